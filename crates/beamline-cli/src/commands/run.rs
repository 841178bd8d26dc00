use super::{build_services, parse_property_pairs, print_workspace_summary};
use crate::cli::RunArgs;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use beamline::engine::manager::AlgorithmManager;
use beamline::engine::notification::AlgorithmEvent;
use std::sync::Arc;
use tracing::info;

pub fn run(args: RunArgs) -> Result<()> {
    let services = build_services(args.config.as_ref())?;
    let properties = parse_property_pairs(&args.properties)?;

    let manager = AlgorithmManager::new(Arc::clone(&services));
    manager.events().subscribe(|event: &AlgorithmEvent| match event {
        AlgorithmEvent::Starting { name, version } => {
            info!(algorithm = %name, version = *version, "Algorithm starting.");
        }
        AlgorithmEvent::Finished {
            name,
            version,
            success,
        } => {
            info!(
                algorithm = %name,
                version = *version,
                success = *success,
                "Algorithm finished."
            );
        }
    });

    let handle = manager.create(&args.algorithm, args.algorithm_version)?;
    let progress = CliProgressHandler::new();
    {
        let mut host = handle.host();
        host.set_rethrows(true);
        host.set_reporter(progress.reporter());
        for (property, value) in &properties {
            host.set_property_value(property, value)?;
        }
    }

    handle.execute()?;
    println!(
        "✓ {} v{} completed.",
        handle.name(),
        handle.version()
    );

    let host = handle.host();
    let outputs: Vec<(String, String)> = host
        .properties()
        .iter()
        .filter(|p| {
            matches!(
                p.direction(),
                beamline::core::properties::Direction::Output
                    | beamline::core::properties::Direction::InOut
            )
        })
        .map(|p| (p.name().to_string(), p.value().to_string()))
        .collect();
    drop(host);

    for (name, value) in outputs {
        println!("  {name} = {value}");
    }
    print_workspace_summary(&services);
    Ok(())
}
