use super::build_services;
use crate::cli::ListArgs;
use crate::error::Result;
use tracing::info;

pub fn run(args: ListArgs) -> Result<()> {
    let services = build_services(args.config.as_ref())?;
    let descriptors = services.registry().descriptors();
    info!(count = descriptors.len(), "Listing registered algorithms.");

    println!("{:<28} {:>3}  {:<12} SUMMARY", "ALGORITHM", "VER", "CATEGORY");
    for descriptor in descriptors {
        println!(
            "{:<28} {:>3}  {:<12} {}",
            descriptor.name, descriptor.version, descriptor.category, descriptor.summary
        );
    }
    println!();
    println!(
        "Workspace types: {}",
        services.factory().known_types().join(", ")
    );
    Ok(())
}
