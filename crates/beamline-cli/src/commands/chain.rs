use super::{build_services, print_workspace_summary};
use crate::cli::ChainArgs;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use beamline::engine::registry::LATEST_VERSION;
use beamline::workflows;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::info;

/// A scripted sequence of algorithm runs, read from TOML:
///
/// ```toml
/// [[step]]
/// algorithm = "CreateSampleWorkspace"
/// [step.properties]
/// OutputWorkspace = "raw"
/// NumSpectra = "32"
///
/// [[step]]
/// algorithm = "Scale"
/// version = 1
/// [step.properties]
/// InputWorkspace = "raw"
/// OutputWorkspace = "scaled"
/// Factor = "2.0"
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChainScript {
    #[serde(default)]
    step: Vec<ChainStep>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChainStep {
    algorithm: String,
    #[serde(default = "latest_version")]
    version: i32,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

fn latest_version() -> i32 {
    LATEST_VERSION
}

pub fn run(args: ChainArgs) -> Result<()> {
    let content = std::fs::read_to_string(&args.script)?;
    let script: ChainScript = toml::from_str(&content).map_err(|source| CliError::Script {
        path: args.script.clone(),
        source,
    })?;
    if script.step.is_empty() {
        return Err(CliError::Argument(format!(
            "script '{}' contains no steps",
            args.script.display()
        )));
    }

    let services = build_services(args.config.as_ref())?;
    let progress = CliProgressHandler::new();
    let total = script.step.len();

    for (i, step) in script.step.iter().enumerate() {
        println!("[{}/{}] {}", i + 1, total, step.algorithm);
        info!(
            step = i + 1,
            algorithm = %step.algorithm,
            version = step.version,
            "Running chain step."
        );
        let properties: Vec<(String, String)> = step
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        workflows::run_algorithm(
            &services,
            &step.algorithm,
            step.version,
            &properties,
            progress.reporter(),
        )?;
    }

    println!("✓ Chain of {total} steps completed.");
    print_workspace_summary(&services);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ChainArgs;
    use std::fs;

    fn write_script(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn a_two_step_chain_runs_to_completion() {
        let (_dir, path) = write_script(
            r#"
[[step]]
algorithm = "CreateSampleWorkspace"
[step.properties]
OutputWorkspace = "raw"
NumSpectra = "4"
NumBins = "8"

[[step]]
algorithm = "Scale"
[step.properties]
InputWorkspace = "raw"
OutputWorkspace = "scaled"
Factor = "2.0"
"#,
        );

        run(ChainArgs {
            script: path,
            config: None,
        })
        .unwrap();
    }

    #[test]
    fn malformed_scripts_report_the_path() {
        let (_dir, path) = write_script("[[step]]\nalgorithm = 42\n");
        let err = run(ChainArgs {
            script: path.clone(),
            config: None,
        })
        .unwrap_err();
        match err {
            CliError::Script { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected a script error, got {other:?}"),
        }
    }

    #[test]
    fn empty_scripts_are_rejected() {
        let (_dir, path) = write_script("");
        let err = run(ChainArgs {
            script: path,
            config: None,
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));
    }

    #[test]
    fn a_failing_step_stops_the_chain() {
        let (_dir, path) = write_script(
            r#"
[[step]]
algorithm = "Scale"
[step.properties]
InputWorkspace = "never-created"
OutputWorkspace = "out"
"#,
        );
        let err = run(ChainArgs {
            script: path,
            config: None,
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Engine(_)));
    }
}
