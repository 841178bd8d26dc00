pub mod chain;
pub mod list;
pub mod run;

use crate::error::{CliError, Result};
use beamline::engine::config::FrameworkConfig;
use beamline::engine::services::Services;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Loads the framework configuration, falling back to defaults when no file
/// was given.
pub fn load_config(path: Option<&Path>) -> Result<FrameworkConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading framework configuration.");
            Ok(FrameworkConfig::load(path)?)
        }
        None => Ok(FrameworkConfig::default()),
    }
}

/// Builds services with every built-in algorithm registered.
pub fn build_services(config_path: Option<&PathBuf>) -> Result<Arc<Services>> {
    let config = load_config(config_path.map(|p| p.as_path()))?;
    Ok(Services::with_builtins(config)?)
}

/// Splits repeated `KEY=VALUE` arguments into property pairs.
pub fn parse_property_pairs(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(key, value)| (key.trim().to_string(), value.to_string()))
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| {
                    CliError::Argument(format!(
                        "property '{entry}' is not of the form KEY=VALUE"
                    ))
                })
        })
        .collect()
}

/// Prints the data service contents after a run.
pub fn print_workspace_summary(services: &Services) {
    let names = services.data().object_names();
    if names.is_empty() {
        println!("Data service is empty.");
        return;
    }
    println!("Workspaces in the data service:");
    for name in names {
        match services.data().retrieve(&name) {
            Ok(ws) => println!("  {:<24} {}", name, ws.summary()),
            Err(_) => println!("  {name:<24} <no longer present>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_pairs_split_on_the_first_equals() {
        let pairs = parse_property_pairs(&[
            "InputWorkspace=raw".to_string(),
            "Formula=a=b".to_string(),
        ])
        .unwrap();
        assert_eq!(
            pairs,
            vec![
                ("InputWorkspace".to_string(), "raw".to_string()),
                ("Formula".to_string(), "a=b".to_string()),
            ]
        );
    }

    #[test]
    fn malformed_pairs_are_rejected() {
        assert!(parse_property_pairs(&["NoEquals".to_string()]).is_err());
        assert!(parse_property_pairs(&["=value".to_string()]).is_err());
    }

    #[test]
    fn missing_config_files_surface_as_config_errors() {
        let path = PathBuf::from("/no/such/config.toml");
        assert!(matches!(
            build_services(Some(&path)),
            Err(CliError::Config { .. })
        ));
    }
}
