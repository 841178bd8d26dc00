use crate::core::properties::{Direction, Property, PropertyKind, PropertyManager, Validator};
use crate::engine::algorithm::{Algorithm, ExecutionContext};
use crate::engine::error::EngineError;
use crate::engine::registry::LATEST_VERSION;
use tracing::instrument;

/// Averages every spectrum of a workspace into one, by composing the
/// `SumSpectra` and `Scale` kernels as child algorithms.
///
/// The intermediate sum lives in the data service under a double-underscore
/// scratch name and is removed again whether or not the scaling step
/// succeeds.
#[derive(Debug, Default)]
pub struct AverageSpectra;

impl Algorithm for AverageSpectra {
    fn name(&self) -> &'static str {
        "AverageSpectra"
    }

    fn category(&self) -> &'static str {
        "Transforms"
    }

    fn summary(&self) -> &'static str {
        "Averages all spectra of a workspace into a single spectrum."
    }

    fn init(&self, properties: &mut PropertyManager) -> Result<(), EngineError> {
        properties.declare_property(
            Property::new("InputWorkspace", PropertyKind::Text, Direction::Input)
                .with_validator(Validator::Mandatory),
        )?;
        properties.declare_property(
            Property::new("OutputWorkspace", PropertyKind::Text, Direction::Output)
                .with_validator(Validator::Mandatory),
        )?;
        Ok(())
    }

    #[instrument(skip_all, name = "average_spectra")]
    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), EngineError> {
        let input_name = ctx.properties.get_text("InputWorkspace")?;
        let output_name = ctx.properties.get_text("OutputWorkspace")?;

        let n_spectra = ctx.data.retrieve_matrix(&input_name)?.n_spectra();
        if n_spectra == 0 {
            return Err(EngineError::Validation {
                property: "InputWorkspace".to_string(),
                message: format!("workspace '{input_name}' has no spectra to average"),
            });
        }

        let sum_name = format!("__{output_name}_sum");
        ctx.run_child(
            "SumSpectra",
            LATEST_VERSION,
            &[
                ("InputWorkspace", &input_name),
                ("OutputWorkspace", &sum_name),
            ],
        )?;

        let factor = 1.0 / n_spectra as f64;
        let scaled = ctx.run_child(
            "Scale",
            LATEST_VERSION,
            &[
                ("InputWorkspace", &sum_name),
                ("OutputWorkspace", &output_name),
                ("Factor", &factor.to_string()),
                ("Operation", "Multiply"),
            ],
        );
        // The scratch sum must not outlive this run, successful or not.
        ctx.data.remove(&sum_name);
        scaled?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::algorithm::AlgorithmHost;
    use crate::engine::config::FrameworkConfig;
    use crate::engine::services::Services;
    use std::sync::Arc;

    fn run(
        services: &Arc<Services>,
        name: &str,
        properties: &[(&str, &str)],
    ) -> Result<AlgorithmHost, EngineError> {
        let kernel = services.registry().create(name, -1)?;
        let mut host = AlgorithmHost::new(kernel, Arc::clone(services));
        host.set_rethrows(true);
        host.initialize()?;
        for (property, value) in properties {
            host.set_property_value(property, value)?;
        }
        host.execute()?;
        Ok(host)
    }

    #[test]
    fn averages_through_its_child_algorithms() {
        let services = Services::with_builtins(FrameworkConfig::default()).unwrap();
        run(
            &services,
            "CreateSampleWorkspace",
            &[
                ("OutputWorkspace", "input"),
                ("NumSpectra", "8"),
                ("NumBins", "4"),
                ("BaseValue", "3"),
            ],
        )
        .unwrap();

        run(
            &services,
            "AverageSpectra",
            &[("InputWorkspace", "input"), ("OutputWorkspace", "mean")],
        )
        .unwrap();

        let output = services.data().retrieve_matrix("mean").unwrap();
        assert_eq!(output.n_spectra(), 1);
        output
            .with_histogram(0, |h| {
                assert!(h.y().iter().all(|&y| (y - 3.0).abs() < 1e-12));
            })
            .unwrap();
    }

    #[test]
    fn the_scratch_sum_is_cleaned_up() {
        let services = Services::with_builtins(FrameworkConfig::default()).unwrap();
        run(
            &services,
            "CreateSampleWorkspace",
            &[("OutputWorkspace", "input"), ("NumSpectra", "2")],
        )
        .unwrap();
        run(
            &services,
            "AverageSpectra",
            &[("InputWorkspace", "input"), ("OutputWorkspace", "mean")],
        )
        .unwrap();

        assert!(!services.data().does_exist("__mean_sum"));
        assert_eq!(services.data().object_names(), vec!["input", "mean"]);
    }

    #[test]
    fn a_missing_input_fails_before_any_child_runs() {
        let services = Services::with_builtins(FrameworkConfig::default()).unwrap();
        let err = run(
            &services,
            "AverageSpectra",
            &[("InputWorkspace", "absent"), ("OutputWorkspace", "mean")],
        )
        .unwrap_err();

        assert!(matches!(err, EngineError::WorkspaceNotFound { .. }));
        assert!(services.data().is_empty());
    }
}
