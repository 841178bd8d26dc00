use crate::core::properties::{Direction, Property, PropertyKind, PropertyManager, Validator};
use crate::engine::algorithm::{Algorithm, ExecutionContext};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressTracker;
use crate::engine::workspace_factory::WorkspaceDims;
use std::sync::Arc;
use tracing::instrument;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Applies `y * factor` or `y + factor` to every spectrum of a workspace.
///
/// Errors scale with the factor under `Multiply` and are untouched under
/// `Add`. X data and spectrum metadata are carried over unchanged.
#[derive(Debug, Default)]
pub struct Scale;

struct ScaledRow {
    x: Arc<Vec<f64>>,
    y: Vec<f64>,
    e: Vec<f64>,
}

impl Algorithm for Scale {
    fn name(&self) -> &'static str {
        "Scale"
    }

    fn category(&self) -> &'static str {
        "Arithmetic"
    }

    fn summary(&self) -> &'static str {
        "Multiplies or offsets every spectrum of a workspace by a constant."
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
        properties.declare_property(
            Property::new("Factor", PropertyKind::Float, Direction::Input).with_default(1.0),
        )?;
        properties.declare_property(
            Property::new("Operation", PropertyKind::Text, Direction::Input)
                .with_default("Multiply")
                .with_validator(Validator::AllowedValues(vec![
                    "Multiply".to_string(),
                    "Add".to_string(),
                ])),
        )?;
        Ok(())
    }

    #[instrument(skip_all, name = "scale")]
    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), EngineError> {
        let input = ctx.input_matrix("InputWorkspace")?;
        let factor = ctx.properties.get_float("Factor")?;
        let multiply = ctx.properties.get_text("Operation")? == "Multiply";

        let n_spectra = input.n_spectra();
        let dims = WorkspaceDims::new(n_spectra, input.x_len(), input.y_len());
        let mut output = ctx.factory.create_matrix(dims)?;
        output.set_unit(input.unit());

        let cancel = ctx.cancel;
        let algorithm = ctx.algorithm_name();
        let tracker = ProgressTracker::new(ctx.reporter, n_spectra as u64);

        let scale_row = |i: usize| -> Result<ScaledRow, EngineError> {
            cancel.check(algorithm)?;
            let row = input.with_histogram(i, |h| {
                let y = h
                    .y()
                    .iter()
                    .map(|&y| if multiply { y * factor } else { y + factor })
                    .collect();
                let e = if multiply {
                    h.e().iter().map(|&e| e * factor.abs()).collect()
                } else {
                    h.e().to_vec()
                };
                ScaledRow {
                    x: h.shared_x(),
                    y,
                    e,
                }
            })?;
            tracker.step();
            Ok(row)
        };

        #[cfg(not(feature = "parallel"))]
        let rows: Result<Vec<ScaledRow>, EngineError> = (0..n_spectra).map(scale_row).collect();

        #[cfg(feature = "parallel")]
        let rows: Result<Vec<ScaledRow>, EngineError> =
            (0..n_spectra).into_par_iter().map(scale_row).collect();

        for (i, row) in rows?.into_iter().enumerate() {
            output.with_histogram_mut(i, |h| {
                h.set_shared_x(row.x);
                *h.y_mut() = row.y;
                *h.e_mut() = row.e;
            })?;
            *output.spectrum_mut(i)? = input.spectrum(i)?.clone();
        }
        tracker.finish();

        ctx.store_output("OutputWorkspace", output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::algorithm::AlgorithmHost;
    use crate::engine::config::FrameworkConfig;
    use crate::engine::services::Services;

    fn services_with_sample(n_spectra: usize, base_value: f64) -> Arc<Services> {
        let services = Services::with_builtins(FrameworkConfig::default()).unwrap();
        run(
            &services,
            "CreateSampleWorkspace",
            &[
                ("OutputWorkspace", "input"),
                ("NumSpectra", &n_spectra.to_string()),
                ("NumBins", "6"),
                ("BaseValue", &base_value.to_string()),
            ],
        );
        services
    }

    fn run(services: &Arc<Services>, name: &str, properties: &[(&str, &str)]) -> AlgorithmHost {
        let kernel = services.registry().create(name, -1).unwrap();
        let mut host = AlgorithmHost::new(kernel, Arc::clone(services));
        host.set_rethrows(true);
        host.initialize().unwrap();
        for (property, value) in properties {
            host.set_property_value(property, value).unwrap();
        }
        host.execute().unwrap();
        host
    }

    #[test]
    fn multiply_scales_counts_and_errors() {
        let services = services_with_sample(3, 4.0);
        run(
            &services,
            "Scale",
            &[
                ("InputWorkspace", "input"),
                ("OutputWorkspace", "scaled"),
                ("Factor", "2.5"),
            ],
        );

        let output = services.data().retrieve_matrix("scaled").unwrap();
        output
            .with_histogram(1, |h| {
                assert!(h.y().iter().all(|&y| y == 10.0));
                let expected_e = 2.0 * 2.5; // sqrt(4) * factor
                assert!(h.e().iter().all(|&e| (e - expected_e).abs() < 1e-12));
            })
            .unwrap();
    }

    #[test]
    fn add_offsets_counts_and_preserves_errors() {
        let services = services_with_sample(2, 4.0);
        run(
            &services,
            "Scale",
            &[
                ("InputWorkspace", "input"),
                ("OutputWorkspace", "offset"),
                ("Factor", "1.5"),
                ("Operation", "Add"),
            ],
        );

        let output = services.data().retrieve_matrix("offset").unwrap();
        output
            .with_histogram(0, |h| {
                assert!(h.y().iter().all(|&y| y == 5.5));
                assert!(h.e().iter().all(|&e| (e - 2.0).abs() < 1e-12));
            })
            .unwrap();
    }

    #[test]
    fn x_data_and_metadata_are_carried_over() {
        let services = services_with_sample(3, 1.0);
        run(
            &services,
            "Scale",
            &[("InputWorkspace", "input"), ("OutputWorkspace", "scaled")],
        );

        let input = services.data().retrieve_matrix("input").unwrap();
        let output = services.data().retrieve_matrix("scaled").unwrap();

        let in_x = input.with_histogram(2, |h| h.x().to_vec()).unwrap();
        let out_x = output.with_histogram(2, |h| h.x().to_vec()).unwrap();
        assert_eq!(in_x, out_x);
        assert_eq!(
            input.spectrum(2).unwrap().detector_ids(),
            output.spectrum(2).unwrap().detector_ids()
        );
        assert_eq!(output.unit(), "TOF");
    }

    #[test]
    fn missing_input_workspace_fails_execution() {
        let services = Services::with_builtins(FrameworkConfig::default()).unwrap();
        let kernel = services.registry().create("Scale", -1).unwrap();
        let mut host = AlgorithmHost::new(kernel, services);
        host.set_rethrows(true);
        host.initialize().unwrap();
        host.set_property_value("InputWorkspace", "absent").unwrap();
        host.set_property_value("OutputWorkspace", "out").unwrap();

        let err = host.execute().unwrap_err();
        assert!(matches!(err, EngineError::WorkspaceNotFound { name } if name == "absent"));
    }

    #[test]
    fn unknown_operations_are_rejected_by_the_validator() {
        let services = Services::with_builtins(FrameworkConfig::default()).unwrap();
        let kernel = services.registry().create("Scale", -1).unwrap();
        let mut host = AlgorithmHost::new(kernel, services);
        host.initialize().unwrap();
        assert!(host.set_property_value("Operation", "Divide").is_err());
    }
}
