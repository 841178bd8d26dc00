use crate::core::properties::{Direction, Property, PropertyKind, PropertyManager, Validator};
use crate::engine::algorithm::{Algorithm, ExecutionContext};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressTracker;
use crate::engine::workspace_factory::WorkspaceDims;
use rand::Rng;
use std::sync::Arc;
use tracing::{info, instrument};

/// Generates a matrix workspace with linear X binning and flat counts, with
/// optional uniform noise. Every spectrum shares one X allocation.
#[derive(Debug, Default)]
pub struct CreateSampleWorkspace;

impl Algorithm for CreateSampleWorkspace {
    fn name(&self) -> &'static str {
        "CreateSampleWorkspace"
    }

    fn category(&self) -> &'static str {
        "Utility"
    }

    fn summary(&self) -> &'static str {
        "Creates a sample workspace with linear binning and flat counts."
    }

    fn init(&self, properties: &mut PropertyManager) -> Result<(), EngineError> {
        properties.declare_property(
            Property::new("OutputWorkspace", PropertyKind::Text, Direction::Output)
                .with_validator(Validator::Mandatory),
        )?;
        properties.declare_property(
            Property::new("NumSpectra", PropertyKind::Int, Direction::Input)
                .with_default(10_i64)
                .with_validator(Validator::Bounds {
                    lower: Some(1.0),
                    upper: None,
                }),
        )?;
        properties.declare_property(
            Property::new("NumBins", PropertyKind::Int, Direction::Input)
                .with_default(100_i64)
                .with_validator(Validator::Bounds {
                    lower: Some(1.0),
                    upper: None,
                }),
        )?;
        properties.declare_property(
            Property::new("XStart", PropertyKind::Float, Direction::Input).with_default(0.0),
        )?;
        properties.declare_property(
            Property::new("BinWidth", PropertyKind::Float, Direction::Input)
                .with_default(1.0)
                .with_validator(Validator::predicate(|value| match value.as_number() {
                    Some(width) if width > 0.0 => Ok(()),
                    _ => Err("bin width must be positive".to_string()),
                })),
        )?;
        properties.declare_property(
            Property::new("BaseValue", PropertyKind::Float, Direction::Input)
                .with_default(1.0)
                .with_validator(Validator::Bounds {
                    lower: Some(0.0),
                    upper: None,
                }),
        )?;
        properties.declare_property(
            Property::new("NoiseAmplitude", PropertyKind::Float, Direction::Input)
                .with_default(0.0)
                .with_validator(Validator::Bounds {
                    lower: Some(0.0),
                    upper: None,
                }),
        )?;
        properties.declare_property(
            Property::new("WorkspaceType", PropertyKind::Text, Direction::Input)
                .with_default("Auto")
                .with_validator(Validator::AllowedValues(vec![
                    "Auto".to_string(),
                    "Workspace2D".to_string(),
                    "ManagedWorkspace2D".to_string(),
                ])),
        )?;
        Ok(())
    }

    #[instrument(skip_all, name = "create_sample_workspace")]
    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), EngineError> {
        let n_spectra = ctx.properties.get_int("NumSpectra")? as usize;
        let n_bins = ctx.properties.get_int("NumBins")? as usize;
        let x_start = ctx.properties.get_float("XStart")?;
        let bin_width = ctx.properties.get_float("BinWidth")?;
        let base_value = ctx.properties.get_float("BaseValue")?;
        let noise_amplitude = ctx.properties.get_float("NoiseAmplitude")?;
        let workspace_type = ctx.properties.get_text("WorkspaceType")?;

        let dims = WorkspaceDims::new(n_spectra, n_bins + 1, n_bins);
        let mut workspace = ctx.factory.create_matrix_of(&workspace_type, dims)?;
        workspace.set_unit("TOF");

        // One shared allocation of bin edges for the whole workspace.
        let edges: Arc<Vec<f64>> = Arc::new(
            (0..=n_bins)
                .map(|i| x_start + i as f64 * bin_width)
                .collect(),
        );

        let mut rng = rand::thread_rng();
        let tracker = ProgressTracker::new(ctx.reporter, n_spectra as u64);
        for i in 0..n_spectra {
            ctx.check_cancelled()?;
            workspace.with_histogram_mut(i, |h| {
                h.set_shared_x(Arc::clone(&edges));
                for y in h.y_mut().iter_mut() {
                    let noise = if noise_amplitude > 0.0 {
                        rng.gen_range(-noise_amplitude..=noise_amplitude)
                    } else {
                        0.0
                    };
                    *y = (base_value + noise).max(0.0);
                }
                for j in 0..n_bins {
                    let y = h.y()[j];
                    h.e_mut()[j] = y.sqrt();
                }
            })?;
            let spectrum = workspace.spectrum_mut(i)?;
            spectrum.set_spectrum_no(i as i64 + 1);
            spectrum.add_detector_id(1000 + i as i64);
            tracker.step();
        }
        tracker.finish();

        info!(
            n_spectra,
            n_bins,
            paged = workspace.is_paged(),
            "Generated sample workspace."
        );
        ctx.store_output("OutputWorkspace", workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::algorithm::AlgorithmHost;
    use crate::engine::config::FrameworkConfig;
    use crate::engine::services::Services;

    fn run(properties: &[(&str, &str)]) -> (Arc<Services>, AlgorithmHost) {
        let services = Services::with_builtins(FrameworkConfig::default()).unwrap();
        let kernel = services.registry().create("CreateSampleWorkspace", -1).unwrap();
        let mut host = AlgorithmHost::new(kernel, Arc::clone(&services));
        host.set_rethrows(true);
        host.initialize().unwrap();
        for (name, value) in properties {
            host.set_property_value(name, value).unwrap();
        }
        host.execute().unwrap();
        (services, host)
    }

    #[test]
    fn generates_the_requested_shape_with_flat_counts() {
        let (services, _host) = run(&[
            ("OutputWorkspace", "sample"),
            ("NumSpectra", "4"),
            ("NumBins", "8"),
            ("XStart", "10"),
            ("BinWidth", "0.5"),
            ("BaseValue", "5"),
        ]);

        let ws = services.data().retrieve_matrix("sample").unwrap();
        assert_eq!(ws.n_spectra(), 4);
        assert_eq!(ws.y_len(), 8);
        assert_eq!(ws.unit(), "TOF");

        ws.with_histogram(2, |h| {
            assert_eq!(h.x().len(), 9);
            assert_eq!(h.x()[0], 10.0);
            assert_eq!(h.x()[8], 14.0);
            assert!(h.y().iter().all(|&y| y == 5.0));
            assert!(h.e().iter().all(|&e| (e - 5.0_f64.sqrt()).abs() < 1e-12));
        })
        .unwrap();
    }

    #[test]
    fn all_spectra_share_one_x_allocation() {
        let (services, _host) = run(&[("OutputWorkspace", "sample"), ("NumSpectra", "6")]);
        let ws = services.data().retrieve_matrix("sample").unwrap();

        let x0 = ws.with_histogram(0, |h| h.shared_x()).unwrap();
        let x5 = ws.with_histogram(5, |h| h.shared_x()).unwrap();
        assert!(Arc::ptr_eq(&x0, &x5));
    }

    #[test]
    fn noise_stays_within_the_requested_amplitude() {
        let (services, _host) = run(&[
            ("OutputWorkspace", "noisy"),
            ("NumSpectra", "3"),
            ("NumBins", "50"),
            ("BaseValue", "10"),
            ("NoiseAmplitude", "2"),
        ]);

        let ws = services.data().retrieve_matrix("noisy").unwrap();
        for i in 0..3 {
            ws.with_histogram(i, |h| {
                assert!(h.y().iter().all(|&y| (8.0..=12.0).contains(&y)));
            })
            .unwrap();
        }
    }

    #[test]
    fn managed_workspaces_can_be_requested_explicitly() {
        let (services, _host) = run(&[
            ("OutputWorkspace", "paged"),
            ("NumSpectra", "20"),
            ("NumBins", "4"),
            ("WorkspaceType", "ManagedWorkspace2D"),
        ]);

        let ws = services.data().retrieve_matrix("paged").unwrap();
        assert!(ws.is_paged());
        ws.with_histogram(19, |h| assert_eq!(h.y().len(), 4)).unwrap();
    }

    #[test]
    fn detector_ids_are_assigned_per_spectrum() {
        let (services, _host) = run(&[("OutputWorkspace", "sample"), ("NumSpectra", "3")]);
        let ws = services.data().retrieve_matrix("sample").unwrap();
        assert!(ws.spectrum(0).unwrap().has_detector_id(1000));
        assert!(ws.spectrum(2).unwrap().has_detector_id(1002));
        assert_eq!(ws.spectrum(2).unwrap().spectrum_no(), 3);
    }

    #[test]
    fn invalid_shapes_are_rejected_at_assignment() {
        let services = Services::with_builtins(FrameworkConfig::default()).unwrap();
        let kernel = services.registry().create("CreateSampleWorkspace", -1).unwrap();
        let mut host = AlgorithmHost::new(kernel, services);
        host.initialize().unwrap();

        assert!(host.set_property_value("NumSpectra", "0").is_err());
        assert!(host.set_property_value("BinWidth", "0").is_err());
        assert!(host.set_property_value("WorkspaceType", "EventWorkspace").is_err());
    }
}
