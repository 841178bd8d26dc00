use crate::core::properties::{Direction, Property, PropertyKind, PropertyManager, Validator};
use crate::engine::algorithm::{Algorithm, ExecutionContext};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressTracker;
use crate::engine::workspace_factory::WorkspaceDims;
use itertools::izip;
use std::collections::BTreeSet;
use tracing::instrument;

/// Collapses a contiguous range of spectra into a single spectrum.
///
/// Counts are summed bin by bin, errors combine in quadrature, and the
/// detector IDs of every contributing spectrum are merged. `EndIndex = -1`
/// means the last spectrum of the input.
#[derive(Debug, Default)]
pub struct SumSpectra;

impl Algorithm for SumSpectra {
    fn name(&self) -> &'static str {
        "SumSpectra"
    }

    fn category(&self) -> &'static str {
        "Transforms"
    }

    fn summary(&self) -> &'static str {
        "Sums a range of spectra into a single spectrum."
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
            Property::new("StartIndex", PropertyKind::Int, Direction::Input)
                .with_default(0_i64)
                .with_validator(Validator::Bounds {
                    lower: Some(0.0),
                    upper: None,
                }),
        )?;
        properties.declare_property(
            Property::new("EndIndex", PropertyKind::Int, Direction::Input)
                .with_default(-1_i64)
                .with_validator(Validator::Bounds {
                    lower: Some(-1.0),
                    upper: None,
                }),
        )?;
        Ok(())
    }

    #[instrument(skip_all, name = "sum_spectra")]
    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), EngineError> {
        let input = ctx.input_matrix("InputWorkspace")?;
        let n_spectra = input.n_spectra();
        let start = ctx.properties.get_int("StartIndex")?;
        let end_raw = ctx.properties.get_int("EndIndex")?;
        let end = if end_raw < 0 {
            n_spectra as i64 - 1
        } else {
            end_raw
        };

        if start > end || end >= n_spectra as i64 {
            return Err(EngineError::Validation {
                property: "EndIndex".to_string(),
                message: format!(
                    "index range {start}..={end} is invalid for a workspace with {n_spectra} spectra"
                ),
            });
        }
        let (start, end) = (start as usize, end as usize);

        let y_len = input.y_len();
        let mut acc_y = vec![0.0; y_len];
        let mut acc_e2 = vec![0.0; y_len];
        let mut detectors: BTreeSet<i64> = BTreeSet::new();

        let tracker = ProgressTracker::new(ctx.reporter, (end - start + 1) as u64);
        for i in start..=end {
            ctx.check_cancelled()?;
            input.with_histogram(i, |h| {
                for (acc, e2, &y, &e) in izip!(acc_y.iter_mut(), acc_e2.iter_mut(), h.y(), h.e()) {
                    *acc += y;
                    *e2 += e * e;
                }
            })?;
            detectors.extend(input.spectrum(i)?.detector_ids().iter().copied());
            tracker.step();
        }
        tracker.finish();

        let mut output = ctx
            .factory
            .create_matrix(WorkspaceDims::new(1, input.x_len(), y_len))?;
        output.set_unit(input.unit());
        let shared_x = input.with_histogram(start, |h| h.shared_x())?;
        output.with_histogram_mut(0, |h| {
            h.set_shared_x(shared_x);
            *h.y_mut() = acc_y;
            for (e, &e2) in h.e_mut().iter_mut().zip(&acc_e2) {
                *e = e2.sqrt();
            }
        })?;
        let spectrum = output.spectrum_mut(0)?;
        spectrum.set_spectrum_no(1);
        spectrum.add_detector_ids(detectors);

        ctx.store_output("OutputWorkspace", output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::algorithm::AlgorithmHost;
    use crate::engine::config::FrameworkConfig;
    use crate::engine::services::Services;
    use std::sync::Arc;

    fn services_with_sample(n_spectra: usize, base_value: f64) -> Arc<Services> {
        let services = Services::with_builtins(FrameworkConfig::default()).unwrap();
        run(
            &services,
            "CreateSampleWorkspace",
            &[
                ("OutputWorkspace", "input"),
                ("NumSpectra", &n_spectra.to_string()),
                ("NumBins", "4"),
                ("BaseValue", &base_value.to_string()),
            ],
        )
        .unwrap();
        services
    }

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
    fn sums_counts_and_combines_errors_in_quadrature() {
        let services = services_with_sample(5, 4.0);
        run(
            &services,
            "SumSpectra",
            &[("InputWorkspace", "input"), ("OutputWorkspace", "summed")],
        )
        .unwrap();

        let output = services.data().retrieve_matrix("summed").unwrap();
        assert_eq!(output.n_spectra(), 1);
        output
            .with_histogram(0, |h| {
                assert!(h.y().iter().all(|&y| y == 20.0));
                // Five spectra with e = 2 each: sqrt(5 * 4) = sqrt(20).
                let expected = 20.0_f64.sqrt();
                assert!(h.e().iter().all(|&e| (e - expected).abs() < 1e-12));
            })
            .unwrap();
    }

    #[test]
    fn a_sub_range_only_sums_its_members() {
        let services = services_with_sample(6, 1.0);
        run(
            &services,
            "SumSpectra",
            &[
                ("InputWorkspace", "input"),
                ("OutputWorkspace", "partial"),
                ("StartIndex", "2"),
                ("EndIndex", "3"),
            ],
        )
        .unwrap();

        let output = services.data().retrieve_matrix("partial").unwrap();
        output
            .with_histogram(0, |h| assert!(h.y().iter().all(|&y| y == 2.0)))
            .unwrap();

        // Only the detectors of spectra 2 and 3 are merged.
        let detectors = output.spectrum(0).unwrap().detector_ids().clone();
        assert_eq!(
            detectors.into_iter().collect::<Vec<i64>>(),
            vec![1002, 1003]
        );
    }

    #[test]
    fn invalid_ranges_fail_with_a_validation_error() {
        let services = services_with_sample(3, 1.0);
        let err = run(
            &services,
            "SumSpectra",
            &[
                ("InputWorkspace", "input"),
                ("OutputWorkspace", "bad"),
                ("StartIndex", "2"),
                ("EndIndex", "5"),
            ],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation { property, .. } if property == "EndIndex"
        ));
    }

    #[test]
    fn output_shares_the_input_binning() {
        let services = services_with_sample(4, 1.0);
        run(
            &services,
            "SumSpectra",
            &[("InputWorkspace", "input"), ("OutputWorkspace", "summed")],
        )
        .unwrap();

        let input = services.data().retrieve_matrix("input").unwrap();
        let output = services.data().retrieve_matrix("summed").unwrap();
        let in_x = input.with_histogram(0, |h| h.shared_x()).unwrap();
        let out_x = output.with_histogram(0, |h| h.shared_x()).unwrap();
        assert!(Arc::ptr_eq(&in_x, &out_x));
    }
}
