use crate::engine::algorithm::AlgorithmHost;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::services::Services;
use std::sync::Arc;
use tracing::{info, instrument};

/// Runs one algorithm entirely through the string surface: the same
/// name-plus-property-strings interface GUIs and scripting front ends use.
///
/// The host is created unmanaged, configured from the `(name, value)` pairs,
/// and executed with rethrow enabled so failures surface as errors. The
/// finished host comes back for output-property inspection; result
/// workspaces are in the services' data service under the names the
/// properties gave them.
#[instrument(skip_all, name = "run_algorithm", fields(algorithm = name, version = version))]
pub fn run_algorithm(
    services: &Arc<Services>,
    name: &str,
    version: i32,
    properties: &[(String, String)],
    reporter: ProgressReporter,
) -> Result<AlgorithmHost, EngineError> {
    let kernel = services.registry().create(name, version)?;
    let mut host = AlgorithmHost::new(kernel, Arc::clone(services));
    host.set_rethrows(true);
    host.set_reporter(reporter);
    host.initialize()?;

    for (property, value) in properties {
        host.set_property_value(property, value)?;
    }

    info!(
        algorithm = name,
        properties = properties.len(),
        "Running algorithm through the string surface."
    );
    host.execute()?;
    Ok(host)
}
