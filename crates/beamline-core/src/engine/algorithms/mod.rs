//! Built-in structural algorithms shipped with the framework.
//!
//! These kernels move, reshape, and manage workspaces; instrument-specific
//! reductions live outside the core and register themselves the same way.

pub mod average_spectra;
pub mod create_sample_workspace;
pub mod delete_workspace;
pub mod scale;
pub mod sum_spectra;

use super::error::EngineError;
use super::registry::AlgorithmRegistry;

pub use average_spectra::AverageSpectra;
pub use create_sample_workspace::CreateSampleWorkspace;
pub use delete_workspace::DeleteWorkspace;
pub use scale::Scale;
pub use sum_spectra::SumSpectra;

/// Registers every built-in algorithm with the given registry.
pub fn register_builtins(registry: &AlgorithmRegistry) -> Result<(), EngineError> {
    registry.register::<CreateSampleWorkspace>()?;
    registry.register::<Scale>()?;
    registry.register::<SumSpectra>()?;
    registry.register::<AverageSpectra>()?;
    registry.register::<DeleteWorkspace>()?;
    Ok(())
}
