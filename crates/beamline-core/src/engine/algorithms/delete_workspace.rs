use crate::core::properties::{Direction, Property, PropertyKind, PropertyManager, Validator};
use crate::engine::algorithm::{Algorithm, ExecutionContext};
use crate::engine::error::EngineError;
use tracing::instrument;

/// Removes a named workspace from the data service.
///
/// Other holders of the shared reference keep the object alive; only the
/// service's name binding is dropped.
#[derive(Debug, Default)]
pub struct DeleteWorkspace;

impl Algorithm for DeleteWorkspace {
    fn name(&self) -> &'static str {
        "DeleteWorkspace"
    }

    fn category(&self) -> &'static str {
        "Utility"
    }

    fn summary(&self) -> &'static str {
        "Removes a workspace from the data service."
    }

    fn init(&self, properties: &mut PropertyManager) -> Result<(), EngineError> {
        properties.declare_property(
            Property::new("Workspace", PropertyKind::Text, Direction::Input)
                .with_validator(Validator::Mandatory),
        )?;
        Ok(())
    }

    #[instrument(skip_all, name = "delete_workspace")]
    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), EngineError> {
        let name = ctx.properties.get_text("Workspace")?;
        if !ctx.data.does_exist(&name) {
            return Err(EngineError::WorkspaceNotFound { name });
        }
        ctx.data.remove(&name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::table::TableWorkspace;
    use crate::engine::algorithm::AlgorithmHost;
    use crate::engine::config::FrameworkConfig;
    use crate::engine::services::Services;
    use std::sync::Arc;

    fn host(services: &Arc<Services>) -> AlgorithmHost {
        let kernel = services.registry().create("DeleteWorkspace", -1).unwrap();
        let mut host = AlgorithmHost::new(kernel, Arc::clone(services));
        host.set_rethrows(true);
        host.initialize().unwrap();
        host
    }

    #[test]
    fn removes_an_existing_workspace() {
        let services = Services::with_builtins(FrameworkConfig::default()).unwrap();
        services
            .data()
            .add("doomed", Arc::new(TableWorkspace::new()))
            .unwrap();

        let mut host = host(&services);
        host.set_property_value("Workspace", "doomed").unwrap();
        assert!(host.execute().unwrap());
        assert!(!services.data().does_exist("doomed"));
    }

    #[test]
    fn deleting_a_missing_workspace_fails() {
        let services = Services::with_builtins(FrameworkConfig::default()).unwrap();
        let mut host = host(&services);
        host.set_property_value("Workspace", "ghost").unwrap();

        let err = host.execute().unwrap_err();
        assert!(matches!(err, EngineError::WorkspaceNotFound { name } if name == "ghost"));
    }
}
