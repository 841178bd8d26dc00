use super::algorithms;
use super::config::FrameworkConfig;
use super::data_service::DataService;
use super::error::EngineError;
use super::registry::AlgorithmRegistry;
use super::workspace_factory::WorkspaceFactory;
use std::sync::Arc;

/// The dependency-injected bundle of engine services.
///
/// Everything that would be a process-wide singleton in a classic framework
/// (the algorithm registry, the data service, the workspace factory) lives
/// here instead, so tests and embedders construct as many isolated instances
/// as they like and tear them down by dropping the `Arc`.
#[derive(Debug)]
pub struct Services {
    registry: Arc<AlgorithmRegistry>,
    data: Arc<DataService>,
    factory: Arc<WorkspaceFactory>,
    config: FrameworkConfig,
}

impl Services {
    /// Wires up empty services from the given configuration.
    pub fn new(config: FrameworkConfig) -> Arc<Self> {
        let factory = WorkspaceFactory::with_defaults(config.paging.clone());
        Arc::new(Self {
            registry: Arc::new(AlgorithmRegistry::new()),
            data: Arc::new(DataService::new()),
            factory: Arc::new(factory),
            config,
        })
    }

    /// Wires up services with every built-in algorithm registered.
    pub fn with_builtins(config: FrameworkConfig) -> Result<Arc<Self>, EngineError> {
        let services = Self::new(config);
        algorithms::register_builtins(services.registry())?;
        Ok(services)
    }

    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    pub fn data(&self) -> &DataService {
        &self.data
    }

    pub fn factory(&self) -> &WorkspaceFactory {
        &self.factory
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }
}
