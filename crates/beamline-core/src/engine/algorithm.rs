use super::cancellation::CancellationToken;
use super::data_service::DataService;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::services::Services;
use super::workspace_factory::WorkspaceFactory;
use crate::core::models::workspace::MatrixWorkspace;
use crate::core::properties::{PropertyError, PropertyManager, PropertyValue};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The compute-kernel interface.
///
/// A kernel declares what it is (`name`/`version`/`category`), which
/// properties it takes (`init`), and what it does (`exec`). Validation,
/// state tracking, cancellation, and workspace exchange are handled by the
/// surrounding [`AlgorithmHost`].
pub trait Algorithm: Send {
    fn name(&self) -> &'static str;

    fn version(&self) -> i32 {
        1
    }

    fn category(&self) -> &'static str {
        "General"
    }

    fn summary(&self) -> &'static str {
        ""
    }

    /// Declares the kernel's properties. Called exactly once per instance.
    fn init(&self, properties: &mut PropertyManager) -> Result<(), EngineError>;

    /// Does the work. Long loops are expected to poll
    /// [`ExecutionContext::check_cancelled`] and may report progress through
    /// the context's reporter.
    fn exec(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<(), EngineError>;
}

/// Lifecycle of an algorithm instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmState {
    Constructed,
    Initialized,
    Executing,
    Executed,
    Failed,
}

/// The borrowed view of the engine a kernel sees during `exec`.
///
/// Workspace exchange goes exclusively through the context (and therefore
/// through the data service); that is the only sanctioned way algorithms
/// share data.
pub struct ExecutionContext<'a> {
    pub properties: &'a mut PropertyManager,
    pub data: &'a DataService,
    pub factory: &'a WorkspaceFactory,
    pub reporter: &'a ProgressReporter,
    pub cancel: &'a CancellationToken,
    services: &'a Arc<Services>,
    algorithm_name: &'static str,
}

impl ExecutionContext<'_> {
    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm_name
    }

    /// Errors out with `EngineError::Cancelled` once cancellation was
    /// requested; poll this at the top of long loops.
    pub fn check_cancelled(&self) -> Result<(), EngineError> {
        self.cancel.check(self.algorithm_name)
    }

    /// Resolves a workspace-name property to the matrix workspace it points
    /// at.
    pub fn input_matrix(&self, property: &str) -> Result<Arc<MatrixWorkspace>, EngineError> {
        let name = self.properties.get_text(property)?;
        self.data.retrieve_matrix(&name)
    }

    /// Stores a result under the name held by a workspace-name property,
    /// replacing any previous holder of that name.
    pub fn store_output(
        &mut self,
        property: &str,
        workspace: MatrixWorkspace,
    ) -> Result<(), EngineError> {
        let name = self.properties.get_text(property)?;
        self.data.add_or_replace(&name, Arc::new(workspace))?;
        debug!(
            algorithm = self.algorithm_name,
            workspace = name,
            "Stored output workspace."
        );
        Ok(())
    }

    /// Constructs an initialized child algorithm sharing this execution's
    /// services, progress channel, and cancellation token. Children always
    /// rethrow, so a failing child surfaces inside the parent's `exec`.
    pub fn create_child(&self, name: &str, version: i32) -> Result<AlgorithmHost, EngineError> {
        let kernel = self.services.registry().create(name, version)?;
        let mut child = AlgorithmHost::child(
            kernel,
            Arc::clone(self.services),
            self.reporter.clone(),
            self.cancel.clone(),
        );
        child.initialize()?;
        debug!(
            parent = self.algorithm_name,
            child = name,
            "Created child algorithm."
        );
        Ok(child)
    }

    /// Creates, configures, and synchronously executes a child algorithm,
    /// returning the finished host for output inspection.
    pub fn run_child(
        &self,
        name: &str,
        version: i32,
        properties: &[(&str, &str)],
    ) -> Result<AlgorithmHost, EngineError> {
        let mut child = self.create_child(name, version)?;
        for (property, value) in properties {
            child.set_property_value(property, value)?;
        }
        child.execute()?;
        Ok(child)
    }
}

/// Owns one kernel instance and drives it through the
/// `Constructed → Initialized → Executing → Executed/Failed` state machine.
pub struct AlgorithmHost {
    kernel: Box<dyn Algorithm>,
    properties: PropertyManager,
    state: AlgorithmState,
    services: Arc<Services>,
    cancel: CancellationToken,
    reporter: ProgressReporter,
    rethrows: bool,
    is_child: bool,
}

impl AlgorithmHost {
    pub fn new(kernel: Box<dyn Algorithm>, services: Arc<Services>) -> Self {
        Self {
            kernel,
            properties: PropertyManager::new(),
            state: AlgorithmState::Constructed,
            services,
            cancel: CancellationToken::new(),
            reporter: ProgressReporter::new(),
            rethrows: false,
            is_child: false,
        }
    }

    fn child(
        kernel: Box<dyn Algorithm>,
        services: Arc<Services>,
        reporter: ProgressReporter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            kernel,
            properties: PropertyManager::new(),
            state: AlgorithmState::Constructed,
            services,
            cancel,
            reporter,
            rethrows: true,
            is_child: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kernel.name()
    }

    pub fn version(&self) -> i32 {
        self.kernel.version()
    }

    pub fn category(&self) -> &'static str {
        self.kernel.category()
    }

    pub fn summary(&self) -> &'static str {
        self.kernel.summary()
    }

    pub fn state(&self) -> AlgorithmState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state != AlgorithmState::Constructed
    }

    pub fn is_executed(&self) -> bool {
        self.state == AlgorithmState::Executed
    }

    /// Chooses whether a failing `execute` returns the error (`true`) or
    /// records it and returns `Ok(false)` (`false`, the default).
    pub fn set_rethrows(&mut self, rethrows: bool) {
        self.rethrows = rethrows;
    }

    /// A clone of this host's cancellation token, for cancelling from
    /// another thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn set_reporter(&mut self, reporter: ProgressReporter) {
        self.reporter = reporter;
    }

    pub fn properties(&self) -> &PropertyManager {
        &self.properties
    }

    pub fn set_property_value(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        Ok(self.properties.set_value(name, value)?)
    }

    pub fn get_property_value(&self, name: &str) -> Result<String, EngineError> {
        Ok(self.properties.get_value(name)?)
    }

    pub fn set_property(
        &mut self,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), EngineError> {
        Ok(self.properties.set(name, value)?)
    }

    /// Runs the kernel's property declarations. Idempotent: a second call is
    /// a no-op, so properties are never declared twice.
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        if self.state != AlgorithmState::Constructed {
            return Ok(());
        }
        self.kernel.init(&mut self.properties)?;
        self.state = AlgorithmState::Initialized;
        debug!(
            algorithm = self.kernel.name(),
            properties = self.properties.len(),
            "Initialized algorithm."
        );
        Ok(())
    }

    /// Validates every property, then runs the kernel.
    ///
    /// Returns `Ok(true)` on success. On any failure the instance moves to
    /// `Failed` and the outcome depends on the rethrow flag: the error is
    /// returned, or recorded and `Ok(false)` comes back. A host that was
    /// never initialized is initialized first.
    pub fn execute(&mut self) -> Result<bool, EngineError> {
        if self.state == AlgorithmState::Constructed {
            self.initialize()?;
        }
        if !self.is_child {
            // A cancellation requested between runs must not poison this one.
            self.cancel.clear();
        }

        let name = self.kernel.name();
        if let Err(error) = self.validate_properties() {
            return self.fail(error);
        }

        self.state = AlgorithmState::Executing;
        info!(
            algorithm = name,
            version = self.kernel.version(),
            "Executing algorithm."
        );
        if !self.is_child {
            self.reporter.report(Progress::PhaseStart {
                name: name.to_string(),
            });
        }

        let result = {
            let mut ctx = ExecutionContext {
                properties: &mut self.properties,
                data: self.services.data(),
                factory: self.services.factory(),
                reporter: &self.reporter,
                cancel: &self.cancel,
                services: &self.services,
                algorithm_name: name,
            };
            self.kernel.exec(&mut ctx)
        };

        if !self.is_child {
            self.reporter.report(Progress::PhaseFinish);
        }

        match result {
            Ok(()) => {
                self.state = AlgorithmState::Executed;
                info!(algorithm = name, "Algorithm completed.");
                Ok(true)
            }
            Err(error) => self.fail(error),
        }
    }

    fn validate_properties(&self) -> Result<(), EngineError> {
        self.properties.validate_all().map_err(|error| match error {
            PropertyError::InvalidValue { name, message } => EngineError::Validation {
                property: name,
                message,
            },
            other => other.into(),
        })
    }

    fn fail(&mut self, error: EngineError) -> Result<bool, EngineError> {
        self.state = AlgorithmState::Failed;
        warn!(
            algorithm = self.kernel.name(),
            error = %error,
            "Algorithm execution failed."
        );
        if self.rethrows { Err(error) } else { Ok(false) }
    }
}

impl std::fmt::Debug for AlgorithmHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmHost")
            .field("name", &self.kernel.name())
            .field("version", &self.kernel.version())
            .field("state", &self.state)
            .field("is_child", &self.is_child)
            .finish()
    }
}
