use super::error::EngineError;
use super::notification::{DataEvent, NotificationHub};
use crate::core::models::workspace::{MatrixWorkspace, Workspace};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::sync::Arc;
use tracing::{debug, warn};

/// The process-wide name → workspace store algorithms exchange data through.
///
/// Ownership is shared: the service holds one strong reference per entry and
/// any number of callers may hold more, so removing a name never destroys an
/// object something else is still using. The map itself is mutex-protected
/// for concurrent GUI/algorithm access, but a retrieved workspace is a shared
/// object; one writer per workspace at a time stays a caller convention.
#[derive(Default)]
pub struct DataService {
    entries: Mutex<HashMap<String, Arc<dyn Workspace>>>,
    notifications: NotificationHub<DataEvent>,
}

impl std::fmt::Debug for DataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataService")
            .field("workspaces", &self.object_names())
            .finish()
    }
}

impl DataService {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_name(name: &str) -> Result<(), EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::InvalidWorkspaceName);
        }
        Ok(())
    }

    /// Stores a workspace under a new name; an existing name is an error.
    pub fn add(&self, name: &str, workspace: Arc<dyn Workspace>) -> Result<(), EngineError> {
        Self::check_name(name)?;
        {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            if entries.contains_key(name) {
                return Err(EngineError::WorkspaceExists {
                    name: name.to_string(),
                });
            }
            entries.insert(name.to_string(), workspace);
        }
        debug!(workspace = name, "Added workspace to the data service.");
        self.notifications.publish(&DataEvent::Added {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Stores a workspace, atomically replacing any previous holder of the
    /// name.
    pub fn add_or_replace(
        &self,
        name: &str,
        workspace: Arc<dyn Workspace>,
    ) -> Result<(), EngineError> {
        Self::check_name(name)?;
        let replaced = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.insert(name.to_string(), workspace).is_some()
        };
        let event = if replaced {
            DataEvent::Replaced {
                name: name.to_string(),
            }
        } else {
            DataEvent::Added {
                name: name.to_string(),
            }
        };
        self.notifications.publish(&event);
        Ok(())
    }

    pub fn retrieve(&self, name: &str) -> Result<Arc<dyn Workspace>, EngineError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::WorkspaceNotFound {
                name: name.to_string(),
            })
    }

    /// Retrieves a workspace and downcasts the shared reference to a concrete
    /// type.
    pub fn retrieve_as<T: Workspace>(&self, name: &str) -> Result<Arc<T>, EngineError> {
        let workspace = self.retrieve(name)?;
        let actual = workspace.id();
        workspace
            .into_any()
            .downcast::<T>()
            .map_err(|_| EngineError::WorkspaceTypeMismatch {
                name: name.to_string(),
                actual: actual.to_string(),
                requested: std::any::type_name::<T>(),
            })
    }

    pub fn retrieve_matrix(&self, name: &str) -> Result<Arc<MatrixWorkspace>, EngineError> {
        self.retrieve_as::<MatrixWorkspace>(name)
    }

    /// Drops the service's reference to `name`. Removing an absent name is
    /// logged, not an error.
    pub fn remove(&self, name: &str) {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some();
        if removed {
            debug!(workspace = name, "Removed workspace from the data service.");
            self.notifications.publish(&DataEvent::Removed {
                name: name.to_string(),
            });
        } else {
            warn!(
                workspace = name,
                "Attempted to remove a workspace that is not in the data service."
            );
        }
    }

    pub fn does_exist(&self, name: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// All stored names, sorted.
    pub fn object_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every mapping. Not transactional: in-flight retrievals keep
    /// whatever references they already cloned.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.notifications.publish(&DataEvent::Cleared);
    }

    pub fn events(&self) -> &NotificationHub<DataEvent> {
        &self.notifications
    }
}
