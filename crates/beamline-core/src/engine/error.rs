use crate::core::models::workspace::WorkspaceError;
use crate::core::paging::PagingError;
use crate::core::properties::PropertyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No algorithm named '{name}' is registered")]
    AlgorithmNotFound { name: String },

    #[error("Algorithm '{name}' has no registered version {version}")]
    VersionNotFound { name: String, version: i32 },

    #[error("Algorithm '{name}' version {version} is already registered")]
    DuplicateRegistration { name: String, version: i32 },

    #[error("A workspace named '{name}' already exists in the data service")]
    WorkspaceExists { name: String },

    #[error("No workspace named '{name}' exists in the data service")]
    WorkspaceNotFound { name: String },

    #[error("Workspace names may not be empty")]
    InvalidWorkspaceName,

    #[error("Workspace '{name}' is a {actual}, not the requested {requested}")]
    WorkspaceTypeMismatch {
        name: String,
        actual: String,
        requested: &'static str,
    },

    #[error("No workspace type named '{type_id}' is registered with the factory")]
    UnknownWorkspaceType { type_id: String },

    #[error("Workspace type '{type_id}' is already registered with the factory")]
    DuplicateWorkspaceType { type_id: String },

    #[error("Algorithm '{algorithm}' was cancelled")]
    Cancelled { algorithm: String },

    #[error("Property validation failed for '{property}': {message}")]
    Validation { property: String, message: String },

    #[error("Property error: {source}")]
    Property {
        #[from]
        source: PropertyError,
    },

    #[error("Workspace error: {source}")]
    Workspace {
        #[from]
        source: WorkspaceError,
    },

    #[error("Paging error: {source}")]
    Paging {
        #[from]
        source: PagingError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
