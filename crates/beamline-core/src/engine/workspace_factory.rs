use super::config::PagingSettings;
use super::error::EngineError;
use crate::core::models::table::TableWorkspace;
use crate::core::models::workspace::{MatrixWorkspace, Workspace};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Dimensions of a matrix workspace to be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspaceDims {
    pub n_spectra: usize,
    pub x_len: usize,
    pub y_len: usize,
}

impl WorkspaceDims {
    pub fn new(n_spectra: usize, x_len: usize, y_len: usize) -> Self {
        Self {
            n_spectra,
            x_len,
            y_len,
        }
    }

    /// Total number of stored doubles (X + Y + E across all spectra).
    pub fn total_values(&self) -> usize {
        self.n_spectra * (self.x_len + 2 * self.y_len)
    }
}

type WorkspaceBuilder =
    Box<dyn Fn(WorkspaceDims) -> Result<Box<dyn Workspace>, EngineError> + Send + Sync>;

/// Builds empty workspaces by concrete type name.
///
/// This is the only sanctioned construction path for algorithms, so
/// factory-level invariants (type-id tagging, paged-versus-memory selection)
/// hold for everything that ends up in the data service.
pub struct WorkspaceFactory {
    builders: RwLock<HashMap<String, WorkspaceBuilder>>,
    paging: PagingSettings,
}

impl WorkspaceFactory {
    /// Creates a factory with the built-in workspace types registered:
    /// `"Workspace2D"`, `"ManagedWorkspace2D"`, and `"TableWorkspace"`.
    pub fn with_defaults(paging: PagingSettings) -> Self {
        let mut builders: HashMap<String, WorkspaceBuilder> = HashMap::new();

        builders.insert(
            "Workspace2D".to_string(),
            Box::new(|dims: WorkspaceDims| {
                Ok(Box::new(MatrixWorkspace::in_memory(
                    dims.n_spectra,
                    dims.x_len,
                    dims.y_len,
                )) as Box<dyn Workspace>)
            }),
        );

        let paged_settings = paging.clone();
        builders.insert(
            "ManagedWorkspace2D".to_string(),
            Box::new(move |dims: WorkspaceDims| {
                let ws = MatrixWorkspace::paged(
                    dims.n_spectra,
                    dims.x_len,
                    dims.y_len,
                    paged_settings.spectra_per_block,
                    paged_settings.resident_blocks,
                    paged_settings.scratch_dir.as_deref(),
                )?;
                Ok(Box::new(ws) as Box<dyn Workspace>)
            }),
        );

        builders.insert(
            "TableWorkspace".to_string(),
            Box::new(|_dims: WorkspaceDims| {
                Ok(Box::new(TableWorkspace::new()) as Box<dyn Workspace>)
            }),
        );

        Self {
            builders: RwLock::new(builders),
            paging,
        }
    }

    /// Registers an additional workspace type.
    pub fn register(&self, type_id: &str, builder: WorkspaceBuilder) -> Result<(), EngineError> {
        let mut builders = self
            .builders
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if builders.contains_key(type_id) {
            return Err(EngineError::DuplicateWorkspaceType {
                type_id: type_id.to_string(),
            });
        }
        builders.insert(type_id.to_string(), builder);
        Ok(())
    }

    /// Builds an empty workspace of the named concrete type.
    pub fn create(
        &self,
        type_id: &str,
        dims: WorkspaceDims,
    ) -> Result<Box<dyn Workspace>, EngineError> {
        let builders = self.builders.read().unwrap_or_else(PoisonError::into_inner);
        let builder = builders
            .get(type_id)
            .ok_or_else(|| EngineError::UnknownWorkspaceType {
                type_id: type_id.to_string(),
            })?;
        builder(dims)
    }

    /// Builds a matrix workspace, paging it to disk when the data would
    /// exceed the configured in-memory limit.
    pub fn create_matrix(&self, dims: WorkspaceDims) -> Result<MatrixWorkspace, EngineError> {
        if dims.total_values() > self.paging.in_memory_value_limit {
            debug!(
                n_spectra = dims.n_spectra,
                total_values = dims.total_values(),
                "Workspace exceeds the in-memory limit; building a managed workspace."
            );
            self.build_paged(dims)
        } else {
            Ok(MatrixWorkspace::in_memory(
                dims.n_spectra,
                dims.x_len,
                dims.y_len,
            ))
        }
    }

    /// Builds a matrix workspace of an explicitly requested kind; `"Auto"`
    /// defers to [`WorkspaceFactory::create_matrix`].
    pub fn create_matrix_of(
        &self,
        type_id: &str,
        dims: WorkspaceDims,
    ) -> Result<MatrixWorkspace, EngineError> {
        match type_id {
            "Auto" => self.create_matrix(dims),
            "Workspace2D" => Ok(MatrixWorkspace::in_memory(
                dims.n_spectra,
                dims.x_len,
                dims.y_len,
            )),
            "ManagedWorkspace2D" => self.build_paged(dims),
            other => Err(EngineError::UnknownWorkspaceType {
                type_id: other.to_string(),
            }),
        }
    }

    fn build_paged(&self, dims: WorkspaceDims) -> Result<MatrixWorkspace, EngineError> {
        Ok(MatrixWorkspace::paged(
            dims.n_spectra,
            dims.x_len,
            dims.y_len,
            self.paging.spectra_per_block,
            self.paging.resident_blocks,
            self.paging.scratch_dir.as_deref(),
        )?)
    }

    /// All registered type names, sorted.
    pub fn known_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .builders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        types.sort();
        types
    }
}

impl std::fmt::Debug for WorkspaceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceFactory")
            .field("known_types", &self.known_types())
            .field("paging", &self.paging)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> WorkspaceFactory {
        WorkspaceFactory::with_defaults(PagingSettings::default())
    }

    #[test]
    fn builtin_types_build_with_the_right_tags() {
        let factory = factory();
        let dims = WorkspaceDims::new(4, 3, 2);

        assert_eq!(factory.create("Workspace2D", dims).unwrap().id(), "Workspace2D");
        assert_eq!(
            factory.create("ManagedWorkspace2D", dims).unwrap().id(),
            "ManagedWorkspace2D"
        );
        assert_eq!(
            factory.create("TableWorkspace", dims).unwrap().id(),
            "TableWorkspace"
        );
    }

    #[test]
    fn unknown_types_are_rejected() {
        let factory = factory();
        let Err(err) = factory.create("EventWorkspace", WorkspaceDims::new(1, 1, 1)) else {
            panic!("expected error")
        };
        assert!(matches!(err, EngineError::UnknownWorkspaceType { .. }));
    }

    #[test]
    fn duplicate_type_registration_is_rejected() {
        let factory = factory();
        let err = factory.register(
            "Workspace2D",
            Box::new(|dims| {
                Ok(Box::new(MatrixWorkspace::in_memory(dims.n_spectra, dims.x_len, dims.y_len))
                    as Box<dyn Workspace>)
            }),
        );
        assert!(matches!(
            err,
            Err(EngineError::DuplicateWorkspaceType { .. })
        ));
    }

    #[test]
    fn auto_selection_pages_large_workspaces() {
        let mut paging = PagingSettings::default();
        paging.in_memory_value_limit = 100;
        paging.spectra_per_block = 4;
        paging.resident_blocks = 2;
        let factory = WorkspaceFactory::with_defaults(paging);

        let small = factory.create_matrix(WorkspaceDims::new(2, 3, 2)).unwrap();
        assert!(!small.is_paged());

        let large = factory.create_matrix(WorkspaceDims::new(50, 11, 10)).unwrap();
        assert!(large.is_paged());
    }

    #[test]
    fn explicit_matrix_kinds_are_honoured() {
        let factory = factory();
        let dims = WorkspaceDims::new(4, 3, 2);

        assert!(!factory.create_matrix_of("Workspace2D", dims).unwrap().is_paged());
        assert!(
            factory
                .create_matrix_of("ManagedWorkspace2D", dims)
                .unwrap()
                .is_paged()
        );
        assert!(factory.create_matrix_of("TableWorkspace", dims).is_err());
    }
}
