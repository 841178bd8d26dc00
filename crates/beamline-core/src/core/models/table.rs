use super::workspace::{Workspace, WorkspaceError};
use std::any::Any;
use std::sync::Arc;

/// A small named-column table of string cells.
///
/// Algorithms use it for tabular side results (fit parameters, masked
/// detector lists); it also gives the data service a second concrete type so
/// typed retrieval has something to distinguish.
#[derive(Debug, Clone, Default)]
pub struct TableWorkspace {
    columns: Vec<Column>,
    n_rows: usize,
}

#[derive(Debug, Clone)]
struct Column {
    name: String,
    values: Vec<String>,
}

impl TableWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_column(&mut self, name: &str) -> Result<(), WorkspaceError> {
        if self.columns.iter().any(|c| c.name == name) {
            return Err(WorkspaceError::DuplicateColumn {
                name: name.to_string(),
            });
        }
        self.columns.push(Column {
            name: name.to_string(),
            values: vec![String::new(); self.n_rows],
        });
        Ok(())
    }

    pub fn append_row(&mut self, values: &[&str]) -> Result<(), WorkspaceError> {
        if values.len() != self.columns.len() {
            return Err(WorkspaceError::ColumnCountMismatch {
                expected: self.columns.len(),
                got: values.len(),
            });
        }
        for (column, value) in self.columns.iter_mut().zip(values) {
            column.values.push(value.to_string());
        }
        self.n_rows += 1;
        Ok(())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn cell(&self, row: usize, column_name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name == column_name)?
            .values
            .get(row)
            .map(String::as_str)
    }
}

impl Workspace for TableWorkspace {
    fn id(&self) -> &'static str {
        "TableWorkspace"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn summary(&self) -> String {
        format!(
            "TableWorkspace: {} columns, {} rows",
            self.n_columns(),
            self.n_rows()
        )
    }
}
