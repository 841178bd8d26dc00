use super::histogram::Histogram1D;
use super::spectrum::SpectrumInfo;
use crate::core::paging::{PagedSpectrumStore, PagingError};
use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Workspace index {index} is out of range for {len} spectra")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Paging failed: {source}")]
    Paging {
        #[from]
        source: PagingError,
    },

    #[error("A column named '{name}' already exists in the table")]
    DuplicateColumn { name: String },

    #[error("Row has {got} cells but the table has {expected} columns")]
    ColumnCountMismatch { expected: usize, got: usize },
}

/// Interface every object stored in the data service must implement.
///
/// The type tag keys factory construction and shows up in diagnostics; the
/// `Any` plumbing lets the data service hand back concretely-typed shared
/// references.
pub trait Workspace: Any + Send + Sync {
    /// Stable type tag, e.g. `"Workspace2D"`.
    fn id(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// One-line human description used by front ends.
    fn summary(&self) -> String;
}

#[derive(Debug)]
enum SpectrumStorage {
    Memory(Vec<Histogram1D>),
    Paged(PagedSpectrumStore),
}

/// An ordered collection of spectra, each holding X/Y/E histogram data and a
/// set of contributing detector IDs.
///
/// Storage is either fully in memory (`"Workspace2D"`) or paged through a
/// disk-backed block cache (`"ManagedWorkspace2D"`); the accessor API is the
/// same for both. Spectrum metadata always stays resident.
#[derive(Debug)]
pub struct MatrixWorkspace {
    storage: SpectrumStorage,
    spectra: Vec<SpectrumInfo>,
    x_len: usize,
    y_len: usize,
    unit: String,
}

impl MatrixWorkspace {
    /// Creates a zero-filled in-memory workspace. All spectra share one X
    /// allocation until a caller detaches it by mutating X.
    pub fn in_memory(n_spectra: usize, x_len: usize, y_len: usize) -> Self {
        let shared_x = Arc::new(vec![0.0; x_len]);
        let histograms = (0..n_spectra)
            .map(|_| {
                let mut h = Histogram1D::with_lengths(0, y_len);
                h.set_shared_x(Arc::clone(&shared_x));
                h
            })
            .collect();
        Self {
            storage: SpectrumStorage::Memory(histograms),
            spectra: Self::default_spectra(n_spectra),
            x_len,
            y_len,
            unit: String::new(),
        }
    }

    /// Creates a zero-filled workspace whose histogram data is paged to a
    /// scratch file.
    pub fn paged(
        n_spectra: usize,
        x_len: usize,
        y_len: usize,
        spectra_per_block: usize,
        resident_blocks: usize,
        scratch_dir: Option<&Path>,
    ) -> Result<Self, WorkspaceError> {
        let store = PagedSpectrumStore::new(
            n_spectra,
            x_len,
            y_len,
            spectra_per_block,
            resident_blocks,
            scratch_dir,
        )?;
        Ok(Self {
            storage: SpectrumStorage::Paged(store),
            spectra: Self::default_spectra(n_spectra),
            x_len,
            y_len,
            unit: String::new(),
        })
    }

    fn default_spectra(n_spectra: usize) -> Vec<SpectrumInfo> {
        (0..n_spectra)
            .map(|i| SpectrumInfo::new(i as i64 + 1))
            .collect()
    }

    pub fn n_spectra(&self) -> usize {
        self.spectra.len()
    }

    pub fn x_len(&self) -> usize {
        self.x_len
    }

    pub fn y_len(&self) -> usize {
        self.y_len
    }

    pub fn is_paged(&self) -> bool {
        matches!(self.storage, SpectrumStorage::Paged(_))
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn set_unit(&mut self, unit: &str) {
        self.unit = unit.to_string();
    }

    fn check_index(&self, index: usize) -> Result<(), WorkspaceError> {
        if index >= self.spectra.len() {
            return Err(WorkspaceError::IndexOutOfRange {
                index,
                len: self.spectra.len(),
            });
        }
        Ok(())
    }

    pub fn spectrum(&self, index: usize) -> Result<&SpectrumInfo, WorkspaceError> {
        self.check_index(index)?;
        Ok(&self.spectra[index])
    }

    pub fn spectrum_mut(&mut self, index: usize) -> Result<&mut SpectrumInfo, WorkspaceError> {
        self.check_index(index)?;
        Ok(&mut self.spectra[index])
    }

    /// Read access to one histogram.
    pub fn with_histogram<R>(
        &self,
        index: usize,
        f: impl FnOnce(&Histogram1D) -> R,
    ) -> Result<R, WorkspaceError> {
        self.check_index(index)?;
        match &self.storage {
            SpectrumStorage::Memory(histograms) => Ok(f(&histograms[index])),
            SpectrumStorage::Paged(store) => Ok(store.with_histogram(index, f)?),
        }
    }

    /// Write access to one histogram; on paged storage this marks the owning
    /// block dirty so it is flushed before eviction.
    pub fn with_histogram_mut<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut Histogram1D) -> R,
    ) -> Result<R, WorkspaceError> {
        self.check_index(index)?;
        match &mut self.storage {
            SpectrumStorage::Memory(histograms) => Ok(f(&mut histograms[index])),
            SpectrumStorage::Paged(store) => Ok(store.with_histogram_mut(index, f)?),
        }
    }
}

impl Workspace for MatrixWorkspace {
    fn id(&self) -> &'static str {
        if self.is_paged() {
            "ManagedWorkspace2D"
        } else {
            "Workspace2D"
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn summary(&self) -> String {
        format!(
            "{}: {} spectra, {} bins{}",
            self.id(),
            self.n_spectra(),
            self.y_len,
            if self.unit.is_empty() {
                String::new()
            } else {
                format!(", unit {}", self.unit)
            }
        )
    }
}
