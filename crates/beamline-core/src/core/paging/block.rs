use crate::core::models::histogram::Histogram1D;

/// A fixed-size contiguous run of histograms held in memory by the block
/// cache.
///
/// A block covers the half-open workspace index range
/// `[min_index, min_index + len)`. The dirty flag records whether any
/// histogram was handed out mutably since the block was last flushed;
/// a dirty block must be written back to its scratch file before its memory
/// is reused.
#[derive(Debug, Clone)]
pub struct DataBlock {
    min_index: usize,
    histograms: Vec<Histogram1D>,
    has_changes: bool,
}

impl DataBlock {
    /// Wraps already-loaded histograms into a clean block.
    pub fn new(min_index: usize, histograms: Vec<Histogram1D>) -> Self {
        Self {
            min_index,
            histograms,
            has_changes: false,
        }
    }

    /// Creates a clean, zero-filled block, used for index ranges that have
    /// never been written to the scratch file.
    pub fn zeroed(min_index: usize, len: usize, x_len: usize, y_len: usize) -> Self {
        let histograms = (0..len)
            .map(|_| Histogram1D::with_lengths(x_len, y_len))
            .collect();
        Self::new(min_index, histograms)
    }

    pub fn min_index(&self) -> usize {
        self.min_index
    }

    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Whether the given workspace index falls inside this block.
    pub fn contains(&self, workspace_index: usize) -> bool {
        workspace_index >= self.min_index && workspace_index < self.min_index + self.histograms.len()
    }

    /// Read-only access by workspace index; does not mark the block dirty.
    pub fn histogram(&self, workspace_index: usize) -> Option<&Histogram1D> {
        self.histograms.get(workspace_index.checked_sub(self.min_index)?)
    }

    /// Mutable access by workspace index. Any element could be mutated
    /// through the returned reference, so the block is marked dirty.
    pub fn histogram_mut(&mut self, workspace_index: usize) -> Option<&mut Histogram1D> {
        let offset = workspace_index.checked_sub(self.min_index)?;
        let histogram = self.histograms.get_mut(offset)?;
        self.has_changes = true;
        Some(histogram)
    }

    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    pub fn set_changes(&mut self, has_changes: bool) {
        self.has_changes = has_changes;
    }

    pub(crate) fn histograms(&self) -> &[Histogram1D] {
        &self.histograms
    }
}
