//! Disk-backed paging for workspaces too large to hold in memory.
//!
//! Histograms are grouped into fixed-size [`DataBlock`]s that an LRU
//! [`BlockCache`] swaps between memory and an anonymous scratch file. Dirty
//! blocks are written back before eviction; that flush-before-evict rule is
//! the correctness invariant of the whole layer.

mod block;
mod cache;
mod file_store;

pub use block::DataBlock;
pub use cache::BlockCache;
pub use file_store::{BlockFile, PagingError};

use crate::core::models::histogram::Histogram1D;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Paged histogram storage backing a matrix workspace.
///
/// Access goes through closures so a histogram reference never outlives the
/// cache lock that keeps its block resident.
#[derive(Debug)]
pub struct PagedSpectrumStore {
    cache: Mutex<BlockCache>,
    n_spectra: usize,
    spectra_per_block: usize,
}

impl PagedSpectrumStore {
    pub fn new(
        n_spectra: usize,
        x_len: usize,
        y_len: usize,
        spectra_per_block: usize,
        resident_blocks: usize,
        scratch_dir: Option<&Path>,
    ) -> Result<Self, PagingError> {
        let spectra_per_block = spectra_per_block.max(1);
        let file = BlockFile::create(scratch_dir, spectra_per_block, x_len, y_len, n_spectra)?;
        Ok(Self {
            cache: Mutex::new(BlockCache::new(file, resident_blocks)),
            n_spectra,
            spectra_per_block,
        })
    }

    pub fn n_spectra(&self) -> usize {
        self.n_spectra
    }

    fn check_index(&self, index: usize) -> Result<usize, PagingError> {
        if index >= self.n_spectra {
            return Err(PagingError::IndexNotInBlock {
                index,
                block_index: index / self.spectra_per_block,
            });
        }
        Ok(index / self.spectra_per_block)
    }

    /// Read access to one histogram; the owning block stays clean.
    pub fn with_histogram<R>(
        &self,
        index: usize,
        f: impl FnOnce(&Histogram1D) -> R,
    ) -> Result<R, PagingError> {
        let block_index = self.check_index(index)?;
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let block = cache.block_mut(block_index)?;
        let histogram = block
            .histogram(index)
            .ok_or(PagingError::IndexNotInBlock { index, block_index })?;
        Ok(f(histogram))
    }

    /// Write access to one histogram; marks the owning block dirty.
    pub fn with_histogram_mut<R>(
        &self,
        index: usize,
        f: impl FnOnce(&mut Histogram1D) -> R,
    ) -> Result<R, PagingError> {
        let block_index = self.check_index(index)?;
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let block = cache.block_mut(block_index)?;
        let histogram = block
            .histogram_mut(index)
            .ok_or(PagingError::IndexNotInBlock { index, block_index })?;
        Ok(f(histogram))
    }

    /// Flushes every dirty resident block to the scratch file.
    pub fn flush(&self) -> Result<(), PagingError> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush_all()
    }
}
