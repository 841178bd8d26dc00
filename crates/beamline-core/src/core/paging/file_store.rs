use super::block::DataBlock;
use crate::core::models::histogram::Histogram1D;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PagingError {
    #[error("Scratch file I/O failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Block index {index} is out of range for {count} blocks")]
    BlockOutOfRange { index: usize, count: usize },

    #[error("Workspace index {index} is not backed by block {block_index}")]
    IndexNotInBlock { index: usize, block_index: usize },
}

const F64_BYTES: usize = std::mem::size_of::<f64>();

/// Fixed-geometry scratch file that holds evicted data blocks.
///
/// Every block slot has the same byte size (the last block of a workspace may
/// hold fewer histograms, but its slot is padded to the full size), so a block
/// index maps directly to a file offset. The file is an anonymous temporary
/// file and disappears with the workspace.
#[derive(Debug)]
pub struct BlockFile {
    file: File,
    block_len: usize,
    x_len: usize,
    y_len: usize,
    n_spectra: usize,
    written: Vec<bool>,
}

impl BlockFile {
    /// Creates an empty scratch file for `n_spectra` histograms grouped into
    /// blocks of `block_len`. The file lives in `scratch_dir` when given,
    /// otherwise in the system temporary directory.
    pub fn create(
        scratch_dir: Option<&Path>,
        block_len: usize,
        x_len: usize,
        y_len: usize,
        n_spectra: usize,
    ) -> Result<Self, PagingError> {
        let file = match scratch_dir {
            Some(dir) => tempfile::tempfile_in(dir)?,
            None => tempfile::tempfile()?,
        };
        let n_blocks = n_spectra.div_ceil(block_len.max(1));
        Ok(Self {
            file,
            block_len: block_len.max(1),
            x_len,
            y_len,
            n_spectra,
            written: vec![false; n_blocks],
        })
    }

    pub fn n_blocks(&self) -> usize {
        self.written.len()
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Number of histograms actually stored in the given block; only the last
    /// block of a workspace can be short.
    pub fn block_spectra(&self, index: usize) -> usize {
        let start = index * self.block_len;
        self.n_spectra.saturating_sub(start).min(self.block_len)
    }

    /// Whether the block slot has been flushed at least once.
    pub fn has_block(&self, index: usize) -> bool {
        self.written.get(index).copied().unwrap_or(false)
    }

    fn histogram_bytes(&self) -> usize {
        (self.x_len + 2 * self.y_len) * F64_BYTES
    }

    fn slot_offset(&self, index: usize) -> u64 {
        (index * self.block_len * self.histogram_bytes()) as u64
    }

    fn check_index(&self, index: usize) -> Result<(), PagingError> {
        if index >= self.n_blocks() {
            return Err(PagingError::BlockOutOfRange {
                index,
                count: self.n_blocks(),
            });
        }
        Ok(())
    }

    /// Writes a block into its slot and records the slot as populated.
    pub fn write_block(&mut self, block: &DataBlock) -> Result<(), PagingError> {
        let index = block.min_index() / self.block_len;
        self.check_index(index)?;

        let mut buffer = Vec::with_capacity(block.len() * self.histogram_bytes());
        for histogram in block.histograms() {
            for &v in histogram.x() {
                buffer.extend_from_slice(&v.to_le_bytes());
            }
            for &v in histogram.y() {
                buffer.extend_from_slice(&v.to_le_bytes());
            }
            for &v in histogram.e() {
                buffer.extend_from_slice(&v.to_le_bytes());
            }
        }

        self.file.seek(SeekFrom::Start(self.slot_offset(index)))?;
        self.file.write_all(&buffer)?;
        self.written[index] = true;
        Ok(())
    }

    /// Reads the block at `index` back into memory. A slot that was never
    /// written returns a clean, zero-filled block.
    pub fn read_block(&mut self, index: usize) -> Result<DataBlock, PagingError> {
        self.check_index(index)?;

        let min_index = index * self.block_len;
        let spectra = self.block_spectra(index);
        if !self.written[index] {
            return Ok(DataBlock::zeroed(min_index, spectra, self.x_len, self.y_len));
        }

        let mut buffer = vec![0u8; spectra * self.histogram_bytes()];
        self.file.seek(SeekFrom::Start(self.slot_offset(index)))?;
        self.file.read_exact(&mut buffer)?;

        let mut histograms = Vec::with_capacity(spectra);
        let mut cursor = buffer.chunks_exact(F64_BYTES).map(|chunk| {
            let mut bytes = [0u8; F64_BYTES];
            bytes.copy_from_slice(chunk);
            f64::from_le_bytes(bytes)
        });
        for _ in 0..spectra {
            let x: Vec<f64> = cursor.by_ref().take(self.x_len).collect();
            let y: Vec<f64> = cursor.by_ref().take(self.y_len).collect();
            let e: Vec<f64> = cursor.by_ref().take(self.y_len).collect();
            histograms.push(Histogram1D::new(x, y, e));
        }

        Ok(DataBlock::new(min_index, histograms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block(min_index: usize, len: usize, x_len: usize, y_len: usize) -> DataBlock {
        let mut block = DataBlock::zeroed(min_index, len, x_len, y_len);
        for i in min_index..min_index + len {
            let h = block.histogram_mut(i).unwrap();
            for (j, v) in h.x_mut().iter_mut().enumerate() {
                *v = (i * 100 + j) as f64;
            }
            for (j, v) in h.y_mut().iter_mut().enumerate() {
                *v = (i * 10 + j) as f64;
            }
            for v in h.e_mut().iter_mut() {
                *v = 0.5;
            }
        }
        block
    }

    #[test]
    fn blocks_round_trip_through_the_scratch_file() {
        let mut file = BlockFile::create(None, 4, 5, 4, 12).unwrap();
        let block = sample_block(4, 4, 5, 4);

        file.write_block(&block).unwrap();
        let loaded = file.read_block(1).unwrap();

        assert_eq!(loaded.min_index(), 4);
        assert_eq!(loaded.len(), 4);
        assert!(!loaded.has_changes());
        for i in 4..8 {
            assert_eq!(loaded.histogram(i).unwrap(), block.histogram(i).unwrap());
        }
    }

    #[test]
    fn unwritten_blocks_read_back_zero_filled() {
        let mut file = BlockFile::create(None, 4, 3, 2, 8).unwrap();
        assert!(!file.has_block(0));

        let block = file.read_block(0).unwrap();
        assert_eq!(block.len(), 4);
        assert!(block.histogram(0).unwrap().y().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn last_block_may_be_short() {
        let mut file = BlockFile::create(None, 4, 3, 2, 10).unwrap();
        assert_eq!(file.n_blocks(), 3);
        assert_eq!(file.block_spectra(2), 2);

        let short = sample_block(8, 2, 3, 2);
        file.write_block(&short).unwrap();
        let loaded = file.read_block(2).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.histogram(9).unwrap(), short.histogram(9).unwrap());
    }

    #[test]
    fn out_of_range_block_index_is_rejected() {
        let mut file = BlockFile::create(None, 4, 3, 2, 8).unwrap();
        let result = file.read_block(2);
        assert!(matches!(
            result,
            Err(PagingError::BlockOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn scratch_dir_is_honoured() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = BlockFile::create(Some(dir.path()), 2, 3, 2, 4).unwrap();
        let block = sample_block(0, 2, 3, 2);
        file.write_block(&block).unwrap();
        assert!(file.has_block(0));
    }
}
