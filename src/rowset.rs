//! Bitrow - In-memory row set
//!
//! An ordered, contiguous collection of rows backing the offline dedup and
//! class-index tools. The flat word buffer is exclusively owned; row offsets
//! are derived as `index * n_words` here and nowhere else.
//!
//! Sorting splits into a rayon-parallel comparison phase (index permutation)
//! and a sequential gather, the same parallel-then-sequential shape the
//! generation pipeline uses elsewhere. Deduplication is a sequential
//! two-cursor compaction whose read cursor never trails the write cursor.

use rayon::prelude::*;
use tracing::debug;

use crate::codec::Word;
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::row::get_class;
use crate::storage::RowStore;

/// Owned, contiguous set of fixed-width rows.
///
/// The logical row count can drop below the physical buffer capacity after
/// deduplication; words past `len() * n_words()` are unused, not freed.
#[derive(Debug, Clone)]
pub struct RowSet {
    words: Vec<Word>,
    n_words: usize,
    n_rows: usize,
}

impl RowSet {
    /// Allocate a zeroed set of `n_rows` rows, `n_words` words each.
    pub fn zeroed(n_rows: u32, n_words: u32) -> Self {
        let n_rows = n_rows as usize;
        let n_words = n_words as usize;
        Self {
            words: vec![0; n_rows * n_words],
            n_words,
            n_rows,
        }
    }

    /// Wrap an existing flat buffer. The buffer length must be a whole
    /// number of rows.
    pub fn from_words(words: Vec<Word>, n_words: u32) -> Self {
        let n_words = n_words as usize;
        assert!(n_words > 0 && words.len() % n_words == 0, "ragged row buffer");
        let n_rows = words.len() / n_words;
        Self {
            words,
            n_words,
            n_rows,
        }
    }

    /// Logical number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    /// True when the set holds no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Words per row.
    pub fn n_words(&self) -> usize {
        self.n_words
    }

    #[inline]
    fn offset(&self, index: u32) -> usize {
        let index = index as usize;
        debug_assert!(index < self.n_rows);
        index * self.n_words
    }

    /// Borrow one row.
    #[inline]
    pub fn row(&self, index: u32) -> &[Word] {
        let at = self.offset(index);
        &self.words[at..at + self.n_words]
    }

    /// Borrow one row mutably.
    #[inline]
    pub fn row_mut(&mut self, index: u32) -> &mut [Word] {
        let at = self.offset(index);
        &mut self.words[at..at + self.n_words]
    }

    /// The words of the logical rows, in order.
    pub fn as_words(&self) -> &[Word] {
        &self.words[..self.n_rows * self.n_words]
    }

    /// Sort rows in row-wise lexicographic order (word 0 most significant).
    ///
    /// Establishes the precondition of [`remove_duplicates`]. The comparison
    /// phase sorts an index permutation in parallel; the gather into sorted
    /// order is sequential.
    ///
    /// [`remove_duplicates`]: RowSet::remove_duplicates
    pub fn sort(&mut self) {
        let n_words = self.n_words;
        let words = &self.words;

        let mut order: Vec<u32> = (0..self.n_rows as u32).collect();
        order.par_sort_unstable_by(|&a, &b| {
            let a = a as usize * n_words;
            let b = b as usize * n_words;
            words[a..a + n_words].cmp(&words[b..b + n_words])
        });

        let mut sorted = Vec::with_capacity(self.n_rows * n_words);
        for index in order {
            let at = index as usize * n_words;
            sorted.extend_from_slice(&self.words[at..at + n_words]);
        }
        self.words = sorted;
    }

    /// Remove adjacent duplicate rows, keeping the first of each run.
    ///
    /// Precondition: rows sorted lexicographically (see [`sort`]); on
    /// unsorted input only adjacent duplicates collapse. Unique rows are
    /// compacted toward the front in place; the physical buffer is not
    /// shrunk. Returns the number of rows removed.
    ///
    /// [`sort`]: RowSet::sort
    pub fn remove_duplicates(&mut self) -> usize {
        if self.n_rows == 0 {
            return 0;
        }

        let n_words = self.n_words;
        let mut kept = 1usize;

        for i in 1..self.n_rows {
            let read = i * n_words;
            let last = (kept - 1) * n_words;
            if self.words[read..read + n_words] != self.words[last..last + n_words] {
                let write = kept * n_words;
                if write != read {
                    self.words.copy_within(read..read + n_words, write);
                }
                kept += 1;
            }
        }

        let removed = self.n_rows - kept;
        self.n_rows = kept;
        debug!(kept, removed, "deduplication complete");
        removed
    }

    /// Partition row indices by class.
    ///
    /// Two passes: count rows per class, size each class's index array
    /// exactly, then fill. Fails with [`Error::ClassOutOfRange`] if a row
    /// decodes to a class the descriptor does not admit (possible in
    /// externally supplied data when `n_classes` is not a power of two).
    pub fn class_index(&self, descriptor: &Descriptor) -> Result<Vec<Vec<u32>>> {
        let n_classes = descriptor.n_classes as usize;
        let mut counts = vec![0usize; n_classes];

        for i in 0..self.n_rows as u32 {
            let class_id = get_class(
                self.row(i),
                descriptor.n_attributes,
                descriptor.n_bits_for_class,
            );
            if class_id >= descriptor.n_classes {
                return Err(Error::ClassOutOfRange {
                    row: i,
                    class_id,
                    n_classes: descriptor.n_classes,
                });
            }
            counts[class_id as usize] += 1;
        }

        let mut index: Vec<Vec<u32>> =
            counts.iter().map(|&c| Vec::with_capacity(c)).collect();
        for i in 0..self.n_rows as u32 {
            let class_id = get_class(
                self.row(i),
                descriptor.n_attributes,
                descriptor.n_bits_for_class,
            );
            index[class_id as usize].push(i);
        }

        Ok(index)
    }
}

impl RowStore for RowSet {
    fn read_row(&mut self, index: u32, row: &mut [Word]) -> Result<()> {
        row.copy_from_slice(self.row(index));
        Ok(())
    }

    fn write_row(&mut self, index: u32, row: &[Word]) -> Result<()> {
        self.row_mut(index).copy_from_slice(row);
        Ok(())
    }
}
