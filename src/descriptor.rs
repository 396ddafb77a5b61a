//! Bitrow - Dataset descriptor
//!
//! Derived sizing metadata for a dataset: how many bits encode the class,
//! how many words hold a row. Computed once from the configuration and
//! read-only afterwards. Every component sizes rows through this struct;
//! the ceiling arithmetic lives nowhere else.

use crate::codec::WORD_BITS;
use crate::error::{Error, Result};

/// Read-only dimensions of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    /// Number of boolean feature bits per row.
    pub n_attributes: u32,
    /// Number of distinct class labels (>= 2).
    pub n_classes: u32,
    /// Number of rows.
    pub n_observations: u32,
    /// Minimum bits to represent a class id in `[0, n_classes)`.
    pub n_bits_for_class: u8,
    /// Words per row.
    pub n_words: u32,
}

impl Descriptor {
    /// Compute the derived dimensions for a dataset.
    ///
    /// Fails with [`Error::InvalidDimensions`] when `n_observations < 1`,
    /// `n_attributes < 1`, or `n_classes < 2` - before any allocation or
    /// I/O happens downstream.
    pub fn compute(n_observations: u32, n_attributes: u32, n_classes: u32) -> Result<Self> {
        if n_observations < 1 || n_attributes < 1 || n_classes < 2 {
            return Err(Error::InvalidDimensions {
                n_observations,
                n_attributes,
                n_classes,
            });
        }

        let n_bits_for_class = bits_for_class(n_classes);
        let row_bits = u64::from(n_attributes) + u64::from(n_bits_for_class);
        let n_words = row_bits.div_ceil(u64::from(WORD_BITS)) as u32;

        Ok(Self {
            n_attributes,
            n_classes,
            n_observations,
            n_bits_for_class,
            n_words,
        })
    }

    /// Occupied bits per row: attributes plus class, excluding padding.
    pub fn row_bits(&self) -> u64 {
        u64::from(self.n_attributes) + u64::from(self.n_bits_for_class)
    }

    /// Words in the whole dataset payload.
    pub fn total_words(&self) -> u64 {
        u64::from(self.n_observations) * u64::from(self.n_words)
    }
}

/// ceil(log2(n_classes)): minimum bits for a class id.
///
/// Requires `n_classes >= 2`, guaranteed by [`Descriptor::compute`].
fn bits_for_class(n_classes: u32) -> u8 {
    (32 - (n_classes - 1).leading_zeros()) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_for_class() {
        assert_eq!(bits_for_class(2), 1);
        assert_eq!(bits_for_class(3), 2);
        assert_eq!(bits_for_class(4), 2);
        assert_eq!(bits_for_class(5), 3);
        assert_eq!(bits_for_class(8), 3);
        assert_eq!(bits_for_class(9), 4);
        assert_eq!(bits_for_class(256), 8);
        assert_eq!(bits_for_class(257), 9);
    }

    #[test]
    fn test_word_count() {
        // 4 attributes + 1 class bit fit in one word
        let d = Descriptor::compute(20, 4, 2).unwrap();
        assert_eq!(d.n_bits_for_class, 1);
        assert_eq!(d.n_words, 1);

        // 63 + 1 exactly fill a word
        let d = Descriptor::compute(20, 63, 2).unwrap();
        assert_eq!(d.n_words, 1);

        // 64 + 1 spill into a second word
        let d = Descriptor::compute(20, 64, 2).unwrap();
        assert_eq!(d.n_words, 2);

        // 62 attributes + 3 class bits straddle the boundary
        let d = Descriptor::compute(20, 62, 8).unwrap();
        assert_eq!(d.n_bits_for_class, 3);
        assert_eq!(d.n_words, 2);

        let d = Descriptor::compute(2000, 1_000_000, 2).unwrap();
        assert_eq!(d.n_words, 15_626);
    }

    #[test]
    fn test_word_count_tight() {
        // n_words is the least word count that fits attributes + class
        for (n_attributes, n_classes) in [
            (1, 2),
            (4, 2),
            (63, 2),
            (64, 2),
            (62, 8),
            (100, 3),
            (128, 5),
            (1000, 17),
        ] {
            let d = Descriptor::compute(10, n_attributes, n_classes).unwrap();
            let bits = d.row_bits();
            assert!(u64::from(d.n_words) * u64::from(WORD_BITS) >= bits);
            assert!(u64::from(d.n_words - 1) * u64::from(WORD_BITS) < bits);
        }
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            Descriptor::compute(0, 10, 2),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Descriptor::compute(10, 0, 2),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Descriptor::compute(10, 10, 1),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Descriptor::compute(10, 10, 0),
            Err(Error::InvalidDimensions { .. })
        ));
    }
}
