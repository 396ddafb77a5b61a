//! Bitrow - Random row generator
//!
//! Synthesizes one row at a time: every attribute bit is an independent
//! Bernoulli draw, the class label a uniform pick. The caller owns the row
//! buffer and reuses it across the generation loop; the randomness source is
//! an explicit capability so runs are seedable and tests deterministic.

use rand::Rng;
use tracing::debug;

use crate::codec::{Word, WORD_BITS};
use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::row::set_class_bits;
use crate::storage::RowStore;

/// Fill `buffer` with one freshly drawn row.
///
/// `probability_percent` is the per-bit chance an attribute is set, in
/// `[0, 100]`. The buffer is zeroed first, so all padding bits beyond
/// attributes and class end up 0.
pub fn fill_buffer<R: Rng>(
    descriptor: &Descriptor,
    probability_percent: u8,
    rng: &mut R,
    buffer: &mut [Word],
) {
    debug_assert_eq!(buffer.len(), descriptor.n_words as usize);
    let p = f64::from(probability_percent) / 100.0;

    let n_full_words = (descriptor.n_attributes / WORD_BITS) as usize;
    let n_bits_on_last_word = descriptor.n_attributes % WORD_BITS;

    buffer.fill(0);

    // Words fully covered by attributes, MSB-first
    for word in buffer.iter_mut().take(n_full_words) {
        for _ in 0..WORD_BITS {
            *word <<= 1;
            if rng.gen_bool(p) {
                *word |= 1;
            }
        }
    }

    // Partial attribute word: draw the top bits, leave the rest for the class
    if n_bits_on_last_word > 0 {
        let mut word: Word = 0;
        for _ in 0..n_bits_on_last_word {
            word <<= 1;
            if rng.gen_bool(p) {
                word |= 1;
            }
        }
        buffer[n_full_words] = word << (WORD_BITS - n_bits_on_last_word);
    }

    let class_id = rng.gen_range(0..descriptor.n_classes);
    set_class_bits(
        buffer,
        class_id,
        descriptor.n_attributes,
        descriptor.n_bits_for_class,
    );
}

/// Generate all `n_observations` rows and write them sequentially through
/// the store.
///
/// One buffer is allocated up front and reused for every row. A storage
/// failure aborts the loop and propagates; rows already written stay behind.
pub fn generate<R: Rng, S: RowStore + ?Sized>(
    descriptor: &Descriptor,
    probability_percent: u8,
    rng: &mut R,
    store: &mut S,
) -> Result<()> {
    let mut buffer = vec![0 as Word; descriptor.n_words as usize];

    for index in 0..descriptor.n_observations {
        fill_buffer(descriptor, probability_percent, rng, &mut buffer);
        store.write_row(index, &buffer)?;
    }

    debug!(
        rows = descriptor.n_observations,
        words_per_row = descriptor.n_words,
        "generation complete"
    );
    Ok(())
}
