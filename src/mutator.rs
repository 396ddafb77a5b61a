//! Bitrow - Noise injection
//!
//! Rewrites rows of an already-persisted dataset to stress classification
//! algorithms: inconsistencies (an existing attribute pattern reappears
//! elsewhere under a different label) and duplicates (verbatim row copies).
//! Both are fire-and-forget single-row read-modify-write cycles against the
//! row store; each completes before the next begins.

use rand::Rng;
use tracing::debug;

use crate::codec::Word;
use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::row::{get_class, set_class_bits};
use crate::storage::RowStore;

/// Inject `n` label inconsistencies.
///
/// Each round picks a random source row, swaps its class for a different one
/// drawn uniformly from the remaining `n_classes - 1` labels (redraw until it
/// differs; `n_classes >= 2` bounds the retry), and writes the result to a
/// random destination row. Source and destination may coincide.
pub fn inject_inconsistencies<R: Rng, S: RowStore + ?Sized>(
    store: &mut S,
    descriptor: &Descriptor,
    n: u32,
    rng: &mut R,
) -> Result<()> {
    let mut buffer = vec![0 as Word; descriptor.n_words as usize];

    for _ in 0..n {
        let from = rng.gen_range(0..descriptor.n_observations);
        store.read_row(from, &mut buffer)?;

        let old_class = get_class(&buffer, descriptor.n_attributes, descriptor.n_bits_for_class);
        let mut new_class = rng.gen_range(0..descriptor.n_classes);
        while new_class == old_class {
            new_class = rng.gen_range(0..descriptor.n_classes);
        }
        set_class_bits(
            &mut buffer,
            new_class,
            descriptor.n_attributes,
            descriptor.n_bits_for_class,
        );

        let to = rng.gen_range(0..descriptor.n_observations);
        store.write_row(to, &buffer)?;
        debug!(from, to, old_class, new_class, "inconsistency injected");
    }

    Ok(())
}

/// Inject `n` exact duplicates: read a random row, write it verbatim to a
/// random destination.
pub fn inject_duplicates<R: Rng, S: RowStore + ?Sized>(
    store: &mut S,
    descriptor: &Descriptor,
    n: u32,
    rng: &mut R,
) -> Result<()> {
    let mut buffer = vec![0 as Word; descriptor.n_words as usize];

    for _ in 0..n {
        let from = rng.gen_range(0..descriptor.n_observations);
        store.read_row(from, &mut buffer)?;
        let to = rng.gen_range(0..descriptor.n_observations);
        store.write_row(to, &buffer)?;
        debug!(from, to, "duplicate injected");
    }

    Ok(())
}
