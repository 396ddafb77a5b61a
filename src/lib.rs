//! Bitrow — Synthetic boolean-attribute datasets for rule-induction benchmarks.
//!
//! Generates dense word-packed feature matrices (one class label per row),
//! injects controlled noise, and persists everything in a flat binary
//! container with a JSON metadata header.
//!
//! ## Pipeline
//!
//! - **Generate** (`generator`) — every attribute bit an independent
//!   Bernoulli draw, class labels uniform, rows streamed through a reusable
//!   buffer into the container.
//! - **Mutate** (`mutator`) — label inconsistencies (same attributes,
//!   different class, placed elsewhere) and exact duplicates, for
//!   stress-testing rule-induction algorithms.
//! - **Dedup** (`rowset`) — offline pass: sort lexicographically, compact
//!   exact duplicates in place, partition row indices by class.
//!
//! Rows pack attribute bits MSB-first into 64-bit words with the class label
//! immediately after, possibly straddling two words (`row`, `codec`).

pub mod codec;
pub mod descriptor;
pub mod error;
pub mod generator;
pub mod mutator;
pub mod row;
pub mod rowset;
pub mod storage;
