//! Bitrow - Synthetic dataset generator CLI
//!
//! `bitrow generate` synthesizes a word-packed boolean dataset and injects
//! noise; `bitrow dedup` is the offline pass that sorts, deduplicates, and
//! partitions an existing dataset by class.

use anyhow::{bail, Context, Result};
use argh::FromArgs;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use bitrow::descriptor::Descriptor;
use bitrow::generator::generate;
use bitrow::mutator::{inject_duplicates, inject_inconsistencies};
use bitrow::storage::{load_rowset, FileStore, RowStore};

/// Bitrow - Word-packed boolean dataset generator for rule-induction benchmarks
#[derive(FromArgs)]
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Generate(GenerateArgs),
    Dedup(DedupArgs),
}

/// Generate a synthetic dataset and inject noise
#[derive(FromArgs)]
#[argh(subcommand, name = "generate")]
struct GenerateArgs {
    /// output dataset path
    #[argh(positional)]
    file: String,

    /// number of classes (default: 2)
    #[argh(option, short = 'c', default = "2")]
    classes: u32,

    /// number of attributes (default: 10)
    #[argh(option, short = 'a', default = "10")]
    attributes: u32,

    /// number of observations (default: 20)
    #[argh(option, short = 'o', default = "20")]
    observations: u32,

    /// probability of a bit getting set, 0..100 (default: 26)
    #[argh(option, short = 'p', default = "26")]
    probability: u8,

    /// number of inconsistencies to inject (default: 2)
    #[argh(option, short = 'i', default = "2")]
    inconsistencies: u32,

    /// number of duplicates to inject (default: 2)
    #[argh(option, short = 'u', default = "2")]
    duplicates: u32,

    /// RNG seed for a reproducible dataset
    #[argh(option)]
    seed: Option<u64>,
}

/// Sort, deduplicate, and index an existing dataset
#[derive(FromArgs)]
#[argh(subcommand, name = "dedup")]
struct DedupArgs {
    /// input dataset path
    #[argh(positional)]
    file: String,

    /// write the deduplicated dataset to this path
    #[argh(option, short = 'o')]
    output: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Args = argh::from_env();
    match args.command {
        Command::Generate(args) => run_generate(args),
        Command::Dedup(args) => run_dedup(args),
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    if args.classes < 2 {
        bail!("The number of classes must be >= 2.");
    }
    if args.attributes < 2 {
        bail!("The number of attributes must be >= 2.");
    }
    if args.observations < 2 {
        bail!("The number of observations must be >= 2.");
    }
    if args.probability > 100 {
        bail!("The probability must be between 0 and 100.");
    }

    let descriptor = Descriptor::compute(args.observations, args.attributes, args.classes)
        .context("Invalid dataset dimensions")?;

    eprintln!("📦 Creating {}...", args.file);
    let mut store = FileStore::create(&args.file, &descriptor)
        .with_context(|| format!("Failed to create dataset: {}", args.file))?;
    eprintln!(
        "✓ Container created ({} rows × {} words, {} class bit{})",
        descriptor.n_observations,
        descriptor.n_words,
        descriptor.n_bits_for_class,
        if descriptor.n_bits_for_class == 1 { "" } else { "s" }
    );

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let start = Instant::now();
    eprintln!(
        "🎲 Generating {} rows (p = {}%)...",
        descriptor.n_observations, args.probability
    );
    generate(&descriptor, args.probability, &mut rng, &mut store)
        .context("Generation failed")?;
    eprintln!("✓ Rows written in {:.1?}", start.elapsed());

    if args.inconsistencies > 0 || args.duplicates > 0 {
        eprintln!(
            "🔀 Injecting {} inconsistencies and {} duplicates...",
            args.inconsistencies, args.duplicates
        );
        inject_inconsistencies(&mut store, &descriptor, args.inconsistencies, &mut rng)
            .context("Inconsistency injection failed")?;
        inject_duplicates(&mut store, &descriptor, args.duplicates, &mut rng)
            .context("Duplicate injection failed")?;
        eprintln!("✓ Noise injected");
    }

    eprintln!("✅ All done: {}", args.file);
    Ok(())
}

fn run_dedup(args: DedupArgs) -> Result<()> {
    eprintln!("📂 Loading {}...", args.file);
    let (mut rows, metadata) =
        load_rowset(&args.file).with_context(|| format!("Failed to load dataset: {}", args.file))?;
    let descriptor = metadata.descriptor().context("Invalid dataset header")?;
    eprintln!(
        "✓ Loaded {} rows ({} attributes, {} classes)",
        rows.len(),
        descriptor.n_attributes,
        descriptor.n_classes
    );

    let start = Instant::now();
    rows.sort();
    let removed = rows.remove_duplicates();
    eprintln!(
        "🔍 {} unique | {} duplicates removed | {:.1?}",
        rows.len(),
        removed,
        start.elapsed()
    );

    let class_index = rows
        .class_index(&descriptor)
        .context("Class partitioning failed")?;
    eprintln!("📊 Rows per class:");
    for (class_id, members) in class_index.iter().enumerate() {
        eprintln!("   class {}: {}", class_id, members.len());
    }

    if let Some(output) = args.output {
        let out_descriptor =
            Descriptor::compute(rows.len() as u32, descriptor.n_attributes, descriptor.n_classes)
                .context("Invalid output dimensions")?;
        eprintln!("📦 Writing {} unique rows to {}...", rows.len(), output);
        let mut store = FileStore::create(&output, &out_descriptor)
            .with_context(|| format!("Failed to create dataset: {}", output))?;
        for index in 0..out_descriptor.n_observations {
            store.write_row(index, rows.row(index))?;
        }
        eprintln!("✅ Output written to: {}", output);
    }

    Ok(())
}
