//! CLI entry point for building a seed index from a transcriptome FASTA.

use std::path::PathBuf;

use clap::Parser;
use sirna_offtarget::util::init_logging;

/// Build a seed index over a transcriptome FASTA file.
#[derive(Parser, Debug)]
#[command(name = "sirna-build", version, about)]
struct Args {
    /// Transcriptome FASTA file to index.
    #[arg(long)]
    fasta: PathBuf,

    /// Output directory for the built index and transcript store.
    #[arg(long)]
    index: PathBuf,

    /// Index generation number, recorded in the build status.
    #[arg(long, default_value_t = 1)]
    generation: u64,

    /// Raise logging from info to debug.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    sirna_offtarget::builder::build_and_write_index(
        &args.fasta,
        &args.index,
        args.generation,
        |progress| {
            log::debug!(
                "progress: {} transcripts processed, {} seeds emitted",
                progress.transcripts_processed,
                progress.keys_emitted
            );
        },
    )?;

    Ok(())
}
