//! CLI entry point for running an off-target analysis request against a
//! built index.

use std::path::PathBuf;

use clap::Parser;
use sirna_offtarget::orchestrator::{AnalysisRequest, CancellationToken};
use sirna_offtarget::util::init_logging;

/// Predict off-target binding sites for a batch of siRNA guides.
#[derive(Parser, Debug)]
#[command(name = "sirna-predict", version, about)]
struct Args {
    /// Directory containing a built index (from `sirna-build`).
    #[arg(long)]
    index: PathBuf,

    /// JSON file containing a batch analysis request (see the result schema doc).
    #[arg(long)]
    request: PathBuf,

    /// Optional path to also write a CSV export of the results.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Path to write the JSON result array; defaults to stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Raise logging from info to debug.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let (store, index) = sirna_offtarget::builder::load_index(&args.index)?;

    let request_body = std::fs::read_to_string(&args.request)?;
    let request: AnalysisRequest = serde_json::from_str(&request_body)?;

    let token = CancellationToken::new();
    let results = sirna_offtarget::orchestrator::analyze_batch(&request, &index, &store, &token, |progress| {
        log::info!(
            "completed {} ({}/{})",
            progress.guide_name,
            progress.ordinal,
            progress.total
        );
    })?;

    if let Some(csv_path) = &args.csv {
        sirna_offtarget::io::write_csv_batch(csv_path, &results)?;
        log::info!("wrote CSV export to {}", csv_path.display());
    }

    match &args.out {
        Some(path) => {
            sirna_offtarget::io::write_json(path, &results)?;
            log::info!("wrote result to {}", path.display());
        }
        None => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
