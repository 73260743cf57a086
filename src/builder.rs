//! Build driver: FASTA ingestion -> transcript store -> seed index -> commit
//! to disk. Mirrors this codebase's own `build_and_write_index` entry point.

use std::path::Path;

use crate::error::SirnaResult;
use crate::io::load_transcripts_fasta;
use crate::seed_index::{self, BuildProgress, SeedIndexBuilder};
use crate::transcript;

/// Ingest a FASTA file, build the seed index, and write both the transcript
/// store and the index to disk under `output_dir` as `transcripts.bin` and
/// `index.bin`.
pub fn build_and_write_index(
    fasta_path: &Path,
    output_dir: &Path,
    generation: u64,
    mut on_progress: impl FnMut(BuildProgress),
) -> SirnaResult<()> {
    log::info!("loading transcripts from {}", fasta_path.display());
    let store = load_transcripts_fasta(fasta_path)?;
    log::info!(
        "loaded {} transcripts ({} bases)",
        store.transcript_count(),
        store.total_base_count()
    );

    std::fs::create_dir_all(output_dir)?;

    log::info!("building seed index (generation {generation})");
    let index = SeedIndexBuilder::new(&store, generation).build(|progress| on_progress(progress));
    log::info!(
        "index built: {} transcripts, {} seed occurrences",
        index.transcript_count(),
        index.seed_count()
    );

    let store_path = output_dir.join("transcripts.bin");
    let index_path = output_dir.join("index.bin");
    transcript::write_to_file(&store, &store_path)?;
    seed_index::write_to_file(&index, &index_path)?;
    log::info!("wrote {} and {}", store_path.display(), index_path.display());

    Ok(())
}

/// Load a previously built transcript store and seed index from `dir`.
pub fn load_index(dir: &Path) -> SirnaResult<(transcript::TranscriptStore, seed_index::SeedIndex)> {
    let store = transcript::read_from_file(&dir.join("transcripts.bin"))?;
    let index = seed_index::read_from_file(&dir.join("index.bin"))?;
    Ok((store, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let fasta_path = dir.path().join("transcripts.fa");
        std::fs::write(&fasta_path, ">T1 gene=G1\nACGUACGUACGUACGUACGU\n").unwrap();

        let out_dir = dir.path().join("out");
        build_and_write_index(&fasta_path, &out_dir, 3, |_| {}).unwrap();

        let (store, index) = load_index(&out_dir).unwrap();
        assert_eq!(store.transcript_count(), 1);
        assert_eq!(index.generation(), 3);
        assert!(index.is_ready());
    }
}
