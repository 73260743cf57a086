//! The seed index: a direct-addressed table of postings lists keyed by packed
//! 7-mer, one bucket per possible key (2^14 of them). This is the "dedicated
//! file-backed 14-bit -> postings-list layout" the design notes prefer over a
//! general-purpose key-value store, and plays the same role the
//! suffix-array/FM-index pairing plays in this codebase's own metagenomic
//! index: a compact structure purpose-built for one lookup shape.

use serde::{Deserialize, Serialize};

use crate::codec::{seed_key, SEED_KEY_SPACE, SEED_LEN};
use crate::error::{SirnaError, SirnaResult};
use crate::transcript::TranscriptStore;

/// A single posting: the transcript and 0-indexed target-strand offset of a
/// 7-mer occurrence.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Posting {
    pub transcript_ordinal: u32,
    pub position: u32,
}

/// Build/readiness lifecycle of one index generation, mirrored on disk as
/// the `build_status` record (§6).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum BuildState {
    Empty,
    Building,
    Ready,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildStatus {
    pub generation: u64,
    pub state: BuildState,
    pub transcript_count: usize,
    pub seed_count: usize,
}

/// The seed index itself. `transcript_ids` maps the dense ordinal used in
/// [`Posting`] back to the transcript id string, so postings stay compact
/// (a `u32` instead of a cloned `String` per entry).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeedIndex {
    buckets: Vec<Vec<Posting>>,
    transcript_ids: Vec<String>,
    status: BuildStatus,
}

impl SeedIndex {
    fn empty(generation: u64) -> Self {
        SeedIndex {
            buckets: (0..SEED_KEY_SPACE).map(|_| Vec::new()).collect(),
            transcript_ids: Vec::new(),
            status: BuildStatus {
                generation,
                state: BuildState::Empty,
                transcript_count: 0,
                seed_count: 0,
            },
        }
    }

    pub fn generation(&self) -> u64 {
        self.status.generation
    }

    pub fn is_ready(&self) -> bool {
        self.status.state == BuildState::Ready
    }

    pub fn status(&self) -> &BuildStatus {
        &self.status
    }

    pub fn transcript_id(&self, ordinal: u32) -> Option<&str> {
        self.transcript_ids.get(ordinal as usize).map(String::as_str)
    }

    /// Postings for one packed seed key. Empty slice if nothing matched or
    /// the index is not yet ready.
    pub fn postings(&self, key: u16) -> &[Posting] {
        if !self.is_ready() {
            return &[];
        }
        &self.buckets[key as usize]
    }

    pub fn seed_count(&self) -> usize {
        self.status.seed_count
    }

    pub fn transcript_count(&self) -> usize {
        self.status.transcript_count
    }

    /// Decode a candidate's transcript ordinal against a [`TranscriptStore`],
    /// surfacing `TranscriptMissing` for stale references (§7) instead of
    /// panicking.
    pub fn resolve<'a>(
        &self,
        store: &'a TranscriptStore,
        ordinal: u32,
    ) -> SirnaResult<&'a crate::transcript::Transcript> {
        let id = self
            .transcript_id(ordinal)
            .ok_or_else(|| SirnaError::IndexCorrupt(format!("unknown transcript ordinal {ordinal}")))?;
        store
            .get(id)
            .ok_or_else(|| SirnaError::TranscriptMissing(id.to_owned()))
    }
}

/// Builds a [`SeedIndex`] from a [`TranscriptStore`] in one atomic pass.
///
/// Readiness is a commit point: the in-progress index is a private local
/// value until [`SeedIndexBuilder::commit`] returns it, so there is no
/// window in which a partially built index is observable as ready (§4.C).
pub struct SeedIndexBuilder<'a> {
    store: &'a TranscriptStore,
    generation: u64,
    transcripts_processed: usize,
    keys_emitted: usize,
}

/// Progress snapshot, reportable via a callback during [`SeedIndexBuilder::build`].
#[derive(Clone, Copy, Debug)]
pub struct BuildProgress {
    pub transcripts_processed: usize,
    pub keys_emitted: usize,
}

impl<'a> SeedIndexBuilder<'a> {
    pub fn new(store: &'a TranscriptStore, generation: u64) -> Self {
        SeedIndexBuilder {
            store,
            generation,
            transcripts_processed: 0,
            keys_emitted: 0,
        }
    }

    /// Scan every transcript, emitting one posting per 7-mer occurrence in
    /// ascending transcript-id then 5'->3' position order, and commit the
    /// result as `Ready`. `on_progress` is invoked after each transcript.
    pub fn build(mut self, mut on_progress: impl FnMut(BuildProgress)) -> SeedIndex {
        let mut index = SeedIndex::empty(self.generation);
        index.status.state = BuildState::Building;

        for transcript in self.store.stream() {
            let ordinal = index.transcript_ids.len() as u32;
            index.transcript_ids.push(transcript.transcript_id.clone());

            let seq = transcript.sequence_bytes();
            if seq.len() >= SEED_LEN {
                for i in 0..=(seq.len() - SEED_LEN) {
                    let window = &seq[i..i + SEED_LEN];
                    if let Some(key) = seed_key(window) {
                        index.buckets[key as usize].push(Posting {
                            transcript_ordinal: ordinal,
                            position: i as u32,
                        });
                        self.keys_emitted += 1;
                    }
                }
            }

            self.transcripts_processed += 1;
            on_progress(BuildProgress {
                transcripts_processed: self.transcripts_processed,
                keys_emitted: self.keys_emitted,
            });
        }

        index.status.state = BuildState::Ready;
        index.status.transcript_count = self.transcripts_processed;
        index.status.seed_count = self.keys_emitted;
        index
    }
}

pub fn write_to_file(index: &SeedIndex, path: &std::path::Path) -> SirnaResult<()> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    bincode::serialize_into(writer, index)?;
    Ok(())
}

pub fn read_from_file(path: &std::path::Path) -> SirnaResult<SeedIndex> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let index: SeedIndex = bincode::deserialize_from(reader)?;
    if index.buckets.len() != SEED_KEY_SPACE {
        return Err(SirnaError::IndexCorrupt(format!(
            "expected {} seed buckets, found {}",
            SEED_KEY_SPACE,
            index.buckets.len()
        )));
    }
    Ok(index)
}
