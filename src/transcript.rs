//! The transcript store: a keyed, ordered collection of reference transcripts
//! with O(1) random-access windowing, analogous to this codebase's
//! concatenated-sequence + bin layout but keeping each transcript addressable
//! by its own id rather than a flat offset space.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::codec::Rna;
use crate::error::SirnaResult;

/// A single reference transcript.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transcript {
    pub transcript_id: String,
    pub gene_symbol: String,
    pub gene_id: Option<String>,
    pub sequence: String,
    pub utr3_start: Option<usize>,
    pub utr3_end: Option<usize>,
}

impl Transcript {
    pub fn new(
        transcript_id: impl Into<String>,
        gene_symbol: impl Into<String>,
        gene_id: Option<String>,
        sequence: Rna,
        utr3_start: Option<usize>,
        utr3_end: Option<usize>,
    ) -> Self {
        Transcript {
            transcript_id: transcript_id.into(),
            gene_symbol: gene_symbol.into(),
            gene_id,
            sequence: sequence.as_str().to_owned(),
            utr3_start,
            utr3_end,
        }
    }

    pub fn length(&self) -> usize {
        self.sequence.len()
    }

    pub fn sequence_bytes(&self) -> &[u8] {
        self.sequence.as_bytes()
    }

    /// The searchable region: the annotated 3'UTR window if present,
    /// otherwise the whole sequence.
    pub fn searchable_range(&self) -> (usize, usize) {
        match (self.utr3_start, self.utr3_end) {
            (Some(s), Some(e)) => (s.min(self.length()), e.min(self.length())),
            _ => (0, self.length()),
        }
    }

    /// A clamped window of `radius` bases either side of `center`, returning
    /// both the slice and the actual `[start, end)` range used (the caller
    /// is told when clamping occurred at a sequence boundary).
    pub fn window(&self, center: usize, radius: usize) -> (&str, (usize, usize)) {
        let len = self.length();
        let start = center.saturating_sub(radius);
        let end = (center + radius + 1).min(len);
        (&self.sequence[start..end], (start, end))
    }
}

/// An in-memory, ordered transcript store. Ordering by `transcript_id` is
/// what gives the seed index builder (§4.C) its deterministic construction
/// order without an explicit sort pass.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TranscriptStore {
    transcripts: BTreeMap<String, Transcript>,
    total_bases: usize,
}

impl TranscriptStore {
    pub fn new() -> Self {
        TranscriptStore::default()
    }

    pub fn put(&mut self, transcript: Transcript) {
        self.total_bases += transcript.length();
        if let Some(prev) = self.transcripts.insert(transcript.transcript_id.clone(), transcript) {
            self.total_bases -= prev.length();
        }
    }

    pub fn get(&self, id: &str) -> Option<&Transcript> {
        self.transcripts.get(id)
    }

    /// Ascending-`transcript_id` iterator over every stored transcript.
    pub fn stream(&self) -> impl Iterator<Item = &Transcript> {
        self.transcripts.values()
    }

    /// Clamped window lookup by transcript id; `None` if the id is unknown.
    pub fn window(&self, id: &str, center: usize, radius: usize) -> Option<(&str, (usize, usize))> {
        self.transcripts.get(id).map(|t| t.window(center, radius))
    }

    pub fn transcript_count(&self) -> usize {
        self.transcripts.len()
    }

    pub fn total_base_count(&self) -> usize {
        self.total_bases
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }
}

/// Persist a transcript store to disk with bincode, mirroring the
/// serialize-to-file helper this codebase uses for its own index.
pub fn write_to_file(store: &TranscriptStore, path: &std::path::Path) -> SirnaResult<()> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    bincode::serialize_into(writer, store)?;
    Ok(())
}

pub fn read_from_file(path: &std::path::Path) -> SirnaResult<TranscriptStore> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    Ok(bincode::deserialize_from(reader)?)
}
