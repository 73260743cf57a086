//! Result and error types for the off-target prediction engine.

use thiserror::Error;

/// Stable, structured error taxonomy for the engine. Every variant name is the
/// stable code referenced by callers (the hosting HTTP layer maps these to
/// transport codes; that mapping lives outside this crate).
#[derive(Debug, Error)]
pub enum SirnaError {
    #[error("sequence contains a character outside {{A,C,G,U}}: {0:?}")]
    InvalidAlphabet(char),

    #[error("guide length {0} outside the supported range 19..=23")]
    InvalidLength(usize),

    #[error("index is not ready for queries (generation {0:?})")]
    IndexNotReady(Option<u64>),

    #[error("index failed validation and must be rebuilt: {0}")]
    IndexCorrupt(String),

    #[error("seed entry references unknown transcript id: {0}")]
    TranscriptMissing(String),

    #[error("scorer called with mismatched guide/target window lengths ({guide} vs {target})")]
    LengthMismatch { guide: usize, target: usize },

    #[error("analysis was cancelled")]
    Cancelled,

    #[error("candidate set exceeded the configured cap ({limit}): {found} candidates")]
    ResourceExhausted { limit: usize, found: usize },

    #[error("malformed FASTA header: {0}")]
    InvalidHeader(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to (de)serialize index data: {0}")]
    Serialize(#[from] bincode::Error),
}

impl From<bio::io::fasta::Error> for SirnaError {
    fn from(e: bio::io::fasta::Error) -> Self {
        SirnaError::InvalidHeader(e.to_string())
    }
}

pub type SirnaResult<T> = Result<T, SirnaError>;
