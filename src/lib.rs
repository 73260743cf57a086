//! siRNA off-target binding-site prediction engine.
//!
//! Pipeline: normalize a guide and a transcriptome (`codec`, `transcript`),
//! build a seed index over the transcriptome (`seed_index`), search a guide's
//! seed against it with bounded mismatch/wobble tolerance (`search`), score
//! each candidate's duplex thermodynamics and local context (`thermo`,
//! `context`, `risk`), and rank the results (`orchestrator`).

pub mod builder;
pub mod codec;
pub mod context;
pub mod error;
pub mod io;
pub mod orchestrator;
pub mod risk;
pub mod search;
pub mod seed_index;
pub mod thermo;
pub mod transcript;
pub mod util;

pub use error::{SirnaError, SirnaResult};
pub use orchestrator::{
    analyze_batch, analyze_one, AnalysisParameters, AnalysisRequest, AnalysisResult,
    CancellationToken, OffTargetRecord, SirnaInput,
};
