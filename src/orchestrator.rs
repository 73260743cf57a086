//! The analysis orchestrator: drives one guide through seed search, scoring,
//! and ranking, and batches a request's guides with shared parameters.
//!
//! The worker-pool fan-out during per-candidate scoring mirrors this
//! codebase's parallel binning pass, but uses `rayon`'s thread pool in place
//! of the vendored pipeline executor -- a straight swap grounded in the
//! dependency stack of the sibling example repos in the retrieval pack.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::codec::{Rna, SEED_LEN};
use crate::context::{self, ACCESSIBILITY_RADIUS, AU_CONTENT_RADIUS};
use crate::error::{SirnaError, SirnaResult};
use crate::risk::{self, RiskInputs, Scored};
use crate::search::{self, CandidateHit, SearchParams};
use crate::seed_index::SeedIndex;
use crate::thermo;
use crate::transcript::TranscriptStore;

/// Minimum/maximum number of guides accepted in one batch request.
pub const MIN_BATCH_SIZE: usize = 1;
pub const MAX_BATCH_SIZE: usize = 100;

/// A cooperative cancellation flag, checked at well-defined points during
/// [`analyze_one`] rather than aborting mid-computation.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> SirnaResult<()> {
        if self.is_cancelled() {
            Err(SirnaError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Progress reported after each guide in a batch completes.
#[derive(Clone, Debug)]
pub struct BatchProgress<'a> {
    pub guide_name: &'a str,
    pub ordinal: usize,
    pub total: usize,
}

/// One named guide in a batch request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SirnaInput {
    pub name: String,
    pub sequence: String,
}

/// Parameters shared by every guide in a batch, echoed back on each result.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AnalysisParameters {
    pub max_seed_mismatches: u32,
    pub energy_threshold: f64,
    pub include_structure: bool,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        AnalysisParameters {
            max_seed_mismatches: 1,
            energy_threshold: risk::DEFAULT_DG_THRESHOLD,
            include_structure: true,
        }
    }
}

/// A batch analysis request: 1..100 guides with shared parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub sirnas: Vec<SirnaInput>,
    #[serde(flatten)]
    pub parameters: AnalysisParameters,
    /// Worker-pool size for per-candidate scoring fan-out; `None` uses the
    /// available-parallelism default.
    #[serde(default)]
    pub parallelism: Option<usize>,
    /// Upper bound on candidates considered per guide before `ResourceExhausted`.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

fn default_max_candidates() -> usize {
    50_000
}

/// One scored off-target site, as it appears in the JSON result surface.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OffTargetRecord {
    pub transcript_id: String,
    pub gene_symbol: String,
    pub position: usize,
    pub delta_g: f64,
    pub risk_score: f64,
    pub seed_matches: u32,
    pub mismatches: u32,
    pub wobbles: u32,
    /// AU content as a percent (0..100), 2-decimal precision per §4.F/§6.
    pub au_content: f64,
    pub structure_accessibility: f64,
}

/// Analysis result for a single guide.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sirna_name: String,
    pub guide: String,
    pub parameters: AnalysisParameters,
    pub total_offtargets: usize,
    pub high_risk_count: usize,
    pub moderate_risk_count: usize,
    pub low_risk_count: usize,
    pub offtargets: Vec<OffTargetRecord>,
}

/// Round a percent value to 2 decimal places for reporting (§4.F/§6).
fn round_percent(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn complement(b: u8) -> u8 {
    match b {
        b'A' => b'U',
        b'U' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        other => other,
    }
}

/// Score one candidate hit into an [`OffTargetRecord`], fetching its
/// transcript context and computing duplex energy, local composition, and
/// the composite risk score.
fn score_candidate(
    guide: &Rna,
    store: &TranscriptStore,
    hit: &CandidateHit,
    include_structure: bool,
) -> SirnaResult<Scored<OffTargetRecord>> {
    let transcript = store
        .get(&hit.transcript_id)
        .ok_or_else(|| SirnaError::TranscriptMissing(hit.transcript_id.clone()))?;

    let guide_len = guide.len();
    let seq = transcript.sequence_bytes();

    // The seed always fits (the search stage guarantees it), but the full
    // guide-length window can run off either end of the transcript when the
    // guide is longer than the flank available around the seed. Guide
    // positions whose paired offset falls outside the transcript have no
    // base to pair against; they are folded into the wobble weighting below
    // alongside ordinary non-Watson-Crick, non-wobble mismatches, the same
    // deliberate simplification this engine already applies since it does
    // not model bulges or internal loops (Non-goal).
    let mut wobble_positions = Vec::new();
    for i in 0..guide_len {
        let offset = hit.align_start + (guide_len - 1 - i) as isize;
        let in_bounds = offset >= 0 && (offset as usize) < seq.len();
        let guide_base = guide.bytes()[i];
        let target_base = if in_bounds { Some(seq[offset as usize]) } else { None };
        if target_base != Some(complement(guide_base)) {
            wobble_positions.push(i);
        }
    }

    let delta_g = thermo::duplex_delta_g(guide.bytes(), &wobble_positions)?;

    // The seed's own midpoint is always in-bounds, unlike `align_start` when
    // the full window runs off the transcript.
    let center = hit.seed_position + SEED_LEN / 2;
    // `au` stays a [0,1] fraction for the risk formula's threshold check;
    // only the reported/exported value is percent-scaled (§4.F, §6).
    let au = context::au_content(seq, center, AU_CONTENT_RADIUS);
    let au_percent = round_percent(au * 100.0);
    let accessibility = if include_structure {
        context::accessibility(seq, center, ACCESSIBILITY_RADIUS)
    } else {
        0.0
    };

    let risk_score = risk::composite_risk_score(RiskInputs {
        delta_g,
        au_content: au,
        accessibility,
        conservation: None,
    });

    let seed_matches = (SEED_LEN as u32).saturating_sub(hit.mismatches + hit.wobbles);

    let record = OffTargetRecord {
        transcript_id: transcript.transcript_id.clone(),
        gene_symbol: transcript.gene_symbol.clone(),
        position: hit.seed_position,
        delta_g: thermo::round_for_report(delta_g),
        risk_score,
        seed_matches,
        mismatches: hit.mismatches,
        wobbles: hit.wobbles,
        au_content: au_percent,
        structure_accessibility: accessibility,
    };

    Ok(Scored {
        transcript_id: record.transcript_id.clone(),
        risk_score,
        delta_g,
        record,
    })
}

/// Run a full off-target analysis for one guide against a built index.
///
/// Cancellation is checked after seed search, after scoring, and before the
/// final sort -- the three points where a long-running analysis can be
/// abandoned without discarding already-committed state.
pub fn analyze_one(
    name: &str,
    sequence: &str,
    parameters: &AnalysisParameters,
    max_candidates: usize,
    parallelism: Option<usize>,
    index: &SeedIndex,
    store: &TranscriptStore,
    cancellation: &CancellationToken,
) -> SirnaResult<AnalysisResult> {
    let guide = Rna::normalize_guide(sequence)?;

    let params = SearchParams {
        max_seed_mismatches: parameters.max_seed_mismatches,
        allow_wobble: true,
        max_candidates,
    };
    let hits = search::search(&guide, index, store, params)?;
    cancellation.check()?;

    let score_all = || -> Vec<SirnaResult<Scored<OffTargetRecord>>> {
        hits.par_iter()
            .map(|hit| score_candidate(&guide, store, hit, parameters.include_structure))
            .collect()
    };
    let scored = match parallelism {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| SirnaError::IndexCorrupt(format!("failed to size worker pool: {e}")))?
            .install(score_all),
        None => score_all(),
    };

    let mut results = Vec::with_capacity(scored.len());
    for item in scored {
        results.push(item?);
    }
    cancellation.check()?;

    let mut results = risk::filter_by_energy_threshold(results, parameters.energy_threshold);
    risk::sort_results(&mut results);
    cancellation.check()?;

    let mut high = 0usize;
    let mut moderate = 0usize;
    let mut low = 0usize;
    for r in &results {
        match risk::classify(r.risk_score) {
            crate::risk::RiskClass::High => high += 1,
            crate::risk::RiskClass::Moderate => moderate += 1,
            crate::risk::RiskClass::Low => low += 1,
        }
    }

    Ok(AnalysisResult {
        sirna_name: name.to_owned(),
        guide: guide.as_str().to_owned(),
        parameters: *parameters,
        total_offtargets: results.len(),
        high_risk_count: high,
        moderate_risk_count: moderate,
        low_risk_count: low,
        offtargets: results.into_iter().map(|s| s.record).collect(),
    })
}

/// Run a batch of guides sharing one set of parameters, reporting progress
/// after each guide completes.
pub fn analyze_batch(
    request: &AnalysisRequest,
    index: &SeedIndex,
    store: &TranscriptStore,
    cancellation: &CancellationToken,
    mut on_progress: impl FnMut(BatchProgress),
) -> SirnaResult<Vec<AnalysisResult>> {
    if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&request.sirnas.len()) {
        return Err(SirnaError::InvalidLength(request.sirnas.len()));
    }

    let total = request.sirnas.len();
    let mut results = Vec::with_capacity(total);
    for (ordinal, sirna) in request.sirnas.iter().enumerate() {
        let result = analyze_one(
            &sirna.name,
            &sirna.sequence,
            &request.parameters,
            request.max_candidates,
            request.parallelism,
            index,
            store,
            cancellation,
        )?;
        on_progress(BatchProgress {
            guide_name: &sirna.name,
            ordinal: ordinal + 1,
            total,
        });
        results.push(result);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed_index::SeedIndexBuilder;
    use crate::transcript::Transcript;

    fn build_store(seqs: &[(&str, &str)]) -> (TranscriptStore, SeedIndex) {
        let mut store = TranscriptStore::new();
        for (id, seq) in seqs {
            store.put(Transcript::new(*id, "GENE", None, Rna::normalize(seq).unwrap(), None, None));
        }
        let index = SeedIndexBuilder::new(&store, 1).build(|_| {});
        (store, index)
    }

    #[test]
    fn analyze_one_returns_ranked_results() {
        let (store, index) = build_store(&[(
            "T1",
            "AAAAAAAAAAGCUACGUAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
        )]);
        let mut parameters = AnalysisParameters::default();
        parameters.energy_threshold = 0.0;
        let token = CancellationToken::new();
        let result = analyze_one(
            "test-guide",
            "UUUACGUAGCAAAAAAAAAA",
            &parameters,
            50_000,
            None,
            &index,
            &store,
            &token,
        )
        .unwrap();
        assert!(!result.offtargets.is_empty());
        assert_eq!(result.sirna_name, "test-guide");
        assert_eq!(
            result.total_offtargets,
            result.high_risk_count + result.moderate_risk_count + result.low_risk_count
        );
    }

    #[test]
    fn cancellation_before_scoring_short_circuits() {
        let (store, index) = build_store(&[(
            "T1",
            "AAAAAAAAAAGCUACGUAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
        )]);
        let parameters = AnalysisParameters::default();
        let token = CancellationToken::new();
        token.cancel();
        let err = analyze_one(
            "test-guide",
            "UUUACGUAGCAAAAAAAAAA",
            &parameters,
            50_000,
            None,
            &index,
            &store,
            &token,
        )
        .unwrap_err();
        assert!(matches!(err, SirnaError::Cancelled));
    }

    #[test]
    fn results_are_sorted_by_risk_descending() {
        let (store, index) = build_store(&[
            ("T1", "AAAAAAAAAAGCUACGUAAAAAAAAAAAAAAAAAAAAAAAAAAAA"),
            ("T2", "AAAAAAAAAAGCUACAUAAAAAAAAAAAAAAAAAAAAAAAAAAAA"),
        ]);
        let mut parameters = AnalysisParameters::default();
        parameters.energy_threshold = 0.0;
        let token = CancellationToken::new();
        let result = analyze_one(
            "test-guide",
            "UUUACGUAGCAAAAAAAAAA",
            &parameters,
            50_000,
            None,
            &index,
            &store,
            &token,
        )
        .unwrap();
        for pair in result.offtargets.windows(2) {
            assert!(pair[0].risk_score >= pair[1].risk_score);
        }
    }

    #[test]
    fn batch_rejects_empty_sirna_list() {
        let (store, index) = build_store(&[("T1", "ACGUACGUACGUACGUACGU")]);
        let request = AnalysisRequest {
            sirnas: vec![],
            parameters: AnalysisParameters::default(),
            parallelism: None,
            max_candidates: 50_000,
        };
        let token = CancellationToken::new();
        let err = analyze_batch(&request, &index, &store, &token, |_| {}).unwrap_err();
        assert!(matches!(err, SirnaError::InvalidLength(0)));
    }

    #[test]
    fn batch_reports_progress_per_guide() {
        let (store, index) = build_store(&[(
            "T1",
            "AAAAAAAAAAGCUACGUAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
        )]);
        let request = AnalysisRequest {
            sirnas: vec![SirnaInput {
                name: "g1".into(),
                sequence: "UUUACGUAGCAAAAAAAAAA".into(),
            }],
            parameters: AnalysisParameters {
                energy_threshold: 0.0,
                ..AnalysisParameters::default()
            },
            parallelism: None,
            max_candidates: 50_000,
        };
        let token = CancellationToken::new();
        let mut seen = Vec::new();
        let results = analyze_batch(&request, &index, &store, &token, |progress| {
            seen.push((progress.guide_name.to_owned(), progress.ordinal, progress.total));
        })
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(seen, vec![("g1".to_owned(), 1, 1)]);
    }
}
