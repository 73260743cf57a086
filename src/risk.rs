//! Composite risk scoring: blends duplex stability, AU content, accessibility,
//! and an optional conservation score into a single bounded score, plus the
//! ordering and classification rules applied to a finished result set.

/// ΔG floor/ceiling used to normalize duplex energy onto `[0, 1]`. Values at
/// or below `DG_FLOOR` saturate to maximal stability; values at or above
/// `DG_CEILING` saturate to minimal stability.
const DG_FLOOR: f64 = -25.0;
const DG_CEILING: f64 = -10.0;

/// AU-content threshold above which `au_score` is 1 rather than 0.
const AU_SCORE_THRESHOLD: f64 = 0.60;

/// Default energy_threshold: candidates weaker (less negative) than this are
/// dropped before ranking, since they are thermodynamically implausible
/// off-targets.
pub const DEFAULT_DG_THRESHOLD: f64 = -10.0;

pub const HIGH_RISK_THRESHOLD: f64 = 0.7;
pub const MODERATE_RISK_THRESHOLD: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskClass {
    High,
    Moderate,
    Low,
}

/// Normalize ΔG onto `[0, 1]`, where 0 is at `DG_FLOOR` (most negative,
/// weakest normalized value) and 1 is at `DG_CEILING` (least negative).
fn normalize_delta_g(delta_g: f64) -> f64 {
    ((delta_g - DG_FLOOR) / (DG_CEILING - DG_FLOOR)).clamp(0.0, 1.0)
}

/// Inputs to the composite risk formula for a single candidate.
#[derive(Clone, Copy, Debug)]
pub struct RiskInputs {
    pub delta_g: f64,
    /// AU content as a fraction in `[0, 1]` (not a percent).
    pub au_content: f64,
    pub accessibility: f64,
    /// Optional cross-species conservation score in `[0, 1]`; `None` is
    /// treated as 0 (no conservation data source is wired into this engine).
    pub conservation: Option<f64>,
}

/// `risk = (1 - dg_norm)*0.5 + au_score*0.2 + access*0.2 + conservation*0.1`,
/// where `au_score` is 1 if AU content exceeds 60% else 0.
pub fn composite_risk_score(inputs: RiskInputs) -> f64 {
    let dg_norm = normalize_delta_g(inputs.delta_g);
    let stability = 1.0 - dg_norm;
    let au_score = if inputs.au_content > AU_SCORE_THRESHOLD { 1.0 } else { 0.0 };
    let conservation = inputs.conservation.unwrap_or(0.0).clamp(0.0, 1.0);

    let score = 0.5 * stability + 0.2 * au_score + 0.2 * inputs.accessibility + 0.1 * conservation;
    score.clamp(0.0, 1.0)
}

pub fn classify(risk_score: f64) -> RiskClass {
    if risk_score > HIGH_RISK_THRESHOLD {
        RiskClass::High
    } else if risk_score >= MODERATE_RISK_THRESHOLD {
        RiskClass::Moderate
    } else {
        RiskClass::Low
    }
}

/// A scored candidate, ready for final ordering.
#[derive(Clone, Debug)]
pub struct Scored<T> {
    pub record: T,
    pub risk_score: f64,
    pub delta_g: f64,
    pub transcript_id: String,
}

/// Sort a mutable slice of scored candidates by the final ordering rule:
/// risk score descending, ΔG ascending (more negative first among ties),
/// transcript id ascending.
pub fn sort_results<T>(scored: &mut [Scored<T>]) {
    scored.sort_by(|a, b| {
        b.risk_score
            .partial_cmp(&a.risk_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.delta_g.partial_cmp(&b.delta_g).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.transcript_id.cmp(&b.transcript_id))
    });
}

/// Drop candidates whose ΔG is weaker (less negative / greater) than
/// `energy_threshold`.
pub fn filter_by_energy_threshold<T>(scored: Vec<Scored<T>>, energy_threshold: f64) -> Vec<Scored<T>> {
    scored.into_iter().filter(|s| s.delta_g <= energy_threshold).collect()
}
