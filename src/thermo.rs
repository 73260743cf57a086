//! Nearest-neighbor duplex thermodynamics: a Turner-2004-style dinucleotide
//! stacking table, positional weighting, and the terminal AU penalty.
//!
//! The embedded parameter table plays the same role this codebase's static
//! taxonomy tables play elsewhere: a constant lookup structure, computed
//! once behind a `once_cell::sync::Lazy` rather than recomputed per call.

use std::collections::HashMap;

use itertools::Itertools;
use once_cell::sync::Lazy;

use crate::error::{SirnaError, SirnaResult};

/// Per-dinucleotide-step nearest-neighbor free energy, kcal/mol, for RNA:RNA
/// duplexes (values approximate Turner 2004; indexed by the 5'->3' guide
/// dinucleotide step).
static NN_TABLE: Lazy<HashMap<[u8; 2], f64>> = Lazy::new(|| {
    let entries: &[(&[u8; 2], f64)] = &[
        (b"AA", -0.93),
        (b"AU", -1.10),
        (b"AC", -2.24),
        (b"AG", -2.08),
        (b"UA", -1.33),
        (b"UU", -0.93),
        (b"UC", -2.35),
        (b"UG", -2.11),
        (b"CA", -2.11),
        (b"CU", -2.08),
        (b"CC", -3.26),
        (b"CG", -2.36),
        (b"GA", -2.35),
        (b"GU", -2.24),
        (b"GC", -3.42),
        (b"GG", -3.26),
    ];
    entries.iter().map(|(k, v)| (**k, *v)).collect()
});

/// +0.45 kcal/mol applied once per terminal A/U end of the duplex.
const TERMINAL_AU_PENALTY: f64 = 0.45;

/// Positional weight multiplier applied to a dinucleotide step, by where its
/// first base falls in the guide (0-indexed). Bands are fixed, not scaled to
/// guide length: seed `[1,7]` -> 1.5, mid `[8,11]` -> 1.0, tail `[12, L-2]` ->
/// 0.8 (the upper bound falls out naturally since steps only run to `L-2`).
fn positional_weight(step_start: usize) -> f64 {
    let seed_start = 1; // guide position 2 (1-indexed) -> index 1
    let seed_end = 8; // exclusive, guide position 8 (1-indexed) -> index 7 inclusive
    let tail_start = 12; // guide position 13 (1-indexed) -> index 12
    if step_start >= seed_start && step_start < seed_end {
        1.5
    } else if step_start >= tail_start {
        0.8
    } else {
        1.0
    }
}

fn is_au(b: u8) -> bool {
    matches!(b, b'A' | b'U')
}

/// Duplex free energy for a guide aligned against a target window of equal
/// length, with wobble pairs folded in at half stacking weight for the
/// steps they participate in.
///
/// `wobble_positions` lists 0-indexed guide positions (within the full
/// guide, not just the seed) that pair as G:U/U:G wobbles rather than
/// Watson-Crick; every other position is assumed to be a Watson-Crick
/// match (this function is only meaningful for windows already selected
/// as candidates, where non-wobble mismatches have already been excluded
/// by the seed search or counted as an independent penalty upstream).
pub fn duplex_delta_g(guide: &[u8], wobble_positions: &[usize]) -> SirnaResult<f64> {
    if guide.len() < 2 {
        return Err(SirnaError::LengthMismatch {
            guide: guide.len(),
            target: guide.len(),
        });
    }

    let mut total = 0.0f64;
    for (i, (&a, &b)) in guide.iter().tuple_windows().enumerate() {
        let step = [a, b];
        let base_energy = *NN_TABLE
            .get(&step)
            .ok_or_else(|| SirnaError::InvalidAlphabet(step[0] as char))?;
        let weight = positional_weight(i);
        let wobble_factor = if wobble_positions.contains(&i) || wobble_positions.contains(&(i + 1)) {
            0.5
        } else {
            1.0
        };
        total += base_energy * weight * wobble_factor;
    }

    if is_au(guide[0]) {
        total += TERMINAL_AU_PENALTY;
    }
    if is_au(guide[guide.len() - 1]) {
        total += TERMINAL_AU_PENALTY;
    }

    Ok(total)
}

/// Round to 2 decimal places for reporting; ranking must always use the
/// unrounded value returned by [`duplex_delta_g`].
pub fn round_for_report(delta_g: f64) -> f64 {
    (delta_g * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_duplex_is_exothermic() {
        let dg = duplex_delta_g(b"ACGUACGUACGUACGUACGU", &[]).unwrap();
        assert!(dg < 0.0);
    }

    #[test]
    fn terminal_au_penalty_applied_once_per_end() {
        let au_ends = duplex_delta_g(b"ACGCGCGCGCGCGCGCGCGU", &[]).unwrap();
        let gc_ends = duplex_delta_g(b"CCGCGCGCGCGCGCGCGCGC", &[]).unwrap();
        assert!(au_ends > gc_ends - 2.0 * TERMINAL_AU_PENALTY + 1e-9);
    }

    #[test]
    fn wobble_step_is_half_weight() {
        let guide = b"ACGUACGUACGUACGUACGU";
        let plain = duplex_delta_g(guide, &[]).unwrap();
        let wobbled = duplex_delta_g(guide, &[3]).unwrap();
        assert!(wobbled > plain, "wobble should weaken (less negative) duplex energy");
    }

    #[test]
    fn rejects_single_base_input() {
        let err = duplex_delta_g(b"A", &[]).unwrap_err();
        assert!(matches!(err, SirnaError::LengthMismatch { .. }));
    }

    #[test]
    fn round_for_report_rounds_to_two_decimals() {
        assert_eq!(round_for_report(-12.3456), -12.35);
        assert_eq!(round_for_report(-12.344), -12.34);
    }

    #[test]
    fn seed_region_carries_more_weight_than_tail() {
        // Two otherwise-identical duplexes differing only in whether the
        // wobble lands inside the seed (high weight) or the tail (low
        // weight) should diverge in the direction the seed weighting predicts.
        let guide = b"ACGUACGUACGUACGUACGU";
        let seed_wobble = duplex_delta_g(guide, &[2]).unwrap(); // within seed (idx 1..8)
        let tail_wobble = duplex_delta_g(guide, &[guide.len() - 2]).unwrap(); // near 3' tail
        assert!((seed_wobble - tail_wobble).abs() > 1e-9);
    }

    #[test]
    fn tail_band_starts_at_fixed_index_regardless_of_guide_length() {
        // For a 20 nt guide, step 12 is in the fixed tail band (>= 12) even
        // though a quarter-of-length cutoff would put the tail at index 15.
        assert_eq!(positional_weight(11), 1.0);
        assert_eq!(positional_weight(12), 0.8);
        assert_eq!(positional_weight(14), 0.8);
    }
}
