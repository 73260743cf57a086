//! Seed search: enumerates the mismatch-tolerant probe set for a guide's
//! seed and collects candidate hits from the [`SeedIndex`].
//!
//! This plays the role this codebase's `matching_tax_ids` plays for its own
//! index: fan a query out into a handful of index lookups, then merge and
//! filter what comes back. The approximate-matching strategy here is
//! probe enumeration rather than an FM-index backward search, per the
//! design notes' preference for bounded, O(1)-lookup-per-probe matching.

use std::collections::HashMap;

use crate::codec::{seed_key, unpack_seed_key, Rna, SEED_LEN};
use crate::error::{SirnaError, SirnaResult};
use crate::seed_index::SeedIndex;
use crate::transcript::{Transcript, TranscriptStore};

const BASES: [u8; 4] = [b'A', b'C', b'G', b'U'];

/// A candidate off-target site, before scoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateHit {
    pub transcript_id: String,
    /// 0-indexed offset on the target strand of the seed match (guide
    /// positions 2..8); this is the "position" of the external result
    /// schema (§3 Data Model).
    pub seed_position: usize,
    /// 0-indexed start of the full guide-length alignment window, under the
    /// antiparallel registration `orchestrator::score_candidate` scores
    /// against. Can fall outside `[0, transcript.length())` when the guide
    /// is longer than the flank available around the seed -- the seed
    /// itself is always in-bounds (it came from a valid index posting), the
    /// full window is not guaranteed to be.
    pub align_start: isize,
    pub mismatches: u32,
    pub wobbles: u32,
}

struct Probe {
    key: u16,
    distance: u32,
}

/// Enumerate every target-side 7-mer probe within Hamming distance `m` of
/// `target_seed`, tagged with its distance, de-duplicated keeping the
/// smallest distance seen for a given key.
fn enumerate_probes(target_seed: &[u8], m: u32) -> Vec<Probe> {
    let mut best: HashMap<u16, u32> = HashMap::new();
    let base_key = seed_key(target_seed).expect("seed is pre-validated RNA of length SEED_LEN");
    best.insert(base_key, 0);

    if m >= 1 {
        for p in 0..SEED_LEN {
            for &b in &BASES {
                if b == target_seed[p] {
                    continue;
                }
                let mut mutated = target_seed.to_vec();
                mutated[p] = b;
                let key = seed_key(&mutated).unwrap();
                best.entry(key).and_modify(|d| *d = (*d).min(1)).or_insert(1);
            }
        }
    }

    if m >= 2 {
        for p1 in 0..SEED_LEN {
            for &b1 in &BASES {
                if b1 == target_seed[p1] {
                    continue;
                }
                let mut once = target_seed.to_vec();
                once[p1] = b1;
                for p2 in (p1 + 1)..SEED_LEN {
                    for &b2 in &BASES {
                        if b2 == target_seed[p2] {
                            continue;
                        }
                        let mut twice = once.clone();
                        twice[p2] = b2;
                        let key = seed_key(&twice).unwrap();
                        best.entry(key).and_modify(|d| *d = (*d).min(2)).or_insert(2);
                    }
                }
            }
        }
    }

    best.into_iter()
        .map(|(key, distance)| Probe { key, distance })
        .collect()
}

/// `true` if `guide_base` and `target_base` form a G:U or U:G wobble pair.
fn is_wobble(guide_base: u8, target_base: u8) -> bool {
    matches!((guide_base, target_base), (b'G', b'U') | (b'U', b'G'))
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

/// Classify a target-strand 7-mer window against the guide seed, returning
/// `(mismatches, wobbles)`. Position `p` of `target_window` pairs against
/// guide seed position `SEED_LEN - 1 - p` (antiparallel duplex).
fn classify_window(guide_seed: &[u8], target_window: &[u8]) -> (u32, u32) {
    let mut mismatches = 0u32;
    let mut wobbles = 0u32;
    for p in 0..SEED_LEN {
        let guide_base = guide_seed[SEED_LEN - 1 - p];
        let target_base = target_window[p];
        if target_base == complement(guide_base) {
            continue;
        }
        if is_wobble(guide_base, target_base) {
            wobbles += 1;
        } else {
            mismatches += 1;
        }
    }
    (mismatches, wobbles)
}

/// Search parameters for one guide query.
#[derive(Clone, Copy, Debug)]
pub struct SearchParams {
    pub max_seed_mismatches: u32,
    pub allow_wobble: bool,
    pub max_candidates: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            max_seed_mismatches: 1,
            allow_wobble: true,
            max_candidates: 50_000,
        }
    }
}

/// `true` if the seed match at `position` is usable: the seed itself is
/// always within the transcript (it came from a valid index posting), so
/// the only remaining gate is the 3'UTR restriction (§4.D), checked against
/// the seed span rather than the full guide window -- the full window is
/// allowed to run off either end of the transcript when the guide is longer
/// than the available flank; scoring clips it rather than rejecting the hit.
fn seed_fits(transcript: &Transcript, position: usize) -> bool {
    let seed_end = position + SEED_LEN;
    if seed_end > transcript.length() {
        return false;
    }
    let (search_start, search_end) = transcript.searchable_range();
    position >= search_start && seed_end <= search_end
}

/// The full guide-length alignment window's start, under the antiparallel
/// registration: guide index `i` pairs transcript offset
/// `align_start + guide_len - 1 - i`. The seed (guide indices `1..=7`) pairs
/// transcript offsets `[position, position + SEED_LEN)`, so solving for the
/// window start at `i = SEED_LEN` gives `align_start = position + SEED_LEN +
/// 1 - guide_len`.
fn align_start_for(position: usize, guide_len: usize) -> isize {
    position as isize + SEED_LEN as isize + 1 - guide_len as isize
}

/// Search `guide` against `index`, returning every candidate hit whose seed
/// Hamming distance (wobble-weighted if `allow_wobble`) is within
/// `params.max_seed_mismatches`.
pub fn search(
    guide: &Rna,
    index: &SeedIndex,
    store: &TranscriptStore,
    params: SearchParams,
) -> SirnaResult<Vec<CandidateHit>> {
    if !index.is_ready() {
        return Err(SirnaError::IndexNotReady(Some(index.generation())));
    }

    let guide_seed = &guide.bytes()[1..1 + SEED_LEN];
    let target_seed = {
        let s = Rna::normalize(std::str::from_utf8(guide_seed).unwrap())
            .expect("guide is pre-validated RNA");
        s.revcomp()
    };

    let probes = enumerate_probes(target_seed.bytes(), params.max_seed_mismatches);

    // (transcript_ordinal, position) -> best (mismatches, wobbles) seen so far.
    let mut best: HashMap<(u32, u32), (u32, u32)> = HashMap::new();

    for probe in &probes {
        if probe.distance > params.max_seed_mismatches {
            continue;
        }
        let target_window = unpack_seed_key(probe.key);
        let (mismatches, wobbles) = classify_window(guide_seed, &target_window);

        if !params.allow_wobble && wobbles > 0 {
            continue;
        }
        let effective = if params.allow_wobble {
            mismatches
        } else {
            mismatches + wobbles
        };
        if effective > params.max_seed_mismatches {
            continue;
        }

        for posting in index.postings(probe.key) {
            let key = (posting.transcript_ordinal, posting.position);
            best.entry(key)
                .and_modify(|cur| {
                    if (mismatches, wobbles) < *cur {
                        *cur = (mismatches, wobbles);
                    }
                })
                .or_insert((mismatches, wobbles));
        }
    }

    let mut hits = Vec::with_capacity(best.len());
    for ((ordinal, position), (mismatches, wobbles)) in best {
        let transcript = match index.resolve(store, ordinal) {
            Ok(t) => t,
            Err(SirnaError::TranscriptMissing(id)) => {
                log::warn!("seed entry references unknown transcript id: {id}");
                continue;
            }
            Err(other) => return Err(other),
        };

        if !seed_fits(transcript, position as usize) {
            continue;
        }

        hits.push(CandidateHit {
            transcript_id: transcript.transcript_id.clone(),
            seed_position: position as usize,
            align_start: align_start_for(position as usize, guide.len()),
            mismatches,
            wobbles,
        });
    }

    if hits.len() > params.max_candidates {
        return Err(SirnaError::ResourceExhausted {
            limit: params.max_candidates,
            found: hits.len(),
        });
    }

    // Deterministic ordering independent of HashMap iteration order.
    hits.sort_by(|a, b| {
        a.transcript_id
            .cmp(&b.transcript_id)
            .then(a.seed_position.cmp(&b.seed_position))
    });

    Ok(hits)
}
