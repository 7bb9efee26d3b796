//! Ranking engine: filter, then order by score override or the user's sort mode.
//!
//! Pure and stable. Equal keys keep their input order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::candidate::CandidateRecord;
use crate::recommendation::merger::ScoreLookup;

/// User-selected ordering, used only while no score lookup is active.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Years of experience, most first
    #[default]
    Experience,
    /// Name, A to Z
    Name,
    /// City, A to Z
    City,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate<'a> {
    pub candidate: &'a CandidateRecord,
    /// Set only when a score lookup drove the ordering; unscored candidates get 0.
    pub score: Option<f64>,
}

/// Keeps candidates whose name or city contains `search`, ignoring case.
pub fn filter_candidates<'a>(
    candidates: &'a [CandidateRecord],
    search: &str,
) -> Vec<&'a CandidateRecord> {
    if search.is_empty() {
        return candidates.iter().collect();
    }
    let needle = search.to_lowercase();
    candidates
        .iter()
        .filter(|c| {
            c.name_or_empty().to_lowercase().contains(&needle)
                || c.city_or_empty().to_lowercase().contains(&needle)
        })
        .collect()
}

/// Primary collation key: canonical decomposition with combining marks dropped,
/// then lowercased, so "Émile" sorts with "E" and "Åre" with "A".
fn collation_key(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Accent- and case-insensitive first; raw text breaks the remaining ties.
fn lexical_cmp(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn sort_mode_cmp(mode: SortMode, a: &CandidateRecord, b: &CandidateRecord) -> Ordering {
    match mode {
        SortMode::Experience => b.experience_years().total_cmp(&a.experience_years()),
        SortMode::Name => lexical_cmp(a.name_or_empty(), b.name_or_empty()),
        SortMode::City => lexical_cmp(a.city_or_empty(), b.city_or_empty()),
    }
}

/// Produces the display order. A non-empty lookup orders by score descending and
/// overrides `mode` entirely; otherwise `mode` applies.
pub fn rank_candidates<'a>(
    candidates: &'a [CandidateRecord],
    search: &str,
    mode: SortMode,
    lookup: Option<&ScoreLookup>,
) -> Vec<RankedCandidate<'a>> {
    let filtered = filter_candidates(candidates, search);

    match lookup.filter(|l| !l.is_empty()) {
        Some(lookup) => {
            let mut ranked: Vec<RankedCandidate<'a>> = filtered
                .into_iter()
                .map(|candidate| RankedCandidate {
                    candidate,
                    score: Some(lookup.score_for(&candidate.record_id)),
                })
                .collect();
            ranked.sort_by(|a, b| {
                let (sa, sb) = (a.score.unwrap_or(0.0), b.score.unwrap_or(0.0));
                sb.total_cmp(&sa)
            });
            ranked
        }
        None => {
            let mut ordered = filtered;
            ordered.sort_by(|a, b| sort_mode_cmp(mode, a, b));
            ordered
                .into_iter()
                .map(|candidate| RankedCandidate {
                    candidate,
                    score: None,
                })
                .collect()
        }
    }
}
