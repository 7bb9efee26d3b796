//! Result merger: joins a completed task's score records onto the local candidate set.
//!
//! Stateless and idempotent. Scores are kept in a side table keyed by `record_id`;
//! candidate records are never modified.

use std::collections::HashMap;

use tracing::debug;

use crate::models::candidate::CandidateRecord;
use crate::models::recommendation::{EvaluationSummary, RecommendationResults, ScoreRecord};

pub const NO_QUALIFIED_CANDIDATES: &str = "No qualified candidates found";

/// Non-fatal conditions reported alongside a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeNotice {
    NoQualifiedCandidates,
}

impl MergeNotice {
    pub fn message(&self) -> &'static str {
        match self {
            MergeNotice::NoQualifiedCandidates => NO_QUALIFIED_CANDIDATES,
        }
    }
}

/// Transient mapping from candidate `record_id` to its score for the current job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreLookup {
    scores: HashMap<String, ScoreRecord>,
}

impl ScoreLookup {
    pub fn get(&self, record_id: &str) -> Option<&ScoreRecord> {
        self.scores.get(record_id)
    }

    /// Score for ranking; candidates absent from the lookup rank as 0.
    pub fn score_for(&self, record_id: &str) -> f64 {
        self.get(record_id).map(ScoreRecord::score_value).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub lookup: ScoreLookup,
    /// Score records that matched no local candidate.
    pub unmatched: usize,
    pub evaluation: Option<EvaluationSummary>,
    pub notice: Option<MergeNotice>,
}

/// The one place that knows a score record may reference its candidate as either
/// `candidate_id` or `id`. Both keys are checked; neither is assumed.
// TODO: drop the `id` fallback once the evaluator settles on `candidate_id` upstream.
pub fn references_candidate(record: &ScoreRecord, record_id: &str) -> bool {
    record.candidate_id.as_deref() == Some(record_id) || record.id.as_deref() == Some(record_id)
}

pub fn merge_scores(candidates: &[CandidateRecord], results: &RecommendationResults) -> MergeOutcome {
    let records: &[ScoreRecord] = results.candidates.as_deref().unwrap_or(&[]);

    let mut scores = HashMap::new();
    for candidate in candidates {
        if let Some(record) = records
            .iter()
            .find(|r| references_candidate(r, &candidate.record_id))
        {
            scores
                .entry(candidate.record_id.clone())
                .or_insert_with(|| record.clone());
        }
    }

    let unmatched = records
        .iter()
        .filter(|r| !candidates.iter().any(|c| references_candidate(r, &c.record_id)))
        .count();
    if unmatched > 0 {
        debug!("{unmatched} score records matched no local candidate");
    }

    let lookup = ScoreLookup { scores };
    let notice = lookup
        .is_empty()
        .then_some(MergeNotice::NoQualifiedCandidates);

    MergeOutcome {
        lookup,
        unmatched,
        evaluation: results.evaluation.clone(),
        notice,
    }
}
