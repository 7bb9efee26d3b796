//! Recommendation session: the client-side state one portal user works against.
//!
//! Holds the read-through candidate cache, the job list, the selected job and the
//! transient per-job scoring state. Only fetches write the candidate cache; a cycle
//! writes its results to the side table, and only while it is still the current cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::ClientError;
use crate::models::candidate::{CandidateDraft, CandidateRecord};
use crate::models::job::JobPosting;
use crate::recommendation::merger::{merge_scores, MergeNotice, ScoreLookup};
use crate::recommendation::poller::{PollConfig, PollingScheduler};
use crate::recommendation::ranking::{rank_candidates, SortMode};
use crate::recommendation::submitter::{submit_for_job, validate_job_id};
use crate::recommendation::summary::SummaryView;
use crate::store_client::{CandidateStore, RecommendationApi};

/// How a recommendation cycle ended, from the caller's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Completed {
        matched: usize,
        unmatched: usize,
        notice: Option<MergeNotice>,
    },
    Failed(ClientError),
    /// A newer cycle started, or the selection was cleared; nothing was applied.
    Superseded,
}

/// Identifies one recommendation cycle; stale tickets never write results.
#[derive(Debug, Clone)]
pub struct CycleTicket {
    cycle: u64,
    cancel: CancellationToken,
}

/// Owned ranking row handed out of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub candidate: CandidateRecord,
    pub score: Option<f64>,
}

struct SessionState {
    candidates: Vec<CandidateRecord>,
    /// Fetch generation that produced `candidates`.
    candidates_version: u64,
    jobs: Vec<JobPosting>,
    jobs_version: u64,
    selected_job: Option<String>,
    cycle: u64,
    cancel: CancellationToken,
    lookup: ScoreLookup,
    summary: SummaryView,
    notice: Option<MergeNotice>,
    last_error: Option<String>,
}

impl SessionState {
    fn reset_cycle(&mut self) -> CycleTicket {
        self.cancel.cancel();
        self.cycle += 1;
        self.cancel = CancellationToken::new();
        self.lookup = ScoreLookup::default();
        self.summary.clear();
        self.notice = None;
        self.last_error = None;
        CycleTicket {
            cycle: self.cycle,
            cancel: self.cancel.clone(),
        }
    }
}

pub struct RecommendationSession {
    store: Arc<dyn CandidateStore>,
    api: Arc<dyn RecommendationApi>,
    poll: PollConfig,
    fetch_generation: AtomicU64,
    job_fetch_generation: AtomicU64,
    state: RwLock<SessionState>,
}

impl RecommendationSession {
    pub fn new(
        store: Arc<dyn CandidateStore>,
        api: Arc<dyn RecommendationApi>,
        poll: PollConfig,
    ) -> Self {
        Self {
            store,
            api,
            poll,
            fetch_generation: AtomicU64::new(0),
            job_fetch_generation: AtomicU64::new(0),
            state: RwLock::new(SessionState {
                candidates: Vec::new(),
                candidates_version: 0,
                jobs: Vec::new(),
                jobs_version: 0,
                selected_job: None,
                cycle: 0,
                cancel: CancellationToken::new(),
                lookup: ScoreLookup::default(),
                summary: SummaryView::default(),
                notice: None,
                last_error: None,
            }),
        }
    }

    // ── Candidate cache ────────────────────────────────────────────────────

    /// Refetches the candidate collection. Returns `false` when a newer fetch already
    /// landed and this response was discarded.
    pub async fn refresh_candidates(&self) -> Result<bool, ClientError> {
        let generation = self.fetch_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let fetched = self.store.list_candidates().await?;

        let mut state = self.state.write().await;
        if generation < state.candidates_version {
            debug!(
                "Discarding candidate fetch #{generation}; #{} already applied",
                state.candidates_version
            );
            return Ok(false);
        }
        info!("Loaded {} candidates", fetched.len());
        state.candidates = fetched;
        state.candidates_version = generation;
        Ok(true)
    }

    pub async fn refresh_jobs(&self) -> Result<bool, ClientError> {
        let generation = self.job_fetch_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let fetched = self.store.list_job_postings().await?;

        let mut state = self.state.write().await;
        if generation < state.jobs_version {
            return Ok(false);
        }
        info!("Loaded {} job postings", fetched.len());
        state.jobs = fetched;
        state.jobs_version = generation;
        Ok(true)
    }

    /// Creates the candidate when the draft has no `record_id`, updates it otherwise,
    /// then refetches. On failure the cache is left as it was.
    pub async fn save_candidate(&self, draft: &CandidateDraft) -> Result<(), ClientError> {
        match draft.record_id.as_deref() {
            Some(record_id) => self.store.update_candidate(record_id, draft).await?,
            None => self.store.create_candidate(draft).await?,
        }
        self.refresh_candidates().await?;
        Ok(())
    }

    pub async fn delete_candidate(&self, record_id: &str) -> Result<(), ClientError> {
        self.store.delete_candidate(record_id).await?;
        self.refresh_candidates().await?;
        Ok(())
    }

    // ── Recommendation cycle ───────────────────────────────────────────────

    /// Makes `job_id` the current job, abandoning any cycle still in flight and
    /// clearing the previous job's scores, summary and messages.
    pub async fn select_job(&self, job_id: &str) -> CycleTicket {
        let mut state = self.state.write().await;
        let ticket = state.reset_cycle();
        state.selected_job = Some(job_id.to_string());
        ticket
    }

    /// Abandons any cycle in flight and drops the job selection.
    pub async fn clear_selection(&self) {
        let mut state = self.state.write().await;
        state.reset_cycle();
        state.selected_job = None;
    }

    /// Full cycle: select → submit → poll → merge. Results apply only if this is
    /// still the current cycle once polling ends. A blank job id fails before
    /// anything in the session changes.
    pub async fn run_recommendation(&self, job_id: &str) -> CycleOutcome {
        let job_id = match validate_job_id(job_id) {
            Ok(job_id) => job_id,
            Err(e) => {
                warn!("Recommendation refused: {e}");
                return CycleOutcome::Failed(e);
            }
        };
        let CycleTicket { cycle, cancel } = self.select_job(job_id).await;
        info!("Recommendation cycle #{cycle} started for job {job_id}");

        let result = async {
            let task_id = submit_for_job(self.api.as_ref(), job_id).await?;
            PollingScheduler::new(self.api.as_ref(), self.poll, cancel.clone())
                .run(&task_id)
                .await
        }
        .await;

        let mut state = self.state.write().await;
        if state.cycle != cycle || cancel.is_cancelled() {
            debug!("Cycle #{cycle} superseded; discarding its result");
            return CycleOutcome::Superseded;
        }

        match result {
            Ok(results) => {
                let outcome = merge_scores(&state.candidates, &results);
                let matched = outcome.lookup.len();
                if let Some(notice) = outcome.notice {
                    warn!("Cycle #{cycle}: {}", notice.message());
                }
                state.lookup = outcome.lookup;
                state.summary.present(outcome.evaluation);
                state.notice = outcome.notice;
                info!("Cycle #{cycle} complete: {matched} candidates scored");
                CycleOutcome::Completed {
                    matched,
                    unmatched: outcome.unmatched,
                    notice: outcome.notice,
                }
            }
            Err(ClientError::Cancelled) => CycleOutcome::Superseded,
            Err(e) => {
                warn!("Cycle #{cycle} failed: {e}");
                state.last_error = Some(e.user_message());
                CycleOutcome::Failed(e)
            }
        }
    }

    // ── Read side ──────────────────────────────────────────────────────────

    /// Display order for the current cache. Falls back to `mode` whenever no
    /// non-empty score lookup is active.
    pub async fn ranked(&self, search: &str, mode: SortMode) -> Vec<RankedEntry> {
        let state = self.state.read().await;
        rank_candidates(&state.candidates, search, mode, Some(&state.lookup))
            .into_iter()
            .map(|r| RankedEntry {
                candidate: r.candidate.clone(),
                score: r.score,
            })
            .collect()
    }

    pub async fn candidates(&self) -> Vec<CandidateRecord> {
        self.state.read().await.candidates.clone()
    }

    pub async fn jobs(&self) -> Vec<JobPosting> {
        self.state.read().await.jobs.clone()
    }

    pub async fn selected_job(&self) -> Option<String> {
        self.state.read().await.selected_job.clone()
    }

    pub async fn summary(&self) -> SummaryView {
        self.state.read().await.summary.clone()
    }

    pub async fn notice(&self) -> Option<MergeNotice> {
        self.state.read().await.notice
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    pub async fn has_scores(&self) -> bool {
        !self.state.read().await.lookup.is_empty()
    }
}
