//! Polling scheduler: tracks a recommendation task to a terminal state.
//!
//! States: Submitted → Polling → {Complete, Failed, TimedOut}.
//! - "complete" ends in Complete with the payload
//! - "error" ends in Failed immediately, whatever budget is left
//! - any other status counts one attempt; the cap ends in TimedOut
//! - a transport or decode failure on the status call ends in Failed and is not counted
//!
//! The first status check runs right after submission; later checks are separated by
//! `PollConfig::interval`. Cancellation is checked before each delay, while suspended,
//! and before a completed payload is handed back.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::ClientError;
use crate::models::recommendation::{RecommendationResults, TaskStatus, TaskStatusResponse};
use crate::store_client::RecommendationApi;

/// Fallback when the evaluator reports "error" without a message.
pub const TASK_FAILED_FALLBACK: &str = "Recommendation task failed";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_attempts: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Submitted,
    Polling { attempts: u32 },
    Complete(RecommendationResults),
    Failed(ClientError),
    TimedOut { attempts: u32 },
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Complete(_) | PollState::Failed(_) | PollState::TimedOut { .. }
        )
    }

    /// Applies one status observation. Terminal states absorb further observations.
    pub fn observe(
        self,
        observation: Result<TaskStatusResponse, ClientError>,
        max_attempts: u32,
    ) -> PollState {
        let attempts = match self {
            PollState::Submitted => 0,
            PollState::Polling { attempts } => attempts,
            terminal => return terminal,
        };

        let response = match observation {
            Ok(r) => r,
            Err(e) => return PollState::Failed(e),
        };

        match response.classify() {
            TaskStatus::Complete => PollState::Complete(response.results.unwrap_or_default()),
            TaskStatus::Error => {
                let message = response
                    .error
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| TASK_FAILED_FALLBACK.to_string());
                PollState::Failed(ClientError::TaskFailed(message))
            }
            TaskStatus::Pending | TaskStatus::Other(_) => {
                let attempts = attempts + 1;
                if attempts >= max_attempts.max(1) {
                    PollState::TimedOut { attempts }
                } else {
                    PollState::Polling { attempts }
                }
            }
        }
    }

    /// Converts a terminal state into the caller-facing result.
    pub fn into_result(self) -> Result<RecommendationResults, ClientError> {
        match self {
            PollState::Complete(results) => Ok(results),
            PollState::Failed(e) => Err(e),
            PollState::TimedOut { attempts } => Err(ClientError::PollTimeout { attempts }),
            PollState::Submitted | PollState::Polling { .. } => Err(ClientError::Cancelled),
        }
    }
}

pub struct PollingScheduler<'a, A: RecommendationApi + ?Sized> {
    api: &'a A,
    config: PollConfig,
    cancel: CancellationToken,
}

impl<'a, A: RecommendationApi + ?Sized> PollingScheduler<'a, A> {
    pub fn new(api: &'a A, config: PollConfig, cancel: CancellationToken) -> Self {
        Self {
            api,
            config,
            cancel,
        }
    }

    /// Polls `task_id` until a terminal state, suspending between checks.
    pub async fn run(&self, task_id: &str) -> Result<RecommendationResults, ClientError> {
        let mut state = PollState::Submitted;

        while !state.is_terminal() {
            if self.cancel.is_cancelled() {
                debug!("Polling for task {task_id} cancelled");
                return Err(ClientError::Cancelled);
            }

            let observation = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
                obs = self.api.recommendation_status(task_id) => obs,
            };

            state = state.observe(observation, self.config.max_attempts);

            if let PollState::Polling { attempts } = state {
                debug!(
                    "Task {} still pending (attempt {}/{}), next check in {}ms",
                    task_id,
                    attempts,
                    self.config.max_attempts,
                    self.config.interval.as_millis()
                );
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
                    _ = tokio::time::sleep(self.config.interval) => {}
                }
            }
        }

        if self.cancel.is_cancelled() {
            debug!("Discarding result of cancelled task {task_id}");
            return Err(ClientError::Cancelled);
        }

        match &state {
            PollState::Complete(_) => info!("Task {task_id} complete"),
            PollState::Failed(e) => warn!("Task {task_id} failed: {e}"),
            PollState::TimedOut { attempts } => {
                warn!("Task {task_id} timed out after {attempts} attempts")
            }
            _ => {}
        }

        state.into_result()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tokio::time::Instant;

    use super::*;
    use crate::recommendation::test_support::{complete, pending, task_error, FakeEvaluator};

    fn pending_response() -> TaskStatusResponse {
        pending().unwrap()
    }

    #[test]
    fn test_pending_counts_attempts() {
        let state = PollState::Submitted.observe(Ok(pending_response()), 60);
        assert_eq!(state, PollState::Polling { attempts: 1 });
        let state = state.observe(Ok(pending_response()), 60);
        assert_eq!(state, PollState::Polling { attempts: 2 });
    }

    #[test]
    fn test_unknown_status_counts_as_pending() {
        let running = TaskStatusResponse {
            status: "running".to_string(),
            results: None,
            error: None,
        };
        let state = PollState::Polling { attempts: 3 }.observe(Ok(running), 60);
        assert_eq!(state, PollState::Polling { attempts: 4 });
    }

    #[test]
    fn test_times_out_exactly_at_cap() {
        let mut state = PollState::Submitted;
        for _ in 0..59 {
            state = state.observe(Ok(pending_response()), 60);
            assert!(!state.is_terminal());
        }
        state = state.observe(Ok(pending_response()), 60);
        assert_eq!(state, PollState::TimedOut { attempts: 60 });
    }

    #[test]
    fn test_error_fails_regardless_of_budget() {
        let state = PollState::Polling { attempts: 1 }.observe(task_error("Model crashed"), 60);
        assert_eq!(
            state,
            PollState::Failed(ClientError::TaskFailed("Model crashed".to_string()))
        );
    }

    #[test]
    fn test_error_without_message_uses_fallback() {
        let resp = TaskStatusResponse {
            status: "error".to_string(),
            results: None,
            error: None,
        };
        let state = PollState::Submitted.observe(Ok(resp), 60);
        assert_eq!(
            state.into_result().unwrap_err(),
            ClientError::TaskFailed(TASK_FAILED_FALLBACK.to_string())
        );
    }

    #[test]
    fn test_transport_failure_is_fatal_and_uncounted() {
        let err = ClientError::Transport("reset".to_string());
        let state = PollState::Polling { attempts: 10 }.observe(Err(err.clone()), 60);
        assert_eq!(state, PollState::Failed(err));
    }

    #[test]
    fn test_terminal_state_absorbs_observations() {
        let state = PollState::TimedOut { attempts: 60 }.observe(Ok(pending_response()), 60);
        assert_eq!(state, PollState::TimedOut { attempts: 60 });
    }

    #[test]
    fn test_complete_without_results_is_empty_payload() {
        let resp = TaskStatusResponse {
            status: "complete".to_string(),
            results: None,
            error: None,
        };
        let results = PollState::Submitted.observe(Ok(resp), 60).into_result().unwrap();
        assert!(results.candidates.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_on_fourth_poll_after_three_delays() {
        let api = FakeEvaluator::new().script(
            "T-J1",
            vec![
                pending(),
                pending(),
                pending(),
                complete(json!({
                    "candidates": [{"candidate_id": "C1", "score": 82}],
                    "evaluation": {"average_score": 82.0, "above_50_count": 1, "total_candidates": 1}
                })),
            ],
        );
        let scheduler = PollingScheduler::new(&api, PollConfig::default(), CancellationToken::new());

        let start = Instant::now();
        let results = scheduler.run("T-J1").await.unwrap();

        assert_eq!(api.status_calls(), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(3 * 2000));
        assert_eq!(results.candidates.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sixty_pending_polls_time_out() {
        let api = FakeEvaluator::new();
        let scheduler = PollingScheduler::new(&api, PollConfig::default(), CancellationToken::new());

        let start = Instant::now();
        let err = scheduler.run("T-J1").await.unwrap_err();

        assert_eq!(err, ClientError::PollTimeout { attempts: 60 });
        assert_eq!(err.user_message(), "Processing timeout");
        assert_eq!(api.status_calls(), 60);
        assert_eq!(start.elapsed(), Duration::from_millis(59 * 2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_stops_immediately() {
        let api = FakeEvaluator::new().script("T-J1", vec![pending(), task_error("No candidates")]);
        let scheduler = PollingScheduler::new(&api, PollConfig::default(), CancellationToken::new());

        let err = scheduler.run("T-J1").await.unwrap_err();
        assert_eq!(err, ClientError::TaskFailed("No candidates".to_string()));
        assert_eq!(api.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_stops_without_retry() {
        let api = FakeEvaluator::new().script(
            "T-J1",
            vec![pending(), Err(ClientError::Transport("connection reset".to_string()))],
        );
        let scheduler = PollingScheduler::new(&api, PollConfig::default(), CancellationToken::new());

        let err = scheduler.run("T-J1").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(api.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_delay_abandons_polling() {
        let api = Arc::new(FakeEvaluator::new());
        let cancel = CancellationToken::new();

        let handle = {
            let api = api.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                PollingScheduler::new(api.as_ref(), PollConfig::default(), cancel)
                    .run("T-J1")
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(5000)).await;
        cancel.cancel();

        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err, ClientError::Cancelled);
        // checks at t=0, 2000, 4000; none after cancellation at 5000
        assert_eq!(api.status_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_payload_arriving_after_cancel_is_discarded() {
        let api = Arc::new(
            FakeEvaluator::new()
                .with_status_delay(Duration::from_millis(1000))
                .script("T-J1", vec![complete(json!({"candidates": []}))]),
        );
        let cancel = CancellationToken::new();

        let handle = {
            let api = api.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                PollingScheduler::new(api.as_ref(), PollConfig::default(), cancel)
                    .run("T-J1")
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();

        assert_eq!(handle.await.unwrap().unwrap_err(), ClientError::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_interval_and_cap() {
        let api = FakeEvaluator::new();
        let config = PollConfig {
            interval: Duration::from_millis(250),
            max_attempts: 4,
        };
        let scheduler = PollingScheduler::new(&api, config, CancellationToken::new());

        let start = Instant::now();
        let err = scheduler.run("T-J1").await.unwrap_err();
        assert_eq!(err, ClientError::PollTimeout { attempts: 4 });
        assert_eq!(start.elapsed(), Duration::from_millis(3 * 250));
    }
}
