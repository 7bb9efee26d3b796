//! Scripted fakes for the store and evaluator traits.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ClientError;
use crate::models::candidate::{CandidateDraft, CandidateRecord};
use crate::models::job::JobPosting;
use crate::models::recommendation::{TaskHandle, TaskStatusResponse};
use crate::store_client::{CandidateStore, RecommendationApi};

pub type Observation = Result<TaskStatusResponse, ClientError>;

pub fn pending() -> Observation {
    Ok(TaskStatusResponse {
        status: "pending".to_string(),
        results: None,
        error: None,
    })
}

pub fn complete(results: Value) -> Observation {
    Ok(TaskStatusResponse {
        status: "complete".to_string(),
        results: Some(serde_json::from_value(results).unwrap()),
        error: None,
    })
}

pub fn task_error(message: &str) -> Observation {
    Ok(TaskStatusResponse {
        status: "error".to_string(),
        results: None,
        error: Some(message.to_string()),
    })
}

/// Evaluator fake. Task ids are `T-{job_id}`; unscripted polls answer "pending".
#[derive(Default)]
pub struct FakeEvaluator {
    submissions: Mutex<Vec<String>>,
    submit_errors: HashMap<String, ClientError>,
    scripts: Mutex<HashMap<String, VecDeque<Observation>>>,
    status_calls: AtomicU32,
    status_delay: Duration,
}

impl FakeEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_submission(mut self, job_id: &str, status: u16, message: &str) -> Self {
        self.submit_errors.insert(
            job_id.to_string(),
            ClientError::RequestRejected {
                status,
                message: message.to_string(),
            },
        );
        self
    }

    pub fn fail_submission_transport(mut self, job_id: &str) -> Self {
        self.submit_errors.insert(
            job_id.to_string(),
            ClientError::Transport("connection refused".to_string()),
        );
        self
    }

    pub fn script(mut self, task_id: &str, observations: Vec<Observation>) -> Self {
        self.scripts
            .get_mut()
            .unwrap()
            .insert(task_id.to_string(), observations.into());
        self
    }

    /// Each status call suspends this long before answering.
    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = delay;
        self
    }

    pub fn submissions(&self) -> Vec<String> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecommendationApi for FakeEvaluator {
    async fn submit_recommendation(&self, job_id: &str) -> Result<TaskHandle, ClientError> {
        self.submissions.lock().unwrap().push(job_id.to_string());
        if let Some(err) = self.submit_errors.get(job_id) {
            return Err(err.clone());
        }
        Ok(TaskHandle {
            task_id: format!("T-{job_id}"),
        })
    }

    async fn recommendation_status(&self, task_id: &str) -> Observation {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if !self.status_delay.is_zero() {
            tokio::time::sleep(self.status_delay).await;
        }
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(task_id)
            .and_then(|script| script.pop_front());
        next.unwrap_or_else(pending)
    }
}

/// In-memory store fake. `list_script` entries are served first, each after its delay.
#[derive(Default)]
pub struct FakeStore {
    records: Mutex<Vec<CandidateRecord>>,
    jobs: Vec<JobPosting>,
    list_script: Mutex<VecDeque<(Duration, Vec<CandidateRecord>)>>,
    fail_writes: bool,
    list_calls: AtomicU32,
    next_id: AtomicU32,
}

impl FakeStore {
    pub fn with_candidates(records: Vec<CandidateRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn with_jobs(mut self, jobs: Vec<JobPosting>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn scripted_lists(self, lists: Vec<(Duration, Vec<CandidateRecord>)>) -> Self {
        *self.list_script.lock().unwrap() = lists.into();
        self
    }

    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), ClientError> {
        if self.fail_writes {
            return Err(ClientError::RequestRejected {
                status: 500,
                message: "Failed to save candidate".to_string(),
            });
        }
        Ok(())
    }
}

fn record_from_draft(record_id: String, draft: &CandidateDraft) -> CandidateRecord {
    let mut record = crate::models::candidate::candidate(&record_id, &draft.name, "", 0.0);
    record.city = draft.city.clone();
    record.position = draft.position.clone();
    record.total_experience_years = draft.total_experience_years.map(f64::from);
    record.experiences = draft.experiences.clone();
    record.about = draft.about.clone();
    record.url = draft.url.clone();
    record
}

#[async_trait]
impl CandidateStore for FakeStore {
    async fn list_candidates(&self) -> Result<Vec<CandidateRecord>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.list_script.lock().unwrap().pop_front();
        if let Some((delay, records)) = scripted {
            tokio::time::sleep(delay).await;
            return Ok(records);
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn create_candidate(&self, draft: &CandidateDraft) -> Result<(), ClientError> {
        self.check_writable()?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.records
            .lock()
            .unwrap()
            .push(record_from_draft(format!("N{n}"), draft));
        Ok(())
    }

    async fn update_candidate(
        &self,
        record_id: &str,
        draft: &CandidateDraft,
    ) -> Result<(), ClientError> {
        self.check_writable()?;
        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|c| c.record_id == record_id)
            .ok_or_else(|| ClientError::RequestRejected {
                status: 404,
                message: "Candidate not found".to_string(),
            })?;
        *slot = record_from_draft(record_id.to_string(), draft);
        Ok(())
    }

    async fn delete_candidate(&self, record_id: &str) -> Result<(), ClientError> {
        self.check_writable()?;
        self.records
            .lock()
            .unwrap()
            .retain(|c| c.record_id != record_id);
        Ok(())
    }

    async fn list_job_postings(&self) -> Result<Vec<JobPosting>, ClientError> {
        Ok(self.jobs.clone())
    }
}
