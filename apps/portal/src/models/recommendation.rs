//! Wire types for the recommendation endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::serde_helpers::{lenient_list, opt_id, opt_number, string_id};

/// `POST /recommendations/{job_id}` success body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskHandle {
    #[serde(deserialize_with = "string_id::deserialize")]
    pub task_id: String,
}

/// One candidate's score against the job.
///
/// Upstream sends the candidate reference as either `candidate_id` or `id`.
/// Both are kept as-is; `merger::references_candidate` is the only reader.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreRecord {
    #[serde(default, deserialize_with = "opt_id::deserialize")]
    pub candidate_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id::deserialize")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "opt_number::deserialize")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "opt_number::deserialize")]
    pub precision: Option<f64>,
    #[serde(default, deserialize_with = "opt_number::deserialize")]
    pub recall: Option<f64>,
    #[serde(default, deserialize_with = "opt_number::deserialize")]
    pub f1_score: Option<f64>,
}

impl ScoreRecord {
    /// Score clamped to [0, 100]; missing or non-finite scores count as 0.
    pub fn score_value(&self) -> f64 {
        match self.score {
            Some(s) if s.is_finite() => s.clamp(0.0, 100.0),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EvaluationSummary {
    #[serde(default)]
    pub average_score: f64,
    #[serde(default)]
    pub above_50_count: u32,
    #[serde(default)]
    pub total_candidates: u32,
}

/// Payload attached to a completed task.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResults {
    /// `None` when the field is missing or not a list.
    #[serde(default, deserialize_with = "lenient_list::deserialize")]
    pub candidates: Option<Vec<ScoreRecord>>,
    #[serde(default)]
    pub evaluation: Option<EvaluationSummary>,
}

/// Classified task status. Unknown strings are treated as still running.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskStatus {
    Pending,
    Complete,
    Error,
    Other(String),
}

impl From<&str> for TaskStatus {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => TaskStatus::Pending,
            "complete" => TaskStatus::Complete,
            "error" => TaskStatus::Error,
            other => TaskStatus::Other(other.to_string()),
        }
    }
}

/// `GET /recommendations/status/{task_id}` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatusResponse {
    pub status: String,
    #[serde(default)]
    pub results: Option<RecommendationResults>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskStatusResponse {
    pub fn classify(&self) -> TaskStatus {
        TaskStatus::from(self.status.as_str())
    }
}

/// Extracts a human-readable message from an error body.
/// Accepts `{"error": "..."}` and `{"error": {"message": "..."}}`.
pub fn error_message_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = match value.get("error")? {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj.get("message")?.as_str()?.to_string(),
        _ => return None,
    };
    let message = message.trim();
    (!message.is_empty()).then(|| message.to_string())
}
