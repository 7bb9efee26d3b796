use serde::{Deserialize, Serialize};

use crate::models::serde_helpers::{opt_number, string_id};

/// A job posting as listed by the store. Only the subject of a recommendation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobPosting {
    #[serde(deserialize_with = "string_id::deserialize")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub locations: Option<String>,
    #[serde(default)]
    pub work_type: Option<String>,
    /// Free text, e.g. "5+ years in backend development".
    #[serde(default)]
    pub experience_required: Option<String>,
    #[serde(default, deserialize_with = "opt_number::deserialize")]
    pub total_experience_years: Option<f64>,
    #[serde(default)]
    pub job_description: Option<String>,
}

impl JobPosting {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }
}

/// Body for job posting create/update calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobPostingDraft {
    #[serde(skip)]
    pub id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_skills: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_skills: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages_required: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_required: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_experience_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsibilities: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifications: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
}
