use serde::{Deserialize, Serialize};

use crate::models::serde_helpers::{opt_number, string_id};

/// Minimum number of comma-separated skills before a profile counts as complete.
const MIN_SKILL_ENTRIES: usize = 2;

/// A candidate row as served by the store's joined profile view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateRecord {
    #[serde(deserialize_with = "string_id::deserialize")]
    pub record_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default, deserialize_with = "opt_number::deserialize")]
    pub total_experience_years: Option<f64>,
    /// Comma-delimited skills text.
    #[serde(default)]
    pub experiences: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub url: Option<String>,

    // Passthrough fields; the client never interprets them.
    #[serde(default)]
    pub person_id: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub degrees: Option<String>,
    #[serde(default)]
    pub certifications: Option<String>,
    #[serde(default)]
    pub languages: Option<String>,
    #[serde(default)]
    pub courses: Option<String>,
    #[serde(default)]
    pub load_date: Option<String>,
}

impl CandidateRecord {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed")
    }

    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn city_or_empty(&self) -> &str {
        self.city.as_deref().unwrap_or("")
    }

    pub fn experience_years(&self) -> f64 {
        self.total_experience_years.unwrap_or(0.0)
    }

    /// Non-blank entries of the comma-delimited skills text.
    pub fn skills(&self) -> Vec<&str> {
        self.experiences
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Derived, never stored: missing "about" text or fewer than two skills.
    pub fn is_profile_incomplete(&self) -> bool {
        let about_missing = self
            .about
            .as_deref()
            .map(|a| a.trim().is_empty())
            .unwrap_or(true);
        about_missing || self.skills().len() < MIN_SKILL_ENTRIES
    }
}

/// Body for create/update calls. `record_id` picks the verb and is never sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CandidateDraft {
    #[serde(skip)]
    pub record_id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_experience_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiences: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<&CandidateRecord> for CandidateDraft {
    fn from(c: &CandidateRecord) -> Self {
        Self {
            record_id: Some(c.record_id.clone()),
            name: c.name.clone().unwrap_or_default(),
            city: c.city.clone(),
            position: c.position.clone(),
            total_experience_years: c.total_experience_years.map(|y| y.max(0.0).round() as u32),
            experiences: c.experiences.clone(),
            about: c.about.clone(),
            url: c.url.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) fn candidate(record_id: &str, name: &str, city: &str, years: f64) -> CandidateRecord {
    CandidateRecord {
        record_id: record_id.to_string(),
        name: Some(name.to_string()),
        city: Some(city.to_string()),
        position: None,
        total_experience_years: Some(years),
        experiences: None,
        about: None,
        url: None,
        person_id: None,
        country_code: None,
        degrees: None,
        certifications: None,
        languages: None,
        courses: None,
        load_date: None,
    }
}
