use chrono::{DateTime, Utc};

use crate::models::recommendation::EvaluationSummary;

/// Display projection of the evaluation summary for the current job.
/// Holds nothing it didn't receive; cleared whenever a new cycle starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryView {
    summary: Option<EvaluationSummary>,
    received_at: Option<DateTime<Utc>>,
}

impl SummaryView {
    pub fn present(&mut self, summary: Option<EvaluationSummary>) {
        self.received_at = summary.as_ref().map(|_| Utc::now());
        self.summary = summary;
    }

    pub fn clear(&mut self) {
        self.summary = None;
        self.received_at = None;
    }

    pub fn summary(&self) -> Option<&EvaluationSummary> {
        self.summary.as_ref()
    }

    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    /// Share of evaluated candidates scoring above 50; 0 when nothing was evaluated.
    pub fn above_threshold_ratio(&self) -> f64 {
        match &self.summary {
            Some(s) if s.total_candidates > 0 => {
                f64::from(s.above_50_count) / f64::from(s.total_candidates)
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(avg: f64, above: u32, total: u32) -> EvaluationSummary {
        EvaluationSummary {
            average_score: avg,
            above_50_count: above,
            total_candidates: total,
        }
    }

    #[test]
    fn test_present_passes_summary_through() {
        let mut view = SummaryView::default();
        view.present(Some(summary(61.5, 1, 2)));
        assert!(view.summary().is_some());
        assert_eq!(view.summary(), Some(&summary(61.5, 1, 2)));
        assert!(view.received_at().is_some());
        assert!((view.above_threshold_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_absent_summary_is_hidden() {
        let mut view = SummaryView::default();
        view.present(None);
        assert!(view.summary().is_none());
        assert!(view.received_at().is_none());
    }

    #[test]
    fn test_clear_hides_previous_summary() {
        let mut view = SummaryView::default();
        view.present(Some(summary(80.0, 3, 3)));
        view.clear();
        assert_eq!(view, SummaryView::default());
    }

    #[test]
    fn test_ratio_with_zero_total() {
        let mut view = SummaryView::default();
        view.present(Some(summary(0.0, 0, 0)));
        assert_eq!(view.above_threshold_ratio(), 0.0);
    }
}
