use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::ClinicalStatus;

/// A problem-list entry (code + display) with its clinical status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextCondition {
    pub code: String,
    pub display: String,
    pub clinical_status: ClinicalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset_date: Option<NaiveDate>,
}

impl ContextCondition {
    /// True when the display contains `term` or the code starts with it
    /// (case-insensitive). "I10" matches code "I10.9".
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return false;
        }
        self.display.to_lowercase().contains(&term) || self.code.to_lowercase().starts_with(&term)
    }

    pub fn is_active(&self) -> bool {
        self.clinical_status == ClinicalStatus::Active
    }
}
