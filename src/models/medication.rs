use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::MedicationStatus;

/// A medication on the patient's current list, as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextMedication {
    pub name: String,
    pub status: MedicationStatus,
    pub category: String,
    pub prescribed_date: NaiveDate,
}

impl ContextMedication {
    /// Case-insensitive check against a drug term ("Warfarin 5mg" matches "warfarin").
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        !term.is_empty() && self.name.to_lowercase().contains(&term)
    }

    /// Lowercase leading word of the name, used to find mentions in free text.
    pub fn primary_term(&self) -> Option<String> {
        self.name
            .split_whitespace()
            .next()
            .map(|w| w.to_lowercase())
            .filter(|w| w.len() >= 3)
    }

    pub fn is_active(&self) -> bool {
        self.status == MedicationStatus::Active
    }
}
