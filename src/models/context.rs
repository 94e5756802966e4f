use serde::{Deserialize, Serialize};

use super::allergy::ContextAllergy;
use super::condition::ContextCondition;
use super::enums::ClinicalStatus;
use super::medication::ContextMedication;
use super::vital_sign::VitalReading;

/// Snapshot of the patient's clinical context for one analysis call.
///
/// Owned by the caller and refreshed before each `analyze`; the engine only
/// borrows it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientContext {
    #[serde(default)]
    pub active_medications: Vec<ContextMedication>,
    #[serde(default)]
    pub active_conditions: Vec<ContextCondition>,
    #[serde(default)]
    pub recent_vitals: Vec<VitalReading>,
    #[serde(default)]
    pub allergies: Vec<ContextAllergy>,
}

impl PatientContext {
    /// First condition with Active status matching any of `terms`.
    pub fn active_condition_matching(&self, terms: &[String]) -> Option<&ContextCondition> {
        self.active_conditions
            .iter()
            .filter(|c| c.is_active())
            .find(|c| terms.iter().any(|t| c.matches_term(t)))
    }

    /// Whether this display name is recorded as Resolved and has no Active
    /// entry. A condition listed both ways is treated as current.
    pub fn condition_resolved(&self, display: &str) -> bool {
        let named = || {
            self.active_conditions
                .iter()
                .filter(|c| c.display.eq_ignore_ascii_case(display))
        };
        !named().any(|c| c.is_active())
            && named().any(|c| c.clinical_status == ClinicalStatus::Resolved)
    }

    /// Non-Active medication entry with this (case-insensitive) name, unless
    /// another entry with the same name is Active.
    pub fn inactive_medication(&self, name: &str) -> Option<&ContextMedication> {
        let named = || {
            self.active_medications
                .iter()
                .filter(|m| m.name.eq_ignore_ascii_case(name))
        };
        if named().any(|m| m.is_active()) {
            return None;
        }
        named().find(|m| !m.is_active())
    }
}
