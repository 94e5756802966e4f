use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::enums::AlertType;

use super::types::{AlertPriority, ClinicalAlert};

/// Overall risk band derived from the highest active risk score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            RiskLevel::Critical
        } else if score >= 0.7 {
            RiskLevel::High
        } else if score >= 0.4 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }
}

/// Follow-up a clinician is pointed to for a critical alert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    ReviewSepsisBundle,
    ReviewMedicationRegimen,
    RecheckVitals,
    ReviewAllergyRecord,
    VerifyDose,
    ReviewContraindication,
    ReviewConditionControl,
}

impl RecommendedAction {
    pub fn for_alert_type(alert_type: AlertType) -> Self {
        match alert_type {
            AlertType::Sepsis => Self::ReviewSepsisBundle,
            AlertType::MedicationConflict => Self::ReviewMedicationRegimen,
            AlertType::VitalSign => Self::RecheckVitals,
            AlertType::Allergy => Self::ReviewAllergyRecord,
            AlertType::DosageError => Self::VerifyDose,
            AlertType::Contraindication => Self::ReviewContraindication,
            AlertType::UncontrolledCondition => Self::ReviewConditionControl,
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::ReviewSepsisBundle => "Review sepsis screening and the hour-1 bundle.",
            Self::ReviewMedicationRegimen => "Review the combined medication regimen.",
            Self::RecheckVitals => "Recheck vital signs and confirm the reading.",
            Self::ReviewAllergyRecord => "Confirm the allergy record before ordering.",
            Self::VerifyDose => "Verify the ordered dose.",
            Self::ReviewContraindication => "Review the contraindication before proceeding.",
            Self::ReviewConditionControl => "Review control of the underlying condition.",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub alert_id: Uuid,
    pub action: RecommendedAction,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    pub overall_risk_score: f64,
    pub risk_level: RiskLevel,
    pub requires_immediate_action: bool,
    /// Highest risk first; ties go to the older alert.
    pub prioritized_alert_ids: Vec<Uuid>,
    pub recommendations: Vec<Recommendation>,
}

/// Session-level risk view over the active alerts in `alerts`.
/// Suppressed and resolved alerts are ignored.
pub fn summarize(alerts: &[ClinicalAlert]) -> RiskSummary {
    let mut active: Vec<&ClinicalAlert> = alerts.iter().filter(|a| a.is_active()).collect();
    active.sort_by(|a, b| {
        b.risk_score
            .total_cmp(&a.risk_score)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });

    let overall_risk_score = active.first().map_or(0.0, |a| a.risk_score);

    let recommendations = active
        .iter()
        .filter(|a| a.priority == AlertPriority::Critical)
        .map(|a| {
            let action = RecommendedAction::for_alert_type(a.alert_type());
            Recommendation {
                alert_id: a.id,
                action,
                description: action.description().to_string(),
            }
        })
        .collect();

    RiskSummary {
        overall_risk_score,
        risk_level: RiskLevel::from_score(overall_risk_score),
        requires_immediate_action: active.iter().any(|a| a.action_required),
        prioritized_alert_ids: active.iter().map(|a| a.id).collect(),
        recommendations,
    }
}
