use crate::models::enums::AlertType;
use crate::models::PatientContext;

use super::types::{ClinicalAlert, SuppressionRecord};

pub const REASON_RESOLVED_CONDITION: &str = "resolved_condition";
pub const REASON_INACTIVE_MEDICATION: &str = "inactive_medication";

/// A check that can invalidate an alert given the patient context.
pub trait SuppressionRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, alert: &ClinicalAlert, ctx: &PatientContext) -> Option<SuppressionRecord>;
}

/// Suppress alerts that rest on a condition the problem list marks Resolved.
/// Only `contextualFactors.activeConditions` is read.
pub struct ResolvedConditionRule;

impl SuppressionRule for ResolvedConditionRule {
    fn name(&self) -> &'static str {
        REASON_RESOLVED_CONDITION
    }

    fn evaluate(&self, alert: &ClinicalAlert, ctx: &PatientContext) -> Option<SuppressionRecord> {
        let factors = alert.contextual_factors.as_ref()?;
        factors
            .active_conditions
            .iter()
            .find(|display| ctx.condition_resolved(display))
            .map(|display| SuppressionRecord {
                condition: display.clone(),
                reason: REASON_RESOLVED_CONDITION.to_string(),
            })
    }
}

/// Suppress medication-conflict alerts resting on a drug that is no longer
/// active. Only `contextualFactors.medications` is read.
pub struct InactiveMedicationRule;

impl SuppressionRule for InactiveMedicationRule {
    fn name(&self) -> &'static str {
        REASON_INACTIVE_MEDICATION
    }

    fn evaluate(&self, alert: &ClinicalAlert, ctx: &PatientContext) -> Option<SuppressionRecord> {
        if alert.alert_type() != AlertType::MedicationConflict {
            return None;
        }
        let factors = alert.contextual_factors.as_ref()?;
        factors
            .medications
            .iter()
            .find_map(|name| ctx.inactive_medication(name))
            .map(|med| SuppressionRecord {
                condition: med.name.clone(),
                reason: REASON_INACTIVE_MEDICATION.to_string(),
            })
    }
}

/// Alerts split by the suppression pass.
#[derive(Debug, Default)]
pub struct SuppressionOutcome {
    pub retained: Vec<ClinicalAlert>,
    /// Carry `suppression_rules`; stored for audit, never surfaced as active.
    pub suppressed: Vec<ClinicalAlert>,
}

/// Ordered set of suppression rules. Every rule runs on every alert and all
/// matching records are kept.
pub struct SuppressionEvaluator {
    rules: Vec<Box<dyn SuppressionRule>>,
}

impl SuppressionEvaluator {
    /// No rules: every alert is retained.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn standard() -> Self {
        Self::empty()
            .with_rule(ResolvedConditionRule)
            .with_rule(InactiveMedicationRule)
    }

    pub fn with_rule(mut self, rule: impl SuppressionRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn apply(&self, alerts: Vec<ClinicalAlert>, ctx: &PatientContext) -> SuppressionOutcome {
        let mut outcome = SuppressionOutcome::default();

        for mut alert in alerts {
            let records: Vec<SuppressionRecord> = self
                .rules
                .iter()
                .filter_map(|rule| rule.evaluate(&alert, ctx))
                .collect();

            if records.is_empty() {
                outcome.retained.push(alert);
                continue;
            }

            tracing::info!(
                alert_id = %alert.id,
                alert_type = alert.alert_type().as_str(),
                reasons = ?records.iter().map(|r| r.reason.as_str()).collect::<Vec<_>>(),
                "Alert suppressed"
            );
            alert.suppression_rules = Some(records);
            outcome.suppressed.push(alert);
        }

        outcome
    }
}

impl Default for SuppressionEvaluator {
    fn default() -> Self {
        Self::standard()
    }
}
