use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::enums::ResponseAction;

use super::types::{AlertError, AlertStats, ClinicalAlert};

/// Full alert history for audit, including suppressed and resolved alerts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditExport {
    pub exported_at: DateTime<Utc>,
    /// Insertion order.
    pub alerts: Vec<ClinicalAlert>,
    /// Counts over the alerts that were active at export time.
    pub stats: AlertStats,
}

impl AuditExport {
    pub fn new(alerts: Vec<ClinicalAlert>, exported_at: DateTime<Utc>) -> Self {
        let stats = AlertStats::from_alerts(alerts.iter().filter(|a| a.is_active()));
        Self {
            exported_at,
            alerts,
            stats,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, AlertError> {
        serde_json::to_string_pretty(self).map_err(|e| AlertError::Serialization(e.to_string()))
    }

    /// Parses and checks the alert invariants with [`AuditExport::validate`].
    pub fn from_json(json: &str) -> Result<Self, AlertError> {
        let export: Self =
            serde_json::from_str(json).map_err(|e| AlertError::Serialization(e.to_string()))?;
        export.validate()?;
        Ok(export)
    }

    /// Reject histories no engine session could have produced: repeated ids,
    /// alerts both acknowledged and overridden, resolved alerts whose
    /// `userResponse` is missing or disagrees with the flag, suppressed
    /// alerts that were acted on, and risk scores outside [0, 1].
    pub fn validate(&self) -> Result<(), AlertError> {
        let mut seen = HashSet::with_capacity(self.alerts.len());
        for alert in &self.alerts {
            let invalid = |reason: &str| Err(AlertError::InvalidExport(alert.id, reason.to_string()));

            if !seen.insert(alert.id) {
                return invalid("duplicate id");
            }
            if !(0.0..=1.0).contains(&alert.risk_score) {
                return invalid("risk score outside [0, 1]");
            }
            if alert.is_acknowledged && alert.is_overridden {
                return invalid("both acknowledged and overridden");
            }
            let resolved = alert.is_acknowledged || alert.is_overridden;
            if alert.suppression_rules.is_some() && resolved {
                return invalid("suppressed alert was acted on");
            }

            let expected = if alert.is_overridden {
                Some(ResponseAction::Override)
            } else if alert.is_acknowledged {
                Some(ResponseAction::Acknowledge)
            } else {
                None
            };
            match (expected, &alert.user_response) {
                (None, None) => {}
                (None, Some(_)) => return invalid("user response on an unresolved alert"),
                (Some(_), None) => return invalid("resolved without a user response"),
                (Some(action), Some(response)) if response.action != action => {
                    return invalid("user response does not match the resolved state")
                }
                (Some(ResponseAction::Override), Some(response))
                    if response.comment.as_deref().map_or(true, |c| c.trim().is_empty()) =>
                {
                    return invalid("override without a comment")
                }
                (Some(_), Some(_)) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::config::{ThresholdLevel, VitalParameter};
    use crate::intelligence::types::{
        AlertCore, AlertSeverity, CandidateAlert, ContextualFactors, Evidence, MeasuredValue,
        SuppressionRecord, UserResponse,
    };
    use crate::models::enums::{AlertType, ResponseAction};

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, secs).unwrap()
    }

    fn alert(alert_type: AlertType, severity: AlertSeverity, risk: f64) -> ClinicalAlert {
        ClinicalAlert::from_candidate(
            CandidateAlert {
                rule_id: "r".into(),
                core: AlertCore {
                    alert_type,
                    severity,
                    message: "Blood pressure 190/120 mmHg".into(),
                    source: "ACC/AHA".into(),
                    source_url: Some("https://example.org/guideline".into()),
                    detected_phrase: "blood pressure".into(),
                    context: "Blood pressure 190/120".into(),
                },
            },
            severity.into(),
            risk,
            None,
            at(0),
        )
    }

    fn history() -> Vec<ClinicalAlert> {
        let mut vital = alert(AlertType::VitalSign, AlertSeverity::Critical, 0.9);
        vital.contextual_factors = Some(ContextualFactors {
            active_conditions: vec!["Essential hypertension".into()],
            evidence: Some(Evidence::VitalReading {
                measure: "blood_pressure".into(),
                values: vec![
                    MeasuredValue {
                        parameter: VitalParameter::Systolic,
                        value: 190.0,
                    },
                    MeasuredValue {
                        parameter: VitalParameter::Diastolic,
                        value: 120.0,
                    },
                ],
                threshold_level: ThresholdLevel::Critical,
            }),
            ..Default::default()
        });

        let mut overridden = alert(AlertType::Sepsis, AlertSeverity::Critical, 0.9);
        overridden.is_overridden = true;
        overridden.user_response = Some(UserResponse {
            action: ResponseAction::Override,
            comment: Some("Lactate repeat normal".into()),
            timestamp: at(12),
            user_id: Some("dr-lee".into()),
        });

        let mut suppressed = alert(AlertType::MedicationConflict, AlertSeverity::Caution, 0.6);
        suppressed.suppression_rules = Some(vec![SuppressionRecord {
            condition: "Ibuprofen".into(),
            reason: "inactive_medication".into(),
        }]);

        vec![vital, overridden, suppressed, alert(AlertType::DosageError, AlertSeverity::Caution, 0.6)]
    }

    #[test]
    fn stats_count_active_only() {
        let export = AuditExport::new(history(), at(30));
        assert_eq!(
            export.stats,
            AlertStats {
                critical: 1,
                caution: 1,
                total: 2
            }
        );
        assert_eq!(export.alerts.len(), 4);
    }

    #[test]
    fn json_round_trip_is_byte_identical() {
        let export = AuditExport::new(history(), at(30));
        let json = export.to_json().unwrap();
        let parsed = AuditExport::from_json(&json).unwrap();
        assert_eq!(parsed, export);
        assert_eq!(parsed.to_json().unwrap(), json);
    }

    #[test]
    fn json_uses_wire_names() {
        let json = AuditExport::new(history(), at(30)).to_json().unwrap();
        assert!(json.contains("\"exportedAt\""));
        assert!(json.contains("\"riskScore\""));
        assert!(json.contains("\"suppressionRules\""));
        assert!(json.contains("\"kind\": \"vital_reading\""));
        assert!(json.contains("\"type\": \"medication_conflict\""));
    }

    fn export_json_with(alerts: serde_json::Value) -> String {
        let mut value = serde_json::to_value(AuditExport::new(Vec::new(), at(30))).unwrap();
        value["alerts"] = alerts;
        value.to_string()
    }

    #[test]
    fn repeated_id_rejected() {
        let alert = alert(AlertType::Sepsis, AlertSeverity::Critical, 0.9);
        let entry = serde_json::to_value(&alert).unwrap();
        let json = export_json_with(serde_json::json!([entry.clone(), entry]));
        match AuditExport::from_json(&json) {
            Err(AlertError::InvalidExport(id, reason)) => {
                assert_eq!(id, alert.id);
                assert_eq!(reason, "duplicate id");
            }
            other => panic!("Expected invalid export, got: {:?}", other),
        }
    }

    #[test]
    fn lifecycle_violations_rejected() {
        let mut both = serde_json::to_value(&history()[1]).unwrap();
        both["isAcknowledged"] = true.into();

        let mut no_response = serde_json::to_value(&alert(AlertType::Sepsis, AlertSeverity::Critical, 0.9)).unwrap();
        no_response["isAcknowledged"] = true.into();

        let mut acted_on = serde_json::to_value(&history()[2]).unwrap();
        acted_on["isOverridden"] = true.into();
        acted_on["userResponse"] = serde_json::to_value(&history()[1].user_response).unwrap();

        let mut wrong_action = serde_json::to_value(&history()[1]).unwrap();
        wrong_action["userResponse"]["action"] = "acknowledge".into();

        for entry in [both, no_response, acted_on, wrong_action] {
            let json = export_json_with(serde_json::json!([entry]));
            assert!(
                matches!(AuditExport::from_json(&json), Err(AlertError::InvalidExport(_, _))),
                "{json}"
            );
        }
    }

    #[test]
    fn consistent_history_validates() {
        AuditExport::new(history(), at(30)).validate().unwrap();
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            AuditExport::from_json("{\"alerts\": 3}"),
            Err(AlertError::Serialization(_))
        ));
    }
}
