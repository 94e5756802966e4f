use std::time::Instant;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::models::PatientContext;

use super::catalog::TriggerCatalog;
use super::dedup::retain_new;
use super::evaluation::evaluate;
use super::export::AuditExport;
use super::extraction::truncate_chars;
use super::insights::{summarize, RiskSummary};
use super::scanner::scan;
use super::store::AlertStore;
use super::suppression::SuppressionEvaluator;
use super::types::{
    AlertError, AlertStats, AnalysisResult, ClinicalAlert, ClinicalAlertEngine,
};

/// Default implementation of the clinical alert engine.
/// One instance per patient session: scan, evaluate, dedupe, suppress, store.
pub struct DefaultAlertEngine {
    pub(crate) store: AlertStore,
    pub(crate) catalog: TriggerCatalog,
    pub(crate) config: EngineConfig,
    pub(crate) suppressor: SuppressionEvaluator,
}

impl DefaultAlertEngine {
    /// Validates `config` before accepting it.
    pub fn new(catalog: TriggerCatalog, config: EngineConfig) -> Result<Self, AlertError> {
        Self::with_suppressor(catalog, config, SuppressionEvaluator::standard())
    }

    pub fn with_suppressor(
        catalog: TriggerCatalog,
        config: EngineConfig,
        suppressor: SuppressionEvaluator,
    ) -> Result<Self, AlertError> {
        config.validate()?;
        tracing::info!(
            rules = catalog.len(),
            suppression_rules = ?suppressor.rule_names(),
            dedup_window_secs = config.dedup_window_secs,
            "Alert engine ready"
        );
        Ok(Self {
            store: AlertStore::new(),
            catalog,
            config,
            suppressor,
        })
    }

    /// Built-in catalog and default configuration.
    pub fn standard() -> Self {
        Self {
            store: AlertStore::new(),
            catalog: TriggerCatalog::standard(),
            config: EngineConfig::default(),
            suppressor: SuppressionEvaluator::standard(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TriggerCatalog {
        &self.catalog
    }

    /// Analyze with an explicit analysis time. All alerts from this call
    /// carry `now` as their timestamp.
    pub fn analyze_at(
        &self,
        transcript: &str,
        context: &PatientContext,
        now: DateTime<Utc>,
    ) -> Result<AnalysisResult, AlertError> {
        let start = Instant::now();

        let max_chars = self.config.max_transcript_chars;
        let text = truncate_chars(transcript, max_chars);
        if text.len() < transcript.len() {
            tracing::warn!(
                max_chars,
                original_bytes = transcript.len(),
                "Transcript truncated before scanning"
            );
        }

        let candidates = scan(text, &self.catalog);
        let candidate_count = candidates.len();
        let evaluated = evaluate(candidates, text, context, &self.catalog, &self.config, now);
        let evaluated_count = evaluated.len();

        // Held across dedupe, suppression and insert.
        let mut stored = self.store.write()?;
        let (fresh, duplicates) = retain_new(evaluated, &stored, self.config.dedup_window());
        let outcome = self.suppressor.apply(fresh, context);
        let suppressed = outcome.suppressed.len();

        stored.extend(outcome.retained.iter().cloned());
        stored.extend(outcome.suppressed);
        drop(stored);

        let processing_time_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            candidates = candidate_count,
            evaluated = evaluated_count,
            duplicates,
            suppressed,
            stored = outcome.retained.len(),
            processing_ms = processing_time_ms,
            "Transcript analysis complete"
        );

        Ok(AnalysisResult {
            alerts: outcome.retained,
            suppressed,
            duplicates,
            processing_time_ms,
        })
    }

    pub fn acknowledged_alerts(&self) -> Result<Vec<ClinicalAlert>, AlertError> {
        self.store.acknowledged()
    }

    pub fn overridden_alerts(&self) -> Result<Vec<ClinicalAlert>, AlertError> {
        self.store.overridden()
    }

    pub fn suppressed_alerts(&self) -> Result<Vec<ClinicalAlert>, AlertError> {
        self.store.suppressed()
    }

    pub fn get_alert(&self, alert_id: &Uuid) -> Result<Option<ClinicalAlert>, AlertError> {
        self.store.get(alert_id)
    }

    /// Risk summary over the currently active alerts.
    pub fn risk_summary(&self) -> Result<RiskSummary, AlertError> {
        Ok(summarize(&self.store.active()?))
    }

    pub fn export(&self) -> Result<AuditExport, AlertError> {
        self.store.export(Utc::now())
    }

    pub fn restore(&self, export: AuditExport) -> Result<(), AlertError> {
        self.store.restore(export)
    }
}

impl ClinicalAlertEngine for DefaultAlertEngine {
    fn analyze(
        &self,
        transcript: &str,
        context: &PatientContext,
    ) -> Result<AnalysisResult, AlertError> {
        self.analyze_at(transcript, context, Utc::now())
    }

    fn active_alerts(&self) -> Result<Vec<ClinicalAlert>, AlertError> {
        self.store.active()
    }

    fn all_alerts(&self) -> Result<Vec<ClinicalAlert>, AlertError> {
        self.store.all()
    }

    fn acknowledge(&self, alert_id: &Uuid, user_id: Option<&str>) -> Result<(), AlertError> {
        self.store.acknowledge(alert_id, user_id)
    }

    fn override_alert(
        &self,
        alert_id: &Uuid,
        comment: &str,
        user_id: Option<&str>,
    ) -> Result<(), AlertError> {
        self.store.override_alert(alert_id, comment, user_id)
    }

    fn stats(&self) -> Result<AlertStats, AlertError> {
        self.store.stats()
    }

    fn clear_all(&self) -> Result<(), AlertError> {
        self.store.clear_all()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{Duration, NaiveDate, TimeZone};

    use super::*;
    use crate::config::ConfigError;
    use crate::intelligence::types::{AlertPriority, AlertSeverity, AlertState};
    use crate::models::enums::{AlertType, ClinicalStatus, MedicationStatus};
    use crate::models::{ContextCondition, ContextMedication};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 14, 0, 0).unwrap()
    }

    fn condition(code: &str, display: &str, status: ClinicalStatus) -> ContextCondition {
        ContextCondition {
            code: code.into(),
            display: display.into(),
            clinical_status: status,
            onset_date: None,
        }
    }

    fn med(name: &str, status: MedicationStatus, prescribed: NaiveDate) -> ContextMedication {
        ContextMedication {
            name: name.into(),
            status,
            category: "test".into(),
            prescribed_date: prescribed,
        }
    }

    /// Repeating a phrase inside the window stores one alert.
    #[test]
    fn duplicate_burst_collapses() {
        let engine = DefaultAlertEngine::standard();
        let ctx = PatientContext::default();

        let first = engine.analyze_at("Concern for sepsis.", &ctx, t0()).unwrap();
        assert_eq!(first.alerts.len(), 1);

        for secs in [1, 5, 29] {
            let again = engine
                .analyze_at("Still worried about sepsis.", &ctx, t0() + Duration::seconds(secs))
                .unwrap();
            assert!(again.alerts.is_empty());
            assert_eq!(again.duplicates, 1);
        }
        assert_eq!(engine.all_alerts().unwrap().len(), 1);

        let later = engine
            .analyze_at("Sepsis again.", &ctx, t0() + Duration::seconds(31))
            .unwrap();
        assert_eq!(later.alerts.len(), 1);
        assert_eq!(engine.all_alerts().unwrap().len(), 2);
    }

    #[test]
    fn duplicate_of_resolved_alert_still_dropped() {
        let engine = DefaultAlertEngine::standard();
        let ctx = PatientContext::default();
        let first = engine.analyze_at("Sepsis suspected.", &ctx, t0()).unwrap();
        engine.acknowledge(&first.alerts[0].id, None).unwrap();

        let again = engine
            .analyze_at("Sepsis suspected.", &ctx, t0() + Duration::seconds(10))
            .unwrap();
        assert!(again.alerts.is_empty());
        assert!(engine.active_alerts().unwrap().is_empty());
    }

    /// BP 190/120 only alerts for a hypertensive patient.
    #[test]
    fn blood_pressure_context_gating() {
        let text = "Blood pressure today is 190/120.";

        let engine = DefaultAlertEngine::standard();
        let none = engine.analyze_at(text, &PatientContext::default(), t0()).unwrap();
        assert!(none.alerts.is_empty());

        let ctx = PatientContext {
            active_conditions: vec![condition("I10", "Hypertension", ClinicalStatus::Active)],
            ..Default::default()
        };
        let engine = DefaultAlertEngine::standard();
        let result = engine.analyze_at(text, &ctx, t0()).unwrap();
        assert_eq!(result.alerts.len(), 1);
        let alert = &result.alerts[0];
        assert_eq!(alert.alert_type(), AlertType::VitalSign);
        assert_eq!(alert.priority, AlertPriority::Critical);
        assert!(alert.risk_score >= 0.8);
    }

    /// Suppressed alerts are kept for audit but never active.
    #[test]
    fn suppression_preserves_audit_trail() {
        let engine = DefaultAlertEngine::standard();
        let ctx = PatientContext {
            active_conditions: vec![condition("J18", "Pneumonia", ClinicalStatus::Resolved)],
            ..Default::default()
        };

        let result = engine
            .analyze_at("Sepsis from pneumonia was considered.", &ctx, t0())
            .unwrap();
        assert!(result.alerts.is_empty());
        assert_eq!(result.suppressed, 1);

        assert!(engine.active_alerts().unwrap().is_empty());
        let all = engine.all_alerts().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].state(), AlertState::Suppressed);
        let records = all[0].suppression_rules.as_ref().unwrap();
        assert_eq!(records[0].condition, "Pneumonia");
        assert_eq!(records[0].reason, "resolved_condition");

        assert!(matches!(
            engine.acknowledge(&all[0].id, None),
            Err(AlertError::AlertSuppressed(_))
        ));
    }

    #[test]
    fn unrelated_resolved_condition_does_not_suppress() {
        let engine = DefaultAlertEngine::standard();
        let ctx = PatientContext {
            active_conditions: vec![condition("J45", "Asthma", ClinicalStatus::Resolved)],
            ..Default::default()
        };
        let result = engine
            .analyze_at("Patient in septic shock. Childhood asthma noted in history.", &ctx, t0())
            .unwrap();
        assert_eq!(result.suppressed, 0);
        assert_eq!(result.alerts.len(), 1);
        assert_eq!(result.alerts[0].alert_type(), AlertType::Sepsis);
        assert_eq!(result.alerts[0].severity(), AlertSeverity::Critical);
        assert_eq!(engine.active_alerts().unwrap().len(), 1);
    }

    #[test]
    fn unrelated_inactive_medication_does_not_suppress_interaction() {
        let engine = DefaultAlertEngine::standard();
        let today = t0().date_naive();
        let ctx = PatientContext {
            active_medications: vec![
                med("Warfarin", MedicationStatus::Active, today - Duration::days(1)),
                med("Aspirin", MedicationStatus::Active, today - Duration::days(20)),
                med("Ibuprofen", MedicationStatus::Inactive, today - Duration::days(45)),
            ],
            ..Default::default()
        };
        let result = engine
            .analyze_at(
                "Prescribing warfarin 5mg daily. Patient already taking aspirin 81mg. \
                 Ibuprofen was stopped last month.",
                &ctx,
                t0(),
            )
            .unwrap();
        assert_eq!(result.suppressed, 0);
        assert_eq!(result.alerts.len(), 1);
        assert_eq!(result.alerts[0].alert_type(), AlertType::MedicationConflict);
        assert_eq!(result.alerts[0].risk_score, 0.95);
    }

    #[test]
    fn stale_inactive_entry_does_not_suppress_active_one() {
        let engine = DefaultAlertEngine::standard();
        let today = t0().date_naive();
        let ctx = PatientContext {
            active_medications: vec![
                med("Aspirin", MedicationStatus::Inactive, today - Duration::days(400)),
                med("Warfarin", MedicationStatus::Active, today - Duration::days(1)),
                med("Aspirin", MedicationStatus::Active, today - Duration::days(5)),
            ],
            ..Default::default()
        };
        let result = engine
            .analyze_at(
                "Prescribing warfarin 5mg daily. Patient already taking aspirin 81mg.",
                &ctx,
                t0(),
            )
            .unwrap();
        assert_eq!(result.suppressed, 0);
        let conflicts: Vec<_> = result
            .alerts
            .iter()
            .filter(|a| a.alert_type() == AlertType::MedicationConflict)
            .collect();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].priority, AlertPriority::Critical);
    }

    #[test]
    fn lifecycle_is_exclusive() {
        let engine = DefaultAlertEngine::standard();
        let result = engine
            .analyze_at("Sepsis and anaphylaxis noted.", &PatientContext::default(), t0())
            .unwrap();
        let (a, b) = (result.alerts[0].id, result.alerts[1].id);

        engine.acknowledge(&a, Some("rn-4")).unwrap();
        engine.override_alert(&b, "Reviewed with attending", Some("md-2")).unwrap();

        assert!(engine.override_alert(&a, "x", None).is_err());
        assert!(engine.acknowledge(&b, None).is_err());

        for alert in engine.all_alerts().unwrap() {
            assert!(!(alert.is_acknowledged && alert.is_overridden));
        }
        assert_eq!(engine.acknowledged_alerts().unwrap().len(), 1);
        assert_eq!(engine.overridden_alerts().unwrap().len(), 1);
        assert!(engine.active_alerts().unwrap().is_empty());
    }

    #[test]
    fn override_without_comment_rejected() {
        let engine = DefaultAlertEngine::standard();
        let result = engine
            .analyze_at("Sepsis.", &PatientContext::default(), t0())
            .unwrap();
        let id = result.alerts[0].id;
        assert!(matches!(
            engine.override_alert(&id, "", None),
            Err(AlertError::EmptyOverrideComment)
        ));
        assert!(engine.get_alert(&id).unwrap().unwrap().is_active());
    }

    #[test]
    fn warfarin_aspirin_example() {
        let engine = DefaultAlertEngine::standard();
        let today = t0().date_naive();
        let ctx = PatientContext {
            active_medications: vec![
                med("Warfarin", MedicationStatus::Active, today - Duration::days(1)),
                med("Aspirin", MedicationStatus::Active, today - Duration::days(20)),
            ],
            ..Default::default()
        };

        let result = engine
            .analyze_at(
                "Prescribing warfarin 5mg daily. Patient already taking aspirin 81mg.",
                &ctx,
                t0(),
            )
            .unwrap();

        let conflicts: Vec<_> = result
            .alerts
            .iter()
            .filter(|a| a.alert_type() == AlertType::MedicationConflict)
            .collect();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].risk_score, 0.95);
        assert_eq!(conflicts[0].priority, AlertPriority::Critical);
        assert!(conflicts[0].action_required);
    }

    #[test]
    fn inactive_medication_suppresses_reported_interaction() {
        let engine = DefaultAlertEngine::standard();
        let ctx = PatientContext {
            active_medications: vec![med(
                "Ibuprofen 400mg",
                MedicationStatus::Inactive,
                NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            )],
            ..Default::default()
        };
        let result = engine
            .analyze_at("Possible drug interaction with ibuprofen.", &ctx, t0())
            .unwrap();
        assert!(result.alerts.is_empty());
        assert_eq!(result.suppressed, 1);
        let suppressed = engine.suppressed_alerts().unwrap();
        assert_eq!(
            suppressed[0].suppression_rules.as_ref().unwrap()[0].reason,
            "inactive_medication"
        );
    }

    #[test]
    fn stats_partition_active_alerts() {
        let engine = DefaultAlertEngine::standard();
        engine
            .analyze_at(
                "Sepsis risk. Allergic reaction last week. Possible double dose. Contraindicated with renal failure.",
                &PatientContext::default(),
                t0(),
            )
            .unwrap();

        let stats = engine.stats().unwrap();
        assert_eq!(stats.critical, 2);
        assert_eq!(stats.caution, 2);
        assert_eq!(stats.total, stats.critical + stats.caution);
        assert_eq!(stats.total, engine.active_alerts().unwrap().len());

        let id = engine.active_alerts().unwrap()[0].id;
        engine.acknowledge(&id, None).unwrap();
        let stats = engine.stats().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.total, stats.critical + stats.caution);
    }

    #[test]
    fn ids_are_unique() {
        let engine = DefaultAlertEngine::standard();
        let ctx = PatientContext::default();
        for (i, text) in ["Sepsis.", "Anaphylaxis.", "Overdose.", "Contraindicated."]
            .iter()
            .enumerate()
        {
            engine
                .analyze_at(text, &ctx, t0() + Duration::seconds(i as i64))
                .unwrap();
        }
        let all = engine.all_alerts().unwrap();
        let ids: HashSet<Uuid> = all.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), all.len());
    }

    #[test]
    fn critical_severity_carries_high_risk() {
        let engine = DefaultAlertEngine::standard();
        engine
            .analyze_at(
                "Septic shock. Anaphylaxis to latex. Overdose suspected.",
                &PatientContext::default(),
                t0(),
            )
            .unwrap();
        for alert in engine.all_alerts().unwrap() {
            if alert.severity() == AlertSeverity::Critical {
                assert!(alert.risk_score >= 0.8);
            }
        }
    }

    #[test]
    fn export_round_trip_is_byte_identical() {
        let engine = DefaultAlertEngine::standard();
        let ctx = PatientContext {
            active_conditions: vec![condition("I10", "Hypertension", ClinicalStatus::Active)],
            ..Default::default()
        };
        let result = engine
            .analyze_at("BP 185/95. Sepsis considered.", &ctx, t0())
            .unwrap();
        engine.acknowledge(&result.alerts[0].id, Some("rn-1")).unwrap();

        let json = engine.export().unwrap().to_json().unwrap();
        let parsed = AuditExport::from_json(&json).unwrap();
        assert_eq!(parsed.to_json().unwrap(), json);

        let replay = DefaultAlertEngine::standard();
        replay.restore(parsed).unwrap();
        assert_eq!(replay.all_alerts().unwrap(), engine.all_alerts().unwrap());
    }

    #[test]
    fn long_transcript_truncated() {
        let mut config = EngineConfig::default();
        config.max_transcript_chars = 50;
        let engine = DefaultAlertEngine::new(TriggerCatalog::standard(), config).unwrap();

        let text = format!("{} sepsis", "a".repeat(60));
        let result = engine.analyze_at(&text, &PatientContext::default(), t0()).unwrap();
        assert!(result.alerts.is_empty());
    }

    #[test]
    fn empty_transcript_no_alerts() {
        let engine = DefaultAlertEngine::standard();
        let result = engine.analyze_at("  ", &PatientContext::default(), t0()).unwrap();
        assert!(result.alerts.is_empty());
        assert_eq!(result.duplicates, 0);
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.risk.interaction = 0.5;
        assert!(matches!(
            DefaultAlertEngine::new(TriggerCatalog::standard(), config),
            Err(AlertError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn clear_all_resets_session() {
        let engine = DefaultAlertEngine::standard();
        engine.analyze_at("Sepsis.", &PatientContext::default(), t0()).unwrap();
        engine.clear_all().unwrap();
        assert!(engine.all_alerts().unwrap().is_empty());

        // Dedup history is gone with the alerts.
        let again = engine
            .analyze_at("Sepsis.", &PatientContext::default(), t0() + Duration::seconds(1))
            .unwrap();
        assert_eq!(again.alerts.len(), 1);
    }

    #[test]
    fn risk_summary_over_active() {
        let engine = DefaultAlertEngine::standard();
        engine
            .analyze_at("Possible double dose. Sepsis.", &PatientContext::default(), t0())
            .unwrap();
        let summary = engine.risk_summary().unwrap();
        assert_eq!(summary.overall_risk_score, 0.9);
        assert!(summary.requires_immediate_action);
        assert_eq!(summary.prioritized_alert_ids.len(), 2);
    }
}
