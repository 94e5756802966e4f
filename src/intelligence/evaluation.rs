use chrono::{DateTime, Utc};

use crate::config::{EngineConfig, ThresholdDirection, ThresholdLevel, VitalParameter, VitalThreshold};
use crate::models::{ContextCondition, ContextMedication, PatientContext};

use super::catalog::{ContextGate, MarkerThreshold, TriggerCatalog, VitalMeasure};
use super::extraction::{blood_pressure_pairs, first_plausible, labeled_values};
use super::messages::MessageTemplates;
use super::types::{
    AlertPriority, AlertSeverity, CandidateAlert, ClinicalAlert, ContextualFactors, Evidence,
    MeasuredValue, VitalFactor,
};

/// How a candidate fared against the patient context.
struct Assessment {
    priority: AlertPriority,
    risk_score: f64,
    /// Replaces the rule's severity (threshold-scored alerts).
    severity: Option<AlertSeverity>,
    /// Replaces the rule's message with one naming the corroborating data.
    message: Option<String>,
    evidence: Option<Evidence>,
    /// Condition or medications that gated the alert, recorded as factors.
    gate_condition: Option<String>,
    gate_medications: Vec<String>,
}

impl Assessment {
    fn context_free(severity: AlertSeverity, config: &EngineConfig) -> Self {
        let risk_score = match severity {
            AlertSeverity::Critical => config.risk.default_critical,
            AlertSeverity::Caution => config.risk.default_caution,
        };
        Self {
            priority: severity.into(),
            risk_score,
            severity: None,
            message: None,
            evidence: None,
            gate_condition: None,
            gate_medications: Vec::new(),
        }
    }
}

/// Turn scanner candidates into scored alerts.
///
/// Context-gated candidates whose context or readings do not corroborate them
/// are dropped here. Every surviving alert is stamped with `now`.
pub fn evaluate(
    candidates: Vec<CandidateAlert>,
    transcript: &str,
    ctx: &PatientContext,
    catalog: &TriggerCatalog,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Vec<ClinicalAlert> {
    let lowered = transcript.to_lowercase();
    let mut alerts = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let Some(rule) = catalog.get(&candidate.rule_id) else {
            tracing::debug!(rule = %candidate.rule_id, "Candidate from unknown rule, dropped");
            continue;
        };

        let assessment = match &rule.gate {
            ContextGate::None => Some(Assessment::context_free(rule.severity, config)),
            ContextGate::Vital {
                measure,
                condition_terms,
            } => assess_vital(
                *measure,
                condition_terms,
                &rule.keywords,
                transcript,
                ctx,
                config,
            ),
            ContextGate::Interaction {
                primary,
                interacting,
            } => assess_interaction(primary, interacting, &rule.message, ctx, config, now),
            ContextGate::Condition {
                condition_terms,
                markers,
            } => assess_condition(rule.severity, condition_terms, markers, transcript, ctx, config),
        };

        let Some(assessment) = assessment else {
            tracing::debug!(rule = %rule.id, "Context did not corroborate candidate, dropped");
            continue;
        };

        let mut factors = enrich(&lowered, ctx, &rule.gate);
        if let ContextGate::None = rule.gate {
            let excerpt = candidate.core.context.to_lowercase();
            factors.medications = medications_named(&excerpt, ctx);
            factors.active_conditions = conditions_named(&excerpt, ctx);
        }
        if let Some(condition) = &assessment.gate_condition {
            push_unique(&mut factors.active_conditions, condition);
        }
        for name in &assessment.gate_medications {
            push_unique(&mut factors.medications, name);
        }
        factors.evidence = assessment.evidence;

        let contextual_factors = match rule.gate {
            ContextGate::None if factors.is_empty() => None,
            _ => Some(factors),
        };

        let mut alert = ClinicalAlert::from_candidate(
            candidate,
            assessment.priority,
            assessment.risk_score,
            contextual_factors,
            now,
        );
        if let Some(severity) = assessment.severity {
            alert.core.severity = severity;
        }
        if let Some(message) = assessment.message {
            alert.core.message = message;
        }
        alerts.push(alert);
    }

    alerts
}

// ---------------------------------------------------------------------------
// Vital rules
// ---------------------------------------------------------------------------

fn assess_vital(
    measure: VitalMeasure,
    condition_terms: &[String],
    labels: &[String],
    transcript: &str,
    ctx: &PatientContext,
    config: &EngineConfig,
) -> Option<Assessment> {
    let condition = ctx.active_condition_matching(condition_terms)?;

    let (level, message, values) = match measure {
        VitalMeasure::BloodPressure => assess_blood_pressure(transcript, condition, config)?,
        VitalMeasure::HeartRate => {
            assess_single_vital(VitalParameter::HeartRate, labels, transcript, condition, config)?
        }
        VitalMeasure::OxygenSaturation => assess_single_vital(
            VitalParameter::OxygenSaturation,
            labels,
            transcript,
            condition,
            config,
        )?,
    };

    let risk_score = match level {
        ThresholdLevel::Critical => config.risk.threshold_critical,
        ThresholdLevel::Warning => config.risk.threshold_warning,
    };
    let severity = match level {
        ThresholdLevel::Critical => AlertSeverity::Critical,
        ThresholdLevel::Warning => AlertSeverity::Caution,
    };

    Some(Assessment {
        priority: level.into(),
        risk_score,
        severity: Some(severity),
        message: Some(message),
        evidence: Some(Evidence::VitalReading {
            measure: measure.as_str().to_string(),
            values,
            threshold_level: level,
        }),
        gate_condition: Some(condition.display.clone()),
        gate_medications: Vec::new(),
    })
}

fn assess_blood_pressure(
    transcript: &str,
    condition: &ContextCondition,
    config: &EngineConfig,
) -> Option<(ThresholdLevel, String, Vec<MeasuredValue>)> {
    let systolic = config.threshold_for(VitalParameter::Systolic)?;
    let diastolic = config.threshold_for(VitalParameter::Diastolic)?;

    let (sys, dia) = blood_pressure_pairs(transcript)
        .into_iter()
        .find(|(s, d)| systolic.is_plausible(*s) && diastolic.is_plausible(*d))?;

    // The worse of the two readings decides the level.
    let level = systolic.classify(sys).max(diastolic.classify(dia))?;

    let message = MessageTemplates::blood_pressure(
        sys,
        dia,
        level,
        systolic.value_for(level),
        diastolic.value_for(level),
        &condition.display,
    );
    let values = vec![
        MeasuredValue {
            parameter: VitalParameter::Systolic,
            value: sys,
        },
        MeasuredValue {
            parameter: VitalParameter::Diastolic,
            value: dia,
        },
    ];
    Some((level, message, values))
}

/// The reading may be labeled with any of the rule's keywords; labels are
/// tried in table order.
fn assess_single_vital(
    parameter: VitalParameter,
    labels: &[String],
    transcript: &str,
    condition: &ContextCondition,
    config: &EngineConfig,
) -> Option<(ThresholdLevel, String, Vec<MeasuredValue>)> {
    let threshold = config.threshold_for(parameter)?;
    let value = labels.iter().find_map(|label| {
        first_plausible(
            &labeled_values(transcript, label),
            threshold.plausible_min,
            threshold.plausible_max,
        )
    })?;
    let level = threshold.classify(value)?;

    let message = MessageTemplates::vital(
        display_name(parameter),
        value,
        parameter.unit(),
        comparison(threshold),
        level,
        threshold.value_for(level),
        &condition.display,
    );
    Some((level, message, vec![MeasuredValue { parameter, value }]))
}

fn display_name(parameter: VitalParameter) -> &'static str {
    match parameter {
        VitalParameter::Systolic => "Systolic pressure",
        VitalParameter::Diastolic => "Diastolic pressure",
        VitalParameter::HeartRate => "Heart rate",
        VitalParameter::OxygenSaturation => "Oxygen saturation",
    }
}

fn comparison(threshold: &VitalThreshold) -> &'static str {
    match threshold.direction {
        ThresholdDirection::Above => "at or above",
        ThresholdDirection::Below => "at or below",
    }
}

// ---------------------------------------------------------------------------
// Interaction rules
// ---------------------------------------------------------------------------

/// Days from prescription to the analysis date, inside [0, lookback].
fn prescribed_within(med: &ContextMedication, now: DateTime<Utc>, lookback_days: i64) -> bool {
    let days = (now.date_naive() - med.prescribed_date).num_days();
    (0..=lookback_days).contains(&days)
}

fn find_recent_active<'a>(
    ctx: &'a PatientContext,
    terms: &[String],
    now: DateTime<Utc>,
    lookback_days: i64,
    exclude: Option<&ContextMedication>,
) -> Option<&'a ContextMedication> {
    ctx.active_medications.iter().find(|m| {
        m.is_active()
            && prescribed_within(m, now, lookback_days)
            && terms.iter().any(|t| m.matches_term(t))
            && exclude.map_or(true, |other| !std::ptr::eq(*m, other))
    })
}

fn assess_interaction(
    primary_terms: &[String],
    interacting_terms: &[String],
    rule_message: &str,
    ctx: &PatientContext,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Option<Assessment> {
    let lookback = config.interaction_lookback_days;
    let primary = find_recent_active(ctx, primary_terms, now, lookback, None)?;
    let interacting = find_recent_active(ctx, interacting_terms, now, lookback, Some(primary))?;

    Some(Assessment {
        priority: AlertPriority::Critical,
        risk_score: config.risk.interaction,
        severity: Some(AlertSeverity::Critical),
        message: Some(MessageTemplates::interaction(
            &primary.name,
            &interacting.name,
            lookback,
            rule_message,
        )),
        evidence: Some(Evidence::DrugInteraction {
            primary: primary.name.clone(),
            interacting: interacting.name.clone(),
            lookback_days: lookback,
        }),
        gate_condition: None,
        gate_medications: vec![primary.name.clone(), interacting.name.clone()],
    })
}

// ---------------------------------------------------------------------------
// Diagnosis rules
// ---------------------------------------------------------------------------

fn assess_condition(
    severity: AlertSeverity,
    condition_terms: &[String],
    markers: &[MarkerThreshold],
    transcript: &str,
    ctx: &PatientContext,
    config: &EngineConfig,
) -> Option<Assessment> {
    let condition = ctx.active_condition_matching(condition_terms)?;

    let (marker, value) = markers.iter().find_map(|marker| {
        let value = first_plausible(
            &labeled_values(transcript, &marker.label),
            marker.plausible_min,
            marker.plausible_max,
        )?;
        (value > marker.above).then_some((marker, value))
    })?;

    Some(Assessment {
        priority: severity.into(),
        risk_score: config.risk.uncontrolled_condition,
        severity: None,
        message: Some(MessageTemplates::uncontrolled_condition(
            &condition.display,
            &marker.label,
            value,
            marker.above,
        )),
        evidence: Some(Evidence::ConditionMarker {
            condition: condition.display.clone(),
            label: marker.label.clone(),
            value,
            threshold: marker.above,
        }),
        gate_condition: Some(condition.display.clone()),
        gate_medications: Vec::new(),
    })
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// Medications whose name (first word) appears in `lowered`. Any status.
fn medications_named(lowered: &str, ctx: &PatientContext) -> Vec<String> {
    let mut names = Vec::new();
    for med in &ctx.active_medications {
        if med.primary_term().is_some_and(|term| lowered.contains(&term)) {
            push_unique(&mut names, &med.name);
        }
    }
    names
}

/// Conditions whose display appears in `lowered`. Any status.
fn conditions_named(lowered: &str, ctx: &PatientContext) -> Vec<String> {
    let mut displays = Vec::new();
    for condition in &ctx.active_conditions {
        let display = condition.display.trim().to_lowercase();
        if !display.is_empty() && lowered.contains(&display) {
            push_unique(&mut displays, &condition.display);
        }
    }
    displays
}

/// Context the whole transcript mentions. Informational only; suppression
/// never reads these lists.
fn enrich(lowered: &str, ctx: &PatientContext, gate: &ContextGate) -> ContextualFactors {
    let mut factors = ContextualFactors {
        mentioned_medications: medications_named(lowered, ctx),
        mentioned_conditions: conditions_named(lowered, ctx),
        ..Default::default()
    };

    for allergy in &ctx.allergies {
        let substance = allergy.substance.trim().to_lowercase();
        if !substance.is_empty() && lowered.contains(&substance) {
            push_unique(&mut factors.allergies, &allergy.substance);
        }
    }

    if let ContextGate::Vital { measure, .. } = gate {
        factors.vitals = ctx
            .recent_vitals
            .iter()
            .filter(|v| v.relates_to(measure.reading_terms()))
            .map(|v| VitalFactor {
                parameter: v.parameter.clone(),
                value: v.value,
                timestamp: v.timestamp,
                trend: v.trend,
            })
            .collect();
    }

    factors
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        list.push(value.to_string());
    }
}
