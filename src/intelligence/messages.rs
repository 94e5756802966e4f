use crate::config::ThresholdLevel;

use super::extraction::format_value;

/// Message builder for context-corroborated alerts.
/// Plain clinical wording; every message names the value that fired it.
pub struct MessageTemplates;

impl MessageTemplates {
    /// Blood pressure pair over threshold.
    pub fn blood_pressure(
        systolic: f64,
        diastolic: f64,
        level: ThresholdLevel,
        systolic_threshold: f64,
        diastolic_threshold: f64,
        condition: &str,
    ) -> String {
        format!(
            "Blood pressure {}/{} mmHg is at or above the {} threshold ({}/{} mmHg) \
             for a patient with {}.",
            format_value(systolic),
            format_value(diastolic),
            level_word(level),
            format_value(systolic_threshold),
            format_value(diastolic_threshold),
            condition,
        )
    }

    /// Single vital over (or under) threshold.
    pub fn vital(
        label: &str,
        value: f64,
        unit: &str,
        comparison: &str,
        level: ThresholdLevel,
        threshold: f64,
        condition: &str,
    ) -> String {
        format!(
            "{} {} {} is {} the {} threshold ({} {}) for a patient with {}.",
            label,
            format_value(value),
            unit,
            comparison,
            level_word(level),
            format_value(threshold),
            unit,
            condition,
        )
    }

    /// Two active, recently prescribed drugs that interact.
    pub fn interaction(primary: &str, interacting: &str, lookback_days: i64, rule_message: &str) -> String {
        format!(
            "{} and {} are both active and prescribed within the last {} days. {}",
            primary, interacting, lookback_days, rule_message,
        )
    }

    /// Marker value above target for an active diagnosis.
    pub fn uncontrolled_condition(condition: &str, label: &str, value: f64, threshold: f64) -> String {
        format!(
            "{} of {} is above target ({}) for a patient with {}.",
            capitalize(label),
            format_value(value),
            format_value(threshold),
            condition,
        )
    }
}

fn level_word(level: ThresholdLevel) -> &'static str {
    match level {
        ThresholdLevel::Critical => "critical",
        ThresholdLevel::Warning => "warning",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
