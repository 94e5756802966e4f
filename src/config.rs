//! Engine configuration: dedup window, interaction lookback, risk scoring and
//! per-parameter vital thresholds.
//!
//! Every numeric policy the evaluator applies lives here rather than inline in
//! detection code. Defaults reproduce the documented clinical policy; a JSON
//! file may override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "clinical-alerts";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Repeat (type, phrase) pairs inside this window are dropped.
pub const DEFAULT_DEDUP_WINDOW_SECS: u64 = 30;

/// Upper bound accepted for `dedupWindowSecs` (one day).
pub const MAX_DEDUP_WINDOW_SECS: u64 = 86_400;

/// Interaction rules only consider prescriptions this recent.
pub const DEFAULT_INTERACTION_LOOKBACK_DAYS: i64 = 30;

/// Transcripts are truncated to this many characters before scanning.
pub const DEFAULT_MAX_TRANSCRIPT_CHARS: usize = 20_000;

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "clinical_alerts=info,warn"
}

// ═══════════════════════════════════════════════════════════
// Vital thresholds
// ═══════════════════════════════════════════════════════════

/// A single numeric vital parameter with its own threshold policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalParameter {
    Systolic,
    Diastolic,
    HeartRate,
    OxygenSaturation,
}

impl VitalParameter {
    pub fn as_str(self) -> &'static str {
        match self {
            VitalParameter::Systolic => "systolic",
            VitalParameter::Diastolic => "diastolic",
            VitalParameter::HeartRate => "heart_rate",
            VitalParameter::OxygenSaturation => "oxygen_saturation",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            VitalParameter::Systolic | VitalParameter::Diastolic => "mmHg",
            VitalParameter::HeartRate => "bpm",
            VitalParameter::OxygenSaturation => "%",
        }
    }
}

/// Whether readings become worse upward (BP, heart rate) or downward (SpO2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdDirection {
    Above,
    Below,
}

/// Outcome of comparing a reading against its thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdLevel {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalThreshold {
    pub parameter: VitalParameter,
    pub warning_value: f64,
    pub critical_value: f64,
    pub direction: ThresholdDirection,
    /// Readings at or below this are treated as extraction noise.
    pub plausible_min: f64,
    /// Readings at or above this are treated as extraction noise.
    pub plausible_max: f64,
}

impl VitalThreshold {
    /// Strict open interval (plausible_min, plausible_max).
    pub fn is_plausible(&self, value: f64) -> bool {
        value > self.plausible_min && value < self.plausible_max
    }

    /// `None` when the reading does not reach the warning value.
    pub fn classify(&self, value: f64) -> Option<ThresholdLevel> {
        let (critical, warning) = match self.direction {
            ThresholdDirection::Above => (value >= self.critical_value, value >= self.warning_value),
            ThresholdDirection::Below => (value <= self.critical_value, value <= self.warning_value),
        };
        if critical {
            Some(ThresholdLevel::Critical)
        } else if warning {
            Some(ThresholdLevel::Warning)
        } else {
            None
        }
    }

    /// The threshold value a given level corresponds to.
    pub fn value_for(&self, level: ThresholdLevel) -> f64 {
        match level {
            ThresholdLevel::Critical => self.critical_value,
            ThresholdLevel::Warning => self.warning_value,
        }
    }
}

fn default_vital_thresholds() -> Vec<VitalThreshold> {
    vec![
        VitalThreshold {
            parameter: VitalParameter::Systolic,
            warning_value: 140.0,
            critical_value: 180.0,
            direction: ThresholdDirection::Above,
            plausible_min: 70.0,
            plausible_max: 250.0,
        },
        VitalThreshold {
            parameter: VitalParameter::Diastolic,
            warning_value: 90.0,
            critical_value: 120.0,
            direction: ThresholdDirection::Above,
            plausible_min: 30.0,
            plausible_max: 150.0,
        },
        VitalThreshold {
            parameter: VitalParameter::HeartRate,
            warning_value: 110.0,
            critical_value: 130.0,
            direction: ThresholdDirection::Above,
            plausible_min: 25.0,
            plausible_max: 250.0,
        },
        VitalThreshold {
            parameter: VitalParameter::OxygenSaturation,
            warning_value: 92.0,
            critical_value: 88.0,
            direction: ThresholdDirection::Below,
            plausible_min: 50.0,
            plausible_max: 100.0,
        },
    ]
}

// ═══════════════════════════════════════════════════════════
// Risk scoring
// ═══════════════════════════════════════════════════════════

/// Fixed risk-score mapping. Critical-severity scores must stay >= 0.8.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RiskScoring {
    /// Vital reading at or beyond its critical threshold.
    pub threshold_critical: f64,
    /// Vital reading at or beyond its warning threshold.
    pub threshold_warning: f64,
    /// Corroborated drug-drug interaction.
    pub interaction: f64,
    /// Active diagnosis with an out-of-control marker.
    pub uncontrolled_condition: f64,
    /// Context-free rule with Critical severity.
    pub default_critical: f64,
    /// Context-free rule with Caution severity.
    pub default_caution: f64,
}

impl Default for RiskScoring {
    fn default() -> Self {
        Self {
            threshold_critical: 0.9,
            threshold_warning: 0.7,
            interaction: 0.95,
            uncontrolled_condition: 0.85,
            default_critical: 0.9,
            default_caution: 0.6,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// EngineConfig
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub dedup_window_secs: u64,
    pub interaction_lookback_days: i64,
    pub max_transcript_chars: usize,
    pub risk: RiskScoring,
    pub vital_thresholds: Vec<VitalThreshold>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dedup_window_secs: DEFAULT_DEDUP_WINDOW_SECS,
            interaction_lookback_days: DEFAULT_INTERACTION_LOOKBACK_DAYS,
            max_transcript_chars: DEFAULT_MAX_TRANSCRIPT_CHARS,
            risk: RiskScoring::default(),
            vital_thresholds: default_vital_thresholds(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config load failed ({0}): {1}")]
    Load(String, String),

    #[error("Config parse failed: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl EngineConfig {
    /// Load from a JSON file. Absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(path.display().to_string(), e.to_string()))?;
        let config: Self =
            serde_json::from_str(&json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;

        tracing::info!(
            path = %path.display(),
            dedup_window_secs = config.dedup_window_secs,
            lookback_days = config.interaction_lookback_days,
            "Engine config loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.risk;
        for (name, score) in [
            ("thresholdCritical", r.threshold_critical),
            ("thresholdWarning", r.threshold_warning),
            ("interaction", r.interaction),
            ("uncontrolledCondition", r.uncontrolled_condition),
            ("defaultCritical", r.default_critical),
            ("defaultCaution", r.default_caution),
        ] {
            if !(0.0..=1.0).contains(&score) {
                return Err(ConfigError::Invalid(format!(
                    "risk.{name} must be within [0, 1], got {score}"
                )));
            }
        }
        // Scores that can land on a Critical alert. Condition rules keep the
        // catalog's severity, which may be Critical.
        for (name, score) in [
            ("thresholdCritical", r.threshold_critical),
            ("interaction", r.interaction),
            ("uncontrolledCondition", r.uncontrolled_condition),
            ("defaultCritical", r.default_critical),
        ] {
            if score < 0.8 {
                return Err(ConfigError::Invalid(format!(
                    "risk.{name} scores critical alerts and must be >= 0.8, got {score}"
                )));
            }
        }

        if self.dedup_window_secs > MAX_DEDUP_WINDOW_SECS {
            return Err(ConfigError::Invalid(format!(
                "dedupWindowSecs must be <= {MAX_DEDUP_WINDOW_SECS}, got {}",
                self.dedup_window_secs
            )));
        }
        if self.max_transcript_chars == 0 {
            return Err(ConfigError::Invalid("maxTranscriptChars must be > 0".into()));
        }
        if self.interaction_lookback_days < 0 {
            return Err(ConfigError::Invalid(
                "interactionLookbackDays must not be negative".into(),
            ));
        }

        for t in &self.vital_thresholds {
            if t.plausible_min >= t.plausible_max {
                return Err(ConfigError::Invalid(format!(
                    "{}: plausible range is empty",
                    t.parameter.as_str()
                )));
            }
            let ordered = match t.direction {
                ThresholdDirection::Above => t.warning_value <= t.critical_value,
                ThresholdDirection::Below => t.warning_value >= t.critical_value,
            };
            if !ordered {
                return Err(ConfigError::Invalid(format!(
                    "{}: warning value is beyond the critical value",
                    t.parameter.as_str()
                )));
            }
        }
        Ok(())
    }

    pub fn threshold_for(&self, parameter: VitalParameter) -> Option<&VitalThreshold> {
        self.vital_thresholds.iter().find(|t| t.parameter == parameter)
    }

    pub fn dedup_window(&self) -> chrono::Duration {
        i64::try_from(self.dedup_window_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}
