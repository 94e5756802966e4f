use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{ConfigError, ThresholdLevel, VitalParameter};
use crate::models::enums::{AlertType, ResponseAction};
use crate::models::PatientContext;

// ---------------------------------------------------------------------------
// AlertSeverity / AlertPriority
// ---------------------------------------------------------------------------

/// Categorical severity declared by the trigger rule (or derived from a
/// threshold level for vital alerts).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Caution,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Caution => "caution",
            Self::Critical => "critical",
        }
    }
}

/// Priority after context scoring. May differ from severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Warning,
    Critical,
}

impl AlertPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl From<AlertSeverity> for AlertPriority {
    fn from(severity: AlertSeverity) -> Self {
        match severity {
            AlertSeverity::Critical => AlertPriority::Critical,
            AlertSeverity::Caution => AlertPriority::Warning,
        }
    }
}

impl From<ThresholdLevel> for AlertPriority {
    fn from(level: ThresholdLevel) -> Self {
        match level {
            ThresholdLevel::Critical => AlertPriority::Critical,
            ThresholdLevel::Warning => AlertPriority::Warning,
        }
    }
}

// ---------------------------------------------------------------------------
// AlertCore / CandidateAlert
// ---------------------------------------------------------------------------

/// Fields shared by a keyword candidate and a stored alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertCore {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// The keyword that matched.
    pub detected_phrase: String,
    /// The sentence (or leading excerpt) the keyword was found in.
    pub context: String,
}

/// Keyword hit from the scanner, not yet checked against patient context.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateAlert {
    /// Catalog rule that produced this candidate.
    pub rule_id: String,
    pub core: AlertCore,
}

// ---------------------------------------------------------------------------
// ContextualFactors
// ---------------------------------------------------------------------------

/// `medications` and `active_conditions` hold only the entries the alert rests
/// on: the gate's matches for context-gated rules, or what the triggering
/// sentence names for context-free ones. Suppression reads these two lists.
/// Other transcript mentions go to the `mentioned_*` lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextualFactors {
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub active_conditions: Vec<String>,
    #[serde(default)]
    pub mentioned_medications: Vec<String>,
    #[serde(default)]
    pub mentioned_conditions: Vec<String>,
    #[serde(default)]
    pub vitals: Vec<VitalFactor>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
}

impl ContextualFactors {
    pub fn is_empty(&self) -> bool {
        self.medications.is_empty()
            && self.active_conditions.is_empty()
            && self.mentioned_medications.is_empty()
            && self.mentioned_conditions.is_empty()
            && self.vitals.is_empty()
            && self.allergies.is_empty()
            && self.evidence.is_none()
    }
}

/// A recent vital reading that was relevant to the alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VitalFactor {
    pub parameter: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub trend: crate::models::enums::VitalTrend,
}

/// What corroborated a context-gated alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    VitalReading {
        measure: String,
        values: Vec<MeasuredValue>,
        #[serde(rename = "thresholdLevel")]
        threshold_level: ThresholdLevel,
    },
    DrugInteraction {
        primary: String,
        interacting: String,
        #[serde(rename = "lookbackDays")]
        lookback_days: i64,
    },
    ConditionMarker {
        condition: String,
        label: String,
        value: f64,
        threshold: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeasuredValue {
    pub parameter: VitalParameter,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Suppression / user response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuppressionRecord {
    /// The condition or medication that invalidated the alert.
    pub condition: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub action: ResponseAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

// ---------------------------------------------------------------------------
// ClinicalAlert
// ---------------------------------------------------------------------------

/// An alert produced by the pipeline and held in the session store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalAlert {
    pub id: Uuid,
    #[serde(flatten)]
    pub core: AlertCore,
    pub priority: AlertPriority,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contextual_factors: Option<ContextualFactors>,
    pub risk_score: f64,
    pub action_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppression_rules: Option<Vec<SuppressionRecord>>,
    pub is_acknowledged: bool,
    pub is_overridden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_response: Option<UserResponse>,
}

/// Lifecycle state derived from the alert's flags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    Active,
    Suppressed,
    Acknowledged,
    Overridden,
}

impl AlertState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suppressed => "suppressed",
            Self::Acknowledged => "acknowledged",
            Self::Overridden => "overridden",
        }
    }
}

impl std::fmt::Display for AlertState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ClinicalAlert {
    /// Promote a candidate into an alert with a fresh id.
    pub fn from_candidate(
        candidate: CandidateAlert,
        priority: AlertPriority,
        risk_score: f64,
        contextual_factors: Option<ContextualFactors>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            core: candidate.core,
            priority,
            timestamp,
            contextual_factors,
            risk_score,
            action_required: priority == AlertPriority::Critical,
            suppression_rules: None,
            is_acknowledged: false,
            is_overridden: false,
            user_response: None,
        }
    }

    pub fn state(&self) -> AlertState {
        if self.suppression_rules.is_some() {
            AlertState::Suppressed
        } else if self.is_overridden {
            AlertState::Overridden
        } else if self.is_acknowledged {
            AlertState::Acknowledged
        } else {
            AlertState::Active
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == AlertState::Active
    }

    pub fn alert_type(&self) -> AlertType {
        self.core.alert_type
    }

    pub fn severity(&self) -> AlertSeverity {
        self.core.severity
    }

    pub fn detected_phrase(&self) -> &str {
        &self.core.detected_phrase
    }
}

// ---------------------------------------------------------------------------
// AnalysisResult & AlertStats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Newly stored alerts that are active.
    pub alerts: Vec<ClinicalAlert>,
    /// Alerts stored as suppressed in this call.
    pub suppressed: usize,
    /// Candidates dropped as duplicates in this call.
    pub duplicates: usize,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AlertStats {
    pub critical: usize,
    pub caution: usize,
    pub total: usize,
}

impl AlertStats {
    pub fn from_alerts<'a>(alerts: impl IntoIterator<Item = &'a ClinicalAlert>) -> Self {
        let mut stats = Self::default();
        for alert in alerts {
            match alert.severity() {
                AlertSeverity::Critical => stats.critical += 1,
                AlertSeverity::Caution => stats.caution += 1,
            }
            stats.total += 1;
        }
        stats
    }
}

// ---------------------------------------------------------------------------
// AlertError
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Alert not found: {0}")]
    AlertNotFound(Uuid),

    #[error("Override requires a non-empty comment")]
    EmptyOverrideComment,

    #[error("Alert {id} is already {state}")]
    AlreadyResolved { id: Uuid, state: AlertState },

    #[error("Alert {0} was suppressed and cannot be acted on")]
    AlertSuppressed(Uuid),

    #[error("Catalog load failed ({0}): {1}")]
    CatalogLoad(String, String),

    #[error("Catalog parse failed: {0}")]
    CatalogParse(String),

    #[error("Invalid trigger rule {0}: {1}")]
    InvalidRule(String, String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Restore requires an empty store ({0} alerts present)")]
    StoreNotEmpty(usize),

    #[error("Invalid export, alert {0}: {1}")]
    InvalidExport(Uuid, String),

    #[error("Internal lock failed")]
    LockFailed,
}

// ---------------------------------------------------------------------------
// ClinicalAlertEngine trait
// ---------------------------------------------------------------------------

/// Per-session clinical alert engine.
pub trait ClinicalAlertEngine {
    /// Scan a finalized transcript segment against the patient context.
    fn analyze(
        &self,
        transcript: &str,
        context: &PatientContext,
    ) -> Result<AnalysisResult, AlertError>;

    /// Alerts neither acknowledged, overridden nor suppressed.
    fn active_alerts(&self) -> Result<Vec<ClinicalAlert>, AlertError>;

    /// Every alert ever stored this session, in insertion order.
    fn all_alerts(&self) -> Result<Vec<ClinicalAlert>, AlertError>;

    fn acknowledge(&self, alert_id: &Uuid, user_id: Option<&str>) -> Result<(), AlertError>;

    fn override_alert(
        &self,
        alert_id: &Uuid,
        comment: &str,
        user_id: Option<&str>,
    ) -> Result<(), AlertError>;

    fn stats(&self) -> Result<AlertStats, AlertError>;

    /// Session reset. Only ever called on explicit request.
    fn clear_all(&self) -> Result<(), AlertError>;
}
