//! Clinical alert pipeline
//!
//! ```text
//! transcript -> scanner -> evaluation -> dedup -> suppression -> store
//! ```
//!
//! The scanner and evaluator are pure over the transcript, the patient
//! context and the configuration. Only the store holds session state.

pub mod types;
pub mod catalog;
pub mod scanner;
pub mod extraction;
pub mod messages;
pub mod evaluation;
pub mod dedup;
pub mod suppression;
pub mod store;
pub mod export;
pub mod insights;
pub mod engine;

pub use types::*;
pub use catalog::{ContextGate, MarkerThreshold, TriggerCatalog, TriggerRule, VitalMeasure};
pub use engine::DefaultAlertEngine;
pub use export::AuditExport;
pub use insights::{summarize, Recommendation, RecommendedAction, RiskLevel, RiskSummary};
pub use store::AlertStore;
pub use suppression::{
    InactiveMedicationRule, ResolvedConditionRule, SuppressionEvaluator, SuppressionOutcome,
    SuppressionRule,
};
