use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::VitalTrend;

/// A recent vital reading supplied with the patient context.
///
/// `parameter` is free text from the caller ("blood_pressure_systolic",
/// "heart rate", "SpO2"); the evaluator relates readings to vital rules by
/// substring, so naming does not have to follow a fixed vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VitalReading {
    pub parameter: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub trend: VitalTrend,
}

impl VitalReading {
    /// Case-insensitive match of the parameter name against any of `terms`.
    pub fn relates_to(&self, terms: &[&str]) -> bool {
        let parameter = self.parameter.to_lowercase();
        terms.iter().any(|t| parameter.contains(t))
    }
}
