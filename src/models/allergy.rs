use serde::{Deserialize, Serialize};

use super::enums::AllergySeverity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextAllergy {
    pub substance: String,
    pub severity: AllergySeverity,
}
