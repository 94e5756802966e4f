//! Patient context model supplied by the caller for each analysis.

pub mod allergy;
pub mod condition;
pub mod context;
pub mod enums;
pub mod medication;
pub mod vital_sign;

use thiserror::Error;

pub use allergy::ContextAllergy;
pub use condition::ContextCondition;
pub use context::PatientContext;
pub use medication::ContextMedication;
pub use vital_sign::VitalReading;

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("Invalid {field} value: {value}")]
    InvalidEnum { field: String, value: String },
}
