use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde names and `as_str` share the same snake_case spelling.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(MedicationStatus {
    Active => "active",
    Inactive => "inactive",
    Suspended => "suspended",
});

str_enum!(ClinicalStatus {
    Active => "active",
    Resolved => "resolved",
    Inactive => "inactive",
});

str_enum!(VitalTrend {
    Rising => "rising",
    Falling => "falling",
    Stable => "stable",
});

str_enum!(AllergySeverity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
    LifeThreatening => "life_threatening",
});

str_enum!(AlertType {
    Sepsis => "sepsis",
    MedicationConflict => "medication_conflict",
    Contraindication => "contraindication",
    Allergy => "allergy",
    DosageError => "dosage_error",
    VitalSign => "vital_sign",
    UncontrolledCondition => "uncontrolled_condition",
});

str_enum!(ResponseAction {
    Acknowledge => "acknowledge",
    Override => "override",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn medication_status_round_trip() {
        for (variant, s) in [
            (MedicationStatus::Active, "active"),
            (MedicationStatus::Inactive, "inactive"),
            (MedicationStatus::Suspended, "suspended"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(MedicationStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn alert_type_serde_matches_as_str() {
        for variant in [
            AlertType::Sepsis,
            AlertType::MedicationConflict,
            AlertType::Contraindication,
            AlertType::Allergy,
            AlertType::DosageError,
            AlertType::VitalSign,
            AlertType::UncontrolledCondition,
        ] {
            let json = serde_json::to_string(&variant).unwrap();
            assert_eq!(json, format!("\"{}\"", variant.as_str()));
        }
    }

    #[test]
    fn allergy_severity_life_threatening() {
        assert_eq!(
            AllergySeverity::from_str("life_threatening").unwrap(),
            AllergySeverity::LifeThreatening
        );
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(ClinicalStatus::from_str("remission").is_err());
        assert!(MedicationStatus::from_str("").is_err());
        match AlertType::from_str("stroke").unwrap_err() {
            ModelError::InvalidEnum { field, value } => {
                assert_eq!(field, "AlertType");
                assert_eq!(value, "stroke");
            }
        }
    }
}
