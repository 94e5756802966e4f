use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::enums::AlertType;

use super::types::{AlertError, AlertSeverity};

/// Which vital a vital-gated rule reads from the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalMeasure {
    BloodPressure,
    HeartRate,
    OxygenSaturation,
}

impl VitalMeasure {
    pub fn as_str(self) -> &'static str {
        match self {
            VitalMeasure::BloodPressure => "blood_pressure",
            VitalMeasure::HeartRate => "heart_rate",
            VitalMeasure::OxygenSaturation => "oxygen_saturation",
        }
    }

    /// Terms that relate a caller-supplied vital reading to this measure.
    pub fn reading_terms(self) -> &'static [&'static str] {
        match self {
            VitalMeasure::BloodPressure => &["blood_pressure", "blood pressure", "systolic", "diastolic", "bp"],
            VitalMeasure::HeartRate => &["heart_rate", "heart rate", "pulse", "hr"],
            VitalMeasure::OxygenSaturation => &["oxygen", "spo2", "o2 sat", "saturation"],
        }
    }
}

/// Numeric marker for diagnosis-based rules ("glucose" above 180).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerThreshold {
    pub label: String,
    /// Alert when the extracted value is strictly above this.
    pub above: f64,
    pub plausible_min: f64,
    pub plausible_max: f64,
}

/// Context a rule needs before its candidate becomes an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextGate {
    /// No corroboration needed.
    None,
    /// Vital reading from the transcript, only for patients with a matching
    /// active condition.
    Vital {
        measure: VitalMeasure,
        #[serde(rename = "conditionTerms")]
        condition_terms: Vec<String>,
    },
    /// Both drugs must be active, recently prescribed medications.
    Interaction {
        primary: Vec<String>,
        interacting: Vec<String>,
    },
    /// Active diagnosis plus an out-of-range marker value.
    Condition {
        #[serde(rename = "conditionTerms")]
        condition_terms: Vec<String>,
        markers: Vec<MarkerThreshold>,
    },
}

/// Static keyword rule. Loaded once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRule {
    pub id: String,
    /// Tested in order; the first hit wins.
    pub keywords: Vec<String>,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default = "default_gate")]
    pub gate: ContextGate,
}

fn default_gate() -> ContextGate {
    ContextGate::None
}

/// Ordered trigger table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerCatalog {
    rules: Vec<TriggerRule>,
}

impl TriggerCatalog {
    /// Build a catalog, normalizing keywords and rejecting unusable rules.
    pub fn new(mut rules: Vec<TriggerRule>) -> Result<Self, AlertError> {
        for rule in &mut rules {
            rule.keywords = rule
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            if rule.keywords.is_empty() {
                return Err(AlertError::InvalidRule(rule.id.clone(), "no keywords".into()));
            }
            match &mut rule.gate {
                ContextGate::None => {}
                ContextGate::Vital { condition_terms, .. } => {
                    normalize_terms(&rule.id, "conditionTerms", condition_terms)?;
                }
                ContextGate::Interaction {
                    primary,
                    interacting,
                } => {
                    normalize_terms(&rule.id, "primary", primary)?;
                    normalize_terms(&rule.id, "interacting", interacting)?;
                }
                ContextGate::Condition {
                    condition_terms,
                    markers,
                } => {
                    normalize_terms(&rule.id, "conditionTerms", condition_terms)?;
                    if markers.is_empty() {
                        return Err(AlertError::InvalidRule(rule.id.clone(), "no markers".into()));
                    }
                    for marker in markers.iter_mut() {
                        marker.label = marker.label.trim().to_lowercase();
                        if marker.label.is_empty() || marker.plausible_min >= marker.plausible_max {
                            return Err(AlertError::InvalidRule(
                                rule.id.clone(),
                                "marker needs a label and a non-empty plausible range".into(),
                            ));
                        }
                    }
                }
            }
        }
        Ok(Self { rules })
    }

    /// Load a catalog from a JSON array of rules.
    pub fn load(path: &Path) -> Result<Self, AlertError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| AlertError::CatalogLoad(path.display().to_string(), e.to_string()))?;
        let rules: Vec<TriggerRule> =
            serde_json::from_str(&json).map_err(|e| AlertError::CatalogParse(e.to_string()))?;
        let catalog = Self::new(rules)?;
        tracing::info!(
            path = %path.display(),
            rules = catalog.rules.len(),
            "Trigger catalog loaded"
        );
        Ok(catalog)
    }

    pub fn rules(&self) -> &[TriggerRule] {
        &self.rules
    }

    pub fn get(&self, rule_id: &str) -> Option<&TriggerRule> {
        self.rules.iter().find(|r| r.id == rule_id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Built-in table used by default sessions.
    pub fn standard() -> Self {
        Self {
            rules: standard_rules(),
        }
    }
}

impl Default for TriggerCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn normalize_terms(rule_id: &str, field: &str, terms: &mut Vec<String>) -> Result<(), AlertError> {
    *terms = terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return Err(AlertError::InvalidRule(rule_id.into(), format!("{field} is empty")));
    }
    Ok(())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[allow(clippy::too_many_arguments)]
fn rule(
    id: &str,
    keywords: &[&str],
    alert_type: AlertType,
    severity: AlertSeverity,
    message: &str,
    source: &str,
    source_url: Option<&str>,
    gate: ContextGate,
) -> TriggerRule {
    TriggerRule {
        id: id.into(),
        keywords: strings(keywords),
        alert_type,
        severity,
        message: message.into(),
        source: source.into(),
        source_url: source_url.map(str::to_string),
        gate,
    }
}

/// Keywords are already lowercase here; `new()` is only needed for external tables.
fn standard_rules() -> Vec<TriggerRule> {
    vec![
        rule(
            "sepsis",
            &["septic shock", "sepsis", "qsofa", "lactate elevated", "elevated lactate"],
            AlertType::Sepsis,
            AlertSeverity::Critical,
            "Possible sepsis indicators mentioned. Consider the sepsis screening bundle.",
            "Surviving Sepsis Campaign: International Guidelines 2021",
            Some("https://www.sccm.org/SurvivingSepsisCampaign/Guidelines"),
            ContextGate::None,
        ),
        rule(
            "anticoagulant-nsaid-interaction",
            &["warfarin", "coumadin"],
            AlertType::MedicationConflict,
            AlertSeverity::Critical,
            "Anticoagulant combined with antiplatelet/NSAID therapy increases bleeding risk.",
            "FDA Drug Safety Communication: Warfarin interactions",
            Some("https://www.fda.gov/drugs/drug-safety-and-availability"),
            ContextGate::Interaction {
                primary: strings(&["warfarin", "coumadin"]),
                interacting: strings(&["aspirin", "ibuprofen", "naproxen", "clopidogrel"]),
            },
        ),
        rule(
            "pde5-nitrate-interaction",
            &["sildenafil", "tadalafil", "viagra"],
            AlertType::MedicationConflict,
            AlertSeverity::Critical,
            "PDE5 inhibitor with nitrate therapy can cause severe hypotension.",
            "ACC/AHA Guideline: PDE5 inhibitors and nitrates",
            None,
            ContextGate::Interaction {
                primary: strings(&["sildenafil", "tadalafil"]),
                interacting: strings(&["nitroglycerin", "isosorbide"]),
            },
        ),
        rule(
            "reported-interaction",
            &["drug interaction", "interacts with"],
            AlertType::MedicationConflict,
            AlertSeverity::Caution,
            "A drug interaction was mentioned. Review the current medication list.",
            "Clinical Pharmacology Drug Interaction Reference",
            None,
            ContextGate::None,
        ),
        rule(
            "contraindication",
            &["contraindicated", "contraindication", "should not be given"],
            AlertType::Contraindication,
            AlertSeverity::Caution,
            "A contraindication was mentioned. Verify before proceeding.",
            "Institute for Safe Medication Practices",
            Some("https://www.ismp.org"),
            ContextGate::None,
        ),
        rule(
            "allergy",
            &["anaphylaxis", "allergic to", "allergy to", "allergic reaction"],
            AlertType::Allergy,
            AlertSeverity::Critical,
            "Allergy mentioned. Confirm against the documented allergy list before ordering.",
            "Joint Commission National Patient Safety Goals",
            None,
            ContextGate::None,
        ),
        rule(
            "dosage-error",
            &["double dose", "overdose", "wrong dose", "extra dose", "ten times the dose"],
            AlertType::DosageError,
            AlertSeverity::Caution,
            "Possible dosing error mentioned. Verify the ordered dose.",
            "Institute for Safe Medication Practices",
            Some("https://www.ismp.org"),
            ContextGate::None,
        ),
        rule(
            "blood-pressure",
            &["blood pressure", "bp"],
            AlertType::VitalSign,
            AlertSeverity::Caution,
            "Elevated blood pressure in a patient with hypertension",
            "ACC/AHA 2017 High Blood Pressure Guideline",
            Some("https://www.ahajournals.org/doi/10.1161/HYP.0000000000000065"),
            ContextGate::Vital {
                measure: VitalMeasure::BloodPressure,
                condition_terms: strings(&["hypertension", "high blood pressure", "i10"]),
            },
        ),
        rule(
            "heart-rate",
            &["heart rate", "pulse"],
            AlertType::VitalSign,
            AlertSeverity::Caution,
            "Rapid heart rate in a patient with a rhythm disorder",
            "AHA/ACC/HRS Atrial Fibrillation Guideline",
            None,
            ContextGate::Vital {
                measure: VitalMeasure::HeartRate,
                condition_terms: strings(&["atrial fibrillation", "arrhythmia", "i48"]),
            },
        ),
        rule(
            "oxygen-saturation",
            &["oxygen saturation", "spo2", "o2 sat", "sats"],
            AlertType::VitalSign,
            AlertSeverity::Caution,
            "Low oxygen saturation in a patient with chronic lung disease",
            "GOLD COPD Report",
            None,
            ContextGate::Vital {
                measure: VitalMeasure::OxygenSaturation,
                condition_terms: strings(&["copd", "chronic obstructive", "j44"]),
            },
        ),
        rule(
            "uncontrolled-diabetes",
            &["glucose", "blood sugar", "hba1c", "a1c"],
            AlertType::UncontrolledCondition,
            AlertSeverity::Caution,
            "Glycemic control above target for a patient with diabetes",
            "ADA Standards of Care in Diabetes",
            Some("https://diabetesjournals.org/care/issue/47/Supplement_1"),
            ContextGate::Condition {
                condition_terms: strings(&["diabetes", "e10", "e11"]),
                markers: vec![
                    MarkerThreshold {
                        label: "glucose".into(),
                        above: 180.0,
                        plausible_min: 20.0,
                        plausible_max: 1000.0,
                    },
                    MarkerThreshold {
                        label: "blood sugar".into(),
                        above: 180.0,
                        plausible_min: 20.0,
                        plausible_max: 1000.0,
                    },
                    MarkerThreshold {
                        label: "a1c".into(),
                        above: 9.0,
                        plausible_min: 3.0,
                        plausible_max: 20.0,
                    },
                ],
            },
        ),
    ]
}
