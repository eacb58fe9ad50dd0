// Copyright (c), BioPredict Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::app::guidance::RiskLevel;
use crate::ServiceError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Body fluid a biomarker record was measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FluidType {
    Blood,
    Saliva,
    Urine,
    Csf,
}

impl FluidType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FluidType::Blood => "blood",
            FluidType::Saliva => "saliva",
            FluidType::Urine => "urine",
            FluidType::Csf => "csf",
        }
    }
}

impl fmt::Display for FluidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FluidType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blood" => Ok(FluidType::Blood),
            "saliva" => Ok(FluidType::Saliva),
            "urine" => Ok(FluidType::Urine),
            "csf" => Ok(FluidType::Csf),
            other => Err(format!("unknown fluid type: {other}")),
        }
    }
}

/// Classification of a single biomarker reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorType {
    Positive,
    Warning,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionFactor {
    #[serde(rename = "type")]
    pub kind: FactorType,
    pub text: String,
}

/// Result of scoring one biomarker record against one disease model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseasePrediction {
    pub risk_level: RiskLevel,
    pub risk_value: u8,
    pub factors: Vec<PredictionFactor>,
    pub recommendation: String,
    pub potential_diseases: Vec<String>,
}

/// A fluid-specific record of optional biomarker values, addressed by the
/// same names the JSON payload uses.
pub trait BiomarkerPanel {
    fn fluid(&self) -> FluidType;

    /// Every biomarker name this panel can carry.
    fn keys(&self) -> &'static [&'static str];

    /// Value for `key`, or `None` when absent or unknown.
    fn value(&self, key: &str) -> Option<f64>;

    /// Inclusive plausible range for `key`, when the form restricts it.
    fn range(&self, _key: &str) -> Option<(f64, f64)> {
        None
    }

    /// Reject supplied values that cannot be a measurement.
    fn validate(&self) -> Result<(), String> {
        for key in self.keys() {
            let Some(v) = self.value(key) else {
                continue;
            };
            if !v.is_finite() || v < 0.0 {
                return Err(format!("{key} must be a non-negative number, got {v}"));
            }
            if let Some((min, max)) = self.range(key) {
                if v < min || v > max {
                    return Err(format!("{key} must be between {min} and {max}, got {v}"));
                }
            }
        }
        Ok(())
    }
}

/// Parse and validate a prediction request body. An empty body is read as `{}`
/// since every biomarker is optional.
pub fn parse_payload<T>(body: &[u8]) -> Result<T, ServiceError>
where
    T: DeserializeOwned + BiomarkerPanel,
{
    let value: serde_json::Value = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::Value::Object(Default::default())
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ServiceError::ValidationError(format!("Malformed JSON body: {e}")))?
    };

    if !value.is_object() {
        return Err(ServiceError::ValidationError(
            "Request body must be a JSON object".to_string(),
        ));
    }

    let panel: T = serde_json::from_value(value)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid biomarker payload: {e}")))?;
    panel.validate().map_err(ServiceError::ValidationError)?;
    Ok(panel)
}

// ============================================
// Blood
// ============================================

/// Blood form. Carries the conventional panel (mg/dL) and, optionally, the
/// metabolic panel in SI units which must be supplied as a whole.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodPanel {
    pub glucose: Option<f64>,
    pub hba1c: Option<f64>,
    pub total_cholesterol: Option<f64>,
    pub ldl: Option<f64>,
    pub hdl: Option<f64>,
    pub triglycerides: Option<f64>,
    pub crp: Option<f64>,
    pub homocysteine: Option<f64>,

    #[serde(rename = "BMI")]
    pub bmi: Option<f64>,
    #[serde(rename = "Chol")]
    pub chol_mmol: Option<f64>,
    #[serde(rename = "TG")]
    pub tg_mmol: Option<f64>,
    #[serde(rename = "HDL")]
    pub hdl_mmol: Option<f64>,
    #[serde(rename = "LDL")]
    pub ldl_mmol: Option<f64>,
    #[serde(rename = "Cr")]
    pub creatinine_umol: Option<f64>,
    #[serde(rename = "BUN")]
    pub bun_mmol: Option<f64>,
}

/// Fields of the metabolic panel, in display order.
pub const METABOLIC_PANEL_KEYS: [&str; 7] = ["BMI", "Chol", "TG", "HDL", "LDL", "Cr", "BUN"];

/// Accepted range of each metabolic panel field.
const METABOLIC_PANEL_RANGES: [(&str, f64, f64); 7] = [
    ("BMI", 10.0, 50.0),
    ("Chol", 1.0, 10.0),
    ("TG", 0.1, 5.0),
    ("HDL", 0.1, 5.0),
    ("LDL", 0.1, 5.0),
    ("Cr", 10.0, 200.0),
    ("BUN", 1.0, 20.0),
];

impl BloodPanel {
    /// Whether the metabolic panel was supplied. Supplying only part of it is
    /// an error naming the missing fields.
    pub fn metabolic_panel_supplied(&self) -> Result<bool, String> {
        let missing: Vec<&str> = METABOLIC_PANEL_KEYS
            .iter()
            .copied()
            .filter(|key| self.value(key).is_none())
            .collect();
        match missing.len() {
            0 => Ok(true),
            n if n == METABOLIC_PANEL_KEYS.len() => Ok(false),
            _ => Err(format!(
                "Missing required fields: {}. The metabolic panel requires all of {}",
                missing.join(", "),
                METABOLIC_PANEL_KEYS.join(", ")
            )),
        }
    }
}

impl BiomarkerPanel for BloodPanel {
    fn fluid(&self) -> FluidType {
        FluidType::Blood
    }

    fn keys(&self) -> &'static [&'static str] {
        &[
            "glucose",
            "hba1c",
            "totalCholesterol",
            "ldl",
            "hdl",
            "triglycerides",
            "crp",
            "homocysteine",
            "BMI",
            "Chol",
            "TG",
            "HDL",
            "LDL",
            "Cr",
            "BUN",
        ]
    }

    fn range(&self, key: &str) -> Option<(f64, f64)> {
        METABOLIC_PANEL_RANGES
            .iter()
            .find(|(k, _, _)| *k == key)
            .map(|&(_, min, max)| (min, max))
    }

    fn value(&self, key: &str) -> Option<f64> {
        match key {
            "glucose" => self.glucose,
            "hba1c" => self.hba1c,
            "totalCholesterol" => self.total_cholesterol,
            "ldl" => self.ldl,
            "hdl" => self.hdl,
            "triglycerides" => self.triglycerides,
            "crp" => self.crp,
            "homocysteine" => self.homocysteine,
            "BMI" => self.bmi,
            "Chol" => self.chol_mmol,
            "TG" => self.tg_mmol,
            "HDL" => self.hdl_mmol,
            "LDL" => self.ldl_mmol,
            "Cr" => self.creatinine_umol,
            "BUN" => self.bun_mmol,
            _ => None,
        }
    }
}

// ============================================
// Saliva
// ============================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalivaPanel {
    pub il6: Option<f64>,
    pub tnf_alpha: Option<f64>,
    pub mmp9: Option<f64>,
    pub saliva_cortisol: Option<f64>,
    pub cyfra21: Option<f64>,
    pub cd44: Option<f64>,
}

impl BiomarkerPanel for SalivaPanel {
    fn fluid(&self) -> FluidType {
        FluidType::Saliva
    }

    fn keys(&self) -> &'static [&'static str] {
        &["il6", "tnfAlpha", "mmp9", "salivaCortisol", "cyfra21", "cd44"]
    }

    fn value(&self, key: &str) -> Option<f64> {
        match key {
            "il6" => self.il6,
            "tnfAlpha" => self.tnf_alpha,
            "mmp9" => self.mmp9,
            "salivaCortisol" => self.saliva_cortisol,
            "cyfra21" => self.cyfra21,
            "cd44" => self.cd44,
            _ => None,
        }
    }
}

// ============================================
// Urine
// ============================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrinePanel {
    pub urine_glucose: Option<f64>,
    pub albumin: Option<f64>,
    pub creatinine: Option<f64>,
    pub acr: Option<f64>,
    pub protein: Option<f64>,
    pub specific_gravity: Option<f64>,
    pub ngal: Option<f64>,
    pub kim1: Option<f64>,
}

impl BiomarkerPanel for UrinePanel {
    fn fluid(&self) -> FluidType {
        FluidType::Urine
    }

    fn keys(&self) -> &'static [&'static str] {
        &[
            "urineGlucose",
            "albumin",
            "creatinine",
            "acr",
            "protein",
            "specificGravity",
            "ngal",
            "kim1",
        ]
    }

    fn value(&self, key: &str) -> Option<f64> {
        match key {
            "urineGlucose" => self.urine_glucose,
            "albumin" => self.albumin,
            "creatinine" => self.creatinine,
            "acr" => self.acr,
            "protein" => self.protein,
            "specificGravity" => self.specific_gravity,
            "ngal" => self.ngal,
            "kim1" => self.kim1,
            _ => None,
        }
    }
}

// ============================================
// Cerebrospinal fluid
// ============================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsfPanel {
    pub abeta42: Option<f64>,
    pub total_tau: Option<f64>,
    pub p_tau: Option<f64>,
    pub nfl: Option<f64>,
    pub csf_glucose: Option<f64>,
    pub csf_protein: Option<f64>,
    pub csf_ldh: Option<f64>,
    pub cell_count: Option<f64>,
}

impl BiomarkerPanel for CsfPanel {
    fn fluid(&self) -> FluidType {
        FluidType::Csf
    }

    fn keys(&self) -> &'static [&'static str] {
        &[
            "abeta42",
            "totalTau",
            "pTau",
            "nfl",
            "csfGlucose",
            "csfProtein",
            "csfLdh",
            "cellCount",
        ]
    }

    fn value(&self, key: &str) -> Option<f64> {
        match key {
            "abeta42" => self.abeta42,
            "totalTau" => self.total_tau,
            "pTau" => self.p_tau,
            "nfl" => self.nfl,
            "csfGlucose" => self.csf_glucose,
            "csfProtein" => self.csf_protein,
            "csfLdh" => self.csf_ldh,
            "cellCount" => self.cell_count,
            _ => None,
        }
    }
}

// ============================================
// Responses
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodPredictions {
    pub diabetes: DiseasePrediction,
    pub cardiovascular: DiseasePrediction,
    /// Present only when the metabolic panel was supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metabolic: Option<DiseasePrediction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalivaPredictions {
    pub oral_cancer: DiseasePrediction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrinePredictions {
    pub kidney: DiseasePrediction,
    pub diabetes: DiseasePrediction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsfPredictions {
    pub alzheimer: DiseasePrediction,
    pub brain_tumor: DiseasePrediction,
}
