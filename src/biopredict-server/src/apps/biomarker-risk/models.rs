// Copyright (c), BioPredict Contributors
// SPDX-License-Identifier: Apache-2.0

//! Disease models. Each model is a fixed list of biomarker ladders plus an
//! optional bonus for several abnormal readings at once.

use crate::app::guidance::{guidance_for, RiskLevel};
use crate::app::thresholds::{Band, BiomarkerRule};
use crate::app::types::{BiomarkerPanel, DiseasePrediction, FluidType};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::app::thresholds::BandTest::{AtLeast, AtMost, Below, Otherwise, Within};
use crate::app::types::FactorType::{Negative, Positive, Warning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiseaseKey {
    BloodDiabetes,
    Cardiovascular,
    Metabolic,
    OralCancer,
    Kidney,
    UrineDiabetes,
    Alzheimer,
    BrainTumor,
}

impl DiseaseKey {
    pub const ALL: [DiseaseKey; 8] = [
        DiseaseKey::BloodDiabetes,
        DiseaseKey::Cardiovascular,
        DiseaseKey::Metabolic,
        DiseaseKey::OralCancer,
        DiseaseKey::Kidney,
        DiseaseKey::UrineDiabetes,
        DiseaseKey::Alzheimer,
        DiseaseKey::BrainTumor,
    ];
}

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("{biomarker} value {value} matched no threshold band in the {model} model")]
    Unbanded {
        model: &'static str,
        biomarker: &'static str,
        value: f64,
    },

    #[error("{model} model scores {expected} records, got {actual}")]
    FluidMismatch {
        model: &'static str,
        expected: FluidType,
        actual: FluidType,
    },
}

/// Extra points when at least `min_flagged` readings are warning or negative.
#[derive(Debug, Clone, Copy)]
pub struct Compounding {
    pub min_flagged: usize,
    pub bonus: u32,
}

const BLOOD_COMPOUNDING: Compounding = Compounding {
    min_flagged: 3,
    bonus: 10,
};

pub struct DiseaseModel {
    pub key: DiseaseKey,
    /// Field name in the prediction response
    pub response_key: &'static str,
    pub name: &'static str,
    pub fluid: FluidType,
    pub description: &'static str,
    pub rules: &'static [BiomarkerRule],
    pub compounding: Option<Compounding>,
}

impl DiseaseModel {
    /// Score `panel`. Absent biomarkers add nothing and produce no factor.
    pub fn predict(&self, panel: &dyn BiomarkerPanel) -> Result<DiseasePrediction, ScoringError> {
        if panel.fluid() != self.fluid {
            return Err(ScoringError::FluidMismatch {
                model: self.name,
                expected: self.fluid,
                actual: panel.fluid(),
            });
        }

        let mut score: u32 = 0;
        let mut flagged = 0;
        let mut factors = Vec::new();
        for rule in self.rules {
            let Some(value) = panel.value(rule.key) else {
                continue;
            };
            let assessment = rule.assess(value).ok_or(ScoringError::Unbanded {
                model: self.name,
                biomarker: rule.key,
                value,
            })?;
            if assessment.is_flagged() {
                flagged += 1;
            }
            score += assessment.points;
            factors.push(assessment.factor);
        }

        if let Some(c) = self.compounding {
            if flagged >= c.min_flagged {
                score += c.bonus;
            }
        }

        let risk_value = score.min(100) as u8;
        let risk_level = RiskLevel::from_score(risk_value);
        debug!(model = self.name, risk_value, %risk_level, "scored");

        let guidance = guidance_for(self.key);
        Ok(DiseasePrediction {
            risk_level,
            risk_value,
            factors,
            recommendation: guidance.recommendation(risk_level).to_string(),
            potential_diseases: guidance
                .potential_diseases(risk_level)
                .iter()
                .map(|d| d.to_string())
                .collect(),
        })
    }
}

pub fn all_models() -> [&'static DiseaseModel; 8] {
    [
        &BLOOD_DIABETES,
        &CARDIOVASCULAR,
        &METABOLIC,
        &ORAL_CANCER,
        &KIDNEY,
        &URINE_DIABETES,
        &ALZHEIMER,
        &BRAIN_TUMOR,
    ]
}

// ============================================
// Blood
// ============================================

pub static BLOOD_DIABETES: DiseaseModel = DiseaseModel {
    key: DiseaseKey::BloodDiabetes,
    response_key: "diabetes",
    name: "Diabetes Mellitus",
    fluid: FluidType::Blood,
    description: "Diabetes is a chronic metabolic disorder characterized by elevated blood glucose levels. Early detection through biomarkers can significantly improve management outcomes and prevent complications.",
    rules: &[
        BiomarkerRule {
            key: "glucose",
            label: "Fasting Glucose",
            unit: "mg/dL",
            bands: &[
                Band::new(Below(100.0), 0, Positive, "Normal fasting glucose ({value})"),
                Band::new(Below(126.0), 20, Warning, "Elevated fasting glucose ({value})"),
                Band::new(Otherwise, 40, Negative, "Fasting glucose in diabetic range ({value})"),
            ],
        },
        BiomarkerRule {
            key: "hba1c",
            label: "HbA1c",
            unit: "%",
            bands: &[
                Band::new(Below(5.7), 0, Positive, "Normal HbA1c levels ({value})"),
                Band::new(Below(6.5), 22, Warning, "HbA1c slightly above normal range ({value})"),
                Band::new(Otherwise, 45, Negative, "HbA1c above diabetic threshold ({value})"),
            ],
        },
        BiomarkerRule {
            key: "triglycerides",
            label: "Triglycerides",
            unit: "mg/dL",
            bands: &[
                Band::new(AtMost(150.0), 0, Positive, "Normal triglyceride levels ({value})"),
                Band::new(Otherwise, 10, Warning, "Elevated triglyceride levels ({value})"),
            ],
        },
    ],
    compounding: Some(BLOOD_COMPOUNDING),
};

pub static CARDIOVASCULAR: DiseaseModel = DiseaseModel {
    key: DiseaseKey::Cardiovascular,
    response_key: "cardiovascular",
    name: "Cardiovascular Disease",
    fluid: FluidType::Blood,
    description: "Cardiovascular disease encompasses conditions affecting the heart and blood vessels. Early biomarker analysis can identify risk factors before clinical symptoms appear.",
    rules: &[
        BiomarkerRule {
            key: "totalCholesterol",
            label: "Total Cholesterol",
            unit: "mg/dL",
            bands: &[
                Band::new(Below(200.0), 0, Positive, "Healthy total cholesterol ({value})"),
                Band::new(Below(240.0), 24, Warning, "Slightly elevated total cholesterol ({value})"),
                Band::new(Otherwise, 40, Negative, "High total cholesterol ({value})"),
            ],
        },
        BiomarkerRule {
            key: "ldl",
            label: "LDL Cholesterol",
            unit: "mg/dL",
            bands: &[
                Band::new(Below(100.0), 0, Positive, "Optimal LDL levels ({value})"),
                Band::new(Below(130.0), 10, Warning, "Near-optimal LDL levels ({value})"),
                Band::new(Below(160.0), 20, Warning, "Borderline high LDL levels ({value})"),
                Band::new(Otherwise, 30, Negative, "High LDL cholesterol ({value})"),
            ],
        },
        BiomarkerRule {
            key: "hdl",
            label: "HDL Cholesterol",
            unit: "mg/dL",
            bands: &[
                Band::new(AtLeast(50.0), 0, Positive, "Healthy HDL levels ({value})"),
                Band::new(AtLeast(40.0), 10, Warning, "Moderate HDL levels ({value})"),
                Band::new(Otherwise, 20, Negative, "Low HDL cholesterol ({value})"),
            ],
        },
        BiomarkerRule {
            key: "crp",
            label: "C-Reactive Protein",
            unit: "mg/L",
            bands: &[
                Band::new(Below(3.0), 0, Positive, "Normal CRP levels ({value})"),
                Band::new(Otherwise, 20, Negative, "High CRP levels ({value})"),
            ],
        },
        BiomarkerRule {
            key: "homocysteine",
            label: "Homocysteine",
            unit: "µmol/L",
            bands: &[
                Band::new(AtMost(15.0), 0, Positive, "Normal homocysteine levels ({value})"),
                Band::new(Otherwise, 15, Warning, "Elevated homocysteine levels ({value})"),
            ],
        },
    ],
    compounding: Some(BLOOD_COMPOUNDING),
};

/// SI-unit panel; only scored when all seven fields are supplied.
pub static METABOLIC: DiseaseModel = DiseaseModel {
    key: DiseaseKey::Metabolic,
    response_key: "metabolic",
    name: "Metabolic Syndrome",
    fluid: FluidType::Blood,
    description: "Metabolic syndrome is a cluster of conditions including excess body weight, abnormal lipids and impaired kidney markers that together raise the risk of diabetes and heart disease.",
    rules: &[
        BiomarkerRule {
            key: "BMI",
            label: "Body Mass Index",
            unit: "kg/m²",
            bands: &[
                Band::new(Below(25.0), 0, Positive, "Healthy BMI ({value})"),
                Band::new(Below(30.0), 12, Warning, "Elevated BMI suggests overweight condition ({value})"),
                Band::new(Otherwise, 25, Negative, "High BMI indicates obesity risk ({value})"),
            ],
        },
        BiomarkerRule {
            key: "Chol",
            label: "Total Cholesterol",
            unit: "mmol/L",
            bands: &[
                Band::new(AtMost(5.2), 0, Positive, "Normal cholesterol level ({value})"),
                Band::new(Otherwise, 12, Warning, "High cholesterol level ({value})"),
            ],
        },
        BiomarkerRule {
            key: "TG",
            label: "Triglycerides",
            unit: "mmol/L",
            bands: &[
                Band::new(AtMost(1.7), 0, Positive, "Normal triglycerides level ({value})"),
                Band::new(Otherwise, 12, Warning, "High triglycerides level ({value})"),
            ],
        },
        BiomarkerRule {
            key: "HDL",
            label: "HDL Cholesterol",
            unit: "mmol/L",
            bands: &[
                Band::new(AtLeast(1.0), 0, Positive, "Healthy HDL cholesterol ({value})"),
                Band::new(Otherwise, 15, Negative, "Low HDL cholesterol ({value})"),
            ],
        },
        BiomarkerRule {
            key: "LDL",
            label: "LDL Cholesterol",
            unit: "mmol/L",
            bands: &[
                Band::new(AtMost(3.4), 0, Positive, "Normal LDL cholesterol ({value})"),
                Band::new(Otherwise, 10, Warning, "High LDL cholesterol ({value})"),
            ],
        },
        BiomarkerRule {
            key: "Cr",
            label: "Serum Creatinine",
            unit: "µmol/L",
            bands: &[
                Band::new(AtMost(106.0), 0, Positive, "Normal creatinine level ({value})"),
                Band::new(Otherwise, 10, Warning, "Elevated creatinine level ({value})"),
            ],
        },
        BiomarkerRule {
            key: "BUN",
            label: "Blood Urea Nitrogen",
            unit: "mmol/L",
            bands: &[
                Band::new(AtMost(7.1), 0, Positive, "Normal blood urea nitrogen ({value})"),
                Band::new(Otherwise, 10, Warning, "High blood urea nitrogen ({value})"),
            ],
        },
    ],
    compounding: Some(BLOOD_COMPOUNDING),
};

// ============================================
// Saliva
// ============================================

pub static ORAL_CANCER: DiseaseModel = DiseaseModel {
    key: DiseaseKey::OralCancer,
    response_key: "oralCancer",
    name: "Oral Cancer",
    fluid: FluidType::Saliva,
    description: "Oral cancer affects the mouth, lips, tongue, and throat. Early detection through salivary biomarkers can significantly improve treatment outcomes and survival rates.",
    rules: &[
        BiomarkerRule {
            key: "il6",
            label: "Interleukin-6",
            unit: "pg/mL",
            bands: &[
                Band::new(Below(5.0), 0, Positive, "Normal IL-6 levels ({value})"),
                Band::new(Below(10.0), 20, Warning, "Moderately elevated IL-6 levels ({value})"),
                Band::new(Otherwise, 40, Negative, "Significantly elevated IL-6 levels ({value})"),
            ],
        },
        BiomarkerRule {
            key: "tnfAlpha",
            label: "TNF-α",
            unit: "pg/mL",
            bands: &[
                Band::new(Below(15.0), 0, Positive, "Normal TNF-α levels ({value})"),
                Band::new(Below(30.0), 20, Warning, "Elevated TNF-α levels ({value})"),
                Band::new(Otherwise, 40, Negative, "High TNF-α levels ({value})"),
            ],
        },
        BiomarkerRule {
            key: "cyfra21",
            label: "CYFRA 21-1",
            unit: "ng/mL",
            bands: &[
                Band::new(Below(3.3), 0, Positive, "CYFRA 21-1 within normal range ({value})"),
                Band::new(Below(5.0), 25, Warning, "Borderline CYFRA 21-1 ({value})"),
                Band::new(Otherwise, 50, Negative, "Elevated CYFRA 21-1 tumor marker ({value})"),
            ],
        },
        BiomarkerRule {
            key: "mmp9",
            label: "MMP-9",
            unit: "ng/mL",
            bands: &[
                Band::new(AtMost(600.0), 0, Positive, "Normal MMP-9 levels ({value})"),
                Band::new(Otherwise, 20, Warning, "Elevated MMP-9 levels ({value})"),
            ],
        },
        BiomarkerRule {
            key: "cd44",
            label: "Soluble CD44",
            unit: "ng/mL",
            bands: &[
                Band::new(AtMost(200.0), 0, Positive, "Normal CD44 levels ({value})"),
                Band::new(Otherwise, 20, Warning, "Elevated CD44 levels ({value})"),
            ],
        },
    ],
    compounding: None,
};

// ============================================
// Urine
// ============================================

pub static KIDNEY: DiseaseModel = DiseaseModel {
    key: DiseaseKey::Kidney,
    response_key: "kidney",
    name: "Kidney Disease",
    fluid: FluidType::Urine,
    description: "Chronic kidney disease (CKD) is a gradual loss of kidney function. Early detection through urine biomarkers allows for interventions that can slow progression and prevent complications.",
    rules: &[
        BiomarkerRule {
            key: "albumin",
            label: "Albumin",
            unit: "mg/L",
            bands: &[
                Band::new(Below(30.0), 0, Positive, "Normal albumin levels ({value})"),
                Band::new(Below(300.0), 30, Warning, "Moderately increased albumin ({value})"),
                Band::new(Otherwise, 60, Negative, "Severely increased albumin ({value})"),
            ],
        },
        BiomarkerRule {
            key: "acr",
            label: "Albumin-to-Creatinine Ratio",
            unit: "mg/g",
            bands: &[
                Band::new(Below(30.0), 0, Positive, "Normal ACR ratio ({value})"),
                Band::new(Below(300.0), 30, Warning, "Moderately elevated ACR ({value})"),
                Band::new(Otherwise, 60, Negative, "Severely elevated ACR ({value})"),
            ],
        },
        BiomarkerRule {
            key: "protein",
            label: "Urine Protein",
            unit: "mg/dL",
            bands: &[
                Band::new(Below(150.0), 0, Positive, "Normal urine protein ({value})"),
                Band::new(Otherwise, 30, Warning, "Proteinuria detected ({value})"),
            ],
        },
        BiomarkerRule {
            key: "ngal",
            label: "NGAL",
            unit: "ng/mL",
            bands: &[
                Band::new(Below(131.7), 0, Positive, "Normal NGAL levels ({value})"),
                Band::new(Below(200.0), 20, Warning, "Slightly elevated NGAL ({value})"),
                Band::new(Otherwise, 40, Negative, "High NGAL suggests kidney injury ({value})"),
            ],
        },
        BiomarkerRule {
            key: "kim1",
            label: "KIM-1",
            unit: "pg/mL",
            bands: &[
                Band::new(AtMost(1000.0), 0, Positive, "Normal KIM-1 levels ({value})"),
                Band::new(Otherwise, 30, Warning, "Elevated KIM-1 levels ({value})"),
            ],
        },
    ],
    compounding: None,
};

pub static URINE_DIABETES: DiseaseModel = DiseaseModel {
    key: DiseaseKey::UrineDiabetes,
    response_key: "diabetes",
    name: "Diabetes (Urine)",
    fluid: FluidType::Urine,
    description: "Urine analysis can detect glucose spillover, providing an additional screening tool for diabetes alongside blood biomarkers. Presence of glucose in urine can indicate that blood glucose levels are elevated above the renal threshold.",
    rules: &[
        BiomarkerRule {
            key: "urineGlucose",
            label: "Urine Glucose",
            unit: "mg/dL",
            bands: &[
                Band::new(AtMost(0.0), 0, Positive, "Negative urine glucose ({value})"),
                Band::new(AtMost(50.0), 30, Warning, "Trace glucose in urine ({value})"),
                Band::new(Otherwise, 60, Negative, "Significant glucose in urine ({value})"),
            ],
        },
        BiomarkerRule {
            key: "protein",
            label: "Urine Protein",
            unit: "mg/dL",
            bands: &[
                Band::new(Below(150.0), 0, Positive, "Normal urine protein ({value})"),
                Band::new(Otherwise, 20, Warning, "Protein in urine may indicate diabetic nephropathy ({value})"),
            ],
        },
        BiomarkerRule {
            key: "specificGravity",
            label: "Specific Gravity",
            unit: "",
            bands: &[
                Band::new(Below(1.005), 0, Warning, "Dilute urine (SG: {value})"),
                Band::new(Within(1.005, 1.030), 0, Positive, "Normal urine concentration (SG: {value})"),
                Band::new(Otherwise, 15, Warning, "Concentrated urine (SG: {value})"),
            ],
        },
    ],
    compounding: None,
};

// ============================================
// Cerebrospinal fluid
// ============================================

pub static ALZHEIMER: DiseaseModel = DiseaseModel {
    key: DiseaseKey::Alzheimer,
    response_key: "alzheimer",
    name: "Alzheimer's Disease",
    fluid: FluidType::Csf,
    description: "Alzheimer's disease is a progressive neurodegenerative disorder characterized by the accumulation of amyloid-β peptides and tau proteins in the brain. CSF biomarkers can detect these changes years before clinical symptoms appear.",
    rules: &[
        BiomarkerRule {
            key: "abeta42",
            label: "Amyloid β-42",
            unit: "pg/mL",
            bands: &[
                Band::new(AtLeast(550.0), 0, Positive, "Normal Amyloid β-42 levels ({value})"),
                Band::new(AtLeast(450.0), 14, Warning, "Borderline Amyloid β-42 ({value})"),
                Band::new(Otherwise, 28, Negative, "Low Amyloid β-42 ({value})"),
            ],
        },
        BiomarkerRule {
            key: "totalTau",
            label: "Total Tau",
            unit: "pg/mL",
            bands: &[
                Band::new(AtMost(375.0), 0, Positive, "Normal total Tau ({value})"),
                Band::new(AtMost(500.0), 12, Warning, "Slightly elevated total Tau ({value})"),
                Band::new(Otherwise, 23, Negative, "Elevated total Tau ({value})"),
            ],
        },
        BiomarkerRule {
            key: "pTau",
            label: "Phosphorylated Tau",
            unit: "pg/mL",
            bands: &[
                Band::new(AtMost(52.0), 0, Positive, "Normal phosphorylated Tau ({value})"),
                Band::new(AtMost(65.0), 12, Warning, "Slightly elevated phosphorylated Tau ({value})"),
                Band::new(Otherwise, 23, Negative, "Elevated phosphorylated Tau ({value})"),
            ],
        },
        BiomarkerRule {
            key: "nfl",
            label: "Neurofilament Light Chain",
            unit: "pg/mL",
            bands: &[
                Band::new(AtMost(1000.0), 0, Positive, "Normal neurofilament light chain ({value})"),
                Band::new(Otherwise, 15, Warning, "Elevated neurofilament light chain ({value})"),
            ],
        },
    ],
    compounding: None,
};

pub static BRAIN_TUMOR: DiseaseModel = DiseaseModel {
    key: DiseaseKey::BrainTumor,
    response_key: "brainTumor",
    name: "Brain Tumors",
    fluid: FluidType::Csf,
    description: "Brain tumors can alter the composition of CSF. Elevated protein, LDH, and cell counts often indicate the presence of tumors. Early detection through CSF analysis can lead to earlier intervention and improved outcomes.",
    rules: &[
        BiomarkerRule {
            key: "csfGlucose",
            label: "CSF Glucose",
            unit: "mg/dL",
            bands: &[
                Band::new(Within(45.0, 80.0), 0, Positive, "Normal CSF glucose ({value})"),
                Band::new(Otherwise, 15, Warning, "Abnormal CSF glucose levels ({value})"),
            ],
        },
        BiomarkerRule {
            key: "csfProtein",
            label: "CSF Protein",
            unit: "mg/dL",
            bands: &[
                Band::new(AtMost(45.0), 0, Positive, "Normal CSF protein ({value})"),
                Band::new(AtMost(75.0), 20, Warning, "Mildly elevated CSF protein ({value})"),
                Band::new(Otherwise, 40, Negative, "Markedly elevated CSF protein ({value})"),
            ],
        },
        BiomarkerRule {
            key: "csfLdh",
            label: "CSF Lactate Dehydrogenase",
            unit: "U/L",
            bands: &[
                Band::new(AtMost(40.0), 0, Positive, "Normal CSF LDH ({value})"),
                Band::new(AtMost(70.0), 20, Warning, "Elevated CSF LDH ({value})"),
                Band::new(Otherwise, 40, Negative, "High CSF LDH suggests tissue breakdown ({value})"),
            ],
        },
        BiomarkerRule {
            key: "cellCount",
            label: "CSF White Cell Count",
            unit: "cells/µL",
            bands: &[
                Band::new(AtMost(5.0), 0, Positive, "Normal CSF cell count ({value})"),
                Band::new(AtMost(20.0), 25, Warning, "Mild CSF pleocytosis ({value})"),
                Band::new(Otherwise, 50, Negative, "Marked CSF pleocytosis ({value})"),
            ],
        },
    ],
    compounding: None,
};
