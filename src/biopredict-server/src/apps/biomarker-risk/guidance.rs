// Copyright (c), BioPredict Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::app::models::DiseaseKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk bucket for a 0..=100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Minimal,
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Minimal,
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::High,
        RiskLevel::VeryHigh,
    ];

    pub fn from_score(score: u8) -> Self {
        match score {
            0..=14 => RiskLevel::Minimal,
            15..=34 => RiskLevel::Low,
            35..=54 => RiskLevel::Moderate,
            55..=74 => RiskLevel::High,
            _ => RiskLevel::VeryHigh,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Minimal => "Minimal",
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advice for one disease, one entry per [`RiskLevel`] in ascending order.
pub struct Guidance {
    recommendations: [&'static str; 5],
    potential_diseases: [&'static [&'static str]; 5],
}

impl Guidance {
    pub fn recommendation(&self, level: RiskLevel) -> &'static str {
        self.recommendations[level.index()]
    }

    pub fn potential_diseases(&self, level: RiskLevel) -> &'static [&'static str] {
        self.potential_diseases[level.index()]
    }
}

pub fn guidance_for(disease: DiseaseKey) -> &'static Guidance {
    match disease {
        DiseaseKey::BloodDiabetes => &BLOOD_DIABETES,
        DiseaseKey::Cardiovascular => &CARDIOVASCULAR,
        DiseaseKey::Metabolic => &METABOLIC,
        DiseaseKey::OralCancer => &ORAL_CANCER,
        DiseaseKey::Kidney => &KIDNEY,
        DiseaseKey::UrineDiabetes => &URINE_DIABETES,
        DiseaseKey::Alzheimer => &ALZHEIMER,
        DiseaseKey::BrainTumor => &BRAIN_TUMOR,
    }
}

static BLOOD_DIABETES: Guidance = Guidance {
    recommendations: [
        "Continue maintaining a healthy lifestyle with regular exercise and balanced diet. Routine screening is sufficient.",
        "Keep an eye on refined sugar intake and stay active. Recheck fasting glucose at your next annual visit.",
        "Consider lifestyle modifications including diet changes and increased physical activity. Follow-up testing recommended in 3-6 months.",
        "Consult with a healthcare provider promptly. Further diagnostic testing is recommended along with immediate lifestyle interventions.",
        "Seek medical evaluation as soon as possible. A confirmatory HbA1c or oral glucose tolerance test and a treatment plan are needed.",
    ],
    potential_diseases: [
        &[],
        &["Prediabetes"],
        &["Prediabetes", "Insulin Resistance"],
        &["Type 2 Diabetes", "Metabolic Syndrome"],
        &["Type 2 Diabetes", "Diabetic Complications"],
    ],
};

static CARDIOVASCULAR: Guidance = Guidance {
    recommendations: [
        "Maintain current healthy habits. Regular cardiovascular check-ups every 1-2 years are sufficient.",
        "Limit saturated fat and keep up regular aerobic exercise. Repeat a lipid panel within a year.",
        "Consider dietary adjustments to address cholesterol levels. Increase physical activity and reduce saturated fat intake. Follow-up in 6 months.",
        "Consult with a cardiologist soon. Consider medication options alongside significant lifestyle modifications to reduce cardiovascular risk.",
        "Arrange a cardiology consultation without delay. Lipid-lowering therapy and a full cardiac work-up are likely needed.",
    ],
    potential_diseases: [
        &[],
        &["Borderline Hyperlipidemia"],
        &["Hyperlipidemia", "Atherosclerosis"],
        &["Coronary Artery Disease", "Atherosclerosis"],
        &["Coronary Artery Disease", "Myocardial Infarction"],
    ],
};

static METABOLIC: Guidance = Guidance {
    recommendations: [
        "Metabolic markers look healthy. Keep a balanced diet and regular physical activity.",
        "Aim for gradual weight management and fewer processed foods. Recheck the panel in a year.",
        "Discuss diet and exercise changes with your physician. Repeat lipid and kidney markers in 3-6 months.",
        "See your physician promptly for a metabolic work-up. Structured weight management and lipid control are recommended.",
        "Seek medical evaluation soon. Several metabolic markers are out of range and may need medication alongside lifestyle changes.",
    ],
    potential_diseases: [
        &[],
        &["Overweight"],
        &["Hypercholesterolemia", "Hypertriglyceridemia"],
        &["Obesity", "Hypercholesterolemia"],
        &["Obesity", "Kidney Function Impairment"],
    ],
};

static ORAL_CANCER: Guidance = Guidance {
    recommendations: [
        "Continue regular dental check-ups. Maintain good oral hygiene practices. No additional screening needed at this time.",
        "Keep up good oral hygiene and mention any persistent sores to your dentist at the next check-up.",
        "Schedule a comprehensive oral examination with a dentist or oral surgeon. Consider more frequent dental check-ups and enhanced oral hygiene practices.",
        "Urgent referral to an oral oncologist is recommended. Further diagnostic testing including tissue biopsy may be required.",
        "Immediate referral to an oral oncologist is required. A tissue biopsy and imaging should be arranged without delay.",
    ],
    potential_diseases: [
        &[],
        &["Oral Inflammation"],
        &["Oral Leukoplakia", "Chronic Periodontitis"],
        &["Oral Squamous Cell Carcinoma", "Oral Leukoplakia"],
        &["Oral Squamous Cell Carcinoma"],
    ],
};

static KIDNEY: Guidance = Guidance {
    recommendations: [
        "Continue regular check-ups with your healthcare provider. Maintain proper hydration and a balanced diet low in sodium.",
        "Stay well hydrated and limit sodium. Repeat the urine test at your next routine visit.",
        "Schedule a follow-up with a nephrologist within 3 months. Monitor blood pressure closely and consider dietary modifications.",
        "Urgent consultation with a nephrologist is recommended. Further diagnostic testing and possible intervention may be necessary.",
        "Seek nephrology care immediately. Kidney function tests and imaging are needed to assess damage.",
    ],
    potential_diseases: [
        &[],
        &["Microalbuminuria"],
        &["Chronic Kidney Disease (early stage)", "Microalbuminuria"],
        &["Chronic Kidney Disease", "Acute Kidney Injury"],
        &["Chronic Kidney Disease (advanced)", "Nephrotic Syndrome"],
    ],
};

static URINE_DIABETES: Guidance = Guidance {
    recommendations: [
        "Maintain a healthy lifestyle with regular exercise and a balanced diet. Routine screening with your primary care physician is recommended.",
        "Reduce added sugars and recheck urine glucose at your next routine visit.",
        "Follow up with your healthcare provider for blood glucose testing. Consider lifestyle modifications to improve glucose control.",
        "Urgent blood glucose testing is recommended. Consult with an endocrinologist for comprehensive diabetes evaluation and management.",
        "Seek medical care promptly. Blood glucose and HbA1c testing are needed along with a kidney function assessment.",
    ],
    potential_diseases: [
        &[],
        &["Glycosuria"],
        &["Prediabetes", "Glycosuria"],
        &["Type 2 Diabetes", "Diabetic Nephropathy"],
        &["Type 2 Diabetes", "Diabetic Nephropathy"],
    ],
};

static ALZHEIMER: Guidance = Guidance {
    recommendations: [
        "Continue regular cognitive health check-ups. Maintain brain health with cognitive activities, social engagement, and physical exercise.",
        "Stay mentally and physically active. Mention any memory concerns at your next check-up.",
        "Follow up with a neurologist for comprehensive cognitive assessment. Consider lifestyle interventions known to support brain health.",
        "Consult with a neurologist immediately. Further cognitive testing is recommended, along with potential treatment options and lifestyle interventions.",
        "Urgent neurological evaluation is required. Neuropsychological testing and amyloid imaging should be considered.",
    ],
    potential_diseases: [
        &[],
        &["Mild Cognitive Impairment"],
        &["Mild Cognitive Impairment", "Early Alzheimer's Disease"],
        &["Alzheimer's Disease", "Mild Cognitive Impairment"],
        &["Alzheimer's Disease"],
    ],
};

static BRAIN_TUMOR: Guidance = Guidance {
    recommendations: [
        "No specific action required at this time based on CSF analysis. Continue with regular neurological check-ups as recommended by your physician.",
        "Mention these CSF results at your next neurological check-up. Repeat testing may be suggested.",
        "Follow up with a neurologist for further evaluation. Additional imaging studies may be warranted.",
        "Urgent neurological consultation is required. Further diagnostic imaging such as MRI and potentially biopsy may be necessary.",
        "Immediate neuro-oncology referral is required. Contrast MRI and CSF cytology should be performed without delay.",
    ],
    potential_diseases: [
        &[],
        &["CNS Inflammation"],
        &["CNS Inflammation", "Benign CNS Tumor"],
        &["Glioma", "CNS Lymphoma"],
        &["Glioblastoma", "Leptomeningeal Metastasis"],
    ],
};
