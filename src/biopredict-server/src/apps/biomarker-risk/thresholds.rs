// Copyright (c), BioPredict Contributors
// SPDX-License-Identifier: Apache-2.0

//! Threshold ladders. One table per biomarker drives both the points added to
//! a disease score and the factor text shown to the user.

use crate::app::types::{FactorType, PredictionFactor};

/// Condition a measured value must satisfy for a band to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandTest {
    /// value < x
    Below(f64),
    /// value <= x
    AtMost(f64),
    /// value >= x
    AtLeast(f64),
    /// lo <= value <= hi
    Within(f64, f64),
    Otherwise,
}

impl BandTest {
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            BandTest::Below(x) => value < x,
            BandTest::AtMost(x) => value <= x,
            BandTest::AtLeast(x) => value >= x,
            BandTest::Within(lo, hi) => lo <= value && value <= hi,
            BandTest::Otherwise => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub test: BandTest,
    pub points: u32,
    pub kind: FactorType,
    /// Factor text; `{value}` is replaced by the measured value and unit.
    pub template: &'static str,
}

impl Band {
    pub const fn new(test: BandTest, points: u32, kind: FactorType, template: &'static str) -> Self {
        Self {
            test,
            points,
            kind,
            template,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BiomarkerRule {
    /// JSON field name in the request payload
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    /// Tried in order; the first match wins.
    pub bands: &'static [Band],
}

/// Outcome of placing one value on a ladder.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub points: u32,
    pub factor: PredictionFactor,
}

impl Assessment {
    /// Warning and negative bands count towards compounding bonuses.
    pub fn is_flagged(&self) -> bool {
        self.factor.kind != FactorType::Positive
    }
}

impl BiomarkerRule {
    /// Place `value` on the ladder. `None` means no band matched, which only
    /// happens for a ladder without an `Otherwise` tail or a NaN value.
    pub fn assess(&self, value: f64) -> Option<Assessment> {
        let band = self.bands.iter().find(|band| band.test.matches(value))?;
        Some(Assessment {
            points: band.points,
            factor: PredictionFactor {
                kind: band.kind,
                text: band
                    .template
                    .replace("{value}", &format_quantity(value, self.unit)),
            },
        })
    }

    /// Human readable range of the first positive band, e.g. `< 100 mg/dL`.
    pub fn normal_range(&self) -> String {
        let Some(band) = self
            .bands
            .iter()
            .find(|band| band.kind == FactorType::Positive)
        else {
            return "n/a".to_string();
        };
        let range = match band.test {
            BandTest::Below(x) => format!("< {x}"),
            BandTest::AtMost(x) => format!("<= {x}"),
            BandTest::AtLeast(x) => format!(">= {x}"),
            BandTest::Within(lo, hi) => format!("{lo}-{hi}"),
            BandTest::Otherwise => "any".to_string(),
        };
        match self.unit {
            "" => range,
            "%" => format!("{range}%"),
            unit => format!("{range} {unit}"),
        }
    }
}

/// Render a measurement the way it was typed: `115 mg/dL`, `5.9%`, `1.02`.
pub fn format_quantity(value: f64, unit: &str) -> String {
    match unit {
        "" => format!("{value}"),
        "%" => format!("{value}%"),
        unit => format!("{value} {unit}"),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const GLUCOSE: BiomarkerRule = BiomarkerRule {
        key: "glucose",
        label: "Fasting glucose",
        unit: "mg/dL",
        bands: &[
            Band::new(
                BandTest::Below(100.0),
                0,
                FactorType::Positive,
                "Normal fasting glucose ({value})",
            ),
            Band::new(
                BandTest::Below(126.0),
                20,
                FactorType::Warning,
                "Elevated fasting glucose ({value})",
            ),
            Band::new(
                BandTest::Otherwise,
                40,
                FactorType::Negative,
                "High fasting glucose ({value})",
            ),
        ],
    };

    #[test]
    fn band_tests_respect_their_boundaries() {
        assert!(BandTest::Below(100.0).matches(99.9));
        assert!(!BandTest::Below(100.0).matches(100.0));
        assert!(BandTest::AtMost(150.0).matches(150.0));
        assert!(BandTest::AtLeast(40.0).matches(40.0));
        assert!(!BandTest::AtLeast(40.0).matches(39.99));
        assert!(BandTest::Within(45.0, 80.0).matches(45.0));
        assert!(BandTest::Within(45.0, 80.0).matches(80.0));
        assert!(!BandTest::Within(45.0, 80.0).matches(80.5));
        assert!(BandTest::Otherwise.matches(f64::MAX));
    }

    #[test]
    fn first_matching_band_wins() {
        let low = GLUCOSE.assess(90.0).unwrap();
        assert_eq!(low.points, 0);
        assert_eq!(low.factor.kind, FactorType::Positive);
        assert!(!low.is_flagged());

        let edge = GLUCOSE.assess(100.0).unwrap();
        assert_eq!(edge.points, 20);
        assert_eq!(edge.factor.text, "Elevated fasting glucose (100 mg/dL)");

        let high = GLUCOSE.assess(130.0).unwrap();
        assert_eq!(high.points, 40);
        assert_eq!(high.factor.kind, FactorType::Negative);
        assert!(high.is_flagged());
    }

    #[test]
    fn ladder_without_tail_can_miss() {
        let rule = BiomarkerRule {
            bands: &GLUCOSE.bands[..1],
            ..GLUCOSE
        };
        assert_eq!(rule.assess(150.0), None);
    }

    #[test]
    fn quantities_render_without_trailing_zeros() {
        assert_eq!(format_quantity(115.0, "mg/dL"), "115 mg/dL");
        assert_eq!(format_quantity(5.9, "%"), "5.9%");
        assert_eq!(format_quantity(1.02, ""), "1.02");
    }

    #[test]
    fn normal_range_uses_first_positive_band() {
        assert_eq!(GLUCOSE.normal_range(), "< 100 mg/dL");
    }
}
