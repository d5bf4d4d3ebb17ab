//! Body-mass index computation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// BMI category, decided from the unrounded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Lower bound of the normal range.
    pub const NORMAL_MIN: f64 = 18.5;
    /// Lower bound of the overweight range.
    pub const OVERWEIGHT_MIN: f64 = 25.0;
    /// Lower bound of the obese range.
    pub const OBESE_MIN: f64 = 30.0;

    /// All categories in ascending order.
    pub const ALL: [BmiCategory; 4] = [
        Self::Underweight,
        Self::Normal,
        Self::Overweight,
        Self::Obese,
    ];

    /// Classify a BMI value. Lower bounds are inclusive.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < Self::NORMAL_MIN {
            Self::Underweight
        } else if bmi < Self::OVERWEIGHT_MIN {
            Self::Normal
        } else if bmi < Self::OBESE_MIN {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    /// Stable lowercase identifier, as stored in history.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Underweight => "underweight",
            Self::Normal => "normal",
            Self::Overweight => "overweight",
            Self::Obese => "obese",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BmiCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("unknown BMI category '{s}'"))
    }
}

/// Outcome of a BMI computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BmiResult {
    /// BMI rounded to one decimal place.
    pub value: f64,
    pub category: BmiCategory,
}

/// Compute BMI from weight in kilograms and height in centimeters.
///
/// Inputs are expected to have passed [`validate`](crate::validate::validate).
pub fn compute(weight_kg: f64, height_cm: f64) -> BmiResult {
    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);
    BmiResult {
        value: round_one_decimal(bmi),
        category: BmiCategory::from_bmi(bmi),
    }
}

/// Round half-up to one decimal place.
///
/// BMI is always positive here, where `f64::round` (half away from zero)
/// agrees with round-half-up.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_scenario() {
        let result = compute(70.0, 175.0);
        assert_eq!(result.value, 22.9);
        assert_eq!(result.category, BmiCategory::Normal);
    }

    #[test]
    fn test_obese_scenario() {
        let result = compute(120.0, 170.0);
        assert_eq!(result.value, 41.5);
        assert_eq!(result.category, BmiCategory::Obese);
    }

    #[test]
    fn test_thresholds_are_inclusive_lower_bounds() {
        assert_eq!(BmiCategory::from_bmi(18.49), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(24.99), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(29.99), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_category_uses_unrounded_value() {
        // 24.96 rounds to 25.0 for display but is still normal.
        let height_cm = 200.0;
        let weight_kg = 24.96 * 4.0;
        let result = compute(weight_kg, height_cm);
        assert_eq!(result.value, 25.0);
        assert_eq!(result.category, BmiCategory::Normal);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_one_decimal(22.25), 22.3);
        assert_eq!(round_one_decimal(22.24), 22.2);
    }

    #[test]
    fn test_near_tie_values_round_up() {
        // 30.2 / 2.0^2 = 7.55
        assert_eq!(compute(30.2, 200.0).value, 7.6);
        // 45 / 2.0^2 = 11.25 exactly, ruling out truncation and half-to-even.
        assert_eq!(compute(45.0, 200.0).value, 11.3);
        // 89 / 2.0^2 = 22.25 exactly.
        assert_eq!(compute(89.0, 200.0).value, 22.3);
        // 30.19 / 2.0^2 = 7.5475
        assert_eq!(compute(30.19, 200.0).value, 7.5);
        // 70 / 1.75^2 = 22.857...
        assert_eq!(compute(70.0, 175.0).value, 22.9);
    }

    #[test]
    fn test_category_parses_from_stored_name() {
        assert_eq!("obese".parse::<BmiCategory>(), Ok(BmiCategory::Obese));
        assert!("heavy".parse::<BmiCategory>().is_err());
    }
}
