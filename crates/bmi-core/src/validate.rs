//! Range validation for raw measurement input.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{InvalidReason, ValidationError, ValidationErrors};

/// Maximum accepted weight in kilograms.
pub const MAX_WEIGHT_KG: f64 = 500.0;

/// Maximum accepted height in centimeters.
pub const MAX_HEIGHT_CM: f64 = 300.0;

/// A measurement input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Weight,
    Height,
}

impl Field {
    /// Largest value the field accepts (inclusive).
    pub fn maximum(&self) -> f64 {
        match self {
            Self::Weight => MAX_WEIGHT_KG,
            Self::Height => MAX_HEIGHT_CM,
        }
    }

    /// Error signal raised for this field.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Weight => "invalid-weight",
            Self::Height => "invalid-height",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::Weight => "kg",
            Self::Height => "cm",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weight => f.write_str("weight"),
            Self::Height => f.write_str("height"),
        }
    }
}

/// Validate one raw field value, returning the parsed number.
///
/// The value must parse as a finite number, be greater than zero and not
/// exceed [`Field::maximum`].
pub fn validate(field: Field, raw: &str) -> Result<f64, ValidationError> {
    let reject = |reason| ValidationError { field, reason };

    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| reject(InvalidReason::NotANumber))?;
    if !value.is_finite() {
        return Err(reject(InvalidReason::NotANumber));
    }
    if value <= 0.0 {
        return Err(reject(InvalidReason::NotPositive));
    }
    if value > field.maximum() {
        return Err(reject(InvalidReason::AboveMaximum));
    }
    Ok(value)
}

/// Validated weight and height, ready for computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    pub weight_kg: f64,
    pub height_cm: f64,
}

/// Validate both fields independently.
///
/// Both errors are reported when both fields are bad.
pub fn validate_measurements(
    weight_raw: &str,
    height_raw: &str,
) -> Result<Measurements, ValidationErrors> {
    match (
        validate(Field::Weight, weight_raw),
        validate(Field::Height, height_raw),
    ) {
        (Ok(weight_kg), Ok(height_cm)) => Ok(Measurements {
            weight_kg,
            height_cm,
        }),
        (weight, height) => Err(ValidationErrors {
            weight: weight.err(),
            height: height.err(),
        }),
    }
}
