//! Error types for the BMI core.
//!
//! Validation errors are user-correctable and carry the offending field.
//! Persistence errors are never fatal: the in-memory state stays
//! authoritative and the error is surfaced as a warning.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::validate::Field;

/// Why a raw input value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// The value is empty or not a finite number.
    NotANumber,
    /// The value is zero or negative.
    NotPositive,
    /// The value exceeds the field maximum.
    AboveMaximum,
}

impl InvalidReason {
    /// Stable kebab-case identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotANumber => "not-a-number",
            Self::NotPositive => "not-positive",
            Self::AboveMaximum => "above-maximum",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {reason}", field.error_code())]
pub struct ValidationError {
    pub field: Field,
    pub reason: InvalidReason,
}

impl ValidationError {
    /// Signal identifying the field (`invalid-weight` / `invalid-height`).
    pub fn code(&self) -> &'static str {
        self.field.error_code()
    }
}

/// Validation failures for a whole measurement form.
///
/// Each field is checked independently, so both may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub weight: Option<ValidationError>,
    pub height: Option<ValidationError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.weight.is_none() && self.height.is_none()
    }

    /// Iterate over the present errors, weight first.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.weight.iter().chain(self.height.iter())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// A compute request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputeError {
    /// One or both inputs failed validation.
    #[error("invalid input: {0}")]
    Invalid(ValidationErrors),

    /// Another computation is still in flight.
    #[error("a calculation is already in progress")]
    Busy,

    /// The pending computation was started by a different session.
    #[error("the calculation belongs to another session")]
    ForeignComputation,
}

/// Durable storage operation error.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// File I/O error.
    #[error("Failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Value could not be serialized for storage.
    #[error("Failed to serialize value for key '{key}'")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Atomic write failed (temp file couldn't be renamed).
    #[error("Failed to complete write of key '{key}'")]
    AtomicWriteFailed {
        key: String,
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backend refused the write (e.g. quota exhausted).
    #[error("Storage rejected write of key '{key}': {reason}")]
    Rejected { key: String, reason: String },
}

impl PersistenceError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Io {
                operation, path, ..
            } => format!("Could not {} {}", operation, path.display()),
            Self::Serialization { key, .. } => {
                format!("Your '{key}' data could not be prepared for saving.")
            }
            Self::AtomicWriteFailed { target_path, .. } => format!(
                "Could not save to {}. Changes are kept for this session only.",
                target_path.display()
            ),
            Self::Rejected { key, reason } => {
                format!("Saving '{key}' was refused ({reason}). Changes are kept for this session only.")
            }
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Io { operation, .. } => {
                if *operation == "read" {
                    Some("Check that the data directory is readable.".into())
                } else {
                    Some("Check that you have permission to write to the data directory.".into())
                }
            }
            Self::Serialization { .. } => None,
            Self::AtomicWriteFailed { .. } | Self::Rejected { .. } => {
                Some("Free up disk space or choose a different data directory.".into())
            }
        }
    }
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
