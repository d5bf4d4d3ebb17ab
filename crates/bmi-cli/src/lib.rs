//! CLI library components for BMI Studio.

pub mod logging;
pub mod summary;
