//! Engine error types

use thiserror::Error;

use crate::bonus::factors::FactorType;

/// Errors and diagnostics produced by the grading engine.
///
/// Only `InvalidGradeValue` and `InvalidScale` stop a calculation. The other
/// variants are reported alongside a result while a documented fallback is
/// used in their place.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradeError {
    /// Raw grade could not be read as a value of the grading system
    #[error("invalid grade '{value}' for {subject}: {reason}")]
    InvalidGradeValue {
        subject: String,
        value: String,
        reason: String,
    },

    /// Scale with min == max; normalization passes the raw value through
    #[error("grading system '{system}' has a flat scale (min == max)")]
    DegenerateScale { system: String },

    /// Factor absent from both defaults and overrides
    #[error("no '{factor_type}' factor configured for key '{key}'")]
    MissingFactor { factor_type: FactorType, key: String },

    /// Grading system bounds that cannot describe a scale
    #[error("invalid grading system '{system}': {reason}")]
    InvalidScale { system: String, reason: String },
}

impl GradeError {
    /// Whether the error aborts the calculation it was raised in.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GradeError::InvalidGradeValue { .. } | GradeError::InvalidScale { .. }
        )
    }

    /// Attach the subject to an `InvalidGradeValue` raised before it was known.
    pub(crate) fn for_subject(self, subject: &str) -> Self {
        match self {
            GradeError::InvalidGradeValue { value, reason, .. } => {
                GradeError::InvalidGradeValue {
                    subject: subject.to_string(),
                    value,
                    reason,
                }
            }
            other => other,
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, GradeError>;
