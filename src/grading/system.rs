use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GradeError, Result};

/// How raw grades of a system are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    /// Raw grades are numbers on a continuous range (points, percentages)
    Numeric,
    /// Raw grades are positions on an ordered scale (letters resolved upstream)
    Ordinal,
}

impl fmt::Display for ScaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleKind::Numeric => write!(f, "numeric"),
            ScaleKind::Ordinal => write!(f, "ordinal"),
        }
    }
}

/// One external grading scale.
///
/// Bounds are checked on construction: they must be finite and `min` may not
/// exceed `max`. A flat scale (`min == max`) is accepted so that the
/// normalizer can report it and fail open.
#[derive(Debug, Clone, PartialEq)]
pub struct GradingSystemModel {
    id: String,
    kind: ScaleKind,
    min: f64,
    max: f64,
    best_is_highest: bool,
}

impl GradingSystemModel {
    pub fn new(
        id: impl Into<String>,
        kind: ScaleKind,
        min: f64,
        max: f64,
        best_is_highest: bool,
    ) -> Result<Self> {
        let id = id.into();
        if !min.is_finite() || !max.is_finite() {
            return Err(GradeError::InvalidScale {
                system: id,
                reason: "bounds must be finite numbers".to_string(),
            });
        }
        if min > max {
            return Err(GradeError::InvalidScale {
                system: id,
                reason: format!("min {} is greater than max {}", min, max),
            });
        }
        Ok(Self {
            id,
            kind,
            min,
            max,
            best_is_highest,
        })
    }

    /// Numeric scale where larger values are better (e.g. 0-100 percent).
    pub fn numeric(id: impl Into<String>, min: f64, max: f64) -> Result<Self> {
        Self::new(id, ScaleKind::Numeric, min, max, true)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ScaleKind {
        self.kind
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn best_is_highest(&self) -> bool {
        self.best_is_highest
    }

    /// True when the scale carries no discriminating information.
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_ordered_bounds() {
        let system = GradingSystemModel::new("de", ScaleKind::Numeric, 1.0, 6.0, false).unwrap();
        assert_eq!(system.id(), "de");
        assert_eq!(system.min(), 1.0);
        assert_eq!(system.max(), 6.0);
        assert!(!system.best_is_highest());
        assert!(!system.is_degenerate());
    }

    #[test]
    fn test_new_rejects_inverted_bounds() {
        let result = GradingSystemModel::new("bad", ScaleKind::Numeric, 6.0, 1.0, true);
        assert!(matches!(result, Err(GradeError::InvalidScale { .. })));
    }

    #[test]
    fn test_new_rejects_non_finite_bounds() {
        let result = GradingSystemModel::numeric("nan", f64::NAN, 10.0);
        assert!(matches!(result, Err(GradeError::InvalidScale { .. })));
        let result = GradingSystemModel::numeric("inf", 0.0, f64::INFINITY);
        assert!(result.is_err());
    }

    #[test]
    fn test_flat_scale_is_degenerate() {
        let system = GradingSystemModel::numeric("flat", 3.0, 3.0).unwrap();
        assert!(system.is_degenerate());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let system = GradingSystemModel::numeric("pct", 0.0, 100.0).unwrap();
        assert!(system.contains(0.0));
        assert!(system.contains(100.0));
        assert!(!system.contains(100.5));
    }

    #[test]
    fn test_scale_kind_serde_names() {
        let kind: ScaleKind = serde_json::from_str("\"ordinal\"").unwrap();
        assert_eq!(kind, ScaleKind::Ordinal);
        assert_eq!(ScaleKind::Numeric.to_string(), "numeric");
    }
}
