use tracing::warn;

use super::system::{GradingSystemModel, ScaleKind};
use crate::error::{GradeError, Result};

/// Outcome of normalizing one raw grade.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Score in [0, 100], 100 always best
    pub score: f64,
    /// Raw value was outside the scale and got clamped
    pub clamped: bool,
    /// Set when the scale was flat and the raw value passed through
    pub degenerate: Option<GradeError>,
}

/// Convert a raw grade into a score in [0, 100] where 100 is best.
pub fn normalize(system: &GradingSystemModel, raw: &str) -> Result<f64> {
    normalize_detailed(system, raw).map(|n| n.score)
}

/// Like [`normalize`], but also reports clamping and degenerate scales.
pub fn normalize_detailed(system: &GradingSystemModel, raw: &str) -> Result<Normalized> {
    let value = parse_raw(system, raw)?;

    if system.is_degenerate() {
        let error = GradeError::DegenerateScale {
            system: system.id().to_string(),
        };
        warn!(system = system.id(), raw, "{}", error);
        return Ok(Normalized {
            score: value.clamp(0.0, 100.0),
            clamped: false,
            degenerate: Some(error),
        });
    }

    let bounded = value.clamp(system.min(), system.max());
    let clamped = bounded != value;
    if clamped {
        warn!(
            system = system.id(),
            raw,
            min = system.min(),
            max = system.max(),
            "grade outside scale, clamped to {}",
            bounded
        );
    }

    let span = system.max() - system.min();
    let distance = if system.best_is_highest() {
        bounded - system.min()
    } else {
        system.max() - bounded
    };
    let score = (100.0 * distance / span).clamp(0.0, 100.0);

    Ok(Normalized {
        score,
        clamped,
        degenerate: None,
    })
}

fn parse_raw(system: &GradingSystemModel, raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    let invalid = |reason: String| GradeError::InvalidGradeValue {
        subject: String::new(),
        value: raw.to_string(),
        reason,
    };

    if trimmed.is_empty() {
        return Err(invalid("grade is empty".to_string()));
    }

    // Decimal comma is common on report cards ("2,5")
    let value: f64 = trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| invalid(format!("not a number on scale '{}'", system.id())))?;

    if !value.is_finite() {
        return Err(invalid("grade must be a finite number".to_string()));
    }

    if system.kind() == ScaleKind::Ordinal && value.fract() != 0.0 {
        return Err(invalid(format!(
            "'{}' is an ordinal scale and expects a whole position",
            system.id()
        )));
    }

    Ok(value)
}
