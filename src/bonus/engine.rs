use rayon::prelude::*;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{debug, warn};

use super::factors::{EffectiveFactorTable, FactorType, FactorValue, CORE_BONUS_KEY};
use crate::error::{GradeError, Result};
use crate::grading::{classify, normalize_detailed, GradingSystemModel, Tier};

/// One submitted grade.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGradeEntry {
    pub subject: String,
    /// Raw grade as written; letter grades arrive already resolved to a position
    pub value: String,
    pub is_core_subject: bool,
    pub note: Option<String>,
}

impl RawGradeEntry {
    pub fn new(subject: impl Into<String>, value: impl Into<String>, is_core_subject: bool) -> Self {
        Self {
            subject: subject.into(),
            value: value.into(),
            is_core_subject,
            note: None,
        }
    }
}

/// Factor values that went into a bonus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonusBreakdown {
    pub tier_multiplier: FactorValue,
    pub core_bonus: FactorValue,
    pub level_scale: FactorValue,
    /// Level band key used for `level_scaling`, if a band matched
    pub level_bucket: Option<String>,
    /// Bonus before rounding, floored at zero
    pub unrounded: Decimal,
}

/// Calculation result for one grade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResult {
    pub subject: String,
    pub normalized: f64,
    pub tier: Tier,
    pub bonus: Decimal,
    pub breakdown: BonusBreakdown,
    /// True when any factor fell back to its neutral value
    pub incomplete: bool,
    /// Non-fatal problems met while calculating
    #[serde(skip)]
    pub diagnostics: Vec<GradeError>,
}

/// A batch entry that was left out of the term result.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    pub index: usize,
    pub subject: String,
    pub reason: GradeError,
}

/// Calculation result for a term's worth of grades.
#[derive(Debug, Clone, PartialEq)]
pub struct TermBonus {
    pub per_entry: Vec<NormalizedResult>,
    pub skipped: Vec<SkippedEntry>,
    /// Full-precision sum of per-entry bonuses, rounded once
    pub total_bonus: Decimal,
}

impl TermBonus {
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Round to cents, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Evaluate a single grade (quick grade).
pub fn calculate_single_grade_bonus(
    system: &GradingSystemModel,
    table: &EffectiveFactorTable,
    class_level: u32,
    entry: &RawGradeEntry,
) -> Result<NormalizedResult> {
    let normalized = normalize_detailed(system, &entry.value)
        .map_err(|e| e.for_subject(&entry.subject))?;
    let mut diagnostics: Vec<GradeError> = normalized.degenerate.into_iter().collect();

    let tier = classify(normalized.score);

    let tier_multiplier = factor_or_fallback(table, FactorType::TierMultiplier, tier.key(), &mut diagnostics);

    let core_bonus = if entry.is_core_subject {
        factor_or_fallback(table, FactorType::CoreSubjectBonus, CORE_BONUS_KEY, &mut diagnostics)
    } else {
        FactorValue::configured(Decimal::ZERO)
    };

    let level_bucket = table.level_bucket(class_level).map(str::to_string);
    let level_scale = match &level_bucket {
        Some(bucket) => factor_or_fallback(table, FactorType::LevelScaling, bucket, &mut diagnostics),
        None => {
            let missing = GradeError::MissingFactor {
                factor_type: FactorType::LevelScaling,
                key: format!("class level {}", class_level),
            };
            warn!("{}", missing);
            diagnostics.push(missing);
            FactorValue::fallback(FactorType::LevelScaling)
        }
    };

    let score = Decimal::from_f64(normalized.score).unwrap_or(Decimal::ZERO);
    let raw_bonus =
        score / Decimal::new(100, 0) * tier_multiplier.value * level_scale.value + core_bonus.value;
    let unrounded = raw_bonus.max(Decimal::ZERO);
    let bonus = round2(unrounded);

    let incomplete =
        tier_multiplier.is_fallback() || core_bonus.is_fallback() || level_scale.is_fallback();

    debug!(
        subject = %entry.subject,
        normalized = normalized.score,
        %tier,
        %bonus,
        incomplete,
        "grade evaluated"
    );

    Ok(NormalizedResult {
        subject: entry.subject.clone(),
        normalized: normalized.score,
        tier,
        bonus,
        breakdown: BonusBreakdown {
            tier_multiplier,
            core_bonus,
            level_scale,
            level_bucket,
            unrounded,
        },
        incomplete,
        diagnostics,
    })
}

/// Evaluate a term's grades. Invalid entries are skipped and reported
/// without affecting the others.
pub fn calculate_term_bonus(
    system: &GradingSystemModel,
    table: &EffectiveFactorTable,
    class_level: u32,
    entries: &[RawGradeEntry],
) -> TermBonus {
    let outcomes: Vec<Result<NormalizedResult>> = entries
        .par_iter()
        .map(|entry| calculate_single_grade_bonus(system, table, class_level, entry))
        .collect();

    let mut per_entry = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    for (index, (entry, outcome)) in entries.iter().zip(outcomes).enumerate() {
        match outcome {
            Ok(result) => per_entry.push(result),
            Err(reason) => {
                warn!(subject = %entry.subject, "skipping grade: {}", reason);
                skipped.push(SkippedEntry {
                    index,
                    subject: entry.subject.clone(),
                    reason,
                });
            }
        }
    }

    let total_bonus = round2(
        per_entry
            .iter()
            .map(|result| result.breakdown.unrounded)
            .sum::<Decimal>(),
    );

    debug!(
        evaluated = per_entry.len(),
        skipped = skipped.len(),
        %total_bonus,
        "term evaluated"
    );

    TermBonus {
        per_entry,
        skipped,
        total_bonus,
    }
}

fn factor_or_fallback(
    table: &EffectiveFactorTable,
    factor_type: FactorType,
    key: &str,
    diagnostics: &mut Vec<GradeError>,
) -> FactorValue {
    match table.lookup(factor_type, key) {
        Ok(value) => FactorValue::configured(value),
        Err(missing) => {
            warn!("{}, using {}", missing, factor_type.fallback());
            diagnostics.push(missing);
            FactorValue::fallback(factor_type)
        }
    }
}
