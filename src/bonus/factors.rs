use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::levels::{bucket_for, LevelBand};
use crate::error::GradeError;

/// Key used for the flat `core_subject_bonus` factor.
pub const CORE_BONUS_KEY: &str = "flat";

/// Category of a bonus factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorType {
    /// Multiplier per tier, keyed by tier name
    TierMultiplier,
    /// Flat amount added for core subjects, keyed "flat"
    CoreSubjectBonus,
    /// Multiplier per class-level band, keyed by band key
    LevelScaling,
}

/// How a factor enters the bonus formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorKind {
    Multiplicative,
    Additive,
}

impl FactorType {
    pub fn kind(&self) -> FactorKind {
        match self {
            FactorType::TierMultiplier | FactorType::LevelScaling => FactorKind::Multiplicative,
            FactorType::CoreSubjectBonus => FactorKind::Additive,
        }
    }

    /// Value used when the factor is not configured: neutral for its kind.
    pub fn fallback(&self) -> Decimal {
        match self.kind() {
            FactorKind::Multiplicative => Decimal::ONE,
            FactorKind::Additive => Decimal::ZERO,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FactorType::TierMultiplier => "tier_multiplier",
            FactorType::CoreSubjectBonus => "core_subject_bonus",
            FactorType::LevelScaling => "level_scaling",
        }
    }
}

impl fmt::Display for FactorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configurable parameter of the bonus formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BonusFactor {
    pub factor_type: FactorType,
    pub key: String,
    pub value: Decimal,
}

impl BonusFactor {
    pub fn new(factor_type: FactorType, key: impl Into<String>, value: Decimal) -> Self {
        Self {
            factor_type,
            key: key.into(),
            value,
        }
    }
}

/// Where a factor value used in a calculation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorSource {
    Configured,
    Fallback,
}

/// Factor value together with its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FactorValue {
    pub value: Decimal,
    pub source: FactorSource,
}

impl FactorValue {
    pub fn configured(value: Decimal) -> Self {
        Self {
            value,
            source: FactorSource::Configured,
        }
    }

    pub fn fallback(factor_type: FactorType) -> Self {
        Self {
            value: factor_type.fallback(),
            source: FactorSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == FactorSource::Fallback
    }
}

/// Merged view of default and override factors for one (user, child) pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectiveFactorTable {
    values: BTreeMap<(FactorType, String), Decimal>,
    level_bands: Vec<LevelBand>,
}

impl EffectiveFactorTable {
    /// Attach the bands that map class levels to `level_scaling` keys.
    pub fn with_level_bands(mut self, bands: Vec<LevelBand>) -> Self {
        self.level_bands = bands;
        self
    }

    pub fn level_bands(&self) -> &[LevelBand] {
        &self.level_bands
    }

    pub fn get(&self, factor_type: FactorType, key: &str) -> Option<Decimal> {
        self.values.get(&(factor_type, key.to_string())).copied()
    }

    /// Configured value, or `MissingFactor` if neither layer defines it.
    pub fn lookup(&self, factor_type: FactorType, key: &str) -> Result<Decimal, GradeError> {
        self.get(factor_type, key)
            .ok_or_else(|| GradeError::MissingFactor {
                factor_type,
                key: key.to_string(),
            })
    }

    /// Level band key for a class level, if any band covers it.
    pub fn level_bucket(&self, class_level: u32) -> Option<&str> {
        bucket_for(&self.level_bands, class_level)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All entries as factors, ordered by type then key.
    pub fn factors(&self) -> Vec<BonusFactor> {
        self.values
            .iter()
            .map(|((factor_type, key), value)| BonusFactor::new(*factor_type, key.clone(), *value))
            .collect()
    }

    fn insert(&mut self, factor: &BonusFactor) {
        self.values
            .insert((factor.factor_type, factor.key.clone()), factor.value);
    }
}

/// Merge defaults with overrides; an override replaces the default value of
/// the same (type, key) outright. Within one set, later entries win.
pub fn resolve(defaults: &[BonusFactor], overrides: &[BonusFactor]) -> EffectiveFactorTable {
    let mut table = EffectiveFactorTable::default();
    for factor in defaults.iter().chain(overrides) {
        table.insert(factor);
    }
    table
}
