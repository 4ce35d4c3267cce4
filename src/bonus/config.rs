use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::factors::{resolve, BonusFactor, EffectiveFactorTable, FactorType, CORE_BONUS_KEY};
use super::levels::{default_level_bands, LevelBand};
use crate::grading::Tier;

/// Bonus configuration: global default factors, class-level bands and
/// per-user / per-child overrides.
///
/// Example YAML:
/// ```yaml
/// bonus:
///   defaults:
///     - { factor_type: tier_multiplier, key: best, value: 1.5 }
///     - { factor_type: core_subject_bonus, key: flat, value: 2 }
///     - { factor_type: level_scaling, key: "5-8", value: 1.5 }
///   level_bands:
///     - { range: "1-4", key: "1-4" }
///     - { range: "5-8", key: "5-8" }
///   overrides:
///     - user: anna
///       child: ben
///       factors:
///         - { factor_type: tier_multiplier, key: best, value: 2 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BonusConfig {
    #[serde(default)]
    pub defaults: Vec<BonusFactor>,

    /// Class-level bands; first match selects the `level_scaling` key
    #[serde(default = "default_level_bands")]
    pub level_bands: Vec<LevelBand>,

    #[serde(default)]
    pub overrides: Vec<FactorOverride>,
}

/// Factors overriding the defaults for one user, optionally narrowed to one child.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FactorOverride {
    pub user: String,

    /// Without a child the override applies to all of the user's children
    #[serde(default)]
    pub child: Option<String>,

    pub factors: Vec<BonusFactor>,
}

impl Default for BonusConfig {
    fn default() -> Self {
        let multiplier =
            |tier: Tier, value: Decimal| BonusFactor::new(FactorType::TierMultiplier, tier.key(), value);
        let level = |key: &str, value: Decimal| BonusFactor::new(FactorType::LevelScaling, key, value);

        Self {
            defaults: vec![
                multiplier(Tier::Best, Decimal::new(15, 1)),
                multiplier(Tier::Second, Decimal::ONE),
                multiplier(Tier::Third, Decimal::new(5, 1)),
                multiplier(Tier::Below, Decimal::ZERO),
                BonusFactor::new(FactorType::CoreSubjectBonus, CORE_BONUS_KEY, Decimal::new(2, 0)),
                level("1-4", Decimal::ONE),
                level("5-8", Decimal::new(15, 1)),
                level("9-13", Decimal::new(2, 0)),
            ],
            level_bands: default_level_bands(),
            overrides: Vec::new(),
        }
    }
}

impl BonusConfig {
    /// Override factors that apply to `(user, child)`.
    ///
    /// User-wide overrides come first and child-specific ones last, so when
    /// both define a key the child-specific value wins on resolve.
    pub fn scoped_overrides(&self, user: &str, child: Option<&str>) -> Vec<BonusFactor> {
        let user_wide = self
            .overrides
            .iter()
            .filter(|o| o.user == user && o.child.is_none());
        let child_specific = self.overrides.iter().filter(|o| {
            o.user == user && child.is_some() && o.child.as_deref() == child
        });

        user_wide
            .chain(child_specific)
            .flat_map(|o| o.factors.iter().cloned())
            .collect()
    }

    /// Effective factor table for `(user, child)`; without a user only the
    /// defaults apply.
    pub fn effective_table(&self, user: Option<&str>, child: Option<&str>) -> EffectiveFactorTable {
        let overrides = match user {
            Some(user) => self.scoped_overrides(user, child),
            None => Vec::new(),
        };
        resolve(&self.defaults, &overrides).with_level_bands(self.level_bands.clone())
    }
}
