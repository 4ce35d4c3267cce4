use rust_decimal::Decimal;
use std::collections::HashSet;

use super::config::BonusConfig;
use super::factors::{BonusFactor, FactorType};
use super::levels::RangeOp;

/// Validate bonus configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_bonus(config: &BonusConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    check_factors("bonus.defaults", &config.defaults, &mut errors);

    for (i, band) in config.level_bands.iter().enumerate() {
        if let Err(e) = RangeOp::parse(&band.range) {
            errors.push(format!(
                "bonus.level_bands[{}].range: invalid '{}' - {}",
                i, band.range, e
            ));
        }
        if band.key.trim().is_empty() {
            errors.push(format!("bonus.level_bands[{}].key: must not be empty", i));
        }
    }

    let mut seen_scopes = HashSet::new();
    for (i, o) in config.overrides.iter().enumerate() {
        if o.user.trim().is_empty() {
            errors.push(format!("bonus.overrides[{}].user: must not be empty", i));
        }
        if !seen_scopes.insert((o.user.as_str(), o.child.as_deref())) {
            errors.push(format!(
                "bonus.overrides[{}]: duplicate scope for user '{}'{}",
                i,
                o.user,
                o.child
                    .as_deref()
                    .map(|c| format!(", child '{}'", c))
                    .unwrap_or_default()
            ));
        }
        check_factors(&format!("bonus.overrides[{}].factors", i), &o.factors, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_factors(path: &str, factors: &[BonusFactor], errors: &mut Vec<String>) {
    for (i, factor) in factors.iter().enumerate() {
        if factor.key.trim().is_empty() {
            errors.push(format!("{}[{}].key: must not be empty", path, i));
        }
        if factor.value < Decimal::ZERO {
            errors.push(format!(
                "{}[{}].value: {} factor '{}' must be non-negative, got {}",
                path, i, factor.factor_type, factor.key, factor.value
            ));
        }
        if factor.factor_type == FactorType::TierMultiplier
            && !crate::grading::Tier::ALL.iter().any(|t| t.key() == factor.key)
        {
            errors.push(format!(
                "{}[{}].key: unknown tier '{}' (expected best, second, third or below)",
                path, i, factor.key
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::config::FactorOverride;
    use crate::bonus::levels::LevelBand;

    fn factor(factor_type: FactorType, key: &str, value: &str) -> BonusFactor {
        BonusFactor::new(factor_type, key, value.parse().unwrap())
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_bonus(&BonusConfig::default()).is_ok());
    }

    #[test]
    fn test_negative_factor() {
        let config = BonusConfig {
            defaults: vec![factor(FactorType::CoreSubjectBonus, "flat", "-1")],
            ..BonusConfig::default()
        };
        let errors = validate_bonus(&config).unwrap_err();
        assert!(errors[0].contains("bonus.defaults[0].value"));
    }

    #[test]
    fn test_unknown_tier_key() {
        let config = BonusConfig {
            defaults: vec![factor(FactorType::TierMultiplier, "gold", "2")],
            ..BonusConfig::default()
        };
        let errors = validate_bonus(&config).unwrap_err();
        assert!(errors[0].contains("unknown tier 'gold'"));
    }

    #[test]
    fn test_invalid_level_band() {
        let config = BonusConfig {
            level_bands: vec![LevelBand::new("nine+", "upper")],
            ..BonusConfig::default()
        };
        let errors = validate_bonus(&config).unwrap_err();
        assert!(errors[0].contains("bonus.level_bands[0].range"));
    }

    #[test]
    fn test_override_checks() {
        let config = BonusConfig {
            overrides: vec![
                FactorOverride {
                    user: " ".to_string(),
                    child: None,
                    factors: vec![],
                },
                FactorOverride {
                    user: "anna".to_string(),
                    child: Some("ben".to_string()),
                    factors: vec![factor(FactorType::LevelScaling, "", "1")],
                },
                FactorOverride {
                    user: "anna".to_string(),
                    child: Some("ben".to_string()),
                    factors: vec![],
                },
            ],
            ..BonusConfig::default()
        };
        let errors = validate_bonus(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("bonus.overrides[0].user"));
        assert!(errors[1].contains("bonus.overrides[1].factors[0].key"));
        assert!(errors[2].contains("duplicate scope"));
    }

    #[test]
    fn test_collects_all_errors() {
        let config = BonusConfig {
            defaults: vec![
                factor(FactorType::CoreSubjectBonus, "flat", "-2"),
                factor(FactorType::TierMultiplier, "top", "1"),
            ],
            level_bands: vec![LevelBand::new("x", "")],
            overrides: vec![],
        };
        let errors = validate_bonus(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
