use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest normalized score of each tier band (inclusive).
pub const BEST_THRESHOLD: f64 = 75.0;
pub const SECOND_THRESHOLD: f64 = 50.0;
pub const THIRD_THRESHOLD: f64 = 25.0;

/// Quality tier of a normalized grade, ordered best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Best,
    Second,
    Third,
    Below,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Best, Tier::Second, Tier::Third, Tier::Below];

    /// Key used for this tier in `tier_multiplier` factors.
    pub fn key(&self) -> &'static str {
        match self {
            Tier::Best => "best",
            Tier::Second => "second",
            Tier::Third => "third",
            Tier::Below => "below",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Map a normalized score to its tier.
///
/// Expects a score in [0, 100] as produced by the normalizer.
pub fn classify(normalized: f64) -> Tier {
    match normalized {
        n if n >= BEST_THRESHOLD => Tier::Best,
        n if n >= SECOND_THRESHOLD => Tier::Second,
        n if n >= THIRD_THRESHOLD => Tier::Third,
        _ => Tier::Below,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(classify(100.0), Tier::Best);
        assert_eq!(classify(75.0), Tier::Best);
        assert_eq!(classify(74.99), Tier::Second);
        assert_eq!(classify(50.0), Tier::Second);
        assert_eq!(classify(49.99), Tier::Third);
        assert_eq!(classify(25.0), Tier::Third);
        assert_eq!(classify(24.99), Tier::Below);
        assert_eq!(classify(0.0), Tier::Below);
    }

    #[test]
    fn test_tiers_are_ordered_best_first() {
        assert!(Tier::Best < Tier::Second);
        assert!(Tier::Second < Tier::Third);
        assert!(Tier::Third < Tier::Below);
    }

    #[test]
    fn test_tier_keys() {
        let keys: Vec<&str> = Tier::ALL.iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec!["best", "second", "third", "below"]);
        assert_eq!(Tier::Second.to_string(), "second");
    }
}
