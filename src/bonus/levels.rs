use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Class-level range expression: "<N", "<=N", ">N", ">=N", "N" or "N-M".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeOp {
    LessThan(u32),
    LessEqual(u32),
    GreaterThan(u32),
    GreaterEqual(u32),
    Equal(u32),
    Between(u32, u32), // inclusive
}

impl RangeOp {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(val) = s.strip_prefix(">=") {
            Ok(RangeOp::GreaterEqual(val.trim().parse()?))
        } else if let Some(val) = s.strip_prefix("<=") {
            Ok(RangeOp::LessEqual(val.trim().parse()?))
        } else if let Some(val) = s.strip_prefix('>') {
            Ok(RangeOp::GreaterThan(val.trim().parse()?))
        } else if let Some(val) = s.strip_prefix('<') {
            Ok(RangeOp::LessThan(val.trim().parse()?))
        } else if let Some((low, high)) = s.split_once('-') {
            let low: u32 = low.trim().parse()?;
            let high: u32 = high.trim().parse()?;
            if low > high {
                bail!("Range start {} is above range end {}", low, high);
            }
            Ok(RangeOp::Between(low, high))
        } else {
            Ok(RangeOp::Equal(s.parse()?))
        }
    }

    pub fn matches(&self, value: u32) -> bool {
        match self {
            RangeOp::LessThan(n) => value < *n,
            RangeOp::LessEqual(n) => value <= *n,
            RangeOp::GreaterThan(n) => value > *n,
            RangeOp::GreaterEqual(n) => value >= *n,
            RangeOp::Equal(n) => value == *n,
            RangeOp::Between(low, high) => value >= *low && value <= *high,
        }
    }
}

/// Maps a band of class levels onto a `level_scaling` factor key.
///
/// The key is opaque to the engine; it only has to match a configured
/// `level_scaling` factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelBand {
    /// Range expression (e.g. "1-4", ">=9")
    pub range: String,

    /// Factor key selected for levels in the range
    pub key: String,
}

impl LevelBand {
    pub fn new(range: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            key: key.into(),
        }
    }

    /// Band whose key is the range expression itself.
    pub fn keyed_by_range(range: &str) -> Self {
        Self::new(range, range)
    }
}

/// Default school-level bands: primary, lower secondary, upper secondary.
pub fn default_level_bands() -> Vec<LevelBand> {
    vec![
        LevelBand::keyed_by_range("1-4"),
        LevelBand::keyed_by_range("5-8"),
        LevelBand::keyed_by_range("9-13"),
    ]
}

/// Find the key of the first band whose range contains `class_level`.
///
/// Bands with unparsable ranges are skipped; config validation reports them.
pub fn bucket_for(bands: &[LevelBand], class_level: u32) -> Option<&str> {
    bands
        .iter()
        .find(|band| {
            RangeOp::parse(&band.range)
                .map(|range| range.matches(class_level))
                .unwrap_or(false)
        })
        .map(|band| band.key.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_less_than() {
        let range = RangeOp::parse("<5").unwrap();
        assert!(range.matches(4));
        assert!(!range.matches(5));
    }

    #[test]
    fn test_parse_range_less_equal() {
        let range = RangeOp::parse("<=4").unwrap();
        assert!(range.matches(4));
        assert!(!range.matches(5));
    }

    #[test]
    fn test_parse_range_greater_than() {
        let range = RangeOp::parse(">8").unwrap();
        assert!(!range.matches(8));
        assert!(range.matches(9));
    }

    #[test]
    fn test_parse_range_greater_equal() {
        let range = RangeOp::parse(">= 9").unwrap();
        assert!(!range.matches(8));
        assert!(range.matches(9));
        assert!(range.matches(13));
    }

    #[test]
    fn test_parse_range_equal() {
        let range = RangeOp::parse("7").unwrap();
        assert!(range.matches(7));
        assert!(!range.matches(6));
    }

    #[test]
    fn test_parse_range_between() {
        let range = RangeOp::parse("5-8").unwrap();
        assert!(!range.matches(4));
        assert!(range.matches(5));
        assert!(range.matches(7));
        assert!(range.matches(8));
        assert!(!range.matches(9));
    }

    #[test]
    fn test_parse_range_rejects_garbage() {
        assert!(RangeOp::parse("five").is_err());
        assert!(RangeOp::parse("8-5").is_err());
        assert!(RangeOp::parse("1-2-3").is_err());
        assert!(RangeOp::parse("").is_err());
    }

    #[test]
    fn test_bucket_for_default_bands() {
        let bands = default_level_bands();
        assert_eq!(bucket_for(&bands, 1), Some("1-4"));
        assert_eq!(bucket_for(&bands, 7), Some("5-8"));
        assert_eq!(bucket_for(&bands, 13), Some("9-13"));
        assert_eq!(bucket_for(&bands, 14), None);
    }

    #[test]
    fn test_bucket_first_match_wins() {
        let bands = vec![
            LevelBand::new("<=6", "primary"),
            LevelBand::new("1-13", "any"),
        ];
        assert_eq!(bucket_for(&bands, 3), Some("primary"));
        assert_eq!(bucket_for(&bands, 9), Some("any"));
    }

    #[test]
    fn test_bucket_skips_invalid_ranges() {
        let bands = vec![LevelBand::new("junk", "x"), LevelBand::new(">0", "all")];
        assert_eq!(bucket_for(&bands, 2), Some("all"));
    }
}
