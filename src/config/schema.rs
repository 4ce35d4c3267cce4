use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::bonus::{BonusConfig, EffectiveFactorTable};
use crate::error::Result;
use crate::grading::{GradingSystemModel, ScaleKind};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub grading_systems: Vec<GradingSystemConfig>,

    /// Falls back to the built-in factor catalog when omitted
    #[serde(default)]
    pub bonus: Option<BonusConfig>,
}

/// Grading system as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GradingSystemConfig {
    pub id: String,
    pub kind: ScaleKind,
    pub min: f64,
    pub max: f64,
    pub best_is_highest: bool,

    /// Letter grade -> position on the scale (ordinal systems)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, f64>>,
}

impl GradingSystemConfig {
    pub fn to_model(&self) -> Result<GradingSystemModel> {
        GradingSystemModel::new(
            self.id.clone(),
            self.kind,
            self.min,
            self.max,
            self.best_is_highest,
        )
    }

    /// Translate a letter grade into its numeric position.
    ///
    /// Matching ignores case and surrounding whitespace. Anything without a
    /// label is passed through so the engine can parse or reject it.
    pub fn resolve_raw(&self, raw: &str) -> String {
        let wanted = raw.trim();
        self.labels
            .as_ref()
            .and_then(|labels| {
                labels
                    .iter()
                    .find(|(label, _)| label.eq_ignore_ascii_case(wanted))
                    .map(|(_, position)| position.to_string())
            })
            .unwrap_or_else(|| raw.to_string())
    }
}

impl Config {
    pub fn grading_system(&self, id: &str) -> Option<&GradingSystemConfig> {
        self.grading_systems.iter().find(|s| s.id == id)
    }

    pub fn effective_bonus(&self) -> BonusConfig {
        self.bonus.clone().unwrap_or_default()
    }

    pub fn effective_table(&self, user: Option<&str>, child: Option<&str>) -> EffectiveFactorTable {
        self.effective_bonus().effective_table(user, child)
    }
}

impl Default for Config {
    fn default() -> Self {
        let letters: BTreeMap<String, f64> = ["A", "B", "C", "D", "E", "F"]
            .iter()
            .zip(1..)
            .map(|(label, position)| (label.to_string(), position as f64))
            .collect();

        Self {
            grading_systems: vec![
                GradingSystemConfig {
                    id: "de-1-6".to_string(),
                    kind: ScaleKind::Numeric,
                    min: 1.0,
                    max: 6.0,
                    best_is_highest: false,
                    labels: None,
                },
                GradingSystemConfig {
                    id: "percent".to_string(),
                    kind: ScaleKind::Numeric,
                    min: 0.0,
                    max: 100.0,
                    best_is_highest: true,
                    labels: None,
                },
                GradingSystemConfig {
                    id: "letters-a-f".to_string(),
                    kind: ScaleKind::Ordinal,
                    min: 1.0,
                    max: 6.0,
                    best_is_highest: false,
                    labels: Some(letters),
                },
            ],
            bonus: Some(BonusConfig::default()),
        }
    }
}
