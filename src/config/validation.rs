use std::collections::HashSet;

use super::schema::Config;
use crate::bonus::validate_bonus;

/// Validate the whole configuration file.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.grading_systems.is_empty() {
        errors.push("grading_systems: at least one grading system is required".to_string());
    }

    let mut seen_ids = HashSet::new();
    for (i, system) in config.grading_systems.iter().enumerate() {
        let path = format!("grading_systems[{}]", i);

        if system.id.trim().is_empty() {
            errors.push(format!("{}.id: must not be empty", path));
        } else if !seen_ids.insert(system.id.as_str()) {
            errors.push(format!("{}.id: duplicate id '{}'", path, system.id));
        }

        if !system.min.is_finite() || !system.max.is_finite() {
            errors.push(format!("{}: min and max must be finite numbers", path));
        } else if system.min >= system.max {
            errors.push(format!(
                "{}: min ({}) must be below max ({})",
                path, system.min, system.max
            ));
        }

        if let Some(ref labels) = system.labels {
            for (label, position) in labels {
                if label.trim().is_empty() {
                    errors.push(format!("{}.labels: empty label", path));
                }
                if *position < system.min || *position > system.max {
                    errors.push(format!(
                        "{}.labels.{}: position {} outside scale {}..{}",
                        path, label, position, system.min, system.max
                    ));
                }
            }
        }
    }

    if let Some(ref bonus) = config.bonus {
        if let Err(bonus_errors) = validate_bonus(bonus) {
            errors.extend(bonus_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
