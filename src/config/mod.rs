mod schema;
mod validation;

pub use schema::{Config, GradingSystemConfig};
pub use validation::validate_config;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.config/grade-bonus/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("grade-bonus"))
}

/// Get the default config file path (~/.config/grade-bonus/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Ensure the parent directory of `path` exists
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path (~/.config/grade-bonus/config.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - The config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(path) => path,
        None => get_config_path()?,
    };

    if !config_path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Run `grade-bonus init` to create one",
            config_path.display()
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    Ok(config)
}

/// Write `config` as YAML, refusing to replace an existing file unless `force` is set.
pub fn write_config(path: &Path, config: &Config, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}. Use --force to overwrite",
            path.display()
        );
    }

    let yaml = serde_saphyr::to_string(config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    ensure_parent_dir(path)?;
    fs::write(path, yaml)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_load_missing_file_errors() {
        let path = env::temp_dir().join("grade_bonus_test_missing_config.yaml");
        let _ = fs::remove_file(&path);

        let err = load_config(Some(path)).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_write_and_load_roundtrip() {
        let path = env::temp_dir().join("grade_bonus_test_config_roundtrip.yaml");
        let _ = fs::remove_file(&path);

        let config = Config::default();
        write_config(&path, &config, false).unwrap();
        let loaded = load_config(Some(path.clone())).unwrap();
        assert_eq!(loaded, config);

        // Second write without force is refused
        assert!(write_config(&path, &config, false).is_err());
        assert!(write_config(&path, &config, true).is_ok());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_invalid_yaml_errors() {
        let path = env::temp_dir().join("grade_bonus_test_invalid_config.yaml");
        fs::write(&path, "grading_systems: [ {id: 1").unwrap();

        let err = load_config(Some(path.clone())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));

        let _ = fs::remove_file(&path);
    }
}
