use super::types::{BonusLedger, LEDGER_VERSION};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Get the default ledger file path (~/.config/grade-bonus/ledger.json)
pub fn get_ledger_path() -> Result<PathBuf> {
    Ok(crate::config::get_config_dir()?.join("ledger.json"))
}

/// Load the ledger from a JSON file
///
/// If the file doesn't exist, returns a new empty ledger.
/// If the file exists but has an unsupported version, returns an error.
pub fn load_ledger(path: &Path) -> Result<BonusLedger> {
    if !path.exists() {
        return Ok(BonusLedger::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open ledger file at {}", path.display()))?;

    let mut ledger: BonusLedger =
        serde_json::from_reader(file).context("Failed to load bonus ledger")?;

    if ledger.version != LEDGER_VERSION {
        anyhow::bail!("Unsupported ledger version: {}", ledger.version);
    }

    // Older files may lack the counter; never hand out an id twice
    let after_last = ledger.records.keys().next_back().map_or(1, |id| id + 1);
    ledger.next_id = ledger.next_id.max(after_last);

    Ok(ledger)
}

/// Save the ledger to a JSON file atomically
///
/// Creates the parent directory if it doesn't exist.
pub fn save_ledger(path: &Path, ledger: &BonusLedger) -> Result<()> {
    crate::config::ensure_parent_dir(path)?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, ledger).context("Failed to serialize bonus ledger")?;

    file.commit().context("Failed to save bonus ledger")?;

    Ok(())
}
