// crates/templ-cli/src/state_file.rs
//
// Persistence of the ledger between CLI invocations.
//
// The state file is the serde snapshot of the ledger and its in-memory bank.
// Writes go to a sibling temp file first and are renamed into place, so an
// interrupted write never leaves a truncated state behind.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use templ_core::clock::Clock;
use templ_ledger::{InMemoryBank, Templ, TemplSnapshot};

/// Errors from reading or writing the state file.
#[derive(Debug, Error)]
pub enum StateFileError {
    #[error("no ledger state at {0}; run `templ init` first")]
    Missing(PathBuf),

    #[error("ledger state already exists at {0}; pass --force to overwrite")]
    Exists(PathBuf),

    #[error("could not determine home directory")]
    NoHome,

    #[error("state file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file is not valid ledger JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// `~/.templ/state.json`.
pub fn default_path() -> Result<PathBuf, StateFileError> {
    let home = dirs::home_dir().ok_or(StateFileError::NoHome)?;
    Ok(home.join(".templ").join("state.json"))
}

/// Read the ledger at `path`, driven by `clock`.
pub fn load(path: &Path, clock: Arc<dyn Clock>) -> Result<Templ<InMemoryBank>, StateFileError> {
    if !path.exists() {
        return Err(StateFileError::Missing(path.to_path_buf()));
    }
    let contents = fs::read_to_string(path)?;
    let snapshot: TemplSnapshot<InMemoryBank> = serde_json::from_str(&contents)?;
    Ok(Templ::restore(snapshot, clock))
}

/// Write `templ` to `path`, creating parent directories as needed.
pub fn save(path: &Path, templ: &Templ<InMemoryBank>) -> Result<(), StateFileError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let json = serde_json::to_string_pretty(&templ.snapshot())?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    tracing::debug!(path = %path.display(), "ledger state saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use templ_core::clock::ManualClock;
    use templ_ledger::TemplConfig;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("templ-cli-test-{}-{}", name, std::process::id()))
            .join("state.json")
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("roundtrip");
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(1_000));
        let mut bank = InMemoryBank::new();
        let config = TemplConfig::default();
        bank.register_token(config.access_token);
        let templ = Templ::new(config, bank, clock.clone()).unwrap();

        save(&path, &templ).unwrap();
        let loaded = load(&path, clock).unwrap();
        assert_eq!(loaded.state(), templ.state());
        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_missing_state_is_reported() {
        let path = temp_path("missing");
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(0));
        assert!(matches!(
            load(&path, clock),
            Err(StateFileError::Missing(_))
        ));
    }
}
