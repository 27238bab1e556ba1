mod config;
pub mod store;

pub use config::{Config, NotificationsConfig, TimerConfig};
pub use store::{ExerciseRecord, ExerciseStore, NewExercise};

use std::path::PathBuf;

use crate::error::CoreError;

/// Returns the restbell data directory, creating it if needed.
///
/// `RESTBELL_DATA_DIR` overrides the default `~/.config/restbell/`
/// (used by tests and portable installs).
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let dir = match std::env::var_os("RESTBELL_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("restbell"),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
