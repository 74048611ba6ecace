use crate::config::ConfigurationState;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

/// Writes the persistent part of the state. Hover and selection are not saved.
pub fn save_state_to_file(state: &ConfigurationState, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Loads a snapshot as-is. Entries that no longer match the manifest are
/// skipped at resolution time rather than rejected here.
pub fn load_state_from_file(path: &Path) -> Result<ConfigurationState> {
    let json = std::fs::read_to_string(path)?;
    let state: ConfigurationState = serde_json::from_str(&json)?;
    Ok(state)
}
