//! Path management for convo configuration files.
//!
//! ```text
//! ~/.config/convo/             # Config directory (platform config dir)
//! ├── config.toml              # Client configuration
//! └── token                    # Bearer token of the logged-in user
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "convo";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find the user config directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for convo_core::ChatError {
    fn from(err: PathError) -> Self {
        convo_core::ChatError::config(err.to_string())
    }
}

pub struct ConvoPaths;

impl ConvoPaths {
    /// Returns the convo configuration directory (e.g. `~/.config/convo/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the persisted bearer token.
    ///
    /// # Security Note
    ///
    /// The file is written with mode 600 on Unix.
    pub fn token_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("token"))
    }
}
