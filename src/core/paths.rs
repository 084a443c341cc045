// src/core/paths.rs

//! Locations of the configuration and path expansion.

use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILENAME};
use lazy_static::lazy_static;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

lazy_static! {
    static ref CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

/// Errors raised while resolving paths.
#[derive(Error, Debug)]
pub enum PathError {
    /// The platform reports no config directory.
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    /// `~` or a variable in `path` could not be expanded.
    #[error("Failed to expand path '{path}': {reason}")]
    Expansion {
        /// The path as written.
        path: String,
        /// Why expansion failed.
        reason: String,
    },
}

/// Returns the path to the configuration directory (`~/.config/interactive-shell`).
///
/// The directory is not created: a missing directory simply means "use the defaults".
/// The first call computes the path, later calls return the cached value.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    let mut cached_path_guard = CONFIG_DIR.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(path) = &*cached_path_guard {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(CONFIG_DIR_NAME);

    *cached_path_guard = Some(config_path.clone());
    Ok(config_path)
}

/// Returns the path to the default `config.toml` file.
pub fn get_config_file_path() -> Result<PathBuf, PathError> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILENAME))
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a user supplied path.
pub fn expand_path(template: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(template).map_err(|e| PathError::Expansion {
        path: template.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_lives_in_config_dir() {
        let Ok(dir) = get_config_dir() else {
            // No config dir on this machine (e.g. no HOME); nothing to check.
            return;
        };
        assert!(dir.ends_with(CONFIG_DIR_NAME));
        assert_eq!(get_config_file_path().unwrap(), dir.join(CONFIG_FILENAME));
        // Memoized: same answer on the second call.
        assert_eq!(get_config_dir().unwrap(), dir);
    }

    #[test]
    fn test_expand_path_plain_is_untouched() {
        assert_eq!(
            expand_path("/etc/ishell/config.toml").unwrap(),
            PathBuf::from("/etc/ishell/config.toml")
        );
    }

    #[test]
    fn test_expand_path_unknown_variable_fails() {
        let result = expand_path("$ISHELL_SURELY_UNDEFINED_VARIABLE/config.toml");
        assert!(matches!(result, Err(PathError::Expansion { .. })));
    }
}
