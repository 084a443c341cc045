//! # Config Loader
//!
//! Loads the `SessionConfig` from `config.toml`. The file is optional: when the default
//! location holds no file, the built-in defaults are used. An explicitly requested file
//! must exist.
use crate::{
    core::paths::{self, PathError},
    models::SessionConfig,
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Errors raised while loading `config.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config location could not be resolved.
    #[error(transparent)]
    Path(#[from] PathError),
    /// The file exists but could not be read.
    #[error("Could not read config file '{path}': {source}")]
    Io {
        /// The config file.
        path: PathBuf,
        /// The underlying read error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or has unknown keys.
    #[error("Failed to parse config file '{path}': {source}")]
    TomlParse {
        /// The config file.
        path: PathBuf,
        /// The parser's error.
        #[source]
        source: toml::de::Error,
    },
}

/// Reads and parses the config file at `path`.
pub fn load_from_path(path: &Path) -> Result<SessionConfig, ConfigError> {
    log::debug!("Loading config from '{}'", path.display());
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the config from the default location, or returns the defaults if there is none.
pub fn load_default() -> Result<SessionConfig, ConfigError> {
    let path = match paths::get_config_file_path() {
        Ok(path) => path,
        Err(PathError::ConfigDirNotFound) => {
            log::debug!("No system config directory, using default config.");
            return Ok(SessionConfig::default());
        }
        Err(e) => return Err(e.into()),
    };
    if !path.is_file() {
        log::debug!("'{}' not found, using default config.", path.display());
        return Ok(SessionConfig::default());
    }
    load_from_path(&path)
}

/// Loads `explicit` (after `~`/variable expansion) if given, the default location otherwise.
pub fn load(explicit: Option<&str>) -> Result<SessionConfig, ConfigError> {
    match explicit {
        Some(template) => load_from_path(&paths::expand_path(template)?),
        None => load_default(),
    }
}
