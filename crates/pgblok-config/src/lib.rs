//! Runtime configuration for pgblok registries.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults documented on each field.

use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

///
/// Config
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub view: ViewConfig,
    pub large_object: LargeObjectConfig,
}

impl Config {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&text)
    }
}

///
/// ViewConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    /// Populate views at creation unless a declaration says otherwise.
    pub with_data: bool,

    /// Default `CONCURRENTLY` flag for configured refreshes.
    pub refresh_concurrently: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            with_data: true,
            refresh_concurrently: false,
        }
    }
}

///
/// LargeObjectConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LargeObjectConfig {
    /// Retain replaced blobs instead of reusing or unlinking them.
    pub keep_blob: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();

        assert_eq!(config, Config::default());
        assert!(config.view.with_data);
        assert!(!config.view.refresh_concurrently);
        assert!(!config.large_object.keep_blob);
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::from_toml_str(
            r"
            [view]
            with_data = false
            refresh_concurrently = true

            [large_object]
            keep_blob = true
            ",
        )
        .unwrap();

        assert!(!config.view.with_data);
        assert!(config.view.refresh_concurrently);
        assert!(config.large_object.keep_blob);
    }

    #[test]
    fn partial_section_keeps_remaining_defaults() {
        let config = Config::from_toml_str("[view]\nrefresh_concurrently = true\n").unwrap();

        assert!(config.view.with_data);
        assert!(config.view.refresh_concurrently);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("[view]\nwith_dta = false\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::from_path("/definitely/not/here/pgblok.toml").unwrap_err();

        match err {
            ConfigError::Io { path, .. } => assert!(path.ends_with("pgblok.toml")),
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
