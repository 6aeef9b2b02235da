//! TOML-based configuration for mappers.
//!
//! Supports a config file (tablemap.toml) with environment variable expansion
//! in connection strings.
//!
//! Example configuration:
//! ```toml
//! [mapper]
//! connection_string = "${ORDERS_DB}"
//! max_chunk_size = 2000
//!
//! [mappers.reporting]
//! connection_string = "Server=$REPORT_HOST;Database=reports"
//! max_chunk_size = 500
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Largest id-list sent in one statement unless configured otherwise.
pub const DEFAULT_MAX_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(2000) {
    Some(size) => size,
    None => unreachable!(),
};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Mapper not found: {0}")]
    MapperNotFound(String),
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Per-mapper configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MapperSettings {
    /// Connection string handed to the connector (supports ${ENV_VAR} expansion).
    pub connection_string: String,

    /// Id-lists longer than this are split into chunks. Zero is rejected.
    pub max_chunk_size: NonZeroUsize,
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

impl MapperSettings {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            ..Self::default()
        }
    }

    pub fn with_max_chunk_size(mut self, max_chunk_size: NonZeroUsize) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }

    /// Get the connection string with environment variables expanded.
    pub fn resolved_connection_string(&self) -> SettingsResult<String> {
        expand_env_vars(&self.connection_string)
    }

    /// Copy of these settings with the connection string expanded.
    pub fn resolved(&self) -> SettingsResult<Self> {
        Ok(Self {
            connection_string: self.resolved_connection_string()?,
            max_chunk_size: self.max_chunk_size,
        })
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Settings used when no mapper name is given.
    pub mapper: MapperSettings,

    /// Named mapper configurations.
    pub mappers: HashMap<String, MapperSettings>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> SettingsResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `TABLEMAP_CONFIG`
    /// 2. `./tablemap.toml`
    pub fn load() -> SettingsResult<Self> {
        if let Ok(path) = env::var("TABLEMAP_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("tablemap.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        Ok(Settings::default())
    }

    /// Named mapper settings with the connection string expanded.
    pub fn mapper(&self, name: &str) -> SettingsResult<MapperSettings> {
        self.mappers
            .get(name)
            .ok_or_else(|| SettingsError::MapperNotFound(name.to_string()))?
            .resolved()
    }

    /// The unnamed `[mapper]` settings with the connection string expanded.
    pub fn default_mapper(&self) -> SettingsResult<MapperSettings> {
        self.mapper.resolved()
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> SettingsResult<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
