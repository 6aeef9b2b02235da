//! Configuration module for tablemap.
//!
//! Handles mapper settings, config files and environment variables.

mod settings;

pub use settings::{
    expand_env_vars, MapperSettings, Settings, SettingsError, SettingsResult,
    DEFAULT_MAX_CHUNK_SIZE,
};
