//! Configuration loading, validation, and env substitution.
//!
//! Config files: `streamwatch.toml`, `streamwatch.yaml`, or `streamwatch.json`
//! Searched in `./` then `~/.config/streamwatch/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, data_dir, discover_and_load, find_config_file, load_config},
    schema::{
        AiConfig, BotConfig, DeliveryConfig, MetricsConfig, RegistryConfig, RouterConfig,
        StorageConfig, StreamwatchConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_file},
};
