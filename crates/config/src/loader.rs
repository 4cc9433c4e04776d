use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::StreamwatchConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "streamwatch.toml",
    "streamwatch.yaml",
    "streamwatch.yml",
    "streamwatch.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<StreamwatchConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Load the config file as an untyped JSON value, after env substitution.
pub(crate) fn load_config_value(path: &Path) -> anyhow::Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config_value(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./streamwatch.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/streamwatch/streamwatch.{toml,yaml,yml,json}` (user-global)
///
/// Returns `StreamwatchConfig::default()` if no config file is found.
pub fn discover_and_load() -> StreamwatchConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    StreamwatchConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/streamwatch/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "streamwatch").map(|d| d.config_dir().to_path_buf())
}

/// Resolve the data directory: explicit config value, then the platform data
/// dir, then `./data`.
pub fn data_dir(config: &StreamwatchConfig) -> PathBuf {
    if let Some(dir) = &config.storage.data_dir {
        return dir.clone();
    }
    directories::ProjectDirs::from("", "", "streamwatch")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<StreamwatchConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

fn parse_config_value(raw: &str, path: &Path) -> anyhow::Result<serde_json::Value> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => {
            let v: toml::Value = toml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_each_supported_format() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("streamwatch.toml");
        std::fs::write(&toml_path, "[bot]\nid = \"toml-bot\"\n").unwrap();
        assert_eq!(load_config(&toml_path).unwrap().bot.id, "toml-bot");

        let yaml_path = dir.path().join("streamwatch.yaml");
        std::fs::write(&yaml_path, "bot:\n  id: yaml-bot\n").unwrap();
        assert_eq!(load_config(&yaml_path).unwrap().bot.id, "yaml-bot");

        let json_path = dir.path().join("streamwatch.json");
        std::fs::write(&json_path, r#"{"bot": {"id": "json-bot"}}"#).unwrap();
        assert_eq!(load_config(&json_path).unwrap().bot.id, "json-bot");
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streamwatch.ini");
        std::fs::write(&path, "").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn explicit_data_dir_wins() {
        let mut cfg = StreamwatchConfig::default();
        cfg.storage.data_dir = Some(PathBuf::from("/srv/streamwatch"));
        assert_eq!(data_dir(&cfg), PathBuf::from("/srv/streamwatch"));
    }
}
