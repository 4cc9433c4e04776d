//! Configuration validation.
//!
//! Detects unknown/misspelled fields in the raw config file and reports
//! semantic problems in the parsed config.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{loader::load_config_value, schema::StreamwatchConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "value"
    pub category: &'static str,
    /// Dotted path, e.g. "delivery.unreachable_after"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(
        &mut self,
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Expected shape of the config tree.
enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    Struct(HashMap::from([
        ("bot", Struct(HashMap::from([("id", Leaf)]))),
        ("storage", Struct(HashMap::from([("data_dir", Leaf)]))),
        (
            "delivery",
            Struct(HashMap::from([
                ("mirror_chat_id", Leaf),
                ("mirror_delay_ms", Leaf),
                ("unreachable_after", Leaf),
                ("ai_delay_ms", Leaf),
                ("receipt_delay_ms", Leaf),
            ])),
        ),
        ("registry", Struct(HashMap::from([("cleanup_pause_ms", Leaf)]))),
        ("router", Struct(HashMap::from([("debounce_ms", Leaf)]))),
        (
            "ai",
            Struct(HashMap::from([
                ("enabled", Leaf),
                ("temperature", Leaf),
                ("max_tokens", Leaf),
            ])),
        ),
        ("metrics", Struct(HashMap::from([("enabled", Leaf)]))),
    ]))
}

fn check_unknown_fields(
    value: &serde_json::Value,
    schema: &KnownKeys,
    prefix: &str,
    result: &mut ValidationResult,
) {
    let (KnownKeys::Struct(fields), serde_json::Value::Object(map)) = (schema, value) else {
        return;
    };
    for (key, child) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match fields.get(key.as_str()) {
            Some(child_schema) => check_unknown_fields(child, child_schema, &path, result),
            None => result.push(
                Severity::Warning,
                "unknown-field",
                path,
                format!("unknown field `{key}`"),
            ),
        }
    }
}

/// Semantic checks on a parsed config.
pub fn validate(config: &StreamwatchConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if config.bot.id.trim().is_empty() {
        result.push(
            Severity::Error,
            "value",
            "bot.id",
            "bot id must not be empty",
        );
    }
    if config.delivery.unreachable_after == 0 {
        result.push(
            Severity::Error,
            "value",
            "delivery.unreachable_after",
            "must be at least 1",
        );
    }
    if let Some(chat) = &config.delivery.mirror_chat_id
        && !chat.ends_with("@g.us")
    {
        result.push(
            Severity::Warning,
            "value",
            "delivery.mirror_chat_id",
            format!("`{chat}` does not look like a group id"),
        );
    }
    if !(0.0..=2.0).contains(&config.ai.temperature) {
        result.push(
            Severity::Warning,
            "value",
            "ai.temperature",
            "temperature is usually between 0.0 and 2.0",
        );
    }

    result
}

/// Validate a config file on disk: syntax, unknown fields, then semantics.
pub fn validate_file(path: &Path) -> ValidationResult {
    let mut result = ValidationResult {
        config_path: Some(path.to_path_buf()),
        ..Default::default()
    };

    let value = match load_config_value(path) {
        Ok(v) => v,
        Err(e) => {
            result.push(Severity::Error, "syntax", "", e.to_string());
            return result;
        },
    };
    check_unknown_fields(&value, &build_schema_map(), "", &mut result);

    match serde_json::from_value::<StreamwatchConfig>(value) {
        Ok(cfg) => result.diagnostics.extend(validate(&cfg).diagnostics),
        Err(e) => result.push(Severity::Error, "syntax", "", e.to_string()),
    }
    result
}
