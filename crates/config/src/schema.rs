/// Config schema types (bot identity, storage, delivery, registry, router, ai, metrics).
use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamwatchConfig {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub delivery: DeliveryConfig,
    pub registry: RegistryConfig,
    pub router: RouterConfig,
    pub ai: AiConfig,
    pub metrics: MetricsConfig,
}

/// Identity of this bot instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Identity recorded in a group's `botNotInGroup` list when the group
    /// becomes unreachable.
    pub id: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            id: "streamwatch".into(),
        }
    }
}

/// Where group documents and media files live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root data directory. When unset, the platform data dir is used.
    pub data_dir: Option<PathBuf>,
}

/// Delivery and suppression tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Chat that receives a copy of every drafted notification.
    pub mirror_chat_id: Option<String>,
    /// Delay between the main send and the mirror copies.
    pub mirror_delay_ms: u64,
    /// Consecutive all-empty delivery outcomes before a group is suppressed.
    pub unreachable_after: u32,
    /// Delay hint attached to the AI-authored draft.
    pub ai_delay_ms: u64,
    /// Wait after sending before reading delivery receipts.
    pub receipt_delay_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            mirror_chat_id: None,
            mirror_delay_ms: 2_000,
            unreachable_after: 1,
            ai_delay_ms: 500,
            receipt_delay_ms: 5_000,
        }
    }
}

impl DeliveryConfig {
    pub fn mirror_delay(&self) -> Duration {
        Duration::from_millis(self.mirror_delay_ms)
    }

    pub fn ai_delay(&self) -> Duration {
        Duration::from_millis(self.ai_delay_ms)
    }

    pub fn receipt_delay(&self) -> Duration {
        Duration::from_millis(self.receipt_delay_ms)
    }
}

/// Subscription registry tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Pause between upstream existence checks during cleanup.
    pub cleanup_pause_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cleanup_pause_ms: 5_000,
        }
    }
}

impl RegistryConfig {
    pub fn cleanup_pause(&self) -> Duration {
        Duration::from_millis(self.cleanup_pause_ms)
    }
}

/// Event router tuning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Repeated identical transitions for the same channel inside this
    /// window are dropped. Zero disables debouncing.
    pub debounce_ms: u64,
}

impl RouterConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// AI-authored notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Global switch; per-channel `useAI` is ignored when this is off.
    pub enabled: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            temperature: 0.7,
            max_tokens: 200,
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
