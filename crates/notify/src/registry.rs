//! Which channels the observer is watching.
//!
//! The set of watched channels is the union of every group's channel lists,
//! deduplicated by [`ChannelKey`]. The registry makes sure the observer is
//! asked to subscribe each key at most once per process.

use std::{collections::HashSet, sync::Arc, time::Duration};

use {
    streamwatch_common::{ChannelKey, Platform},
    streamwatch_config::StreamwatchConfig,
    tokio::sync::Mutex,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use streamwatch_metrics::{counter, gauge, registry as registry_metrics};

use crate::{
    Error, Result,
    observer::ChannelObserver,
    store::GroupStore,
    types::{ChannelConfig, GroupRecord},
};

/// Words people leave in when copying the example config.
const PLACEHOLDER_NAMES: &[&str] = &[
    "nomedocanal",
    "nomecanal",
    "canal",
    "channel",
    "channelname",
    "example",
    "exemplo",
];

/// Result of [`SubscriptionRegistry::load_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Keys newly subscribed by this call.
    pub subscribed: Vec<ChannelKey>,
    pub skipped_malformed: Vec<ChannelKey>,
    /// Keys removed from group configs because the platform reported them
    /// missing.
    pub removed: Vec<ChannelKey>,
}

/// `true` for names that cannot be a real channel: empty, placeholder text,
/// template braces, or characters no platform allows.
pub fn is_malformed_channel_name(name: &str) -> bool {
    let len = name.chars().count();
    if !(2..=100).contains(&len) {
        return true;
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '<' | '>'))
    {
        return true;
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '@'))
    {
        return true;
    }
    PLACEHOLDER_NAMES.contains(&name.to_lowercase().as_str())
}

/// Every distinct channel key referenced by `groups`, in first-seen order.
pub fn channel_keys(groups: &[GroupRecord]) -> Vec<ChannelKey> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for group in groups {
        for &platform in Platform::ALL {
            for config in group.channels(platform) {
                let key = ChannelKey::new(platform, config.channel.clone());
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }
        }
    }
    keys
}

pub struct SubscriptionRegistry {
    store: Arc<dyn GroupStore>,
    observer: Arc<dyn ChannelObserver>,
    bot_id: String,
    cleanup_pause: Duration,
    subscribed: Mutex<HashSet<ChannelKey>>,
}

impl SubscriptionRegistry {
    pub fn new(
        store: Arc<dyn GroupStore>,
        observer: Arc<dyn ChannelObserver>,
        bot_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            observer,
            bot_id: bot_id.into(),
            cleanup_pause: Duration::ZERO,
            subscribed: Mutex::new(HashSet::new()),
        }
    }

    pub fn from_config(
        config: &StreamwatchConfig,
        store: Arc<dyn GroupStore>,
        observer: Arc<dyn ChannelObserver>,
    ) -> Self {
        Self::new(store, observer, config.bot.id.clone())
            .with_cleanup_pause(config.registry.cleanup_pause())
    }

    /// Pause between existence checks when cleaning up.
    pub fn with_cleanup_pause(mut self, pause: Duration) -> Self {
        self.cleanup_pause = pause;
        self
    }

    /// Subscribe every channel referenced by any group.
    ///
    /// With `cleanup`, each channel is first checked upstream; channels the
    /// platform reports as missing are removed from every group that lists
    /// them instead of being subscribed. A failed check subscribes anyway.
    pub async fn load_all(&self, cleanup: bool) -> Result<LoadSummary> {
        let groups = self.store.list_groups().await?;
        let keys = channel_keys(&groups);
        let mut summary = LoadSummary::default();
        let mut checked = 0usize;

        info!(channels = keys.len(), groups = groups.len(), cleanup, "loading channel subscriptions");

        for key in keys {
            if is_malformed_channel_name(&key.channel) {
                warn!(channel = %key, "skipping malformed channel name");
                summary.skipped_malformed.push(key);
                continue;
            }

            if cleanup {
                if checked > 0 && !self.cleanup_pause.is_zero() {
                    tokio::time::sleep(self.cleanup_pause).await;
                }
                checked += 1;

                match self.observer.channel_exists(&key).await {
                    Ok(true) => {},
                    Ok(false) => {
                        self.remove_everywhere(&groups, &key).await;
                        summary.removed.push(key);
                        continue;
                    },
                    Err(e) => {
                        warn!(channel = %key, error = %e, "existence check failed, subscribing anyway");
                    },
                }
            }

            match self.subscribe(&key).await {
                Ok(true) => summary.subscribed.push(key),
                Ok(false) => {},
                Err(e) => warn!(channel = %key, error = %e, "failed to subscribe channel"),
            }
        }

        info!(
            subscribed = summary.subscribed.len(),
            skipped = summary.skipped_malformed.len(),
            removed = summary.removed.len(),
            "channel subscriptions loaded"
        );
        Ok(summary)
    }

    /// Drop `key` from every group listing it. Each group is re-read right
    /// before the write so changes made since `snapshot` was taken survive.
    async fn remove_everywhere(&self, snapshot: &[GroupRecord], key: &ChannelKey) {
        for stale in snapshot.iter().filter(|g| g.find_channel(key.platform, &key.channel).is_some()) {
            let mut group = match self.store.get_group(&stale.id).await {
                Ok(Some(group)) => group,
                Ok(None) => continue,
                Err(e) => {
                    warn!(group_id = %stale.id, channel = %key, error = %e, "failed to reload group for cleanup");
                    continue;
                },
            };
            if group.remove_channel(key.platform, &key.channel) == 0 {
                continue;
            }
            match self.store.save_group(&group).await {
                Ok(()) => {
                    info!(group_id = %group.id, channel = %key, "removed channel that no longer exists");
                    #[cfg(feature = "metrics")]
                    counter!(registry_metrics::CHANNELS_REMOVED_TOTAL).increment(1);
                },
                Err(e) => warn!(group_id = %group.id, channel = %key, error = %e, "failed to save group after cleanup"),
            }
        }
    }

    /// Ask the observer to watch `key`. `Ok(false)` if this process already
    /// subscribed it.
    pub async fn subscribe(&self, key: &ChannelKey) -> Result<bool> {
        let mut subscribed = self.subscribed.lock().await;
        if subscribed.contains(key) {
            return Ok(false);
        }
        self.observer
            .subscribe(key)
            .await
            .map_err(|e| Error::collaborator(format!("failed to subscribe {key}"), e))?;
        subscribed.insert(key.clone());
        debug!(channel = %key, "subscribed channel");
        #[cfg(feature = "metrics")]
        gauge!(registry_metrics::SUBSCRIPTIONS_ACTIVE).set(subscribed.len() as f64);
        Ok(true)
    }

    /// Stop watching `key`. `Ok(false)` if it was not subscribed.
    pub async fn unsubscribe(&self, key: &ChannelKey) -> Result<bool> {
        let mut subscribed = self.subscribed.lock().await;
        if !subscribed.contains(key) {
            return Ok(false);
        }
        self.observer
            .unsubscribe(key)
            .await
            .map_err(|e| Error::collaborator(format!("failed to unsubscribe {key}"), e))?;
        subscribed.remove(key);
        debug!(channel = %key, "unsubscribed channel");
        #[cfg(feature = "metrics")]
        gauge!(registry_metrics::SUBSCRIPTIONS_ACTIVE).set(subscribed.len() as f64);
        Ok(true)
    }

    /// Keys this process has subscribed, sorted for display.
    pub async fn subscribed(&self) -> Vec<ChannelKey> {
        let mut keys: Vec<ChannelKey> = self.subscribed.lock().await.iter().cloned().collect();
        keys.sort_by_key(|k| (k.platform.as_str(), k.normalized()));
        keys
    }

    /// Add a channel with the default notification config to a group and
    /// start watching it. Re-registering also lifts this bot's suppression.
    /// Returns `false` if the group already listed the channel.
    pub async fn add_channel(&self, group_id: &str, platform: Platform, channel: &str) -> Result<bool> {
        let mut group = self
            .store
            .get_group(group_id)
            .await?
            .ok_or_else(|| Error::group_not_found(group_id))?;

        let added = group.find_channel(platform, channel).is_none();
        if added {
            group
                .channels_mut(platform)
                .push(ChannelConfig::with_defaults(platform, channel));
        }
        group.bot_not_in_group.retain(|id| id != &self.bot_id);
        self.store.save_group(&group).await?;

        self.subscribe(&ChannelKey::new(platform, channel)).await?;
        info!(group_id, %platform, channel, added, "channel registered");
        Ok(added)
    }

    /// Remove a channel from a group. The observer subscription is dropped
    /// only when no other group still lists the channel.
    pub async fn remove_channel(&self, group_id: &str, platform: Platform, channel: &str) -> Result<bool> {
        let mut group = self
            .store
            .get_group(group_id)
            .await?
            .ok_or_else(|| Error::group_not_found(group_id))?;

        if group.remove_channel(platform, channel) == 0 {
            return Ok(false);
        }
        self.store.save_group(&group).await?;

        let still_used = self
            .store
            .list_groups()
            .await?
            .iter()
            .any(|g| g.find_channel(platform, channel).is_some());
        if !still_used {
            self.unsubscribe(&ChannelKey::new(platform, channel)).await?;
        }
        info!(group_id, %platform, channel, still_used, "channel removed");
        Ok(true)
    }
}
