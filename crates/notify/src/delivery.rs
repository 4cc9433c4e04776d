//! Sending drafts and inferring group reachability from delivery receipts.
//!
//! A group whose receipts come back empty on every stage for every draft is
//! assumed to have removed the bot. After `unreachable_after` consecutive
//! such outcomes the bot id is written to the group's `botNotInGroup` list
//! and later deliveries to that group are skipped until the suppression is
//! cleared.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use {
    streamwatch_channels::{ChatTransport, MessageContent, OutboundMessage, SentMessage},
    streamwatch_config::StreamwatchConfig,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use streamwatch_metrics::{counter, notify as notify_metrics};

use crate::{
    Error, Result,
    store::GroupStore,
    types::{GroupRecord, NotificationDraft},
};

/// What happened to one group's drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The group is suppressed for this bot; nothing was sent.
    Suppressed,
    NothingToSend,
    Delivered { sent: usize, failed: usize },
    /// Every receipt was empty and the threshold was reached; the group is
    /// now suppressed.
    MarkedUnreachable { sent: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reachability {
    Reachable,
    Unreachable,
    /// A send or receipt lookup failed, so the receipts prove nothing.
    Inconclusive,
}

pub struct DeliveryManager {
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn GroupStore>,
    bot_id: String,
    mirror_chat_id: Option<String>,
    mirror_delay: Duration,
    receipt_delay: Duration,
    unreachable_after: u32,
    /// Consecutive all-empty outcomes per group id.
    streaks: Mutex<HashMap<String, u32>>,
}

impl DeliveryManager {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn GroupStore>,
        bot_id: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            bot_id: bot_id.into(),
            mirror_chat_id: None,
            mirror_delay: Duration::ZERO,
            receipt_delay: Duration::ZERO,
            unreachable_after: 1,
            streaks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(
        config: &StreamwatchConfig,
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn GroupStore>,
    ) -> Self {
        let delivery = &config.delivery;
        let manager = Self::new(transport, store, config.bot.id.clone())
            .with_receipt_delay(delivery.receipt_delay())
            .with_unreachable_after(delivery.unreachable_after);
        match &delivery.mirror_chat_id {
            Some(chat) => manager.with_mirror(chat.clone(), delivery.mirror_delay()),
            None => manager,
        }
    }

    /// Copy every draft to `chat_id`, `delay` after the main send.
    pub fn with_mirror(mut self, chat_id: impl Into<String>, delay: Duration) -> Self {
        self.mirror_chat_id = Some(chat_id.into());
        self.mirror_delay = delay;
        self
    }

    pub fn with_receipt_delay(mut self, delay: Duration) -> Self {
        self.receipt_delay = delay;
        self
    }

    pub fn with_unreachable_after(mut self, threshold: u32) -> Self {
        self.unreachable_after = threshold.max(1);
        self
    }

    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    /// Send `drafts` to `group`. Transport and store failures are logged and
    /// folded into the outcome.
    pub async fn deliver(&self, group: &GroupRecord, drafts: &[NotificationDraft]) -> DeliveryOutcome {
        if group.is_suppressed_for(&self.bot_id) {
            info!(group_id = %group.id, bot_id = %self.bot_id, "group is suppressed for this bot, skipping delivery");
            #[cfg(feature = "metrics")]
            counter!(notify_metrics::SUPPRESSED_SKIPS_TOTAL).increment(1);
            return DeliveryOutcome::Suppressed;
        }
        if drafts.is_empty() {
            return DeliveryOutcome::NothingToSend;
        }

        let outbound: Vec<OutboundMessage> = drafts.iter().map(NotificationDraft::to_outbound).collect();
        let results = self.transport.send_batch(&outbound).await;
        let sent_at = Instant::now();

        let mut sent = Vec::with_capacity(results.len());
        let mut failed = 0usize;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(message) => sent.push(message),
                Err(e) => {
                    failed += 1;
                    warn!(group_id = %group.id, draft = index, error = %e, "failed to send notification");
                },
            }
        }
        // A transport that returns fewer results than messages lost the rest.
        failed += outbound.len().saturating_sub(sent.len() + failed);

        #[cfg(feature = "metrics")]
        {
            counter!(notify_metrics::DRAFTS_SENT_TOTAL).increment(sent.len() as u64);
            counter!(notify_metrics::SEND_FAILURES_TOTAL).increment(failed as u64);
        }
        debug!(group_id = %group.id, sent = sent.len(), failed, "notifications sent");

        let reachability = self.probe_receipts(group, &sent, failed).await;
        let marked = self.record_reachability(group, reachability).await;

        self.mirror(group, drafts, sent_at).await;

        if marked {
            DeliveryOutcome::MarkedUnreachable { sent: sent.len() }
        } else {
            DeliveryOutcome::Delivered {
                sent: sent.len(),
                failed,
            }
        }
    }

    async fn probe_receipts(&self, group: &GroupRecord, sent: &[SentMessage], failed: usize) -> Reachability {
        if sent.is_empty() {
            return Reachability::Inconclusive;
        }
        if !self.receipt_delay.is_zero() {
            tokio::time::sleep(self.receipt_delay).await;
        }

        let mut verdict = if failed > 0 {
            Reachability::Inconclusive
        } else {
            Reachability::Unreachable
        };
        for message in sent {
            match self.transport.delivery_info(message).await {
                Ok(info) if !info.is_empty() => return Reachability::Reachable,
                Ok(_) => {},
                Err(e) => {
                    warn!(
                        group_id = %group.id,
                        message_id = %message.message_id,
                        error = %e,
                        "failed to read delivery receipt"
                    );
                    verdict = Reachability::Inconclusive;
                },
            }
        }
        verdict
    }

    /// Update the streak for `group`; returns `true` when the group was just
    /// marked unreachable.
    async fn record_reachability(&self, group: &GroupRecord, reachability: Reachability) -> bool {
        let streak = {
            let Ok(mut streaks) = self.streaks.lock() else {
                warn!(group_id = %group.id, "reachability counters poisoned");
                return false;
            };
            match reachability {
                Reachability::Reachable => {
                    streaks.remove(&group.id);
                    return false;
                },
                Reachability::Inconclusive => return false,
                Reachability::Unreachable => {
                    let streak = streaks.entry(group.id.clone()).or_insert(0);
                    *streak += 1;
                    *streak
                },
            }
        };

        if streak < self.unreachable_after {
            debug!(
                group_id = %group.id,
                streak,
                threshold = self.unreachable_after,
                "empty delivery receipts below threshold"
            );
            return false;
        }

        match self.mark_unreachable(group).await {
            Ok(()) => {
                if let Ok(mut streaks) = self.streaks.lock() {
                    streaks.remove(&group.id);
                }
                warn!(group_id = %group.id, bot_id = %self.bot_id, "no delivery receipts, marked group unreachable");
                #[cfg(feature = "metrics")]
                counter!(notify_metrics::GROUPS_SUPPRESSED_TOTAL).increment(1);
                true
            },
            Err(e) => {
                warn!(group_id = %group.id, error = %e, "failed to persist group suppression");
                false
            },
        }
    }

    async fn mark_unreachable(&self, snapshot: &GroupRecord) -> Result<()> {
        // Re-read so a concurrent edit to other fields is not overwritten
        // with the routing-time snapshot.
        let mut group = match self.store.get_group(&snapshot.id).await? {
            Some(group) => group,
            None => snapshot.clone(),
        };
        if group.is_suppressed_for(&self.bot_id) {
            return Ok(());
        }
        group.bot_not_in_group.push(self.bot_id.clone());
        self.store.save_group(&group).await
    }

    async fn mirror(&self, group: &GroupRecord, drafts: &[NotificationDraft], sent_at: Instant) {
        let Some(mirror_chat) = self.mirror_chat_id.as_deref() else {
            return;
        };
        if mirror_chat == group.id {
            return;
        }

        let remaining = self.mirror_delay.saturating_sub(sent_at.elapsed());
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }

        let copies: Vec<OutboundMessage> = drafts
            .iter()
            .map(|draft| mirror_copy(mirror_chat, group.display_name(), draft))
            .collect();
        for (index, result) in self.transport.send_batch(&copies).await.into_iter().enumerate() {
            if let Err(e) = result {
                warn!(group_id = %group.id, mirror_chat, draft = index, error = %e, "failed to mirror notification");
            }
        }
    }

    /// Remove this bot from the group's `botNotInGroup`. Returns `false`
    /// when the group was not suppressed.
    pub async fn clear_suppression(&self, group_id: &str) -> Result<bool> {
        let mut group = self
            .store
            .get_group(group_id)
            .await?
            .ok_or_else(|| Error::group_not_found(group_id))?;

        let before = group.bot_not_in_group.len();
        group.bot_not_in_group.retain(|id| id != &self.bot_id);
        if let Ok(mut streaks) = self.streaks.lock() {
            streaks.remove(group_id);
        }
        if group.bot_not_in_group.len() == before {
            return Ok(false);
        }

        self.store.save_group(&group).await?;
        info!(group_id, bot_id = %self.bot_id, "cleared group suppression");
        Ok(true)
    }
}

/// Copy of `draft` for the mirror chat, labelled with the originating group.
fn mirror_copy(mirror_chat: &str, group_name: &str, draft: &NotificationDraft) -> OutboundMessage {
    let label = |text: &str| format!("[{group_name}] {text}");
    let content = match &draft.content {
        MessageContent::Text(text) => MessageContent::Text(label(text)),
        MessageContent::Media {
            media,
            caption,
            as_sticker,
        } => MessageContent::Media {
            media: media.clone(),
            caption: Some(caption.as_deref().map_or_else(|| format!("[{group_name}]"), label)),
            as_sticker: *as_sticker,
        },
    };
    OutboundMessage {
        chat_id: mirror_chat.to_string(),
        content,
        mentions: Vec::new(),
        delay: Duration::ZERO,
    }
}
