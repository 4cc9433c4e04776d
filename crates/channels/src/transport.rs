use std::path::Path;

use {anyhow::Result, async_trait::async_trait, tracing::debug};

use crate::message::{DeliveryInfo, MediaRef, OutboundMessage, SentMessage};

/// Snapshot of a chat as the transport sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatInfo {
    pub id: String,
    /// Current subject (group title).
    pub name: String,
    pub is_group: bool,
    /// Participant user ids.
    pub participants: Vec<String>,
}

/// Chat network operations used by the notification core.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one message.
    async fn send_message(&self, message: &OutboundMessage) -> Result<SentMessage>;

    /// Send messages in order, honouring each message's delay. One result per
    /// message; a failed send does not stop the rest of the batch.
    async fn send_batch(&self, messages: &[OutboundMessage]) -> Vec<Result<SentMessage>> {
        let mut results = Vec::with_capacity(messages.len());
        for message in messages {
            if !message.delay.is_zero() {
                debug!(
                    chat_id = %message.chat_id,
                    delay_ms = message.delay.as_millis() as u64,
                    "delaying message"
                );
                tokio::time::sleep(message.delay).await;
            }
            results.push(self.send_message(message).await);
        }
        results
    }

    /// Delivery receipt for a previously sent message.
    async fn delivery_info(&self, sent: &SentMessage) -> Result<DeliveryInfo>;

    /// Look up a chat. `None` when the transport does not know it.
    async fn get_chat(&self, chat_id: &str) -> Result<Option<ChatInfo>>;

    /// Change a group's subject.
    async fn set_subject(&self, chat_id: &str, subject: &str) -> Result<()>;

    /// Change a group's picture.
    async fn set_picture(&self, chat_id: &str, picture: &MediaRef) -> Result<()>;

    /// Load a media file from local storage.
    async fn load_media_file(&self, path: &Path) -> Result<MediaRef>;

    /// Fetch media from a URL.
    async fn load_media_from_url(&self, url: &str) -> Result<MediaRef>;
}
