//! Collaborators for running the engine without a chat network or a
//! platform poller: sends and subscriptions are logged, not performed.

use std::{
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};

use {
    anyhow::Result,
    async_trait::async_trait,
    streamwatch_channels::{
        ChatInfo, ChatTransport, DeliveryInfo, MediaRef, OutboundMessage, SentMessage, media,
    },
    streamwatch_common::ChannelKey,
    streamwatch_notify::ChannelObserver,
    tracing::info,
};

/// Logs every outbound message and reports it as delivered to its own
/// chat, so dry runs never mark a group unreachable.
#[derive(Default)]
pub struct LoggingTransport {
    next_id: AtomicU64,
}

#[async_trait]
impl ChatTransport for LoggingTransport {
    async fn send_message(&self, message: &OutboundMessage) -> Result<SentMessage> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            chat_id = %message.chat_id,
            text = message.content.text().unwrap_or_default(),
            mentions = message.mentions.len(),
            "dry-run send"
        );
        Ok(SentMessage {
            chat_id: message.chat_id.clone(),
            message_id: format!("dry-{id}"),
        })
    }

    async fn delivery_info(&self, sent: &SentMessage) -> Result<DeliveryInfo> {
        Ok(DeliveryInfo {
            delivered: vec![sent.chat_id.clone()],
            ..Default::default()
        })
    }

    async fn get_chat(&self, _chat_id: &str) -> Result<Option<ChatInfo>> {
        Ok(None)
    }

    async fn set_subject(&self, chat_id: &str, subject: &str) -> Result<()> {
        info!(chat_id, subject, "dry-run subject change");
        Ok(())
    }

    async fn set_picture(&self, chat_id: &str, picture: &MediaRef) -> Result<()> {
        info!(chat_id, ?picture, "dry-run picture change");
        Ok(())
    }

    async fn load_media_file(&self, path: &Path) -> Result<MediaRef> {
        Ok(media::read_media_file(path).await?)
    }

    async fn load_media_from_url(&self, url: &str) -> Result<MediaRef> {
        anyhow::bail!("remote media is not fetched in dry-run mode: {url}")
    }
}

/// Observer that only records subscriptions in the log.
pub struct LoggingObserver;

#[async_trait]
impl ChannelObserver for LoggingObserver {
    async fn subscribe(&self, key: &ChannelKey) -> Result<bool> {
        info!(channel = %key, "watching channel");
        Ok(true)
    }

    async fn unsubscribe(&self, key: &ChannelKey) -> Result<bool> {
        info!(channel = %key, "stopped watching channel");
        Ok(true)
    }

    async fn channel_exists(&self, _key: &ChannelKey) -> Result<bool> {
        Ok(true)
    }
}
