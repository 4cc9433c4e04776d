//! In-memory collaborators shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use {
    async_trait::async_trait,
    bytes::Bytes,
    streamwatch_channels::{
        ChatInfo, ChatTransport, DeliveryInfo, MediaRef, OutboundMessage, SentMessage,
    },
    streamwatch_common::ChannelKey,
    streamwatch_config::StreamwatchConfig,
    streamwatch_notify::{
        ChannelObserver, CompletionRequest, EventRouter, GroupStore, TextGenerator,
        store_memory::InMemoryGroupStore,
    },
};

/// Which sent messages come back with a non-empty receipt.
#[derive(Debug, Clone)]
pub enum Receipts {
    AllReached,
    NoneReached,
    /// Only these message ids were reached.
    Only(HashSet<String>),
    Fail,
}

/// Chat transport that records every call.
pub struct RecordingTransport {
    pub sent: Mutex<Vec<OutboundMessage>>,
    pub subjects: Mutex<Vec<(String, String)>>,
    pub pictures: Mutex<Vec<(String, Option<String>)>>,
    pub chats: Mutex<HashMap<String, ChatInfo>>,
    pub receipts: Mutex<Receipts>,
    /// Media files that load successfully, by file name.
    pub media_files: Mutex<HashSet<String>>,
    /// Every URL passed to `load_media_from_url`.
    pub url_loads: Mutex<Vec<String>>,
    /// Sending to these chats panics.
    pub panic_on: Mutex<HashSet<String>>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self {
            sent: Mutex::default(),
            subjects: Mutex::default(),
            pictures: Mutex::default(),
            chats: Mutex::default(),
            receipts: Mutex::new(Receipts::AllReached),
            media_files: Mutex::default(),
            url_loads: Mutex::default(),
            panic_on: Mutex::default(),
        }
    }
}

impl RecordingTransport {
    pub fn with_group_chat(self, id: &str, name: &str, participants: &[&str]) -> Self {
        self.chats.lock().unwrap().insert(id.to_string(), ChatInfo {
            id: id.to_string(),
            name: name.to_string(),
            is_group: true,
            participants: participants.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    pub fn with_media(self, file_name: &str) -> Self {
        self.media_files.lock().unwrap().insert(file_name.to_string());
        self
    }

    pub fn set_receipts(&self, receipts: Receipts) {
        *self.receipts.lock().unwrap() = receipts;
    }

    pub fn panic_when_sending_to(&self, chat_id: &str) {
        self.panic_on.lock().unwrap().insert(chat_id.to_string());
    }

    /// Text (or caption) of each message sent to `chat_id`, in order.
    pub fn texts_to(&self, chat_id: &str) -> Vec<String> {
        self.messages_to(chat_id)
            .iter()
            .map(|m| m.content.text().unwrap_or_default().to_string())
            .collect()
    }

    pub fn messages_to(&self, chat_id: &str) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn destinations(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.chat_id.clone()).collect()
    }

    pub fn subjects(&self) -> Vec<(String, String)> {
        self.subjects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(&self, message: &OutboundMessage) -> anyhow::Result<SentMessage> {
        if self.panic_on.lock().unwrap().contains(&message.chat_id) {
            panic!("transport exploded for {}", message.chat_id);
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(SentMessage {
            chat_id: message.chat_id.clone(),
            message_id: format!("m{}", sent.len()),
        })
    }

    async fn delivery_info(&self, sent: &SentMessage) -> anyhow::Result<DeliveryInfo> {
        let reached = match &*self.receipts.lock().unwrap() {
            Receipts::AllReached => true,
            Receipts::NoneReached => false,
            Receipts::Only(ids) => ids.contains(&sent.message_id),
            Receipts::Fail => anyhow::bail!("receipt lookup timed out"),
        };
        Ok(if reached {
            DeliveryInfo {
                delivered: vec!["5511999999999@c.us".into()],
                ..Default::default()
            }
        } else {
            DeliveryInfo::default()
        })
    }

    async fn get_chat(&self, chat_id: &str) -> anyhow::Result<Option<ChatInfo>> {
        Ok(self.chats.lock().unwrap().get(chat_id).cloned())
    }

    async fn set_subject(&self, chat_id: &str, subject: &str) -> anyhow::Result<()> {
        self.subjects
            .lock()
            .unwrap()
            .push((chat_id.to_string(), subject.to_string()));
        if let Some(chat) = self.chats.lock().unwrap().get_mut(chat_id) {
            chat.name = subject.to_string();
        }
        Ok(())
    }

    async fn set_picture(&self, chat_id: &str, picture: &MediaRef) -> anyhow::Result<()> {
        self.pictures
            .lock()
            .unwrap()
            .push((chat_id.to_string(), picture.file_name.clone()));
        Ok(())
    }

    async fn load_media_file(&self, path: &Path) -> anyhow::Result<MediaRef> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if !self.media_files.lock().unwrap().contains(&name) {
            anyhow::bail!("media file not found: {}", path.display());
        }
        Ok(MediaRef::new(
            "image/png",
            Some(name),
            Bytes::from_static(b"\x89PNG"),
        ))
    }

    async fn load_media_from_url(&self, url: &str) -> anyhow::Result<MediaRef> {
        self.url_loads.lock().unwrap().push(url.to_string());
        Ok(MediaRef::new(
            "image/jpeg",
            Some(url.rsplit('/').next().unwrap_or("thumb.jpg").to_string()),
            Bytes::from_static(b"jpeg"),
        ))
    }
}

/// Observer that records subscriptions. Channels listed in `missing`
/// do not exist upstream; `broken` ones fail the existence check.
#[derive(Default)]
pub struct RecordingObserver {
    pub subscribed: Mutex<Vec<ChannelKey>>,
    pub unsubscribed: Mutex<Vec<ChannelKey>>,
    pub checked: Mutex<Vec<ChannelKey>>,
    pub missing: HashSet<String>,
    pub broken: HashSet<String>,
}

impl RecordingObserver {
    pub fn with_missing(names: &[&str]) -> Self {
        Self {
            missing: names.iter().map(|n| n.to_lowercase()).collect(),
            ..Default::default()
        }
    }

    pub fn subscribed_names(&self) -> Vec<String> {
        self.subscribed
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

#[async_trait]
impl ChannelObserver for RecordingObserver {
    async fn subscribe(&self, key: &ChannelKey) -> anyhow::Result<bool> {
        self.subscribed.lock().unwrap().push(key.clone());
        Ok(true)
    }

    async fn unsubscribe(&self, key: &ChannelKey) -> anyhow::Result<bool> {
        self.unsubscribed.lock().unwrap().push(key.clone());
        Ok(true)
    }

    async fn channel_exists(&self, key: &ChannelKey) -> anyhow::Result<bool> {
        self.checked.lock().unwrap().push(key.clone());
        if self.broken.contains(&key.normalized()) {
            anyhow::bail!("platform api unavailable");
        }
        Ok(!self.missing.contains(&key.normalized()))
    }
}

/// Text generator that always answers with the same text.
pub struct CannedText(pub String);

#[async_trait]
impl TextGenerator for CannedText {
    async fn complete(&self, _request: &CompletionRequest) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

/// Config with every delay zeroed.
pub fn test_config() -> StreamwatchConfig {
    let mut config = StreamwatchConfig::default();
    config.bot.id = "bot-a".into();
    config.delivery.mirror_delay_ms = 0;
    config.delivery.receipt_delay_ms = 0;
    config.delivery.ai_delay_ms = 0;
    config.registry.cleanup_pause_ms = 0;
    config
}

pub fn router_with(
    config: &StreamwatchConfig,
    store: Arc<InMemoryGroupStore>,
    transport: Arc<RecordingTransport>,
    text_generator: Option<Arc<dyn TextGenerator>>,
) -> EventRouter {
    EventRouter::from_config(
        config,
        store as Arc<dyn GroupStore>,
        transport,
        PathBuf::from("media"),
        text_generator,
    )
}

pub fn router(store: Arc<InMemoryGroupStore>, transport: Arc<RecordingTransport>) -> EventRouter {
    router_with(&test_config(), store, transport, None)
}
