use std::{fmt, time::Duration};

use {bytes::Bytes, serde::Serialize};

/// A loaded media blob ready to be attached to a message or used as a
/// group picture.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub mime_type: String,
    pub file_name: Option<String>,
    pub data: Bytes,
}

impl MediaRef {
    pub fn new(mime_type: impl Into<String>, file_name: Option<String>, data: Bytes) -> Self {
        Self {
            mime_type: mime_type.into(),
            file_name,
            data,
        }
    }
}

impl fmt::Debug for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaRef")
            .field("mime_type", &self.mime_type)
            .field("file_name", &self.file_name)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Body of an outbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Media {
        media: MediaRef,
        caption: Option<String>,
        /// Ask the transport to convert the media into a sticker.
        as_sticker: bool,
    },
}

impl MessageContent {
    /// Text shown to a reader: the text body or the caption.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Media { caption, .. } => caption.as_deref(),
        }
    }
}

/// A message handed to [`crate::ChatTransport::send_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: String,
    pub content: MessageContent,
    /// User ids to mention.
    pub mentions: Vec<String>,
    /// Pause before this message is sent.
    pub delay: Duration,
}

impl OutboundMessage {
    pub fn text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            content: MessageContent::Text(text.into()),
            mentions: Vec::new(),
            delay: Duration::ZERO,
        }
    }
}

/// Handle to a message the transport accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentMessage {
    pub chat_id: String,
    pub message_id: String,
}

/// Recipients reached at each delivery stage of a sent message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryInfo {
    pub delivered: Vec<String>,
    pub played: Vec<String>,
    pub read: Vec<String>,
}

impl DeliveryInfo {
    /// No recipient reached any stage.
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty() && self.played.is_empty() && self.read.is_empty()
    }
}
