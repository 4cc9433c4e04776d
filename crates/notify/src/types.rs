//! Group documents, upstream events, and rendered drafts.

use std::time::Duration;

use {
    serde::{Deserialize, Serialize},
    streamwatch_channels::{MessageContent, OutboundMessage},
    streamwatch_common::{ChannelKey, Platform},
};

// ── Group configuration ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Text,
    Image,
    Video,
    Audio,
    Sticker,
}

/// One configured notification unit. For `text`, `content` is the template;
/// for media kinds it is a file name under the media directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSpec {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl MediaSpec {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Text,
            content: content.into(),
            caption: None,
        }
    }

    pub fn media(kind: MediaKind, file: impl Into<String>, caption: Option<String>) -> Self {
        Self {
            kind,
            content: file.into(),
            caption,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub media: Vec<MediaSpec>,
}

/// Per-group settings for one watched channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfig {
    pub channel: String,
    #[serde(default)]
    pub on_config: NotificationConfig,
    #[serde(default)]
    pub off_config: NotificationConfig,
    #[serde(default)]
    pub change_title_on_event: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_photo_online: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_photo_offline: Option<String>,
    #[serde(default, rename = "useAI")]
    pub use_ai: bool,
    #[serde(default)]
    pub use_thumbnail: bool,
    #[serde(default)]
    pub mention_all_members: bool,
}

impl ChannelConfig {
    /// Config a group gets when it starts watching a channel: a single text
    /// announcement for going online, nothing for offline.
    pub fn with_defaults(platform: Platform, channel: impl Into<String>) -> Self {
        let channel = channel.into();
        let text = if platform.is_live_platform() {
            let host = match platform {
                Platform::Kick => "kick.com",
                _ => "twitch.tv",
            };
            format!(
                "⚠️ ATENÇÃO!⚠️\n\n🌟 *{{nomeCanal}}* ✨ está *online* streamando *{{jogo}}*!\n_{{titulo}}_\n\nhttps://{host}/{channel}"
            )
        } else {
            "*⚠️ Vídeo novo! ⚠️*\n\n*{author}:* *{title}* \n{link}".to_string()
        };
        Self {
            channel,
            on_config: NotificationConfig {
                media: vec![MediaSpec::text(text)],
            },
            ..Default::default()
        }
    }

    pub fn notification(&self, transition: Transition) -> &NotificationConfig {
        match transition {
            Transition::Online => &self.on_config,
            Transition::Offline => &self.off_config,
        }
    }

    pub fn custom_title(&self, transition: Transition) -> Option<&str> {
        match transition {
            Transition::Online => self.online_title.as_deref(),
            Transition::Offline => self.offline_title.as_deref(),
        }
        .filter(|t| !t.trim().is_empty())
    }

    pub fn group_photo(&self, transition: Transition) -> Option<&str> {
        match transition {
            Transition::Online => self.group_photo_online.as_deref(),
            Transition::Offline => self.group_photo_offline.as_deref(),
        }
        .filter(|p| !p.trim().is_empty())
    }
}

/// A persisted chat group. Only the fields the notification core reads or
/// writes are typed; everything else round-trips through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub paused: bool,
    /// Bot identities that inferred they can no longer reach this group.
    #[serde(default)]
    pub bot_not_in_group: Vec<String>,
    #[serde(default)]
    pub twitch: Vec<ChannelConfig>,
    #[serde(default)]
    pub kick: Vec<ChannelConfig>,
    #[serde(default)]
    pub youtube: Vec<ChannelConfig>,
    #[serde(default)]
    pub ignored_users: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GroupRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn channels(&self, platform: Platform) -> &[ChannelConfig] {
        match platform {
            Platform::Twitch => &self.twitch,
            Platform::Kick => &self.kick,
            Platform::Youtube => &self.youtube,
        }
    }

    pub fn channels_mut(&mut self, platform: Platform) -> &mut Vec<ChannelConfig> {
        match platform {
            Platform::Twitch => &mut self.twitch,
            Platform::Kick => &mut self.kick,
            Platform::Youtube => &mut self.youtube,
        }
    }

    /// Case-insensitive lookup of a channel config.
    pub fn find_channel(&self, platform: Platform, channel: &str) -> Option<&ChannelConfig> {
        let wanted = channel.to_lowercase();
        self.channels(platform)
            .iter()
            .find(|c| c.channel.to_lowercase() == wanted)
    }

    /// Remove every config for the channel. Returns how many were removed.
    pub fn remove_channel(&mut self, platform: Platform, channel: &str) -> usize {
        let wanted = channel.to_lowercase();
        let list = self.channels_mut(platform);
        let before = list.len();
        list.retain(|c| c.channel.to_lowercase() != wanted);
        before - list.len()
    }

    pub fn is_suppressed_for(&self, bot_id: &str) -> bool {
        self.bot_not_in_group.iter().any(|b| b == bot_id)
    }

    /// Name used in logs and mirrored messages.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

// ── Upstream events ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    #[serde(alias = "online")]
    StreamOnline,
    #[serde(alias = "offline")]
    StreamOffline,
    NewVideo,
    ChannelNotFound,
}

impl EventKind {
    /// The group-facing transition this event drives. New uploads are
    /// announced like a channel going online.
    pub fn transition(self) -> Option<Transition> {
        match self {
            Self::StreamOnline | Self::NewVideo => Some(Transition::Online),
            Self::StreamOffline => Some(Transition::Offline),
            Self::ChannelNotFound => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StreamOnline => "streamOnline",
            Self::StreamOffline => "streamOffline",
            Self::NewVideo => "newVideo",
            Self::ChannelNotFound => "channelNotFound",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Online,
    Offline,
}

/// A state change reported by the channel observer. Consumed once by the
/// router and then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub platform: Platform,
    pub channel_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Target group of a `channelNotFound` notice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl StreamEvent {
    pub fn new(kind: EventKind, platform: Platform, channel_name: impl Into<String>) -> Self {
        Self {
            kind,
            platform,
            channel_name: channel_name.into(),
            title: None,
            game: None,
            url: None,
            thumbnail: None,
            author: None,
            group_id: None,
        }
    }

    pub fn online(platform: Platform, channel_name: impl Into<String>) -> Self {
        Self::new(EventKind::StreamOnline, platform, channel_name)
    }

    pub fn offline(platform: Platform, channel_name: impl Into<String>) -> Self {
        Self::new(EventKind::StreamOffline, platform, channel_name)
    }

    pub fn new_video(channel_name: impl Into<String>) -> Self {
        Self::new(EventKind::NewVideo, Platform::Youtube, channel_name)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_game(mut self, game: impl Into<String>) -> Self {
        self.game = Some(game.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Platform whose channel lists are scanned for this event. New uploads
    /// only exist on YouTube.
    pub fn routing_platform(&self) -> Platform {
        match self.kind {
            EventKind::NewVideo => Platform::Youtube,
            _ => self.platform,
        }
    }

    pub fn key(&self) -> ChannelKey {
        ChannelKey::new(self.routing_platform(), self.channel_name.clone())
    }
}

// ── Drafts ──────────────────────────────────────────────────────────────────

/// A rendered, not-yet-sent notification for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub destination: String,
    pub content: MessageContent,
    pub mentions: Vec<String>,
    /// Pause before sending, relative to the previous draft.
    pub delay: Duration,
}

impl NotificationDraft {
    pub fn text(destination: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            content: MessageContent::Text(text.into()),
            mentions: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn to_outbound(&self) -> OutboundMessage {
        OutboundMessage {
            chat_id: self.destination.clone(),
            content: self.content.clone(),
            mentions: self.mentions.clone(),
            delay: self.delay,
        }
    }
}
