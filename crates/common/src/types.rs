//! Identity types shared by the config, channel and notification crates.

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Streaming platform a watched channel lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitch,
    Kick,
    Youtube,
}

impl Platform {
    /// All variants, in the order group documents list them.
    pub const ALL: &'static [Platform] = &[Self::Twitch, Self::Kick, Self::Youtube];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Twitch => "twitch",
            Self::Kick => "kick",
            Self::Youtube => "youtube",
        }
    }

    /// Twitch and Kick share the live-stream placeholder set.
    pub fn is_live_platform(self) -> bool {
        matches!(self, Self::Twitch | Self::Kick)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twitch" => Ok(Self::Twitch),
            "kick" => Ok(Self::Kick),
            "youtube" => Ok(Self::Youtube),
            other => Err(Error::unknown_platform(other)),
        }
    }
}

/// A (platform, channel) pair. Channel names compare case-insensitively,
/// while the spelling first seen is kept for display and subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelKey {
    pub platform: Platform,
    pub channel: String,
}

impl ChannelKey {
    pub fn new(platform: Platform, channel: impl Into<String>) -> Self {
        Self {
            platform,
            channel: channel.into(),
        }
    }

    /// Lowercased channel name used for identity.
    pub fn normalized(&self) -> String {
        self.channel.to_lowercase()
    }

    pub fn matches(&self, platform: Platform, channel: &str) -> bool {
        self.platform == platform && self.channel.to_lowercase() == channel.to_lowercase()
    }
}

impl PartialEq for ChannelKey {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other.platform, &other.channel)
    }
}

impl Eq for ChannelKey {}

impl Hash for ChannelKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.platform.hash(state);
        self.normalized().hash(state);
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.platform, self.channel)
    }
}
