//! Free-text generation for AI-authored notifications.

use {anyhow::Result, async_trait::async_trait};

use crate::types::StreamEvent;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A text completion backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Prompt for an upbeat announcement: live-stream wording for Twitch/Kick,
/// new-upload wording for YouTube.
pub fn notification_prompt(event: &StreamEvent) -> String {
    let title = event.title.as_deref().unwrap_or_default();
    if event.routing_platform().is_live_platform() {
        let game = event.game.as_deref().unwrap_or("a game");
        format!(
            "The channel {} just went live playing {game} with the title \"{title}\". \
             Write an upbeat message inviting the group to join the stream.",
            event.channel_name
        )
    } else {
        format!(
            "The channel {} just released a new video called \"{title}\". \
             Write an upbeat message inviting the group to watch it.",
            event.channel_name
        )
    }
}
