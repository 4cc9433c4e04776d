//! Turns one group's channel config plus an event into ordered drafts.

use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    streamwatch_channels::{ChatTransport, MediaRef, MessageContent, gating::mention_targets},
    streamwatch_config::{AiConfig, StreamwatchConfig},
    tracing::{debug, warn},
};

use crate::{
    template,
    textgen::{CompletionRequest, TextGenerator, notification_prompt},
    types::{
        ChannelConfig, GroupRecord, MediaKind, MediaSpec, NotificationDraft, StreamEvent,
        Transition,
    },
};

/// AI draft settings resolved from config.
#[derive(Debug, Clone)]
pub struct AiSettings {
    pub enabled: bool,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Delay hint so the AI draft lands after the template drafts.
    pub delay: Duration,
}

impl AiSettings {
    pub fn from_config(ai: &AiConfig, delay: Duration) -> Self {
        Self {
            enabled: ai.enabled,
            temperature: ai.temperature,
            max_tokens: ai.max_tokens,
            delay,
        }
    }
}

impl Default for AiSettings {
    fn default() -> Self {
        Self::from_config(&AiConfig::default(), Duration::from_millis(500))
    }
}

pub struct NotificationComposer {
    transport: Arc<dyn ChatTransport>,
    text_generator: Option<Arc<dyn TextGenerator>>,
    media_dir: PathBuf,
    ai: AiSettings,
}

impl NotificationComposer {
    pub fn new(transport: Arc<dyn ChatTransport>, media_dir: PathBuf) -> Self {
        Self {
            transport,
            text_generator: None,
            media_dir,
            ai: AiSettings::default(),
        }
    }

    pub fn from_config(
        config: &StreamwatchConfig,
        transport: Arc<dyn ChatTransport>,
        media_dir: PathBuf,
    ) -> Self {
        Self::new(transport, media_dir).with_ai_settings(AiSettings::from_config(
            &config.ai,
            config.delivery.ai_delay(),
        ))
    }

    pub fn with_text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.text_generator = Some(generator);
        self
    }

    pub fn with_ai_settings(mut self, ai: AiSettings) -> Self {
        self.ai = ai;
        self
    }

    /// Build the drafts for one group. Media and AI failures degrade to a
    /// fallback draft or no draft; they never fail the whole composition.
    pub async fn compose(
        &self,
        group: &GroupRecord,
        channel: &ChannelConfig,
        event: &StreamEvent,
        transition: Transition,
    ) -> Vec<NotificationDraft> {
        let config = channel.notification(transition);
        if config.media.is_empty() {
            debug!(
                group_id = %group.id,
                channel = %channel.channel,
                ?transition,
                "no media configured for transition"
            );
            return Vec::new();
        }

        let wants_thumbnail =
            channel.use_thumbnail && config.media.iter().any(|s| s.kind == MediaKind::Text);
        let thumbnail = if wants_thumbnail {
            self.load_thumbnail(group, event).await
        } else {
            None
        };

        let mut drafts = Vec::with_capacity(config.media.len() + 1);
        for spec in &config.media {
            drafts.push(self.render_spec(group, channel, event, spec, thumbnail.as_ref()).await);
        }

        if channel.mention_all_members && transition == Transition::Online {
            let mentions = self.resolve_mentions(group).await;
            for draft in &mut drafts {
                draft.mentions = mentions.clone();
            }
        }

        if channel.use_ai
            && transition == Transition::Online
            && let Some(draft) = self.ai_draft(group, event).await
        {
            drafts.push(draft);
        }

        drafts
    }

    async fn render_spec(
        &self,
        group: &GroupRecord,
        channel: &ChannelConfig,
        event: &StreamEvent,
        spec: &MediaSpec,
        thumbnail: Option<&MediaRef>,
    ) -> NotificationDraft {
        match spec.kind {
            MediaKind::Text => {
                let text = template::render(&spec.content, event);
                match thumbnail {
                    Some(thumbnail) => media_draft(&group.id, thumbnail.clone(), Some(text), false),
                    None => NotificationDraft::text(&group.id, text),
                }
            },
            MediaKind::Image | MediaKind::Video | MediaKind::Audio | MediaKind::Sticker => {
                let path = self.media_dir.join(&spec.content);
                match self.transport.load_media_file(&path).await {
                    Ok(media) => {
                        let caption = spec
                            .caption
                            .as_deref()
                            .map(|c| template::render(c, event))
                            .filter(|c| !c.is_empty());
                        media_draft(
                            &group.id,
                            media,
                            caption,
                            spec.kind == MediaKind::Sticker,
                        )
                    },
                    Err(e) => {
                        warn!(
                            group_id = %group.id,
                            channel = %channel.channel,
                            path = %path.display(),
                            error = %e,
                            "failed to load notification media"
                        );
                        NotificationDraft::text(
                            &group.id,
                            format!(
                                "Could not send the media notification for {}/{} ({}). \
                                 Please reconfigure this channel's media.",
                                event.platform, event.channel_name, spec.content
                            ),
                        )
                    },
                }
            },
        }
    }

    /// Thumbnail as media, only for well-formed https URLs.
    async fn load_thumbnail(&self, group: &GroupRecord, event: &StreamEvent) -> Option<MediaRef> {
        let raw = event.thumbnail.as_deref()?;
        if !is_secure_url(raw) {
            debug!(group_id = %group.id, thumbnail = raw, "thumbnail is not a secure url");
            return None;
        }
        match self.transport.load_media_from_url(raw).await {
            Ok(media) => Some(media),
            Err(e) => {
                warn!(group_id = %group.id, thumbnail = raw, error = %e, "failed to load thumbnail");
                None
            },
        }
    }

    async fn resolve_mentions(&self, group: &GroupRecord) -> Vec<String> {
        match self.transport.get_chat(&group.id).await {
            Ok(Some(chat)) => mention_targets(&chat.participants, &group.ignored_users),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(group_id = %group.id, error = %e, "failed to resolve group participants");
                Vec::new()
            },
        }
    }

    async fn ai_draft(&self, group: &GroupRecord, event: &StreamEvent) -> Option<NotificationDraft> {
        if !self.ai.enabled {
            return None;
        }
        let generator = self.text_generator.as_ref()?;
        let request = CompletionRequest {
            prompt: notification_prompt(event),
            temperature: self.ai.temperature,
            max_tokens: self.ai.max_tokens,
        };
        match generator.complete(&request).await {
            Ok(text) if !text.trim().is_empty() => {
                let mut draft = NotificationDraft::text(&group.id, text.trim());
                draft.delay = self.ai.delay;
                Some(draft)
            },
            Ok(_) => {
                debug!(group_id = %group.id, "text generator returned nothing");
                None
            },
            Err(e) => {
                warn!(group_id = %group.id, error = %e, "failed to generate ai notification");
                None
            },
        }
    }
}

fn media_draft(
    destination: &str,
    media: MediaRef,
    caption: Option<String>,
    as_sticker: bool,
) -> NotificationDraft {
    NotificationDraft {
        destination: destination.to_string(),
        content: MessageContent::Media {
            media,
            caption,
            as_sticker,
        },
        mentions: Vec::new(),
        delay: Duration::ZERO,
    }
}

fn is_secure_url(raw: &str) -> bool {
    url::Url::parse(raw)
        .map(|u| u.scheme() == "https" && u.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_url_check() {
        assert!(is_secure_url(
            "https://static-cdn.jtvnw.net/previews-ttv/live_user_foo-640x360.jpg"
        ));
        assert!(!is_secure_url("http://example.com/a.jpg"));
        assert!(!is_secure_url("https://"));
        assert!(!is_secure_url("thumb.jpg"));
    }
}
