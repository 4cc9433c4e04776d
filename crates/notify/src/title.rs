//! Group title and picture changes on stream transitions.

use std::{
    path::PathBuf,
    sync::{Arc, LazyLock},
};

use {
    regex::Regex,
    streamwatch_channels::ChatTransport,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use streamwatch_metrics::{counter, notify as notify_metrics};

use crate::types::{ChannelConfig, GroupRecord, Transition};

/// (offline, online) emoji pairs. A variation selector trailing a matched
/// emoji belongs to the same unit. The heart only counts in its emoji
/// presentation, so a bare U+2764 is left alone.
const EMOJI_PAIRS: &[(&str, &str)] = &[
    ("🔴", "🟢"),
    ("❤\u{FE0F}", "💚"),
    ("🌹", "🍏"),
    ("🟥", "🟩"),
];

static OFF_WORD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\bOFF\b").ok());
static ON_WORD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\bON\b").ok());

fn is_variation_selector(c: char) -> bool {
    matches!(c, '\u{FE0E}' | '\u{FE0F}')
}

/// Swap status emoji toward `transition`, one emoji unit at a time.
fn swap_emoji(title: &str, transition: Transition) -> String {
    let mut out = String::with_capacity(title.len());
    let mut rest = title;

    while let Some(c) = rest.chars().next() {
        let hit = EMOJI_PAIRS.iter().find_map(|&(off, on)| {
            let (from, to) = match transition {
                Transition::Online => (off, on),
                Transition::Offline => (on, off),
            };
            rest.starts_with(from).then_some((from.len(), to))
        });

        match hit {
            Some((len, to)) => {
                out.push_str(to);
                rest = &rest[len..];
                if let Some(sel) = rest.chars().next().filter(|&c| is_variation_selector(c)) {
                    rest = &rest[sel.len_utf8()..];
                }
            },
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            },
        }
    }
    out
}

/// Title derived from the current one: `OFF`/`ON` as whole words, then the
/// status emoji.
pub fn derive_title(current: &str, transition: Transition) -> String {
    let (word, replacement) = match transition {
        Transition::Online => (&*OFF_WORD, "ON"),
        Transition::Offline => (&*ON_WORD, "OFF"),
    };
    let replaced = match word {
        Some(re) => re.replace_all(current, replacement).into_owned(),
        None => current.to_string(),
    };
    swap_emoji(&replaced, transition)
}

/// New title for the transition: the configured custom title, otherwise the
/// derived one.
pub fn resolve_title(channel: &ChannelConfig, current: &str, transition: Transition) -> String {
    channel
        .custom_title(transition)
        .map(str::to_string)
        .unwrap_or_else(|| derive_title(current, transition))
}

/// Applies title/photo changes. Best-effort: failures are logged, never
/// returned.
pub struct TitleMutator {
    transport: Arc<dyn ChatTransport>,
    media_dir: PathBuf,
}

impl TitleMutator {
    pub fn new(transport: Arc<dyn ChatTransport>, media_dir: PathBuf) -> Self {
        Self {
            transport,
            media_dir,
        }
    }

    pub async fn mutate(&self, group: &GroupRecord, channel: &ChannelConfig, transition: Transition) {
        if !channel.change_title_on_event {
            return;
        }

        let chat = match self.transport.get_chat(&group.id).await {
            Ok(Some(chat)) if chat.is_group => chat,
            Ok(_) => {
                debug!(group_id = %group.id, "chat is not a known group, skipping title change");
                return;
            },
            Err(e) => {
                warn!(group_id = %group.id, channel = %channel.channel, error = %e, "failed to fetch chat");
                return;
            },
        };

        let title = resolve_title(channel, &chat.name, transition);
        if title == chat.name {
            debug!(group_id = %group.id, title = %title, "title already up to date");
        } else {
            match self.transport.set_subject(&group.id, &title).await {
                Ok(()) => {
                    info!(group_id = %group.id, channel = %channel.channel, title = %title, "changed group title");
                    #[cfg(feature = "metrics")]
                    counter!(notify_metrics::TITLE_CHANGES_TOTAL).increment(1);
                },
                Err(e) => {
                    warn!(group_id = %group.id, channel = %channel.channel, error = %e, "failed to set group title");
                },
            }
        }

        if let Some(photo) = channel.group_photo(transition) {
            self.set_photo(group, channel, photo).await;
        }
    }

    async fn set_photo(&self, group: &GroupRecord, channel: &ChannelConfig, photo: &str) {
        let path = self.media_dir.join(photo);
        let media = match self.transport.load_media_file(&path).await {
            Ok(media) => media,
            Err(e) => {
                warn!(
                    group_id = %group.id,
                    channel = %channel.channel,
                    path = %path.display(),
                    error = %e,
                    "failed to load group photo"
                );
                return;
            },
        };
        match self.transport.set_picture(&group.id, &media).await {
            Ok(()) => info!(group_id = %group.id, channel = %channel.channel, "changed group photo"),
            Err(e) => {
                warn!(group_id = %group.id, channel = %channel.channel, error = %e, "failed to set group photo");
            },
        }
    }
}
