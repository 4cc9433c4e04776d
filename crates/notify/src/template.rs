//! Placeholder substitution for notification templates.
//!
//! Twitch/Kick: `{nomeCanal}` `{titulo}` `{jogo}`.
//! YouTube: `{author}` `{title}` `{link}`.
//!
//! Substitution is a single left-to-right pass, so text coming from the
//! event is never itself scanned for placeholders. Unknown `{...}` tokens
//! are copied through untouched.

use std::borrow::Cow;

use streamwatch_common::Platform;

use crate::types::StreamEvent;

/// Value for one placeholder name, or `None` if the platform does not know it.
fn lookup<'a>(platform: Platform, name: &str, event: &'a StreamEvent) -> Option<Cow<'a, str>> {
    let field = |v: &'a Option<String>| Cow::Borrowed(v.as_deref().unwrap_or_default());
    if platform.is_live_platform() {
        match name {
            "nomeCanal" => Some(Cow::Borrowed(event.channel_name.as_str())),
            "titulo" => Some(field(&event.title)),
            "jogo" => Some(Cow::Borrowed(event.game.as_deref().unwrap_or("Unknown"))),
            _ => None,
        }
    } else {
        match name {
            "author" => Some(Cow::Borrowed(
                event.author.as_deref().unwrap_or(event.channel_name.as_str()),
            )),
            "title" => Some(field(&event.title)),
            "link" => Some(field(&event.url)),
            _ => None,
        }
    }
}

/// Render `template` with the event's fields.
pub fn render(template: &str, event: &StreamEvent) -> String {
    let platform = event.routing_platform();
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(['}', '{']) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let name = &after[..close];
                match lookup(platform, name, event) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    },
                }
                rest = &after[close + 1..];
            },
            _ => {
                out.push('{');
                rest = after;
            },
        }
    }
    out.push_str(rest);
    out
}
