//! Drops repeated identical transitions for a channel inside a short window.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use streamwatch_common::ChannelKey;

use crate::types::{EventKind, StreamEvent};

pub struct FlapDebouncer {
    window: Duration,
    last: Mutex<HashMap<(ChannelKey, EventKind), Instant>>,
}

impl FlapDebouncer {
    /// A zero window lets every event through.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.window.is_zero()
    }

    /// `false` when the same (channel, kind) was accepted less than `window`
    /// ago. Accepted events restart the window.
    pub fn should_route(&self, event: &StreamEvent) -> bool {
        self.should_route_at(event, Instant::now())
    }

    fn should_route_at(&self, event: &StreamEvent, now: Instant) -> bool {
        if !self.is_enabled() || event.kind == EventKind::ChannelNotFound {
            return true;
        }
        let Ok(mut last) = self.last.lock() else {
            return true;
        };

        // Forget entries that can no longer suppress anything.
        last.retain(|_, seen| now.saturating_duration_since(*seen) < self.window);

        let key = (event.key(), event.kind);
        if last.contains_key(&key) {
            return false;
        }
        last.insert(key, now);
        true
    }
}
