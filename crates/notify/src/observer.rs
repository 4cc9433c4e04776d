//! Boundary to the upstream channel-state observer.
//!
//! The observer polls streaming platforms and pushes [`StreamEvent`]s into an
//! [`EventSender`]. The composition root creates one observer per process,
//! hands the sending half to it and the receiving half to
//! [`crate::EventRouter::run`].

use {anyhow::Result, async_trait::async_trait, streamwatch_common::ChannelKey, tokio::sync::mpsc};

use crate::types::StreamEvent;

pub type EventSender = mpsc::Sender<StreamEvent>;
pub type EventReceiver = mpsc::Receiver<StreamEvent>;

/// Bounded event queue between the observer and the router.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(capacity.max(1))
}

/// Subscription surface of the channel observer.
#[async_trait]
pub trait ChannelObserver: Send + Sync {
    /// Start watching a channel. Returns `false` if it was already watched.
    async fn subscribe(&self, key: &ChannelKey) -> Result<bool>;

    /// Stop watching a channel. Returns `false` if it was not watched.
    async fn unsubscribe(&self, key: &ChannelKey) -> Result<bool>;

    /// Ask the platform whether the channel exists at all.
    async fn channel_exists(&self, key: &ChannelKey) -> Result<bool>;
}
