//! Stream-event fan-out and notification delivery.
//!
//! One upstream [`StreamEvent`] is routed to every group that watches the
//! channel. Each group gets its own drafts (rendered from its templates),
//! an optional title/photo change, and a delivery pass that infers when the
//! bot can no longer reach the group and persists that as suppression.
//! A failure in one group's pipeline never stops the others.

pub mod composer;
pub mod debounce;
pub mod delivery;
pub mod error;
pub mod observer;
pub mod registry;
pub mod router;
pub mod store;
pub mod store_file;
pub mod store_memory;
pub mod template;
pub mod textgen;
pub mod title;
pub mod types;

pub use {
    composer::NotificationComposer,
    delivery::{DeliveryManager, DeliveryOutcome},
    error::{Error, Result},
    observer::{ChannelObserver, EventReceiver, EventSender, event_channel},
    registry::{LoadSummary, SubscriptionRegistry},
    router::{EventRouter, RouteSummary},
    store::GroupStore,
    textgen::{CompletionRequest, TextGenerator},
    title::TitleMutator,
    types::{
        ChannelConfig, EventKind, GroupRecord, MediaKind, MediaSpec, NotificationConfig,
        NotificationDraft, StreamEvent, Transition,
    },
};
