//! Metric name and label definitions.
//!
//! Centralizing names keeps the notification core and the exporter in sync.

/// Stream-event fan-out and delivery metrics
pub mod notify {
    /// Upstream events accepted by the router
    pub const EVENTS_ROUTED_TOTAL: &str = "streamwatch_notify_events_routed_total";
    /// Events dropped by the flap debouncer
    pub const EVENTS_DEBOUNCED_TOTAL: &str = "streamwatch_notify_events_debounced_total";
    /// Groups matched by routed events
    pub const GROUPS_MATCHED_TOTAL: &str = "streamwatch_notify_groups_matched_total";
    /// Per-group pipeline failures caught by the router
    pub const GROUP_ERRORS_TOTAL: &str = "streamwatch_notify_group_errors_total";
    /// Duration of one group's pipeline in seconds
    pub const GROUP_DURATION_SECONDS: &str = "streamwatch_notify_group_duration_seconds";
    /// Drafts accepted by the transport
    pub const DRAFTS_SENT_TOTAL: &str = "streamwatch_notify_drafts_sent_total";
    /// Drafts the transport failed to send
    pub const SEND_FAILURES_TOTAL: &str = "streamwatch_notify_send_failures_total";
    /// Groups newly marked unreachable for this bot
    pub const GROUPS_SUPPRESSED_TOTAL: &str = "streamwatch_notify_groups_suppressed_total";
    /// Deliveries skipped because the group is suppressed
    pub const SUPPRESSED_SKIPS_TOTAL: &str = "streamwatch_notify_suppressed_skips_total";
    /// Group title changes applied
    pub const TITLE_CHANGES_TOTAL: &str = "streamwatch_notify_title_changes_total";
}

/// Subscription registry metrics
pub mod registry {
    /// Channel keys currently subscribed with the observer
    pub const SUBSCRIPTIONS_ACTIVE: &str = "streamwatch_registry_subscriptions_active";
    /// Channels removed during cleanup because they no longer exist
    pub const CHANNELS_REMOVED_TOTAL: &str = "streamwatch_registry_channels_removed_total";
}

/// Common label keys
pub mod labels {
    pub const PLATFORM: &str = "platform";
    pub const EVENT: &str = "event";
}

/// Histogram bucket boundaries
pub mod buckets {
    /// Per-group pipeline durations: media loads and delayed sends make this
    /// a long-tailed distribution.
    pub const GROUP_DURATION: [f64; 10] = [0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];
}
