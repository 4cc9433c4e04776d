//! Entry point for upstream events.
//!
//! For every group watching the event's channel the router runs
//! compose, title mutation, then delivery. Groups are processed one after
//! another; a panic in one group's pipeline is caught and logged so the
//! remaining groups still get their notifications.

use std::{
    panic::AssertUnwindSafe,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use {
    futures::FutureExt,
    streamwatch_channels::{ChatTransport, OutboundMessage},
    streamwatch_config::StreamwatchConfig,
    tokio::task::{JoinError, JoinSet},
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use streamwatch_metrics::{
    counter, histogram, labels as metric_labels, notify as notify_metrics,
};

use crate::{
    Result,
    composer::NotificationComposer,
    debounce::FlapDebouncer,
    delivery::{DeliveryManager, DeliveryOutcome},
    observer::EventReceiver,
    store::GroupStore,
    textgen::TextGenerator,
    title::TitleMutator,
    types::{ChannelConfig, EventKind, GroupRecord, StreamEvent, Transition},
};

/// What routing one event did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteSummary {
    /// Groups whose channel list matched the event.
    pub matched: usize,
    /// Matched groups that had at least one draft sent.
    pub delivered: usize,
    /// Matched groups whose pipeline panicked.
    pub failed: usize,
    /// The event was a repeat inside the debounce window and was dropped.
    pub debounced: bool,
}

pub struct EventRouter {
    store: Arc<dyn GroupStore>,
    transport: Arc<dyn ChatTransport>,
    composer: NotificationComposer,
    titles: TitleMutator,
    delivery: DeliveryManager,
    debouncer: FlapDebouncer,
}

impl EventRouter {
    pub fn new(
        store: Arc<dyn GroupStore>,
        transport: Arc<dyn ChatTransport>,
        composer: NotificationComposer,
        titles: TitleMutator,
        delivery: DeliveryManager,
    ) -> Self {
        Self {
            store,
            transport,
            composer,
            titles,
            delivery,
            debouncer: FlapDebouncer::new(Duration::ZERO),
        }
    }

    /// Wire the whole pipeline from config. `media_dir` holds the files
    /// named by media specs and group photos.
    pub fn from_config(
        config: &StreamwatchConfig,
        store: Arc<dyn GroupStore>,
        transport: Arc<dyn ChatTransport>,
        media_dir: PathBuf,
        text_generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        let mut composer =
            NotificationComposer::from_config(config, Arc::clone(&transport), media_dir.clone());
        if let Some(generator) = text_generator {
            composer = composer.with_text_generator(generator);
        }
        let titles = TitleMutator::new(Arc::clone(&transport), media_dir);
        let delivery = DeliveryManager::from_config(config, Arc::clone(&transport), Arc::clone(&store));
        Self::new(store, transport, composer, titles, delivery)
            .with_debounce(config.router.debounce())
    }

    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debouncer = FlapDebouncer::new(window);
        self
    }

    pub fn delivery(&self) -> &DeliveryManager {
        &self.delivery
    }

    /// Route one event to every matching group.
    ///
    /// Only a failure to list groups is returned; per-group problems are
    /// logged and counted in the summary.
    pub async fn route(&self, event: &StreamEvent) -> Result<RouteSummary> {
        if !self.debouncer.should_route(event) {
            debug!(channel = %event.key(), event = event.kind.as_str(), "dropping repeated event inside debounce window");
            #[cfg(feature = "metrics")]
            counter!(notify_metrics::EVENTS_DEBOUNCED_TOTAL).increment(1);
            return Ok(RouteSummary {
                debounced: true,
                ..Default::default()
            });
        }

        #[cfg(feature = "metrics")]
        counter!(
            notify_metrics::EVENTS_ROUTED_TOTAL,
            metric_labels::PLATFORM => event.routing_platform().as_str(),
            metric_labels::EVENT => event.kind.as_str()
        )
        .increment(1);

        let Some(transition) = event.kind.transition() else {
            self.notify_missing_channel(event).await;
            return Ok(RouteSummary::default());
        };

        let platform = event.routing_platform();
        let groups = self.store.list_groups().await?;
        let mut summary = RouteSummary::default();

        for group in &groups {
            let Some(channel) = group.find_channel(platform, &event.channel_name) else {
                continue;
            };
            summary.matched += 1;

            let started = Instant::now();
            let pipeline = self.process_group(group, channel, event, transition);
            match AssertUnwindSafe(pipeline).catch_unwind().await {
                Ok(Some(DeliveryOutcome::Delivered { sent, .. }))
                | Ok(Some(DeliveryOutcome::MarkedUnreachable { sent }))
                    if sent > 0 =>
                {
                    summary.delivered += 1;
                },
                Ok(_) => {},
                Err(payload) => {
                    summary.failed += 1;
                    error!(
                        group_id = %group.id,
                        channel = %channel.channel,
                        platform = %platform,
                        panic = panic_message(payload.as_ref()),
                        "group pipeline panicked"
                    );
                    #[cfg(feature = "metrics")]
                    counter!(notify_metrics::GROUP_ERRORS_TOTAL).increment(1);
                },
            }

            #[cfg(feature = "metrics")]
            histogram!(notify_metrics::GROUP_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
            debug!(group_id = %group.id, elapsed_ms = started.elapsed().as_millis() as u64, "group processed");
        }

        #[cfg(feature = "metrics")]
        counter!(notify_metrics::GROUPS_MATCHED_TOTAL).increment(summary.matched as u64);
        info!(
            channel = %event.key(),
            event = event.kind.as_str(),
            matched = summary.matched,
            delivered = summary.delivered,
            failed = summary.failed,
            "event routed"
        );
        Ok(summary)
    }

    /// One group's pipeline. `None` when the group is paused.
    async fn process_group(
        &self,
        group: &GroupRecord,
        channel: &ChannelConfig,
        event: &StreamEvent,
        transition: Transition,
    ) -> Option<DeliveryOutcome> {
        if group.paused {
            debug!(group_id = %group.id, "group is paused, skipping");
            return None;
        }
        if group.is_suppressed_for(self.delivery.bot_id()) {
            // The delivery guard logs and counts the skip.
            return Some(self.delivery.deliver(group, &[]).await);
        }

        let drafts = self.composer.compose(group, channel, event, transition).await;
        self.titles.mutate(group, channel, transition).await;
        Some(self.delivery.deliver(group, &drafts).await)
    }

    /// Tell the group named in a `channelNotFound` event that its channel is
    /// gone.
    async fn notify_missing_channel(&self, event: &StreamEvent) {
        let Some(group_id) = event.group_id.as_deref() else {
            warn!(channel = %event.key(), "channel not found event without a target group");
            return;
        };
        let text = format!(
            "Channel {}/{} was not found and is no longer monitored.",
            event.platform, event.channel_name
        );
        match self
            .transport
            .send_message(&OutboundMessage::text(group_id, text))
            .await
        {
            Ok(_) => info!(group_id, channel = %event.key(), "sent channel not found notice"),
            Err(e) => warn!(group_id, channel = %event.key(), error = %e, "failed to send channel not found notice"),
        }
    }

    /// Consume events until the sender side closes. Each event is routed on
    /// its own task, so events for different channels interleave.
    pub async fn run(self: Arc<Self>, mut events: EventReceiver) {
        let mut tasks = JoinSet::new();
        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Some(event) => {
                        let router = Arc::clone(&self);
                        tasks.spawn(async move {
                            let kind = event.kind;
                            (kind, router.route(&event).await)
                        });
                    },
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_task(joined),
            }
        }
        while let Some(joined) = tasks.join_next().await {
            log_task(joined);
        }
        info!("event stream closed, router stopped");
    }
}

fn log_task(joined: std::result::Result<(EventKind, Result<RouteSummary>), JoinError>) {
    match joined {
        Ok((_, Ok(_))) => {},
        Ok((kind, Err(e))) => warn!(event = kind.as_str(), error = %e, "event dropped"),
        Err(e) => error!(error = %e, "routing task failed"),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
