use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Result,
    streamwatch_channels::ChatTransport,
    streamwatch_config::{StreamwatchConfig, data_dir},
    streamwatch_notify::{
        DeliveryManager, EventRouter, EventSender, GroupStore, StreamEvent, SubscriptionRegistry,
        event_channel, store_file::FileGroupStore,
    },
    tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    tracing::{info, warn},
};

use crate::dry_run::{LoggingObserver, LoggingTransport};

const EVENT_QUEUE_CAPACITY: usize = 64;

fn open_store(config: &StreamwatchConfig) -> Arc<dyn GroupStore> {
    Arc::new(FileGroupStore::in_data_dir(&data_dir(config)))
}

/// Load groups, subscribe their channels, then route JSON-lines events from
/// `events` (or stdin) until the input ends.
pub async fn handle_run(config: &StreamwatchConfig, events: Option<PathBuf>, cleanup: bool) -> Result<()> {
    let data_dir = data_dir(config);
    let store = open_store(config);
    let transport: Arc<dyn ChatTransport> = Arc::new(LoggingTransport::default());

    let registry = SubscriptionRegistry::from_config(config, Arc::clone(&store), Arc::new(LoggingObserver));
    registry.load_all(cleanup).await?;

    let router = Arc::new(EventRouter::from_config(
        config,
        store,
        transport,
        data_dir.join("media"),
        None,
    ));
    let (tx, rx) = event_channel(EVENT_QUEUE_CAPACITY);
    let driver = tokio::spawn(Arc::clone(&router).run(rx));

    let fed = match events {
        Some(path) => {
            info!(path = %path.display(), "reading events");
            let file = tokio::fs::File::open(&path).await?;
            feed_events(BufReader::new(file), &tx).await
        },
        None => {
            info!("reading events from stdin");
            feed_events(BufReader::new(tokio::io::stdin()), &tx).await
        },
    };
    drop(tx);
    driver.await?;

    info!(events = fed?, "all events routed");
    Ok(())
}

/// Parse one [`StreamEvent`] per line. Blank lines and `#` comments are
/// ignored; malformed lines are logged and skipped.
async fn feed_events<R>(reader: R, tx: &EventSender) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0usize;
    let mut sent = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<StreamEvent>(line) {
            Ok(event) => {
                if tx.send(event).await.is_err() {
                    warn!("router stopped, no more events accepted");
                    break;
                }
                sent += 1;
            },
            Err(e) => warn!(line = line_no, error = %e, "skipping malformed event"),
        }
    }
    Ok(sent)
}

/// Print the deduplicated channel keys the groups reference.
pub async fn handle_subscriptions(config: &StreamwatchConfig, cleanup: bool) -> Result<()> {
    let registry = SubscriptionRegistry::from_config(config, open_store(config), Arc::new(LoggingObserver));
    let summary = registry.load_all(cleanup).await?;

    for key in registry.subscribed().await {
        println!("{key}");
    }
    for key in &summary.skipped_malformed {
        eprintln!("skipped malformed: {key}");
    }
    for key in &summary.removed {
        eprintln!("removed (not found upstream): {key}");
    }
    Ok(())
}

pub async fn handle_clear_suppression(config: &StreamwatchConfig, group_id: &str) -> Result<()> {
    let delivery = DeliveryManager::from_config(config, Arc::new(LoggingTransport::default()), open_store(config));
    if delivery.clear_suppression(group_id).await? {
        println!("Cleared suppression of {group_id} for bot {}.", delivery.bot_id());
    } else {
        println!("{group_id} was not suppressed for bot {}.", delivery.bot_id());
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, streamwatch_common::Platform, streamwatch_notify::EventKind};

    #[tokio::test]
    async fn feeds_valid_lines_and_skips_the_rest() {
        let input = concat!(
            "# recorded from the observer\n",
            r#"{"type":"streamOnline","platform":"twitch","channelName":"foo","title":"Playing"}"#,
            "\n\nnot json\n",
            r#"{"type":"newVideo","platform":"youtube","channelName":"creator"}"#,
            "\n",
        );
        let (tx, mut rx) = event_channel(8);

        let sent = feed_events(BufReader::new(input.as_bytes()), &tx).await.unwrap();
        drop(tx);

        assert_eq!(sent, 2);
        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, EventKind::StreamOnline);
        assert_eq!(first.platform, Platform::Twitch);
        assert_eq!(first.title.as_deref(), Some("Playing"));
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::NewVideo);
        assert!(rx.recv().await.is_none());
    }
}
