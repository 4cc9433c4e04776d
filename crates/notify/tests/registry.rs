//! Channel subscription loading, cleanup, and incremental changes.
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use {
    async_trait::async_trait,
    common::{RecordingObserver, test_config},
    streamwatch_common::{ChannelKey, Platform},
    streamwatch_notify::{
        ChannelConfig, ChannelObserver, Error, GroupRecord, GroupStore, SubscriptionRegistry,
        store_file::FileGroupStore, store_memory::InMemoryGroupStore,
    },
    tempfile::TempDir,
};

fn group(id: &str, channels: &[(Platform, &str)]) -> GroupRecord {
    let mut group = GroupRecord::new(id, id);
    for &(platform, name) in channels {
        group
            .channels_mut(platform)
            .push(ChannelConfig::with_defaults(platform, name));
    }
    group
}

fn registry(store: Arc<dyn GroupStore>, observer: Arc<RecordingObserver>) -> SubscriptionRegistry {
    SubscriptionRegistry::from_config(&test_config(), store, observer)
}

#[tokio::test]
async fn subscribes_each_key_once() {
    let store = Arc::new(InMemoryGroupStore::with_groups([
        group("a@g.us", &[(Platform::Twitch, "Foo"), (Platform::Kick, "foo")]),
        group("b@g.us", &[(Platform::Twitch, "foo"), (Platform::Youtube, "creator")]),
    ]));
    let observer = Arc::new(RecordingObserver::default());
    let registry = registry(store, observer.clone());

    let summary = registry.load_all(false).await.unwrap();
    assert_eq!(summary.subscribed.len(), 3);
    assert_eq!(observer.subscribed_names(), vec![
        "twitch/Foo",
        "kick/foo",
        "youtube/creator"
    ]);

    let again = registry.load_all(false).await.unwrap();
    assert!(again.subscribed.is_empty());
    assert_eq!(observer.subscribed.lock().unwrap().len(), 3);
    assert!(observer.checked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_names_are_skipped() {
    let store = Arc::new(InMemoryGroupStore::with_groups([group("a@g.us", &[
        (Platform::Twitch, "{nomeCanal}"),
        (Platform::Twitch, "nomedocanal"),
        (Platform::Kick, "real_one"),
    ])]));
    let observer = Arc::new(RecordingObserver::default());

    let summary = registry(store, observer.clone()).load_all(true).await.unwrap();

    assert_eq!(summary.skipped_malformed.len(), 2);
    assert_eq!(observer.subscribed_names(), vec!["kick/real_one"]);
    assert_eq!(observer.checked.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn cleanup_removes_missing_channels_from_every_group() {
    let store = Arc::new(InMemoryGroupStore::with_groups([
        group("a@g.us", &[(Platform::Twitch, "gone"), (Platform::Twitch, "alive")]),
        group("b@g.us", &[(Platform::Twitch, "Gone")]),
    ]));
    let observer = Arc::new(RecordingObserver::with_missing(&["gone"]));

    let summary = registry(store.clone(), observer.clone())
        .load_all(true)
        .await
        .unwrap();

    assert_eq!(summary.removed, vec![ChannelKey::new(Platform::Twitch, "gone")]);
    assert_eq!(observer.subscribed_names(), vec!["twitch/alive"]);
    let a = store.get_group("a@g.us").await.unwrap().unwrap();
    assert_eq!(a.twitch.len(), 1);
    assert_eq!(a.twitch[0].channel, "alive");
    assert!(store.get_group("b@g.us").await.unwrap().unwrap().twitch.is_empty());
}

/// Reports every channel missing, but first suppresses the group as a
/// concurrent delivery would.
struct SuppressWhileChecking {
    store: Arc<InMemoryGroupStore>,
}

#[async_trait]
impl ChannelObserver for SuppressWhileChecking {
    async fn subscribe(&self, _key: &ChannelKey) -> anyhow::Result<bool> {
        Ok(true)
    }

    async fn unsubscribe(&self, _key: &ChannelKey) -> anyhow::Result<bool> {
        Ok(true)
    }

    async fn channel_exists(&self, _key: &ChannelKey) -> anyhow::Result<bool> {
        let mut group = self.store.get_group("a@g.us").await?.unwrap();
        group.bot_not_in_group.push("bot-b".into());
        self.store.save_group(&group).await?;
        Ok(false)
    }
}

#[tokio::test]
async fn cleanup_keeps_changes_made_during_the_check() {
    let store = Arc::new(InMemoryGroupStore::with_groups([group("a@g.us", &[
        (Platform::Twitch, "gone"),
    ])]));
    let observer = Arc::new(SuppressWhileChecking {
        store: store.clone(),
    });

    let summary = SubscriptionRegistry::from_config(&test_config(), store.clone(), observer)
        .load_all(true)
        .await
        .unwrap();

    assert_eq!(summary.removed.len(), 1);
    let a = store.get_group("a@g.us").await.unwrap().unwrap();
    assert!(a.twitch.is_empty());
    assert_eq!(a.bot_not_in_group, vec!["bot-b".to_string()]);
}

#[tokio::test]
async fn failed_existence_check_subscribes_anyway() {
    let store = Arc::new(InMemoryGroupStore::with_groups([group("a@g.us", &[(
        Platform::Kick,
        "flaky",
    )])]));
    let mut observer = RecordingObserver::default();
    observer.broken.insert("flaky".into());
    let observer = Arc::new(observer);

    let summary = registry(store.clone(), observer.clone())
        .load_all(true)
        .await
        .unwrap();

    assert!(summary.removed.is_empty());
    assert_eq!(observer.subscribed_names(), vec!["kick/flaky"]);
    assert_eq!(store.get_group("a@g.us").await.unwrap().unwrap().kick.len(), 1);
}

#[tokio::test]
async fn add_channel_registers_and_lifts_suppression() {
    let mut suppressed = group("a@g.us", &[]);
    suppressed.bot_not_in_group = vec!["bot-a".into(), "bot-b".into()];
    let store = Arc::new(InMemoryGroupStore::with_groups([suppressed]));
    let observer = Arc::new(RecordingObserver::default());
    let registry = registry(store.clone(), observer.clone());

    assert!(registry.add_channel("a@g.us", Platform::Kick, "Bar").await.unwrap());
    assert!(!registry.add_channel("a@g.us", Platform::Kick, "bar").await.unwrap());

    let group = store.get_group("a@g.us").await.unwrap().unwrap();
    assert_eq!(group.kick.len(), 1);
    assert_eq!(group.kick[0].on_config.media.len(), 1);
    assert_eq!(group.bot_not_in_group, vec!["bot-b"]);
    assert_eq!(observer.subscribed_names(), vec!["kick/Bar"]);

    let err = registry
        .add_channel("missing@g.us", Platform::Kick, "bar")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::GroupNotFound { .. }));
}

#[tokio::test]
async fn remove_channel_keeps_shared_subscription() {
    let store = Arc::new(InMemoryGroupStore::with_groups([
        group("a@g.us", &[(Platform::Twitch, "foo")]),
        group("b@g.us", &[(Platform::Twitch, "foo")]),
    ]));
    let observer = Arc::new(RecordingObserver::default());
    let registry = registry(store.clone(), observer.clone());
    registry.load_all(false).await.unwrap();

    assert!(registry.remove_channel("a@g.us", Platform::Twitch, "FOO").await.unwrap());
    assert!(observer.unsubscribed.lock().unwrap().is_empty());
    assert!(!registry.remove_channel("a@g.us", Platform::Twitch, "foo").await.unwrap());

    assert!(registry.remove_channel("b@g.us", Platform::Twitch, "foo").await.unwrap());
    assert_eq!(observer.unsubscribed.lock().unwrap().len(), 1);
    assert!(registry.subscribed().await.is_empty());
}

#[tokio::test]
async fn cleanup_persists_to_file_store() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileGroupStore::in_data_dir(dir.path()));
    store
        .save_group(&group("a@g.us", &[(Platform::Youtube, "deleted"), (Platform::Youtube, "kept")]))
        .await
        .unwrap();
    let observer = Arc::new(RecordingObserver::with_missing(&["deleted"]));

    registry(store.clone(), observer).load_all(true).await.unwrap();

    let reopened = FileGroupStore::in_data_dir(dir.path());
    let group = reopened.get_group("a@g.us").await.unwrap().unwrap();
    assert_eq!(group.youtube.len(), 1);
    assert_eq!(group.youtube[0].channel, "kept");
}
