//! Reachability inference from delivery receipts and the suppression flag.
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::{collections::HashSet, sync::Arc};

use {
    common::{Receipts, RecordingTransport, router, router_with, test_config},
    streamwatch_common::Platform,
    streamwatch_notify::{
        ChannelConfig, GroupRecord, GroupStore, MediaSpec, NotificationConfig, StreamEvent,
        store_memory::InMemoryGroupStore,
    },
};

const GROUP: &str = "fans@g.us";

fn watching_group() -> GroupRecord {
    let mut group = GroupRecord::new(GROUP, "Foo Fans");
    group.twitch.push(ChannelConfig {
        channel: "foo".into(),
        on_config: NotificationConfig {
            media: vec![MediaSpec::text("{nomeCanal} live"), MediaSpec::text("come")],
        },
        ..Default::default()
    });
    group
}

fn online() -> StreamEvent {
    StreamEvent::online(Platform::Twitch, "foo")
}

#[tokio::test]
async fn all_empty_receipts_suppress_future_sends() {
    let transport = Arc::new(RecordingTransport::default());
    transport.set_receipts(Receipts::NoneReached);
    let store = Arc::new(InMemoryGroupStore::with_groups([watching_group()]));
    let router = router(store.clone(), transport.clone());

    router.route(&online()).await.unwrap();
    assert_eq!(transport.sent_count(), 2);
    let group = store.get_group(GROUP).await.unwrap().unwrap();
    assert_eq!(group.bot_not_in_group, vec!["bot-a"]);

    let summary = router.route(&online()).await.unwrap();
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.delivered, 0);
    assert_eq!(transport.sent_count(), 2);
}

#[tokio::test]
async fn one_reached_draft_keeps_group_reachable() {
    let transport = Arc::new(RecordingTransport::default());
    transport.set_receipts(Receipts::Only(HashSet::from(["m2".to_string()])));
    let store = Arc::new(InMemoryGroupStore::with_groups([watching_group()]));

    router(store.clone(), transport.clone())
        .route(&online())
        .await
        .unwrap();

    let group = store.get_group(GROUP).await.unwrap().unwrap();
    assert!(group.bot_not_in_group.is_empty());
}

#[tokio::test]
async fn receipt_failures_do_not_suppress() {
    let transport = Arc::new(RecordingTransport::default());
    transport.set_receipts(Receipts::Fail);
    let store = Arc::new(InMemoryGroupStore::with_groups([watching_group()]));

    router(store.clone(), transport.clone())
        .route(&online())
        .await
        .unwrap();

    assert!(store.get_group(GROUP).await.unwrap().unwrap().bot_not_in_group.is_empty());
}

#[tokio::test]
async fn threshold_counts_consecutive_outcomes() {
    let transport = Arc::new(RecordingTransport::default());
    let store = Arc::new(InMemoryGroupStore::with_groups([watching_group()]));
    let mut config = test_config();
    config.delivery.unreachable_after = 2;
    let router = router_with(&config, store.clone(), transport.clone(), None);

    transport.set_receipts(Receipts::NoneReached);
    router.route(&online()).await.unwrap();
    transport.set_receipts(Receipts::AllReached);
    router.route(&online()).await.unwrap();
    transport.set_receipts(Receipts::NoneReached);
    router.route(&online()).await.unwrap();
    assert!(store.get_group(GROUP).await.unwrap().unwrap().bot_not_in_group.is_empty());

    router.route(&online()).await.unwrap();
    assert_eq!(
        store.get_group(GROUP).await.unwrap().unwrap().bot_not_in_group,
        vec!["bot-a"]
    );
}

#[tokio::test]
async fn another_bots_flag_is_ignored() {
    let transport = Arc::new(RecordingTransport::default());
    let mut group = watching_group();
    group.bot_not_in_group.push("bot-b".into());
    let store = Arc::new(InMemoryGroupStore::with_groups([group]));

    router(store, transport.clone()).route(&online()).await.unwrap();

    assert_eq!(transport.texts_to(GROUP), vec!["foo live", "come"]);
}

#[tokio::test]
async fn suppressed_group_gets_no_title_change() {
    let transport = Arc::new(RecordingTransport::default().with_group_chat(GROUP, "Foo OFF", &[]));
    let mut group = watching_group();
    group.twitch[0].change_title_on_event = true;
    group.bot_not_in_group.push("bot-a".into());
    let store = Arc::new(InMemoryGroupStore::with_groups([group]));

    router(store, transport.clone()).route(&online()).await.unwrap();

    assert_eq!(transport.sent_count(), 0);
    assert!(transport.subjects().is_empty());
}

#[tokio::test]
async fn clearing_suppression_resumes_delivery() {
    let transport = Arc::new(RecordingTransport::default());
    transport.set_receipts(Receipts::NoneReached);
    let store = Arc::new(InMemoryGroupStore::with_groups([watching_group()]));
    let router = router(store.clone(), transport.clone());

    router.route(&online()).await.unwrap();
    assert!(router.delivery().clear_suppression(GROUP).await.unwrap());
    transport.set_receipts(Receipts::AllReached);
    router.route(&online()).await.unwrap();

    assert_eq!(transport.sent_count(), 4);
    assert!(store.get_group(GROUP).await.unwrap().unwrap().bot_not_in_group.is_empty());
}

#[tokio::test]
async fn mirror_copies_follow_the_main_send() {
    let transport = Arc::new(RecordingTransport::default());
    let store = Arc::new(InMemoryGroupStore::with_groups([watching_group()]));
    let mut config = test_config();
    config.delivery.mirror_chat_id = Some("log@g.us".into());

    router_with(&config, store, transport.clone(), None)
        .route(&online())
        .await
        .unwrap();

    assert_eq!(transport.destinations(), vec![GROUP, GROUP, "log@g.us", "log@g.us"]);
    assert_eq!(transport.texts_to("log@g.us"), vec![
        "[Foo Fans] foo live",
        "[Foo Fans] come"
    ]);
    assert!(transport.messages_to("log@g.us").iter().all(|m| m.mentions.is_empty()));
}

#[tokio::test]
async fn suppressed_group_is_not_mirrored() {
    let transport = Arc::new(RecordingTransport::default());
    let mut group = watching_group();
    group.bot_not_in_group.push("bot-a".into());
    let store = Arc::new(InMemoryGroupStore::with_groups([group]));
    let mut config = test_config();
    config.delivery.mirror_chat_id = Some("log@g.us".into());

    router_with(&config, store, transport.clone(), None)
        .route(&online())
        .await
        .unwrap();

    assert_eq!(transport.sent_count(), 0);
}
