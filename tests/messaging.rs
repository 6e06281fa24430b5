mod common;

use async_trait::async_trait;
use common::{default_terms, seed_item, test_env, user, TestEnv, TestUser};
use std::sync::Arc;
use swapmeet_server::domain::MatchRecord;
use swapmeet_server::error::AppError;
use swapmeet_server::realtime::{ChannelMessage, RealtimeTransport};
use swapmeet_server::services::policy::SAFETY_MESSAGE;
use swapmeet_server::services::{
    ContentPolicy, ConversationService, PostOutcome, RealtimeDispatcher, StaticDenylist,
};
use uuid::Uuid;

async fn make_match(env: &TestEnv, a: &TestUser, b: &TestUser) -> MatchRecord {
    let item_a = seed_item(env, a, "camera", 100.0).await;
    let item_b = seed_item(env, b, "guitar", 100.0).await;
    let (record, created) = env.stores.matches.create_or_get(item_a.id, item_b.id).await.expect("match");
    assert!(created);
    record
}

#[tokio::test]
async fn posted_messages_come_back_in_order() {
    let env = test_env();
    let alice = user("alice");
    let bob = user("bob");
    let record = make_match(&env, &alice, &bob).await;

    for (u, text) in [(&alice, "hi!"), (&bob, "hey, still available?"), (&alice, "it is")] {
        let out = env
            .conversation_service
            .post_message(record.id, u.id, &u.name, text)
            .await
            .expect("post");
        assert!(matches!(out, PostOutcome::Sent(_)));
    }

    let history = env.conversation_service.history(record.id, alice.id).await.expect("history");
    let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["hi!", "hey, still available?", "it is"]);
    assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));

    // Re-reading returns the same sequence.
    let again = env.conversation_service.history(record.id, bob.id).await.expect("history");
    assert_eq!(history, again);
}

#[tokio::test]
async fn banned_term_blocks_the_message_in_any_case() {
    let env = test_env();
    let alice = user("alice");
    let bob = user("bob");
    let record = make_match(&env, &alice, &bob).await;

    for text in ["just VeNmO me", "my whatsapp is 555-0100", "wire TRANSFER works too"] {
        let out = env
            .conversation_service
            .post_message(record.id, alice.id, &alice.name, text)
            .await
            .expect("post");
        assert_eq!(out, PostOutcome::Rejected { reason: SAFETY_MESSAGE.to_string() });
    }

    // Nothing was persisted.
    assert!(env.conversation_service.history(record.id, alice.id).await.expect("history").is_empty());
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let env = test_env();
    let alice = user("alice");
    let bob = user("bob");
    let record = make_match(&env, &alice, &bob).await;

    for text in ["", "   ", "\n\t"] {
        let out = env
            .conversation_service
            .post_message(record.id, alice.id, &alice.name, text)
            .await
            .expect("post");
        assert_eq!(out, PostOutcome::Rejected { reason: "Message cannot be empty".to_string() });
    }
}

#[tokio::test]
async fn outsiders_cannot_read_or_post() {
    let env = test_env();
    let alice = user("alice");
    let bob = user("bob");
    let mallory = user("mallory");
    let record = make_match(&env, &alice, &bob).await;

    let post = env
        .conversation_service
        .post_message(record.id, mallory.id, &mallory.name, "hello")
        .await
        .expect_err("outsider post");
    assert!(matches!(post, AppError::NotFound));

    let read = env.conversation_service.history(record.id, mallory.id).await.expect_err("outsider read");
    assert!(matches!(read, AppError::NotFound));

    let sub = env.conversation_service.subscribe(record.id, mallory.id).await.expect_err("outsider subscribe");
    assert!(matches!(sub, AppError::NotFound));
}

#[tokio::test]
async fn send_publishes_the_persisted_row_to_the_match_channel() {
    let env = test_env();
    let alice = user("alice");
    let bob = user("bob");
    let record = make_match(&env, &alice, &bob).await;

    let mut rx = env.conversation_service.subscribe(record.id, bob.id).await.expect("subscribe");

    let out = env
        .conversation_service
        .post_message(record.id, alice.id, &alice.name, "first")
        .await
        .expect("post");
    let PostOutcome::Sent(sent) = out else { panic!("expected a sent message") };

    let frame = rx.recv().await.expect("push");
    assert_eq!(frame.channel, format!("match:{}", record.id));
    let pushed: swapmeet_server::domain::Message = serde_json::from_slice(&frame.payload).expect("decode");
    assert_eq!(pushed, sent);

    // The push carries what the store persisted, not the raw input.
    let history = env.conversation_service.history(record.id, alice.id).await.expect("history");
    assert_eq!(history, [pushed]);
}

#[tokio::test]
async fn match_list_preview_tracks_the_latest_message() {
    let env = test_env();
    let alice = user("alice");
    let bob = user("bob");
    let record = make_match(&env, &alice, &bob).await;

    let before = env.conversation_service.list_matches(alice.id).await.expect("list");
    assert_eq!(before[0].last_message_preview, "New Match!");

    env.conversation_service
        .post_message(record.id, bob.id, &bob.name, "would you take a trade?")
        .await
        .expect("post");

    let after = env.conversation_service.list_matches(alice.id).await.expect("list");
    assert_eq!(after[0].last_message_preview, "would you take a trade?");
    assert_eq!(after[0].counterpart_id, bob.id);
    assert_eq!(after[0].counterpart_name, bob.name);
}

/// Transport whose publish always fails, standing in for a dead broker.
#[derive(Debug)]
struct BrokenTransport;

#[async_trait]
impl RealtimeTransport for BrokenTransport {
    async fn publish(&self, _channel: &str, _payload: &[u8]) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }

    async fn subscribe(&self, _channel: &str) -> anyhow::Result<tokio::sync::broadcast::Receiver<ChannelMessage>> {
        anyhow::bail!("connection refused")
    }
}

#[tokio::test]
async fn send_succeeds_when_the_transport_is_down() {
    let env = test_env();
    let alice = user("alice");
    let bob = user("bob");
    let record = make_match(&env, &alice, &bob).await;

    let policy: Arc<dyn ContentPolicy> = Arc::new(StaticDenylist::new(&default_terms()));
    let broken = ConversationService::new(
        Arc::clone(&env.stores.matches),
        Arc::clone(&env.stores.messages),
        policy,
        RealtimeDispatcher::new(Arc::new(BrokenTransport)),
    );

    let out = broken
        .post_message(record.id, alice.id, &alice.name, "are you there?")
        .await
        .expect("post must not surface the transport failure");
    assert!(matches!(out, PostOutcome::Sent(_)));

    // The message is durable and readable through history regardless.
    let history = broken.history(record.id, bob.id).await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "are you there?");

    // Subscribing through the dead transport is a hard error.
    let err = broken.subscribe(record.id, bob.id).await.expect_err("subscribe");
    assert!(matches!(err, AppError::Internal));
}

#[tokio::test]
async fn history_for_a_missing_match_is_not_found() {
    let env = test_env();
    let alice = user("alice");

    let err = env.conversation_service.history(Uuid::new_v4(), alice.id).await.expect_err("missing match");
    assert!(matches!(err, AppError::NotFound));
}
