mod common;

use common::{seed_item, test_env, user, TestEnv, TestUser};
use std::collections::HashMap;
use swapmeet_server::chat::{ChatSession, Effect, SessionState};
use swapmeet_server::domain::{MatchRecord, Message};
use swapmeet_server::realtime::ChannelMessage;
use swapmeet_server::services::PostOutcome;
use tokio::sync::broadcast;
use uuid::Uuid;

async fn make_match(env: &TestEnv, a: &TestUser, b: &TestUser) -> MatchRecord {
    let item_a = seed_item(env, a, "camera", 100.0).await;
    let item_b = seed_item(env, b, "guitar", 100.0).await;
    let (record, _) = env.stores.matches.create_or_get(item_a.id, item_b.id).await.expect("match");
    record
}

/// Minimal stand-in for the client event loop: executes session effects
/// against the conversation service and keeps the live receivers.
struct Harness<'a> {
    env: &'a TestEnv,
    user: &'a TestUser,
    session: ChatSession,
    receivers: HashMap<Uuid, broadcast::Receiver<ChannelMessage>>,
}

impl<'a> Harness<'a> {
    fn new(env: &'a TestEnv, user: &'a TestUser) -> Self {
        Self {
            env,
            user,
            session: ChatSession::new(user.id, user.name.clone()),
            receivers: HashMap::new(),
        }
    }

    /// Runs the subscribe and unsubscribe effects immediately; a pending
    /// `FetchHistory` is returned so tests can resolve it at any point.
    async fn apply(&mut self, effects: Vec<Effect>) -> Option<Uuid> {
        let mut fetch = None;
        for effect in effects {
            match effect {
                Effect::Subscribe(match_id) => {
                    let rx = self
                        .env
                        .conversation_service
                        .subscribe(match_id, self.user.id)
                        .await
                        .expect("subscribe");
                    self.receivers.insert(match_id, rx);
                }
                Effect::Unsubscribe(match_id) => {
                    self.receivers.remove(&match_id);
                }
                Effect::FetchHistory(match_id) => fetch = Some(match_id),
            }
        }
        fetch
    }

    async fn resolve_history(&mut self, match_id: Uuid) {
        let history = self
            .env
            .conversation_service
            .history(match_id, self.user.id)
            .await
            .expect("history");
        self.session.history_loaded(match_id, history);
    }

    /// Receives one frame from the subscribed channel and feeds it in.
    async fn pump_push(&mut self, match_id: Uuid) {
        let rx = self.receivers.get_mut(&match_id).expect("subscribed");
        let frame = rx.recv().await.expect("push");
        let message: Message = serde_json::from_slice(&frame.payload).expect("decode");
        self.session.push_received(message);
    }
}

#[tokio::test]
async fn open_conversation_loads_history_and_goes_live() {
    let env = test_env();
    let alice = user("alice");
    let bob = user("bob");
    let record = make_match(&env, &alice, &bob).await;

    env.conversation_service
        .post_message(record.id, bob.id, &bob.name, "hey!")
        .await
        .expect("post");

    let mut harness = Harness::new(&env, &alice);
    let effects = harness.session.select_match(record.id);
    let fetch = harness.apply(effects).await.expect("history fetch effect");
    harness.resolve_history(fetch).await;

    assert_eq!(harness.session.state(), SessionState::Live(record.id));
    let entries = harness.session.timeline().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].content, "hey!");
    assert_eq!(entries[0].sender_name, bob.name);
}

#[tokio::test]
async fn push_arriving_before_history_is_not_lost_or_duplicated() {
    let env = test_env();
    let alice = user("alice");
    let bob = user("bob");
    let record = make_match(&env, &alice, &bob).await;

    let mut harness = Harness::new(&env, &alice);
    let effects = harness.session.select_match(record.id);
    let fetch = harness.apply(effects).await.expect("history fetch effect");

    // Bob sends while Alice's history fetch is still in flight. The push
    // lands first; the later history response also contains the message.
    env.conversation_service
        .post_message(record.id, bob.id, &bob.name, "beat the fetch")
        .await
        .expect("post");
    harness.pump_push(record.id).await;
    assert_eq!(harness.session.timeline().len(), 1);

    harness.resolve_history(fetch).await;

    assert_eq!(harness.session.state(), SessionState::Live(record.id));
    let entries = harness.session.timeline().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].content, "beat the fetch");
}

#[tokio::test]
async fn optimistic_send_shows_once_after_echo() {
    let env = test_env();
    let alice = user("alice");
    let bob = user("bob");
    let record = make_match(&env, &alice, &bob).await;

    let mut harness = Harness::new(&env, &alice);
    let effects = harness.session.select_match(record.id);
    let fetch = harness.apply(effects).await.expect("history fetch effect");
    harness.resolve_history(fetch).await;

    let pending = harness.session.begin_send("hello").expect("live session");
    assert!(pending.is_pending());
    assert_eq!(harness.session.timeline().len(), 1);

    let out = env
        .conversation_service
        .post_message(record.id, alice.id, &alice.name, "hello")
        .await
        .expect("post");
    assert!(matches!(out, PostOutcome::Sent(_)));

    // The echo comes back over Alice's own subscription.
    harness.pump_push(record.id).await;

    let entries = harness.session.timeline().entries();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].id.is_pending());
    assert_eq!(entries[0].content, "hello");
    assert_eq!(entries[0].sender_id, alice.id);
}

#[tokio::test]
async fn rejected_send_rolls_back_the_optimistic_entry() {
    let env = test_env();
    let alice = user("alice");
    let bob = user("bob");
    let record = make_match(&env, &alice, &bob).await;

    let mut harness = Harness::new(&env, &alice);
    let effects = harness.session.select_match(record.id);
    let fetch = harness.apply(effects).await.expect("history fetch effect");
    harness.resolve_history(fetch).await;

    let pending = harness.session.begin_send("just venmo me").expect("live session");
    let out = env
        .conversation_service
        .post_message(record.id, alice.id, &alice.name, "just venmo me")
        .await
        .expect("post");
    assert!(matches!(out, PostOutcome::Rejected { .. }));
    harness.session.send_failed(pending);

    assert!(harness.session.timeline().is_empty());
    assert!(env.conversation_service.history(record.id, alice.id).await.expect("history").is_empty());
}

#[tokio::test]
async fn switching_matches_drops_pushes_from_the_old_channel() {
    let env = test_env();
    let alice = user("alice");
    let bob = user("bob");
    let carol = user("carol");
    let with_bob = make_match(&env, &alice, &bob).await;

    let item_a2 = seed_item(&env, &alice, "tripod", 40.0).await;
    let item_c = seed_item(&env, &carol, "flash", 40.0).await;
    let (with_carol, _) = env.stores.matches.create_or_get(item_a2.id, item_c.id).await.expect("match");

    let mut harness = Harness::new(&env, &alice);
    let effects = harness.session.select_match(with_bob.id);
    harness.apply(effects).await;

    // Grab the old receiver before the switch drops it, simulating a frame
    // already in flight when the unsubscribe happens.
    let mut old_rx = env.conversation_service.subscribe(with_bob.id, alice.id).await.expect("subscribe");

    let effects = harness.session.select_match(with_carol.id);
    let fetch = harness.apply(effects).await.expect("history fetch effect");
    harness.resolve_history(fetch).await;

    env.conversation_service
        .post_message(with_bob.id, bob.id, &bob.name, "too late")
        .await
        .expect("post");

    let frame = old_rx.recv().await.expect("in-flight frame");
    let stale: Message = serde_json::from_slice(&frame.payload).expect("decode");
    harness.session.push_received(stale);

    assert_eq!(harness.session.state(), SessionState::Live(with_carol.id));
    assert!(harness.session.timeline().is_empty());
}

#[tokio::test]
async fn closing_the_session_returns_to_idle() {
    let env = test_env();
    let alice = user("alice");
    let bob = user("bob");
    let record = make_match(&env, &alice, &bob).await;

    let mut harness = Harness::new(&env, &alice);
    let effects = harness.session.select_match(record.id);
    let fetch = harness.apply(effects).await.expect("history fetch effect");
    harness.resolve_history(fetch).await;

    let effects = harness.session.close();
    assert_eq!(effects, [Effect::Unsubscribe(record.id)]);
    harness.apply(effects).await;

    assert_eq!(harness.session.state(), SessionState::Idle);
    assert!(harness.session.timeline().is_empty());
    assert!(harness.receivers.is_empty());
}
