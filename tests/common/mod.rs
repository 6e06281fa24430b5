#![allow(dead_code)]

use std::sync::{Arc, Once};
use swapmeet_server::config::{
    AuthConfig, Config, LogFormat, MatchingConfig, PolicyConfig, PubsubConfig, ServerConfig,
    TelemetryConfig,
};
use swapmeet_server::domain::Item;
use swapmeet_server::realtime::{InMemoryTransport, RealtimeTransport};
use swapmeet_server::services::{
    ContentPolicy, ConversationService, RealtimeDispatcher, StaticDenylist, SwipeService,
};
use swapmeet_server::storage::{NewItem, Stores};
use uuid::Uuid;

pub const VALUE_TOLERANCE: f64 = 0.10;

pub const JWT_SECRET: &str = "test-secret";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        server: ServerConfig { host: "127.0.0.1".to_string(), port: 0 },
        auth: AuthConfig { jwt_secret: JWT_SECRET.to_string() },
        pubsub: PubsubConfig { redis_url: "redis://unused".to_string(), channel_capacity: 64 },
        matching: MatchingConfig { value_tolerance: VALUE_TOLERANCE },
        policy: PolicyConfig { banned_terms: default_terms() },
        telemetry: TelemetryConfig { log_format: LogFormat::Text },
    }
}

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("swapmeet_server=debug".parse().unwrap())
            .add_directive("sqlx=warn".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

pub fn default_terms() -> Vec<String> {
    ["whatsapp", "telegram", "bank", "transfer", "venmo", "zelle", "pay"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Core wired against the in-memory store and transport.
pub struct TestEnv {
    pub stores: Stores,
    pub transport: Arc<InMemoryTransport>,
    pub dispatcher: RealtimeDispatcher,
    pub swipe_service: SwipeService,
    pub conversation_service: ConversationService,
}

pub fn test_env() -> TestEnv {
    setup_tracing();

    let stores = Stores::in_memory();
    let transport = InMemoryTransport::new(64);
    let dispatcher = RealtimeDispatcher::new(Arc::clone(&transport) as Arc<dyn RealtimeTransport>);
    let policy: Arc<dyn ContentPolicy> = Arc::new(StaticDenylist::new(&default_terms()));

    let swipe_service = SwipeService::new(
        Arc::clone(&stores.items),
        Arc::clone(&stores.swipes),
        Arc::clone(&stores.matches),
        VALUE_TOLERANCE,
    );
    let conversation_service = ConversationService::new(
        Arc::clone(&stores.matches),
        Arc::clone(&stores.messages),
        policy,
        dispatcher.clone(),
    );

    TestEnv { stores, transport, dispatcher, swipe_service, conversation_service }
}

pub struct TestUser {
    pub id: Uuid,
    pub name: String,
}

pub fn user(name: &str) -> TestUser {
    TestUser { id: Uuid::new_v4(), name: name.to_string() }
}

pub async fn seed_item(env: &TestEnv, owner: &TestUser, title: &str, value: f64) -> Item {
    env.stores
        .items
        .insert(NewItem {
            owner_id: owner.id,
            owner_name: owner.name.clone(),
            title: title.to_string(),
            value,
        })
        .await
        .expect("seed item")
}
