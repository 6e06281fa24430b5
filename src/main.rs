#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use std::net::SocketAddr;
use std::sync::Arc;
use swapmeet_server::api::{self, AppState};
use swapmeet_server::config::Config;
use swapmeet_server::realtime::{RealtimeTransport, RedisTransport};
use swapmeet_server::services::{
    ContentPolicy, ConversationService, RealtimeDispatcher, StaticDenylist, SwipeService,
};
use swapmeet_server::storage::Stores;
use swapmeet_server::{storage, telemetry};
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    telemetry::init_telemetry(&config.telemetry)?;

    let boot_span = tracing::info_span!("boot_server");
    let (listener, app, shutdown_rx) = async {
        // Phase 1: infrastructure
        let pool = storage::init_pool(&config.database_url).await?;
        swapmeet_server::run_migrations(&pool).await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        swapmeet_server::spawn_signal_handler(shutdown_tx);

        let transport: Arc<dyn RealtimeTransport> =
            RedisTransport::new(&config.pubsub, shutdown_rx.clone()).await?;

        // Phase 2: component wiring
        let stores = Stores::postgres(pool.clone());
        let dispatcher = RealtimeDispatcher::new(transport);
        let policy: Arc<dyn ContentPolicy> = Arc::new(StaticDenylist::new(&config.policy.banned_terms));

        let swipe_service = SwipeService::new(
            Arc::clone(&stores.items),
            Arc::clone(&stores.swipes),
            Arc::clone(&stores.matches),
            config.matching.value_tolerance,
        );
        let conversation_service =
            ConversationService::new(Arc::clone(&stores.matches), Arc::clone(&stores.messages), policy, dispatcher);

        // Phase 3: listener and router
        let state = AppState {
            config: config.clone(),
            swipe_service,
            conversation_service,
            db: Some(pool),
            shutdown_rx: shutdown_rx.clone(),
        };
        let app = api::app_router(state);

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        tracing::info!(address = %addr, "listening");
        let listener = tokio::net::TcpListener::bind(addr).await?;

        Ok::<_, anyhow::Error>((listener, app, shutdown_rx))
    }
    .instrument(boot_span)
    .await?;

    let mut serve_rx = shutdown_rx;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = serve_rx.wait_for(|&s| s).await;
        })
        .await?;

    Ok(())
}
