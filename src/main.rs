#![recursion_limit = "256"]
//! # Main Entry Point
//!
//! Initializes the application:
//! - Domain: Configuration and Types
//! - Infrastructure: Matrix transport
//! - Application: Normalizer, Router, Sessions, Rate Limiter, Dispatcher, Outbound Queue
//! - Interface: Command Handlers
//!

mod application;
mod domain;
mod infrastructure;
mod interface;
mod strings;

use anyhow::{Context, Result};
use matrix_sdk::{
    Client,
    config::SyncSettings,
    room::Room,
    ruma::events::room::{
        member::{MembershipState, StrippedRoomMemberEvent, SyncRoomMemberEvent},
        message::{MessageType, SyncRoomMessageEvent},
    },
};
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing;

use crate::application::dispatcher::Dispatcher;
use crate::application::outbound::OutboundQueue;
use crate::application::rate_limit::RateLimiter;
use crate::application::router::Router;
use crate::application::session::SessionStore;
use crate::domain::config::AppConfig;
use crate::domain::traits::Transport;
use crate::domain::types::InboundMessage;
use crate::infrastructure::matrix::MatrixTransport;
use crate::interface::commands;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load Configuration
    let config_content =
        fs::read_to_string("data/config.yaml").context("Failed to read config.yaml")?;
    let config: AppConfig =
        serde_yaml::from_str(&config_content).context("Failed to parse config.yaml")?;

    // 2. Logging Setup
    // Ensure data directory exists
    if !std::path::Path::new("data").exists() {
        fs::create_dir("data").context("Failed to create data directory")?;
    }

    // Clear previous session log
    let log_path = std::path::Path::new("data/session.log");
    if log_path.exists() {
        let _ = fs::remove_file(log_path);
    }

    let file_appender = tracing_appender::rolling::never("data", "session.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,matrix_sdk=warn,matrix_sdk_base=warn,matrix_sdk_crypto=error,ruma=warn,hyper=warn")
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::info!("Starting Switchboard...");

    // 3. Initialize Core Components
    let started_at = Instant::now();
    let core = config.core.clone();

    let sessions = Arc::new(SessionStore::new(Duration::from_secs(core.session_ttl_secs)));
    let limiter = RateLimiter::new(
        core.rate_bucket_capacity,
        core.rate_refill_per_second,
        Duration::from_secs(core.rate_notice_cooldown_secs),
        Duration::from_secs(core.bucket_idle_horizon_secs),
    );
    let outbound = Arc::new(OutboundQueue::new());

    // 4. Register Handlers
    // Registration is an initialization-phase activity: no dispatch is in
    // flight until the sync loop starts below.
    let mut router = Router::new();
    router.register("/help", Arc::new(commands::help::HelpHandler));
    router.register(
        "/status",
        Arc::new(commands::status::StatusHandler::new(started_at)),
    );
    router.register("/note", Arc::new(commands::note::NoteHandler));
    router.register("/done", Arc::new(commands::done::DoneHandler));
    router.register_text(Arc::new(commands::greet::GreetHandler));

    let dispatcher = Arc::new(Dispatcher::new(
        router,
        sessions,
        limiter,
        outbound.clone(),
        Duration::from_millis(core.handler_timeout_ms),
    ));

    // 5. Matrix Setup
    let client = Client::builder()
        .homeserver_url(&config.services.matrix.homeserver)
        .build()
        .await?;

    client
        .matrix_auth()
        .login_username(
            &config.services.matrix.username,
            &config.services.matrix.password,
        )
        .send()
        .await?;

    tracing::info!("Logged in as {}", config.services.matrix.username);

    // 6. Event Handlers
    let start_time = std::time::SystemTime::now();

    let loop_dispatcher = dispatcher.clone();
    client.add_event_handler(move |ev: SyncRoomMessageEvent, room: Room| {
        let dispatcher = loop_dispatcher.clone();

        async move {
            if let Some(original_msg) = ev.as_original() {
                // Ignore events older than start_time
                let ts = ev.origin_server_ts();
                let event_time =
                    std::time::UNIX_EPOCH + std::time::Duration::from_millis(ts.get().into());
                if event_time < start_time {
                    return;
                }

                if let MessageType::Text(text_content) = &original_msg.content.msgtype {
                    if original_msg.sender == room.own_user_id() {
                        return;
                    }
                    tracing::info!(
                        "Received message from {}: \n{}",
                        original_msg.sender,
                        text_content.body
                    );

                    let message = InboundMessage {
                        conversation_id: room.room_id().to_string(),
                        sender_id: original_msg.sender.to_string(),
                        body: text_content.body.clone(),
                        received_at: Instant::now(),
                        system: false,
                    };

                    // Dispatch concurrently; the dispatcher serializes per
                    // conversation on its own.
                    tokio::spawn(async move {
                        let outcome = dispatcher.dispatch(message).await;
                        tracing::debug!("dispatch finished: {:?}", outcome);
                    });
                }
            }
        }
    });

    // Handle Invites
    client.add_event_handler(|ev: StrippedRoomMemberEvent, room: Room| async move {
        if ev.content.membership == MembershipState::Invite {
            let _ = room.join().await;
        }
    });

    // Conversation closed (we left or were removed): mark the session for
    // eviction. In-flight dispatches are allowed to finish.
    let leave_dispatcher = dispatcher.clone();
    client.add_event_handler(move |ev: SyncRoomMemberEvent, room: Room| {
        let dispatcher = leave_dispatcher.clone();
        async move {
            if let Some(original) = ev.as_original() {
                if original.content.membership == MembershipState::Leave
                    && original.state_key.as_str() == room.own_user_id().as_str()
                {
                    dispatcher.close_conversation(room.room_id().as_str()).await;
                }
            }
        }
    });

    // 7. Background Loops
    // Eviction/GC sweep, never inline with a dispatch
    let sweep_dispatcher = dispatcher.clone();
    let sweep_interval = Duration::from_secs(core.sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            sweep_dispatcher.sweep(Instant::now()).await;
        }
    });

    // Delivery loop. The core never retries a delivery; the policy here is
    // to log the failure and move on.
    let transport = MatrixTransport::new(client.clone());
    let delivery_outbound = outbound.clone();
    tokio::spawn(async move {
        loop {
            let batches = delivery_outbound.drain_ready().await;
            if batches.is_empty() {
                delivery_outbound.notified().await;
                continue;
            }
            for (conversation_id, actions) in batches {
                for action in actions {
                    if let Err(e) = transport.deliver(&action).await {
                        tracing::error!("Failed to deliver to {}: {}", conversation_id, e);
                    }
                }
            }
        }
    });

    // 8. Sync Loop
    client.sync(SyncSettings::default()).await?;

    Ok(())
}
