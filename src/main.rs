//! Warnguard - Telegram group moderation bot
//!
//! Warns, bans and un-bans members of registered groups, enforces a
//! one-free-message anti-flood rule and answers configurable triggers.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration and reloadable settings
//! - `database` - MongoDB persistence
//! - `cache` - Moka-backed caches
//! - `transport` - Telegram API calls (with Throttle for API rate limiting)
//! - `moderation` - Event contexts, the stage pipeline and warning state
//! - `bot` - Dispatcher and polling runtime
//! - `utils` - Utility functions

mod bot;
mod cache;
mod config;
mod database;
mod moderation;
mod transport;
mod utils;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bot::AppState;
use config::{Config, ConfigContext};
use database::{Database, MongoStore, UserRecord};
use moderation::Services;
use moderation::cleanup::DeleteScheduler;
use moderation::context::{ContextResolver, RecentPosters};
use moderation::maintenance::Maintenance;
use moderation::stages::build_pipeline;
use transport::{TelegramTransport, Transport};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warnguard=info,teloxide=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Warnguard...");

    let config = Config::from_env()?;
    let moderation_config = Arc::new(ConfigContext::load(&config)?);
    info!(
        "Configuration loaded, {} registered chats",
        moderation_config.current().settings.registered_chats.len()
    );

    info!("Connecting to MongoDB...");
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    let store = Arc::new(MongoStore::new(&db));

    let shutdown = CancellationToken::new();

    // Throttle respects Telegram's rate limits:
    // - 30 messages per second globally
    // - 1 message per second to the same chat
    // - 20 messages per minute to the same group
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());
    let transport: Arc<dyn Transport> =
        Arc::new(TelegramTransport::new(bot.clone(), shutdown.clone()));

    let me = transport.get_self().await?;
    info!(
        "Bot username: @{}",
        me.username.as_deref().unwrap_or(&me.first_name)
    );

    let (deletions, scheduler) = DeleteScheduler::new(me.id);
    let services = Services::new(Arc::clone(&moderation_config), Arc::clone(&transport), deletions);

    let posters = RecentPosters::new();
    let maintenance = Maintenance::new(services.clone(), posters.clone(), store);
    maintenance.load().await?;
    services.users.observe(&UserRecord {
        user_id: me.id,
        first_name: me.first_name.clone(),
        last_name: None,
        username: me.username.clone(),
        is_bot: true,
        write_allowed: false,
    });

    let sweeper = scheduler.spawn(
        Arc::clone(&transport),
        Arc::clone(&moderation_config),
        shutdown.clone(),
    );
    let maintainer = maintenance.spawn(shutdown.clone());

    let pipeline = build_pipeline(&services);
    info!("Pipeline: {}", pipeline.stage_names().join(" -> "));

    let state = AppState {
        resolver: Arc::new(ContextResolver::new(
            Arc::clone(&moderation_config),
            Arc::clone(&services.chats),
            posters,
        )),
        pipeline: Arc::new(pipeline),
        bot: me,
        shutdown: shutdown.clone(),
    };

    let dispatcher = bot::build_dispatcher(bot.clone(), state);
    bot::run(bot, dispatcher, shutdown).await;

    for (name, task) in [("deletion sweep", sweeper), ("maintenance", maintainer)] {
        if let Err(e) = task.await {
            error!("{} task failed: {}", name, e);
        }
    }

    info!("Warnguard stopped");
    Ok(())
}
