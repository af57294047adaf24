//! Bot runtime - long polling until shutdown.

use teloxide::dispatching::DefaultKey;
use teloxide::prelude::*;
use teloxide::types::AllowedUpdate;
use teloxide::update_listeners::Polling;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::transport::ThrottledBot;

/// Poll for updates until Ctrl-C.
///
/// Only message and membership updates are requested, and updates that
/// piled up while the bot was offline are dropped. On Ctrl-C `shutdown` is
/// cancelled first so in-flight requests abort, then the dispatcher stops.
pub async fn run(
    bot: ThrottledBot,
    mut dispatcher: Dispatcher<ThrottledBot, anyhow::Error, DefaultKey>,
    shutdown: CancellationToken,
) {
    let listener = Polling::builder(bot)
        .allowed_updates(vec![
            AllowedUpdate::Message,
            AllowedUpdate::ChatMember,
            AllowedUpdate::MyChatMember,
        ])
        .drop_pending_updates()
        .build();

    let dispatcher_token = dispatcher.shutdown_token();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            return;
        }

        info!("Shutdown requested");
        signal_token.cancel();
        if let Err(e) = dispatcher_token.shutdown() {
            warn!("Dispatcher was not running: {}", e);
        }
    });

    info!("Starting bot in polling mode...");
    dispatcher
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    // The dispatcher can also stop on its own.
    shutdown.cancel();
}
