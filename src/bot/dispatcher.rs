//! Update dispatcher setup.
//!
//! Every update becomes an [`EventContext`](crate::moderation::context::EventContext)
//! and runs through the moderation pipeline.

use std::sync::Arc;

use teloxide::dispatching::{DefaultKey, UpdateHandler};
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::moderation::context::ContextResolver;
use crate::moderation::pipeline::Pipeline;
use crate::transport::{BotIdentity, ThrottledBot};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Turns raw updates into event contexts.
    pub resolver: Arc<ContextResolver>,

    pub pipeline: Arc<Pipeline>,

    /// The bot's own account, fetched once at startup.
    pub bot: BotIdentity,

    /// Fires when the process begins shutting down.
    pub shutdown: CancellationToken,
}

/// Build the dispatcher around `state`.
pub fn build_dispatcher(
    bot: ThrottledBot,
    state: AppState,
) -> Dispatcher<ThrottledBot, anyhow::Error, DefaultKey> {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .default_handler(|_| async {})
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .build()
}

fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry().endpoint(handle_update)
}

async fn handle_update(update: Update, state: AppState) -> anyhow::Result<()> {
    let Some(ctx) = state
        .resolver
        .resolve(&update, &state.bot, state.shutdown.child_token())
    else {
        trace!("Ignoring update {}", update.id.0);
        return Ok(());
    };

    let outcome = state.pipeline.dispatch(&ctx).await;
    trace!(
        chat_id = ctx.chat_id,
        user_id = ctx.sender.user_id,
        "Update {} handled: {:?}",
        update.id.0,
        outcome
    );
    Ok(())
}
