//! Periodic maintenance.
//!
//! Every `update_delay_minutes` the bot reloads its configuration, opens a
//! new poster window, lifts expired restrictions, refreshes admin sets and
//! persists its state.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::Services;
use super::context::RecentPosters;
use crate::database::Store;

pub struct Maintenance {
    services: Services,
    posters: RecentPosters,
    store: Arc<dyn Store>,
}

impl Maintenance {
    pub fn new(services: Services, posters: RecentPosters, store: Arc<dyn Store>) -> Self {
        Self {
            services,
            posters,
            store,
        }
    }

    /// Fill the registries from the store.
    pub async fn load(&self) -> Result<()> {
        let chats = self.store.load_chats().await?;
        let users = self.store.load_users().await?;
        let warnings = self.store.load_warnings().await?;
        info!(
            "Loaded {} chats, {} users, warnings of {} chats",
            chats.len(),
            users.len(),
            warnings.len()
        );

        self.services.chats.load(chats);
        self.services.users.load(users);
        self.services.ledger.load(warnings);
        debug!("{} users indexed", self.services.users.len());
        Ok(())
    }

    /// Write the registries to the store.
    pub async fn persist(&self) -> Result<()> {
        self.store.save_chats(&self.services.chats.all()).await?;
        self.store.save_users(&self.services.users.all()).await?;
        self.store.save_warnings(&self.services.ledger.export()).await?;
        debug!("State persisted");
        Ok(())
    }

    pub async fn tick(&self) -> Result<()> {
        self.tick_at(Utc::now()).await
    }

    pub async fn tick_at(&self, now: DateTime<Utc>) -> Result<()> {
        if let Err(e) = self.services.config.reload() {
            warn!("Configuration reload failed, keeping previous: {}", e);
        }

        self.posters.clear();

        let released = self.services.warns.release_expired(now).await;
        if released > 0 {
            info!("Released {} users from warning restrictions", released);
        }

        for chat_id in self.services.chats.ids() {
            if let Err(e) = self.services.refresh_admins(chat_id).await {
                warn!("Failed to refresh admins of chat {}: {}", chat_id, e);
            }
        }

        self.persist().await
    }

    /// Run ticks until `shutdown`, then persist once more.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        let minutes = self.services.config.current().settings.update_delay_minutes.max(1);
        let period = StdDuration::from_secs(minutes * 60);

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            info!("Maintenance running every {} minutes", minutes);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.tick().await {
                            error!("Maintenance tick failed: {:#}", e);
                        }
                    }
                }
            }

            match self.persist().await {
                Ok(()) => info!("Final state saved"),
                Err(e) => error!("Failed to save state on shutdown: {:#}", e),
            }
        })
    }
}
