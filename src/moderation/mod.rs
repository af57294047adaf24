//! Moderation core.
//!
//! Incoming updates become [`context::EventContext`]s, which run through the
//! stage [`pipeline::Pipeline`]. Stages share the process-wide state held in
//! [`Services`].

pub mod cleanup;
pub mod context;
pub mod gate;
pub mod maintenance;
pub mod mention;
pub mod pipeline;
pub mod records;
pub mod responder;
pub mod service;
pub mod stages;
pub mod template;
pub mod warnings;

use std::sync::Arc;

use tracing::debug;

use crate::config::ConfigContext;
use crate::transport::{Transport, TransportError};
use cleanup::DeleteQueueHandle;
use records::{ChatRegistry, UserRegistry};
use responder::Responder;
use service::WarnService;
use warnings::WarningLedger;

/// Shared state and collaborators of all stages.
#[derive(Clone)]
pub struct Services {
    pub config: Arc<ConfigContext>,
    pub users: Arc<UserRegistry>,
    pub chats: Arc<ChatRegistry>,
    pub ledger: Arc<WarningLedger>,
    pub transport: Arc<dyn Transport>,
    pub responder: Responder,
    pub warns: Arc<WarnService>,
}

impl Services {
    pub fn new(
        config: Arc<ConfigContext>,
        transport: Arc<dyn Transport>,
        deletions: DeleteQueueHandle,
    ) -> Self {
        let users = Arc::new(UserRegistry::new());
        let chats = Arc::new(ChatRegistry::new());
        let ledger = Arc::new(WarningLedger::new());
        let responder = Responder::new(
            Arc::clone(&transport),
            Arc::clone(&config),
            Arc::clone(&ledger),
            deletions,
        );
        let warns = Arc::new(WarnService::new(
            Arc::clone(&config),
            Arc::clone(&users),
            Arc::clone(&chats),
            Arc::clone(&ledger),
            Arc::clone(&transport),
            responder.clone(),
        ));

        Self {
            config,
            users,
            chats,
            ledger,
            transport,
            responder,
            warns,
        }
    }

    /// Re-read the admin set of a chat from the platform.
    pub async fn refresh_admins(&self, chat_id: i64) -> Result<(), TransportError> {
        let admins = self.transport.list_admins(chat_id).await?;
        debug!("Chat {} has {} admins", chat_id, admins.len());
        self.chats.set_admins(chat_id, admins);
        Ok(())
    }
}

/// Fully wired services over a recording transport.
#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::config::{Settings, Snapshot};
    use crate::moderation::cleanup::DeleteScheduler;
    use crate::moderation::context::testing::CHAT;
    use crate::transport::fake::{BOT_ID, FakeTransport};

    pub const ADMIN: u64 = 50;

    pub struct Harness {
        pub transport: Arc<FakeTransport>,
        pub services: Services,
        /// Keeps the deletion channel open.
        pub scheduler: DeleteScheduler,
    }

    pub fn harness(settings: Settings) -> Harness {
        harness_with(Snapshot {
            settings,
            ..Snapshot::default()
        })
    }

    /// `CHAT` is registered; the bot and `ADMIN` are its admins.
    pub fn harness_with(mut snapshot: Snapshot) -> Harness {
        snapshot.settings.registered_chats.push(CHAT);
        let config = Arc::new(ConfigContext::from_snapshot(snapshot));
        let transport = Arc::new(FakeTransport::new());
        transport.admins.lock().insert(CHAT, vec![BOT_ID, ADMIN]);

        let (handle, scheduler) = DeleteScheduler::new(BOT_ID);
        let services = Services::new(config, transport.clone(), handle);
        services.chats.observe(CHAT, "Test group");
        services.chats.set_admins(CHAT, vec![BOT_ID, ADMIN]);

        Harness {
            transport,
            services,
            scheduler,
        }
    }
}
