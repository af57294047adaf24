//! Deferred deletion of the bot's own replies.
//!
//! Producers hand sent messages to a [`DeleteQueueHandle`]; a single worker
//! task owns the [`DeleteQueue`], stamps each entry on receipt and deletes
//! entries once they are older than the configured TTL.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ConfigContext;
use crate::transport::{SentMessage, Transport};

/// A message waiting to be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteMessageEntry {
    pub chat_id: i64,
    pub message_id: i32,
    pub enqueued_at: DateTime<Utc>,
}

/// FIFO of pending deletions, ordered by `enqueued_at`.
#[derive(Debug, Default)]
pub struct DeleteQueue {
    entries: VecDeque<DeleteMessageEntry>,
}

impl DeleteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: DeleteMessageEntry) {
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pop every entry older than `ttl`, oldest first.
    ///
    /// Stops at the first entry that is not due yet; nothing behind it can
    /// be due either.
    pub fn pop_due(&mut self, now: DateTime<Utc>, ttl: Duration) -> Vec<DeleteMessageEntry> {
        let mut due = Vec::new();
        while let Some(head) = self.entries.front() {
            if now - head.enqueued_at <= ttl {
                break;
            }
            due.extend(self.entries.pop_front());
        }
        due
    }
}

/// Delete everything due at `now`. Failed deletions are dropped.
pub async fn sweep(
    queue: &mut DeleteQueue,
    transport: &dyn Transport,
    now: DateTime<Utc>,
    ttl: Duration,
) -> usize {
    let due = queue.pop_due(now, ttl);
    for entry in &due {
        if let Err(e) = transport.delete(entry.chat_id, entry.message_id).await {
            debug!(
                "Failed to delete message {} in chat {}: {}",
                entry.message_id, entry.chat_id, e
            );
        }
    }
    due.len()
}

#[derive(Debug)]
struct Pending {
    chat_id: i64,
    message_id: i32,
}

/// Producer side of the deletion queue.
#[derive(Debug, Clone)]
pub struct DeleteQueueHandle {
    tx: mpsc::UnboundedSender<Pending>,
    bot_id: u64,
}

impl DeleteQueueHandle {
    /// Schedule `sent` for deletion if the bot itself authored it.
    pub fn mark_on_delete(&self, sent: &SentMessage) -> bool {
        if sent.from_user_id != Some(self.bot_id) {
            return false;
        }
        self.tx
            .send(Pending {
                chat_id: sent.chat_id,
                message_id: sent.message_id,
            })
            .is_ok()
    }
}

/// Worker owning the queue.
pub struct DeleteScheduler {
    rx: mpsc::UnboundedReceiver<Pending>,
    queue: DeleteQueue,
}

impl DeleteScheduler {
    pub fn new(bot_id: u64) -> (DeleteQueueHandle, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = DeleteQueueHandle { tx, bot_id };
        let scheduler = Self {
            rx,
            queue: DeleteQueue::new(),
        };
        (handle, scheduler)
    }

    /// Run until `shutdown` fires. The sweep interval is taken from the
    /// settings at spawn time; the TTL is re-read on every sweep.
    pub fn spawn(
        mut self,
        transport: Arc<dyn Transport>,
        config: Arc<ConfigContext>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let every = config
            .current()
            .settings
            .delete_bot_message_timeout_seconds
            .max(1);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(StdDuration::from_secs(every));
            info!("Deletion sweep running every {}s", every);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    Some(pending) = self.rx.recv() => self.accept(pending, Utc::now()),
                    _ = ticker.tick() => {
                        let ttl = Duration::seconds(config.current().settings.message_ttl_seconds);
                        let deleted = sweep(&mut self.queue, transport.as_ref(), Utc::now(), ttl).await;
                        if deleted > 0 {
                            debug!("Deleted {} bot messages, {} pending", deleted, self.queue.len());
                        }
                    }
                }
            }

            if !self.queue.is_empty() {
                debug!("Deletion sweep stopped with {} pending", self.queue.len());
            }
        })
    }

    /// Move everything already sent into the queue and report its length.
    #[cfg(test)]
    pub fn drain_pending(&mut self) -> usize {
        while let Ok(pending) = self.rx.try_recv() {
            self.accept(pending, Utc::now());
        }
        self.queue.len()
    }

    fn accept(&mut self, pending: Pending, now: DateTime<Utc>) {
        self.queue.push(DeleteMessageEntry {
            chat_id: pending.chat_id,
            message_id: pending.message_id,
            enqueued_at: now,
        });
    }
}
