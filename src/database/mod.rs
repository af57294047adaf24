//! Database module exports.
//!
//! The moderation core keeps chats, users and warning ledgers in memory;
//! a [`Store`] loads them at startup and persists them periodically.

mod models;
mod mongo;
mod store;

pub use models::*;
pub use mongo::Database;
#[cfg(test)]
pub use store::MemoryStore;
pub use store::{MongoStore, Store};
