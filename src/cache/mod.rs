//! Cache module - bounded in-memory caches using Moka.
//!
//! Used for short-lived, size-bounded state on the hot path (one lookup per
//! incoming message), where unbounded growth under load is not acceptable.

mod config;
mod typed;

pub use config::CacheConfig;
pub use typed::TypedCache;
