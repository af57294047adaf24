//! Database model exports.

pub mod chat;
pub mod user;
pub mod warning;

pub use chat::ChatRecord;
pub use user::UserRecord;
pub use warning::{ChatWarningsDoc, WarnedUser};
