//! Bot module - wiring between Telegram and the moderation core.

mod dispatcher;
mod runtime;

pub use dispatcher::{AppState, build_dispatcher};
pub use runtime::run;
