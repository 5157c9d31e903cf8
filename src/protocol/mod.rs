mod classify;
mod document;

pub(crate) use classify::render_text;
pub use classify::{Decision, Outcome, RetryNotice, Update, classify};
pub use document::{Flag, ProgressInfo, UpdateDocument};
