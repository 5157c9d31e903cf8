mod controller;
mod state;

pub use controller::{Session, SessionEnd};
pub use state::{SessionEvent, SessionState};
