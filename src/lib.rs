//! Live status reporting for long-running background tasks.
//!
//! A [`Session`] pulls update documents from a transport (HTTP polling or a
//! WebSocket stream), classifies each one into a [`Decision`] and hands the
//! result to a table of handlers that draw on a renderer. The session stops
//! at the first terminal decision or transport error.

pub mod config;
pub mod error;
pub mod protocol;
pub mod reporter;
pub mod session;
pub mod transport;

pub use config::{ConfigOverrides, PulseConfig, SessionConfig};
pub use error::PulseError;
pub use protocol::{Decision, UpdateDocument, classify};
pub use session::{Session, SessionEnd};
