use std::fmt;

use crate::protocol::Decision;

/// The three states of a tracking session.
///
/// Every session flows: INITIATED → AWAITING_UPDATE (looping) → TERMINATED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initiated,
    AwaitingUpdate,
    Terminated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Initiated => write!(f, "INITIATED"),
            SessionState::AwaitingUpdate => write!(f, "AWAITING_UPDATE"),
            SessionState::Terminated => write!(f, "TERMINATED"),
        }
    }
}

/// Something that happened during one transport cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A transport dispatch was started.
    Dispatched,
    /// A document was classified.
    Decided(Decision),
    /// The transport failed; never retried.
    TransportFailed,
}

impl SessionState {
    /// Compute the state that follows `event`.
    ///
    /// - The first dispatch leaves `Initiated`.
    /// - `Continue` and `RetryPending` keep the session waiting.
    /// - Any other decision, or a transport failure, terminates it.
    /// - `Terminated` is absorbing.
    pub fn next(self, event: SessionEvent) -> SessionState {
        match (self, event) {
            (SessionState::Terminated, _) => SessionState::Terminated,
            (_, SessionEvent::TransportFailed) => SessionState::Terminated,
            (_, SessionEvent::Decided(decision)) if decision.is_terminal() => {
                SessionState::Terminated
            }
            (_, SessionEvent::Decided(_)) => SessionState::AwaitingUpdate,
            (_, SessionEvent::Dispatched) => SessionState::AwaitingUpdate,
        }
    }

    pub fn is_terminated(self) -> bool {
        self == SessionState::Terminated
    }
}
