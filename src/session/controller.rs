use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::{SessionEvent, SessionState};
use crate::config::SessionConfig;
use crate::error::PulseError;
use crate::protocol::{Decision, classify};
use crate::reporter::{Renderer, Reporter, TerminalRenderer};
use crate::transport::{Transport, TransportError, UpdateSource};

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEnd {
    /// A terminal decision was classified.
    Finished(Decision),
    /// The transport failed and the session was aborted.
    Failed(TransportError),
}

impl SessionEnd {
    /// True only for a task that finished successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, SessionEnd::Finished(Decision::Success))
    }
}

/// Tracks one background task: pulls documents from its transport,
/// classifies them and reports them until a terminal decision.
///
/// A session owns its transport, renderer and handler table; nothing is
/// shared between sessions. `step` takes `&mut self`, so only one dispatch
/// can be in flight.
pub struct Session<S, R> {
    id: Uuid,
    source: S,
    renderer: R,
    reporter: Reporter,
    state: SessionState,
    end: Option<SessionEnd>,
}

impl<R: Renderer> Session<Transport, R> {
    /// Opens the transport named by `config` and binds it to `renderer`.
    pub fn from_config(config: SessionConfig, renderer: R) -> Result<Self, PulseError> {
        let source = Transport::open(config.transport, &config.endpoint, config.poll_interval)?;
        Ok(Session::new(source, renderer, Reporter::new(config.handlers)))
    }
}

impl Session<Transport, TerminalRenderer> {
    /// Opens the transport named by `config` and draws on stderr, labelled
    /// and writing results as `config.targets` says.
    pub fn terminal(config: SessionConfig) -> Result<Self, PulseError> {
        let renderer = TerminalRenderer::new(&config.targets);
        Self::from_config(config, renderer)
    }
}

impl<S: UpdateSource, R: Renderer> Session<S, R> {
    pub fn new(source: S, renderer: R, reporter: Reporter) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            renderer,
            reporter,
            state: SessionState::Initiated,
            end: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Runs one transport cycle.
    ///
    /// Returns `None` while the session keeps going and the end once it has
    /// terminated. A terminated session returns its recorded end without
    /// dispatching again.
    pub async fn step(&mut self) -> Option<SessionEnd> {
        if let Some(end) = &self.end {
            return Some(end.clone());
        }

        self.state = self.state.next(SessionEvent::Dispatched);
        let doc = match self.source.next_document().await {
            Ok(doc) => doc,
            Err(err) => {
                warn!(session = %self.id, error = %err, "transport failed");
                self.reporter
                    .report_transport_error(&mut self.renderer, &err);
                self.state = self.state.next(SessionEvent::TransportFailed);
                return Some(self.terminate(SessionEnd::Failed(err)).await);
            }
        };

        let (update, decision) = classify(&doc);
        debug!(session = %self.id, %decision, "update classified");
        self.reporter.report(&mut self.renderer, &update);

        self.state = self.state.next(SessionEvent::Decided(decision));
        if self.state.is_terminated() {
            Some(self.terminate(SessionEnd::Finished(decision)).await)
        } else {
            None
        }
    }

    /// Drives the session until it terminates.
    pub async fn run(&mut self) -> SessionEnd {
        loop {
            if let Some(end) = self.step().await {
                return end;
            }
        }
    }

    /// Gives up on an unfinished session and releases its connection.
    /// Nothing is reported to the handlers.
    pub async fn abandon(mut self) {
        if self.end.is_none() {
            debug!(session = %self.id, state = %self.state, "session abandoned");
            self.source.close().await;
        }
    }

    async fn terminate(&mut self, end: SessionEnd) -> SessionEnd {
        self.source.close().await;
        info!(session = %self.id, ?end, "session ended");
        self.end = Some(end.clone());
        end
    }
}
