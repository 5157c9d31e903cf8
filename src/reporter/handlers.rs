use std::fmt;

use chrono::Utc;
use serde_json::Value;

use super::Renderer;
use crate::protocol::{Outcome, ProgressInfo, RetryNotice, Update, render_text};
use crate::transport::TransportError;

type ProgressFn = Box<dyn Fn(&mut dyn Renderer, &ProgressInfo) + Send + Sync>;
type MessageFn = Box<dyn Fn(&mut dyn Renderer, &str) + Send + Sync>;
type RetryFn = Box<dyn Fn(&mut dyn Renderer, &RetryNotice) + Send + Sync>;
type IgnoredFn = Box<dyn Fn(&mut dyn Renderer, Option<&Value>) + Send + Sync>;
type HttpErrorFn = Box<dyn Fn(&mut dyn Renderer, u16, &str) + Send + Sync>;
type ResultFn = Box<dyn Fn(&mut dyn Renderer, &Value) + Send + Sync>;

/// Default renderings, usable from custom handlers that want to extend them.
pub mod defaults {
    use chrono::{DateTime, Utc};
    use serde_json::Value;

    use crate::protocol::{ProgressInfo, RetryNotice, render_text};
    use crate::reporter::{Renderer, Tone};

    pub fn progress(renderer: &mut dyn Renderer, progress: &ProgressInfo) {
        renderer.paint(Tone::Progress, Some(progress.percent()));
        renderer.set_message(&progress_message(progress));
    }

    /// Status line for a progress update. A zero count reads differently
    /// depending on whether the task has been picked up yet.
    pub fn progress_message(progress: &ProgressInfo) -> String {
        if progress.current == 0 {
            if progress.is_pending() {
                "Waiting for task to start...".to_string()
            } else {
                "Task started...".to_string()
            }
        } else {
            let description = progress.description.as_deref().unwrap_or_default();
            format!(
                "{} of {} processed. {description}",
                progress.current, progress.total
            )
            .trim_end()
            .to_string()
        }
    }

    pub fn success(renderer: &mut dyn Renderer, details: &str) {
        renderer.paint(Tone::Success, Some(100.0));
        renderer.set_message(format!("Success! {details}").trim_end());
    }

    pub fn error(renderer: &mut dyn Renderer, message: &str) {
        renderer.paint(Tone::Error, None);
        renderer.set_message(format!("Uh-Oh, something went wrong! {message}").trim_end());
    }

    pub fn retry_message(notice: &RetryNotice, now: DateTime<Utc>) -> String {
        match notice.seconds_until(now) {
            Some(secs) => format!("Retrying in {}s: {}", secs.max(0), notice.message),
            None => format!("Retrying: {}", notice.message),
        }
    }

    pub fn ignored(renderer: &mut dyn Renderer, result: Option<&Value>) {
        renderer.paint(Tone::Ignored, None);
        let text = result.map(render_text).unwrap_or_default();
        if text.is_empty() {
            renderer.set_message("Task result ignored!");
        } else {
            renderer.set_message(&text);
        }
    }

    pub fn result(renderer: &mut dyn Renderer, result: &Value) {
        if renderer.has_result_target() {
            renderer.show_result(&render_text(result));
        }
    }
}

/// One handler slot per kind of update.
///
/// Unset slots fall back to [`defaults`]; task, data, network and HTTP
/// errors fall back further to the generic error slot, parse errors to the
/// data-error slot, and retries to the generic error slot with a
/// "Retrying in Ns" message. Handler return values are ignored.
#[derive(Default)]
pub struct Handlers {
    on_progress: Option<ProgressFn>,
    on_success: Option<MessageFn>,
    on_task_error: Option<MessageFn>,
    on_retry: Option<RetryFn>,
    on_ignored: Option<IgnoredFn>,
    on_data_error: Option<MessageFn>,
    on_network_error: Option<MessageFn>,
    on_http_error: Option<HttpErrorFn>,
    on_parse_error: Option<MessageFn>,
    on_error: Option<MessageFn>,
    on_result: Option<ResultFn>,
}

impl Handlers {
    pub fn on_progress(
        mut self,
        f: impl Fn(&mut dyn Renderer, &ProgressInfo) + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn on_success(mut self, f: impl Fn(&mut dyn Renderer, &str) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_task_error(
        mut self,
        f: impl Fn(&mut dyn Renderer, &str) + Send + Sync + 'static,
    ) -> Self {
        self.on_task_error = Some(Box::new(f));
        self
    }

    pub fn on_retry(
        mut self,
        f: impl Fn(&mut dyn Renderer, &RetryNotice) + Send + Sync + 'static,
    ) -> Self {
        self.on_retry = Some(Box::new(f));
        self
    }

    pub fn on_ignored(
        mut self,
        f: impl Fn(&mut dyn Renderer, Option<&Value>) + Send + Sync + 'static,
    ) -> Self {
        self.on_ignored = Some(Box::new(f));
        self
    }

    pub fn on_data_error(
        mut self,
        f: impl Fn(&mut dyn Renderer, &str) + Send + Sync + 'static,
    ) -> Self {
        self.on_data_error = Some(Box::new(f));
        self
    }

    pub fn on_network_error(
        mut self,
        f: impl Fn(&mut dyn Renderer, &str) + Send + Sync + 'static,
    ) -> Self {
        self.on_network_error = Some(Box::new(f));
        self
    }

    pub fn on_http_error(
        mut self,
        f: impl Fn(&mut dyn Renderer, u16, &str) + Send + Sync + 'static,
    ) -> Self {
        self.on_http_error = Some(Box::new(f));
        self
    }

    pub fn on_parse_error(
        mut self,
        f: impl Fn(&mut dyn Renderer, &str) + Send + Sync + 'static,
    ) -> Self {
        self.on_parse_error = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&mut dyn Renderer, &str) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_result(mut self, f: impl Fn(&mut dyn Renderer, &Value) + Send + Sync + 'static) -> Self {
        self.on_result = Some(Box::new(f));
        self
    }

    pub fn progress(&self, renderer: &mut dyn Renderer, progress: &ProgressInfo) {
        match &self.on_progress {
            Some(f) => f(renderer, progress),
            None => defaults::progress(renderer, progress),
        }
    }

    pub fn success(&self, renderer: &mut dyn Renderer, details: &str) {
        match &self.on_success {
            Some(f) => f(renderer, details),
            None => defaults::success(renderer, details),
        }
    }

    pub fn task_error(&self, renderer: &mut dyn Renderer, details: &str) {
        match &self.on_task_error {
            Some(f) => f(renderer, details),
            None => self.error(renderer, details),
        }
    }

    pub fn retry(&self, renderer: &mut dyn Renderer, notice: &RetryNotice) {
        match &self.on_retry {
            Some(f) => f(renderer, notice),
            None => self.error(renderer, &defaults::retry_message(notice, Utc::now())),
        }
    }

    pub fn ignored(&self, renderer: &mut dyn Renderer, result: Option<&Value>) {
        match &self.on_ignored {
            Some(f) => f(renderer, result),
            None => defaults::ignored(renderer, result),
        }
    }

    pub fn data_error(&self, renderer: &mut dyn Renderer, message: &str) {
        match &self.on_data_error {
            Some(f) => f(renderer, message),
            None => self.error(renderer, message),
        }
    }

    pub fn network_error(&self, renderer: &mut dyn Renderer, message: &str) {
        match &self.on_network_error {
            Some(f) => f(renderer, message),
            None => self.error(renderer, message),
        }
    }

    pub fn http_error(&self, renderer: &mut dyn Renderer, status: u16, message: &str) {
        match &self.on_http_error {
            Some(f) => f(renderer, status, message),
            None => self.error(renderer, message),
        }
    }

    pub fn parse_error(&self, renderer: &mut dyn Renderer, message: &str) {
        match &self.on_parse_error {
            Some(f) => f(renderer, message),
            None => self.data_error(renderer, message),
        }
    }

    pub fn error(&self, renderer: &mut dyn Renderer, message: &str) {
        match &self.on_error {
            Some(f) => f(renderer, message),
            None => defaults::error(renderer, message),
        }
    }

    pub fn result(&self, renderer: &mut dyn Renderer, result: &Value) {
        match &self.on_result {
            Some(f) => f(renderer, result),
            None => defaults::result(renderer, result),
        }
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let overridden: Vec<&str> = [
            ("progress", self.on_progress.is_some()),
            ("success", self.on_success.is_some()),
            ("task_error", self.on_task_error.is_some()),
            ("retry", self.on_retry.is_some()),
            ("ignored", self.on_ignored.is_some()),
            ("data_error", self.on_data_error.is_some()),
            ("network_error", self.on_network_error.is_some()),
            ("http_error", self.on_http_error.is_some()),
            ("parse_error", self.on_parse_error.is_some()),
            ("error", self.on_error.is_some()),
            ("result", self.on_result.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect();
        f.debug_struct("Handlers")
            .field("overridden", &overridden)
            .finish()
    }
}

/// Routes classified updates and transport errors to handler slots.
#[derive(Debug, Default)]
pub struct Reporter {
    handlers: Handlers,
}

impl Reporter {
    pub fn new(handlers: Handlers) -> Self {
        Self { handlers }
    }

    /// Reports one classified update: progress first, then the outcome,
    /// then the published result.
    pub fn report(&self, renderer: &mut dyn Renderer, update: &Update) {
        if let Some(progress) = &update.progress {
            self.handlers.progress(renderer, progress);
        }

        match &update.outcome {
            Outcome::Continue => {}
            Outcome::Success { result } => {
                let details = message_details(renderer, result.as_ref());
                self.handlers.success(renderer, &details);
            }
            Outcome::TaskFailure { result } => {
                let details = message_details(renderer, result.as_ref());
                self.handlers.task_error(renderer, &details);
            }
            Outcome::RetryPending(notice) => self.handlers.retry(renderer, notice),
            Outcome::Ignored { result } => self.handlers.ignored(renderer, result.as_ref()),
            Outcome::Invalid => self.handlers.data_error(renderer, "Data Error"),
        }

        if let Some(result) = &update.published_result {
            self.handlers.result(renderer, result);
        }
    }

    pub fn report_transport_error(&self, renderer: &mut dyn Renderer, err: &TransportError) {
        match err {
            TransportError::Network(_) => self.handlers.network_error(renderer, "Network Error"),
            TransportError::Http { status } => {
                self.handlers
                    .http_error(renderer, *status, &format!("HTTP Code {status}"))
            }
            TransportError::Parse(_) => self.handlers.parse_error(renderer, "Parsing Error"),
        }
    }
}

// The result goes to its own target when there is one, so the status line
// stays short.
fn message_details(renderer: &dyn Renderer, result: Option<&Value>) -> String {
    if renderer.has_result_target() {
        String::new()
    } else {
        result.map(render_text).unwrap_or_default()
    }
}
