use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::document::{Flag, ProgressInfo, UpdateDocument};

const RETRY_STATE: &str = "RETRY";
const IGNORED_STATE: &str = "IGNORED";

/// The classifier's verdict for one update document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decision {
    Continue,
    Success,
    TaskFailure,
    RetryPending,
    Ignored,
    Invalid,
}

impl Decision {
    /// Whether the session stops after this decision.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Decision::Success | Decision::TaskFailure | Decision::Ignored | Decision::Invalid
        )
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Continue => write!(f, "CONTINUE"),
            Decision::Success => write!(f, "SUCCESS"),
            Decision::TaskFailure => write!(f, "TASK_FAILURE"),
            Decision::RetryPending => write!(f, "RETRY_PENDING"),
            Decision::Ignored => write!(f, "IGNORED"),
            Decision::Invalid => write!(f, "INVALID"),
        }
    }
}

/// Server-side retry announcement carried by a `RETRY` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryNotice {
    pub message: String,
    pub when: Option<DateTime<Utc>>,
}

impl RetryNotice {
    fn from_result(result: Option<&Value>) -> Self {
        let message = result
            .and_then(|r| r.get("message"))
            .map(render_text)
            .unwrap_or_default();
        let when = result.and_then(|r| r.get("when")).and_then(parse_when);
        Self { message, when }
    }

    /// Seconds from `now` until the retry, rounded to the nearest second.
    pub fn seconds_until(&self, now: DateTime<Utc>) -> Option<i64> {
        self.when.map(|when| {
            let millis = (when - now).num_milliseconds();
            (millis as f64 / 1000.0).round() as i64
        })
    }
}

// Accepts RFC 3339, the `YYYY-MM-DD HH:MM:SS.ffffff+HH:MM` form and Unix seconds.
fn parse_when(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z"))
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
        Value::Number(n) => {
            let secs = n.as_f64()?;
            DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
        }
        _ => None,
    }
}

/// Renders a result payload as display text: strings verbatim, null as
/// empty, everything else as compact JSON.
pub(crate) fn render_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A decision together with the payload its handler needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Outcome {
    Continue,
    Success { result: Option<Value> },
    TaskFailure { result: Option<Value> },
    RetryPending(RetryNotice),
    Ignored { result: Option<Value> },
    Invalid,
}

impl Outcome {
    pub fn decision(&self) -> Decision {
        match self {
            Outcome::Continue => Decision::Continue,
            Outcome::Success { .. } => Decision::Success,
            Outcome::TaskFailure { .. } => Decision::TaskFailure,
            Outcome::RetryPending(_) => Decision::RetryPending,
            Outcome::Ignored { .. } => Decision::Ignored,
            Outcome::Invalid => Decision::Invalid,
        }
    }
}

/// Everything the reporter should render for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update {
    pub progress: Option<ProgressInfo>,
    pub outcome: Outcome,
    /// Raw result to hand to the generic result handler, if any.
    pub published_result: Option<Value>,
}

/// Classifies one update document.
///
/// Pure and total: every input maps to exactly one [`Decision`], and
/// malformed documents map to [`Decision::Invalid`].
///
/// - `complete` false: `Continue`.
/// - `complete` true: `success` picks `Success` or `TaskFailure`, with the
///   `RETRY` and `IGNORED` states overriding; no success signal at all is
///   `Invalid`.
/// - `complete` anything else: `Invalid`.
///
/// The result of a completed document is published to the generic result
/// handler unless the document was a retry or was ignored.
pub fn classify(doc: &UpdateDocument) -> (Update, Decision) {
    let state = doc.state.as_deref();
    let outcome = match doc.complete {
        Flag::False => Outcome::Continue,
        Flag::Unknown => Outcome::Invalid,
        Flag::True => match (doc.success, state) {
            (Flag::True, _) => Outcome::Success {
                result: doc.result.clone(),
            },
            (Flag::False, Some(RETRY_STATE)) => {
                Outcome::RetryPending(RetryNotice::from_result(doc.result.as_ref()))
            }
            (Flag::False | Flag::Unknown, Some(IGNORED_STATE)) => Outcome::Ignored {
                result: doc.result.clone(),
            },
            (Flag::False, _) => Outcome::TaskFailure {
                result: doc.result.clone(),
            },
            (Flag::Unknown, _) => Outcome::Invalid,
        },
    };

    let publishes = doc.complete == Flag::True
        && !matches!(outcome, Outcome::RetryPending(_) | Outcome::Ignored { .. });
    let published_result = if publishes { doc.result.clone() } else { None };

    let decision = outcome.decision();
    let update = Update {
        progress: doc.progress.clone(),
        outcome,
        published_result,
    };
    (update, decision)
}
