//! Wire model for a single task status update.
//!
//! Decoding is lenient: any JSON value turns into an
//! [`UpdateDocument`], and fields with unexpected types decode as absent.
//! Deciding whether the document makes sense is the classifier's job.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A three-valued boolean: strictly `true`, strictly `false`, or anything else.
///
/// `Unknown` covers a missing key, `null` and non-boolean values alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub enum Flag {
    #[default]
    Unknown,
    True,
    False,
}

impl From<Value> for Flag {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(true) => Flag::True,
            Value::Bool(false) => Flag::False,
            _ => Flag::Unknown,
        }
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        if value { Flag::True } else { Flag::False }
    }
}

/// Progress counters reported by the running task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressInfo {
    #[serde(default, deserialize_with = "lenient_count")]
    pub current: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: u64,
    /// Percentage computed by the producer, if it sent one.
    #[serde(default, deserialize_with = "lenient_number")]
    pub percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    /// Strictly true while the task is accepted but not yet started.
    #[serde(default)]
    pub pending: Flag,
}

impl ProgressInfo {
    /// Completion percentage in `0..=100`.
    ///
    /// Uses the producer's value when present, otherwise derives it from the
    /// counters rounded to two decimals.
    pub fn percent(&self) -> f64 {
        let raw = match self.percent {
            Some(p) => p,
            None if self.total > 0 => {
                let exact = self.current as f64 / self.total as f64 * 100.0;
                (exact * 100.0).round() / 100.0
            }
            None => 0.0,
        };
        raw.clamp(0.0, 100.0)
    }

    pub fn is_pending(&self) -> bool {
        self.pending == Flag::True
    }
}

/// One status update as received from the poll endpoint or the stream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpdateDocument {
    #[serde(default, deserialize_with = "lenient_progress")]
    pub progress: Option<ProgressInfo>,
    #[serde(default)]
    pub complete: Flag,
    #[serde(default)]
    pub success: Flag,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: Option<String>,
    /// `Some(Value::Null)` when the key is present with a null value.
    #[serde(default, deserialize_with = "present")]
    pub result: Option<Value>,
}

impl UpdateDocument {
    /// Decodes a JSON value. Never fails; non-objects yield an empty document.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_f64())
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
        .unwrap_or(0))
}

fn lenient_progress<'de, D>(deserializer: D) -> Result<Option<ProgressInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flag_is_strict() {
        assert_eq!(Flag::from(json!(true)), Flag::True);
        assert_eq!(Flag::from(json!(false)), Flag::False);
        assert_eq!(Flag::from(json!(null)), Flag::Unknown);
        assert_eq!(Flag::from(json!("true")), Flag::Unknown);
        assert_eq!(Flag::from(json!(1)), Flag::Unknown);
    }

    #[test]
    fn missing_and_null_result_are_distinguished() {
        let absent = UpdateDocument::from_value(json!({"complete": true}));
        assert_eq!(absent.result, None);

        let null = UpdateDocument::from_value(json!({"complete": true, "result": null}));
        assert_eq!(null.result, Some(Value::Null));
    }

    #[test]
    fn non_object_decodes_to_empty_document() {
        assert_eq!(UpdateDocument::from_value(json!([1, 2])), UpdateDocument::default());
        assert_eq!(UpdateDocument::from_value(json!("done")), UpdateDocument::default());
    }

    #[test]
    fn mistyped_fields_decode_as_absent() {
        let doc = UpdateDocument::from_value(json!({
            "complete": "yes",
            "state": 7,
            "progress": "half",
        }));
        assert_eq!(doc.complete, Flag::Unknown);
        assert_eq!(doc.state, None);
        assert_eq!(doc.progress, None);
    }

    #[test]
    fn progress_decodes_producer_fields() {
        let doc = UpdateDocument::from_value(json!({
            "complete": false,
            "success": null,
            "progress": {
                "current": 3,
                "total": 9,
                "percent": 33.33,
                "description": "resizing",
                "pending": false
            }
        }));
        let progress = doc.progress.unwrap();
        assert_eq!(progress.current, 3);
        assert_eq!(progress.total, 9);
        assert_eq!(progress.percent(), 33.33);
        assert_eq!(progress.description.as_deref(), Some("resizing"));
        assert!(!progress.is_pending());
        assert_eq!(doc.success, Flag::Unknown);
    }

    #[test]
    fn percent_is_derived_when_missing() {
        let progress = ProgressInfo {
            current: 1,
            total: 3,
            ..Default::default()
        };
        assert_eq!(progress.percent(), 33.33);

        let empty = ProgressInfo::default();
        assert_eq!(empty.percent(), 0.0);
    }

    #[test]
    fn percent_is_clamped() {
        let progress = ProgressInfo {
            percent: Some(140.0),
            ..Default::default()
        };
        assert_eq!(progress.percent(), 100.0);
    }

    #[test]
    fn pending_requires_strict_true() {
        let doc = UpdateDocument::from_value(json!({
            "complete": false,
            "progress": {"current": 0, "total": 100, "pending": true}
        }));
        assert!(doc.progress.unwrap().is_pending());

        let doc = UpdateDocument::from_value(json!({
            "complete": false,
            "progress": {"current": 0, "total": 100, "pending": "yes"}
        }));
        assert!(!doc.progress.unwrap().is_pending());
    }
}
