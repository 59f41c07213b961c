/**
 * Ledger Record Data Structure
 *
 * This module defines the `Record` struct used for ledger entries and their
 * JSON representation on the wire.
 *
 * The record is shared between the client, the proxy and the reference
 * backend. The `pending` marker is local state only: it is skipped by serde
 * so it can never reach the server, and the local store keeps it in its own
 * column.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of a ledger record
///
/// Records used to be keyed by their creation timestamp, which lets two
/// records created within the same clock tick overwrite each other. A random
/// UUID is the key instead; the timestamp is plain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A single ledger entry
///
/// # Fields
/// * `id` - Unique key, generated on the client
/// * `name` - Free-form label entered by the user
/// * `value` - Signed amount (negative for expenses)
/// * `timestamp` - Creation time, serialized as RFC 3339
/// * `pending` - Set while the record only exists locally
///
/// # Example
/// ```
/// use offline_ledger::shared::Record;
///
/// let record = Record::new("rent", -500);
/// let json = serde_json::to_value(&record).unwrap();
///
/// assert_eq!(json["value"], -500);
/// assert!(json.get("pending").is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Unique record key
    ///
    /// Records coming from a server that never saw an id get a fresh one.
    #[serde(default)]
    pub id: RecordId,
    /// Label of the entry
    pub name: String,
    /// Signed amount
    pub value: i64,
    /// Creation time (ISO 8601)
    pub timestamp: DateTime<Utc>,
    /// Not yet acknowledged by the server
    #[serde(skip)]
    pub pending: bool,
}

impl Record {
    /// Create a record stamped with the current UTC time
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self::with_timestamp(name, value, Utc::now())
    }

    /// Create a record with an explicit timestamp
    pub fn with_timestamp(name: impl Into<String>, value: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
            value,
            timestamp,
            pending: false,
        }
    }

    /// Copy of this record flagged as pending
    pub fn into_pending(mut self) -> Self {
        self.pending = true;
        self
    }
}

/// Direction requested by the user when entering an amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Funds added, amount kept positive
    Add,
    /// Funds subtracted, amount negated
    Subtract,
}

impl Direction {
    /// Apply the sign for this direction to a user-entered magnitude
    ///
    /// `None` when the negation does not fit in an `i64`.
    pub fn apply(self, amount: i64) -> Option<i64> {
        match self {
            Direction::Add => Some(amount),
            Direction::Subtract => amount.checked_neg(),
        }
    }
}

/// Body returned by `POST /api/transaction`
///
/// The server answers HTTP 200 even when it refuses the record; in that case
/// the body carries an `errors` value instead of the stored record. An
/// `errors` field that is `null`, `false`, `0` or `""` does not count as a
/// refusal.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SubmitResponse {
    /// Record refused by server-side validation
    Rejected {
        /// Validation details, keyed by field
        errors: serde_json::Value,
    },
    /// Record stored
    Accepted(serde_json::Value),
}

impl<'de> Deserialize<'de> for SubmitResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let mut body = serde_json::Value::deserialize(deserializer)?;
        let refused = body.get("errors").is_some_and(is_truthy);
        match body.as_object_mut().and_then(|fields| fields.remove("errors")) {
            Some(errors) if refused => Ok(SubmitResponse::Rejected { errors }),
            Some(errors) => {
                if let Some(fields) = body.as_object_mut() {
                    fields.insert("errors".into(), errors);
                }
                Ok(SubmitResponse::Accepted(body))
            }
            None => Ok(SubmitResponse::Accepted(body)),
        }
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pending_is_never_serialized() {
        let record = Record::new("rent", -500).into_pending();
        let json = serde_json::to_value(&record).unwrap();

        assert!(json.get("pending").is_none());
        assert_eq!(json["name"], "rent");
        assert_eq!(json["value"], -500);
        assert!(json.get("id").is_some());
    }

    #[test]
    fn test_missing_id_gets_generated() {
        let json = r#"{"name":"coffee","value":-3,"timestamp":"2024-01-05T10:00:00.000Z"}"#;
        let a: Record = serde_json::from_str(json).unwrap();
        let b: Record = serde_json::from_str(json).unwrap();

        assert_ne!(a.id, b.id);
        assert!(!a.pending);
        assert_eq!(
            a.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Add.apply(500), Some(500));
        assert_eq!(Direction::Subtract.apply(500), Some(-500));
        assert_eq!(Direction::Subtract.apply(i64::MIN), None);
    }

    #[test]
    fn test_submit_response_detects_errors_field() {
        let rejected: SubmitResponse =
            serde_json::from_str(r#"{"errors":{"name":"required"}}"#).unwrap();
        assert!(matches!(rejected, SubmitResponse::Rejected { .. }));

        let accepted: SubmitResponse =
            serde_json::from_str(r#"{"name":"rent","value":-500}"#).unwrap();
        assert!(matches!(accepted, SubmitResponse::Accepted(_)));
    }

    #[test]
    fn test_record_id_parse() {
        let id = RecordId::new();
        let parsed: RecordId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_falsy_errors_field_means_accepted() {
        for body in [
            r#"{"errors":null,"name":"rent"}"#,
            r#"{"errors":false}"#,
            r#"{"errors":""}"#,
            r#"{"name":"rent","value":-500}"#,
        ] {
            let response: SubmitResponse = serde_json::from_str(body).unwrap();
            assert!(
                matches!(response, SubmitResponse::Accepted(_)),
                "{} decoded as {:?}",
                body,
                response
            );
        }

        let response: SubmitResponse =
            serde_json::from_str(r#"{"errors":{"name":{"message":"Enter a name"}}}"#).unwrap();
        assert!(matches!(
            response,
            SubmitResponse::Rejected { errors } if errors["name"]["message"] == "Enter a name"
        ));
    }
}
