/**
 * Transaction API Handlers
 *
 * - `GET  /api/transaction`      - every record, newest first
 * - `POST /api/transaction`      - store one record; an invalid record gets
 *   HTTP 200 with an `errors` object, the channel clients rely on
 * - `POST /api/transaction/bulk` - store many records, all or nothing
 * - `GET  /api/health`           - liveness probe
 *
 * Incoming `value`s may be JSON numbers or numeric strings. Records whose id
 * is already stored are acknowledged without being stored twice, so a bulk
 * call replayed after a lost response does not duplicate anything.
 */
use crate::backend::error::BackendError;
use crate::backend::state::AppState;
use crate::shared::{Record, RecordId, SharedError};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// A record as posted by a client, before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomingRecord {
    pub id: Option<RecordId>,
    pub name: Option<String>,
    pub value: Option<Value>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl IncomingRecord {
    /// Validate into a record, or the per-field error map
    pub fn validate(self) -> Result<Record, Map<String, Value>> {
        let mut errors = Map::new();

        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if name.is_none() {
            errors.insert("name".into(), field_error("name", "Enter a name for transaction"));
        }

        let value = match self.value.as_ref() {
            None | Some(Value::Null) => {
                errors.insert("value".into(), field_error("value", "Enter an amount"));
                None
            }
            Some(raw) => {
                let parsed = parse_amount(raw);
                if parsed.is_none() {
                    errors.insert(
                        "value".into(),
                        field_error("value", "Amount must be a whole number"),
                    );
                }
                parsed
            }
        };

        match (name, value) {
            (Some(name), Some(value)) if errors.is_empty() => Ok(Record {
                id: self.id.unwrap_or_default(),
                name,
                value,
                timestamp: self.timestamp.unwrap_or_else(Utc::now),
                pending: false,
            }),
            _ => Err(errors),
        }
    }
}

fn field_error(path: &str, message: &str) -> Value {
    json!({ "message": message, "kind": "required", "path": path })
}

fn parse_amount(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub async fn list_transactions(State(state): State<AppState>) -> Json<Vec<Record>> {
    Json(state.transactions.read().await.newest_first())
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Json(incoming): Json<IncomingRecord>,
) -> Response {
    match incoming.validate() {
        Ok(record) => {
            let added = state.transactions.write().await.insert(record.clone());
            tracing::info!(id = %record.id, added, "Stored transaction {}", record.name);
            Json(record).into_response()
        }
        Err(errors) => {
            tracing::debug!("Rejected transaction: {:?}", errors.keys().collect::<Vec<_>>());
            (
                StatusCode::OK,
                Json(json!({
                    "errors": errors,
                    "message": "Transaction validation failed",
                })),
            )
                .into_response()
        }
    }
}

pub async fn create_bulk(
    State(state): State<AppState>,
    Json(incoming): Json<Vec<IncomingRecord>>,
) -> Result<Json<Vec<Record>>, BackendError> {
    let mut records = Vec::with_capacity(incoming.len());
    for (index, item) in incoming.into_iter().enumerate() {
        let record = item.validate().map_err(|errors| {
            let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
            SharedError::validation(
                format!("[{}]", index),
                format!("invalid fields: {}", fields.join(", ")),
            )
        })?;
        records.push(record);
    }

    let mut store = state.transactions.write().await;
    let added = records
        .iter()
        .filter(|record| store.insert((*record).clone()))
        .count();
    tracing::info!(
        "Bulk stored {} of {} transactions ({} already present)",
        added,
        records.len(),
        records.len() - added
    );

    Ok(Json(records))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
