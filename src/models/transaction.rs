//! Transaction records as listed by the parent.
//!
//! This module defines:
//! - `TransactionRecord`: one read-only ledger entry
//! - `TransactionStatus`: lifecycle of an entry
//! - `with_fallback_total`: fills in `totalEarnedCents` when the parent omits it

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field the parent uses for a precomputed lifetime total.
pub const TOTAL_FIELD: &str = "totalEarnedCents";

/// Transaction status
///
/// - "pending": not settled yet
/// - "completed": counted towards earnings
/// - "failed": never settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// Parent ids are strings on newer deployments and integers on older ones.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TransactionId {
    Text(String),
    Number(i64),
}

/// One entry of the parent's ledger.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "tx_123",
///   "amountCents": 500,
///   "status": "completed",
///   "description": "Pro Monthly",
///   "createdAt": "2025-12-21T16:00:00Z",
///   "currency": "USD"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default)]
    pub id: Option<TransactionId>,

    /// Amount in cents
    pub amount_cents: i64,

    pub status: TransactionStatus,

    #[serde(default)]
    pub description: Option<String>,

    /// Kept as sent: deployments differ on timestamp format (RFC 3339, naive, epoch).
    #[serde(default, alias = "created_at")]
    pub created_at: Option<Value>,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub metadata: Option<Value>,
}

/// The two fields a total depends on; everything else in an entry is ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Tally {
    amount_cents: i64,
    status: TransactionStatus,
}

/// Sum of `amountCents` over completed records.
///
/// Only `status` and `amountCents` are read. An entry is skipped when either of those
/// is missing or has the wrong type.
pub fn completed_total(records: &[Value]) -> i64 {
    records
        .iter()
        .filter_map(|raw| Tally::deserialize(raw).ok())
        .filter(|tally| tally.status == TransactionStatus::Completed)
        .fold(0i64, |total, tally| total.saturating_add(tally.amount_cents))
}

/// Attach a locally computed `totalEarnedCents` when the parent didn't send one.
///
/// # Shapes
///
/// - object with a `transactions` array: field added next to it, everything else kept
/// - bare array: wrapped as `{ "transactions": [...], "totalEarnedCents": n }`
/// - anything else: returned unchanged
///
/// A computed total is flagged with `"totalEarnedComputed": true`; it is a convenience
/// figure, the parent's own total is authoritative.
pub fn with_fallback_total(body: Value) -> Value {
    match body {
        Value::Object(mut map) => {
            let computed = match map.get("transactions") {
                Some(Value::Array(records)) if !map.contains_key(TOTAL_FIELD) => {
                    Some(completed_total(records))
                }
                _ => None,
            };
            if let Some(total) = computed {
                insert_total(&mut map, total);
            }
            Value::Object(map)
        }
        Value::Array(records) => {
            let total = completed_total(&records);
            let mut map = Map::new();
            map.insert("transactions".to_string(), Value::Array(records));
            insert_total(&mut map, total);
            Value::Object(map)
        }
        other => other,
    }
}

fn insert_total(map: &mut Map<String, Value>, total: i64) {
    map.insert(TOTAL_FIELD.to_string(), Value::from(total));
    map.insert("totalEarnedComputed".to_string(), Value::Bool(true));
}
