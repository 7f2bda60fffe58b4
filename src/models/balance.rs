//! Balance read payloads.
//!
//! The parent answers a balance read with one of two shapes: a credit balance for regular
//! users, or an earnings summary for a project's creator. The gateway forwards the body
//! untouched either way; [`BalancePayload::classify`] only decides which one it is so the
//! shape can be logged and reported to callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys whose presence (as numbers) marks an earnings summary.
const EARNINGS_MARKERS: [&str; 3] = ["totalEarnedCents", "availableCents", "pendingCents"];

/// Credit balance of a user within a project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceView {
    pub project_id: String,
    pub credits_remaining: u64,
    pub is_paid: bool,
}

/// Creator earnings summary. Every amount is in cents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsView {
    pub role: Option<String>,
    pub total_earned_cents: Option<i64>,
    pub available_cents: Option<i64>,
    pub pending_cents: Option<i64>,
    pub last30_days_cents: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalancePayload {
    Balance(BalanceView),
    Earnings(EarningsView),
    /// Valid response the gateway doesn't recognize; still forwarded as-is.
    Unrecognized,
}

impl BalancePayload {
    /// Decide which shape a parent body has by the fields it carries.
    ///
    /// Earnings markers win over balance fields, matching how creator views are gated.
    pub fn classify(body: &[u8]) -> Self {
        let Ok(value) = serde_json::from_slice::<Value>(body) else {
            return BalancePayload::Unrecognized;
        };

        let is_earnings = value.get("role").and_then(Value::as_str) == Some("creator")
            || EARNINGS_MARKERS
                .iter()
                .any(|key| value.get(*key).is_some_and(Value::is_number));

        if is_earnings {
            return serde_json::from_value(value)
                .map(BalancePayload::Earnings)
                .unwrap_or(BalancePayload::Unrecognized);
        }

        if value.get("creditsRemaining").is_some() {
            return serde_json::from_value(value)
                .map(BalancePayload::Balance)
                .unwrap_or(BalancePayload::Unrecognized);
        }

        BalancePayload::Unrecognized
    }

    pub fn shape(&self) -> &'static str {
        match self {
            BalancePayload::Balance(_) => "balance",
            BalancePayload::Earnings(_) => "earnings",
            BalancePayload::Unrecognized => "unrecognized",
        }
    }
}
