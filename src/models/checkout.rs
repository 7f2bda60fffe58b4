//! Checkout request and the product descriptor derived from it.
//!
//! # Price Conversion
//!
//! Callers send `amount` in currency units as a JSON number. Multiplying an `f64` by 100
//! drifts (`1.005 * 100.0 == 100.49999999999999`), so cents are computed from the
//! number's shortest decimal representation instead, rounding half-up on the third
//! fractional digit:
//!
//! - `9.99` → 999
//! - `0.005` → 1
//! - `1.005` → 101

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum CheckoutKind {
    #[serde(rename = "subscription")]
    Subscription,

    /// Billed once. Used when no kind is given; unknown kinds are rejected.
    #[default]
    #[serde(rename = "one-time")]
    OneTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl Interval {
    fn adjective(&self) -> &'static str {
        match self {
            Interval::Day => "daily",
            Interval::Week => "weekly",
            Interval::Month => "monthly",
            Interval::Year => "yearly",
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            Interval::Day => "day",
            Interval::Week => "week",
            Interval::Month => "month",
            Interval::Year => "year",
        }
    }
}

/// Body of a checkout-session request.
///
/// # JSON Example
///
/// ```json
/// {
///   "amount": 9.99,
///   "type": "subscription",
///   "tier": "pro-monthly",
///   "interval": "month",
///   "intervalCount": 1
/// }
/// ```
///
/// `kind` is also accepted under its legacy name `type`, and `intervalCount` as
/// `interval_count`. Both names may be present when they agree. Identifier fields may sit
/// in the same body; they are read separately by the identity normalizer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub amount: f64,

    #[serde(default)]
    pub kind: CheckoutKind,

    #[serde(default)]
    pub tier: Option<String>,

    #[serde(default)]
    pub interval: Interval,

    #[serde(default = "default_interval_count")]
    pub interval_count: u32,
}

fn default_interval_count() -> u32 {
    1
}

/// Canonical field name paired with the legacy name it may arrive under.
const FIELD_ALIASES: [(&str, &str); 2] = [("kind", "type"), ("intervalCount", "interval_count")];

/// Fold legacy field names into their canonical names.
///
/// The canonical value wins when both are present; differing values are a 400.
fn fold_aliases(body: &Map<String, Value>) -> Result<Map<String, Value>, AppError> {
    let mut folded = body.clone();

    for (canonical, legacy) in FIELD_ALIASES {
        let Some(legacy_value) = folded.remove(legacy) else {
            continue;
        };
        match folded.get(canonical) {
            Some(value) if *value != legacy_value => {
                return Err(AppError::validation(format!(
                    "Conflicting {canonical} and {legacy}"
                )));
            }
            Some(_) => {}
            None => {
                folded.insert(canonical.to_string(), legacy_value);
            }
        }
    }

    Ok(folded)
}

/// What the parent needs to create a product for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDescriptor {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
}

impl CheckoutRequest {
    pub fn from_body(body: &Map<String, Value>) -> Result<Self, AppError> {
        serde_json::from_value(Value::Object(fold_aliases(body)?))
            .map_err(|e| AppError::validation(format!("Invalid checkout request: {e}")))
    }

    /// Validate and derive the product the parent should bill for.
    pub fn descriptor(&self) -> Result<ProductDescriptor, AppError> {
        let price_cents = price_cents(self.amount).ok_or_else(|| AppError::validation("Invalid amount"))?;

        if self.interval_count < 1 {
            return Err(AppError::validation("intervalCount must be at least 1"));
        }

        let (name, description) = match self.kind {
            CheckoutKind::Subscription => {
                let label = self
                    .tier
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .unwrap_or("Subscription");
                (
                    format!("{label} ({} credits)", self.cadence()),
                    "Recurring support converted to credits".to_string(),
                )
            }
            CheckoutKind::OneTime => (
                format!("Coffee x{}", self.amount),
                "One-time support converted to credits".to_string(),
            ),
        };

        Ok(ProductDescriptor {
            name,
            description,
            price_cents,
        })
    }

    fn cadence(&self) -> String {
        match self.interval_count {
            1 => self.interval.adjective().to_string(),
            n => format!("every {n} {}s", self.interval.noun()),
        }
    }

    /// Parent-facing JSON body: identity in every casing, descriptor, and cadence.
    pub fn upstream_body(
        &self,
        identity_fields: Map<String, Value>,
        product: &ProductDescriptor,
    ) -> Value {
        let mut body = identity_fields;
        let extra = json!({
            "productName": product.name,
            "description": product.description,
            "priceCents": product.price_cents,
            "type": self.kind,
            "kind": self.kind,
            "interval": self.interval,
            "intervalCount": self.interval_count,
        });
        if let Value::Object(extra) = extra {
            body.extend(extra);
        }
        if let Some(tier) = &self.tier {
            body.insert("tier".to_string(), Value::String(tier.clone()));
        }
        Value::Object(body)
    }
}

/// Convert a positive currency amount to whole cents, rounding half-up.
///
/// Returns `None` for non-finite, non-positive or out-of-range amounts, and for amounts
/// that round to zero cents.
pub fn price_cents(amount: f64) -> Option<i64> {
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }

    // Display for f64 is the shortest round-trip form and never uses an exponent.
    let repr = amount.to_string();
    let (whole, fraction) = repr.split_once('.').unwrap_or((repr.as_str(), ""));

    let whole: i64 = whole.parse().ok()?;
    let digits: Vec<i64> = fraction
        .chars()
        .map(|c| c.to_digit(10).map(i64::from))
        .collect::<Option<_>>()?;
    let digit = |i: usize| digits.get(i).copied().unwrap_or(0);

    let round_up = i64::from(digit(2) >= 5);
    let cents = whole
        .checked_mul(100)?
        .checked_add(digit(0) * 10 + digit(1) + round_up)?;

    (cents > 0).then_some(cents)
}

/// Pull the redirect URL out of a successful parent response.
pub fn checkout_url(body: &Value) -> Option<&str> {
    ["url", "checkoutUrl"]
        .into_iter()
        .find_map(|key| body.get(key)?.as_str())
        .filter(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(value: Value) -> CheckoutRequest {
        match value {
            Value::Object(map) => CheckoutRequest::from_body(&map).unwrap(),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn cents_are_exact() {
        assert_eq!(price_cents(9.99), Some(999));
        assert_eq!(price_cents(0.005), Some(1));
        assert_eq!(price_cents(1.005), Some(101));
        assert_eq!(price_cents(19.999), Some(2000));
        assert_eq!(price_cents(5.0), Some(500));
        assert_eq!(price_cents(0.1 + 0.2), Some(30));
    }

    #[test]
    fn cents_reject_non_positive_and_sub_cent() {
        assert_eq!(price_cents(0.0), None);
        assert_eq!(price_cents(-1.0), None);
        assert_eq!(price_cents(0.004), None);
        assert_eq!(price_cents(f64::NAN), None);
        assert_eq!(price_cents(f64::INFINITY), None);
        assert_eq!(price_cents(1e30), None);
    }

    #[test]
    fn defaults_and_legacy_type_field() {
        let req = request(json!({ "amount": 9.99, "type": "subscription", "tier": "pro-monthly" }));
        assert_eq!(req.kind, CheckoutKind::Subscription);
        assert_eq!(req.interval, Interval::Month);
        assert_eq!(req.interval_count, 1);

        let plain = request(json!({ "amount": 3 }));
        assert_eq!(plain.kind, CheckoutKind::OneTime);
    }

    #[test]
    fn agreeing_legacy_and_canonical_names_are_accepted() {
        let req = request(json!({
            "amount": 9.99,
            "kind": "subscription",
            "type": "subscription",
            "intervalCount": 3,
            "interval_count": 3
        }));
        assert_eq!(req.kind, CheckoutKind::Subscription);
        assert_eq!(req.interval_count, 3);

        let legacy_count = request(json!({ "amount": 1, "interval_count": 2 }));
        assert_eq!(legacy_count.interval_count, 2);
    }

    #[test]
    fn disagreeing_legacy_and_canonical_names_are_rejected() {
        let body = json!({ "amount": 1, "kind": "subscription", "type": "one-time" });
        let Value::Object(map) = body else { unreachable!() };
        let err = CheckoutRequest::from_body(&map).unwrap_err();
        assert_eq!(err.to_string(), "Conflicting kind and type");

        let body = json!({ "amount": 1, "intervalCount": 1, "interval_count": 2 });
        let Value::Object(map) = body else { unreachable!() };
        let err = CheckoutRequest::from_body(&map).unwrap_err();
        assert_eq!(err.to_string(), "Conflicting intervalCount and interval_count");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let body = json!({ "amount": 1, "kind": "lifetime" });
        let Value::Object(map) = body else { unreachable!() };
        assert!(matches!(
            CheckoutRequest::from_body(&map),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn subscription_descriptor() {
        let product = request(json!({ "amount": 9.99, "kind": "subscription", "tier": "Pro" }))
            .descriptor()
            .unwrap();

        assert_eq!(product.name, "Pro (monthly credits)");
        assert_eq!(product.description, "Recurring support converted to credits");
        assert_eq!(product.price_cents, 999);

        let untiered = request(json!({
            "amount": 20, "type": "subscription", "interval": "week", "intervalCount": 2
        }))
        .descriptor()
        .unwrap();
        assert_eq!(untiered.name, "Subscription (every 2 weeks credits)");
    }

    #[test]
    fn one_time_descriptor() {
        let product = request(json!({ "amount": 5, "type": "one-time" })).descriptor().unwrap();
        assert_eq!(product.name, "Coffee x5");
        assert_eq!(product.description, "One-time support converted to credits");
        assert_eq!(product.price_cents, 500);
    }

    #[test]
    fn invalid_requests() {
        let zero = request(json!({ "amount": 0 })).descriptor().unwrap_err();
        assert_eq!(zero.to_string(), "Invalid amount");

        let count = request(json!({ "amount": 1, "intervalCount": 0 })).descriptor().unwrap_err();
        assert!(matches!(count, AppError::Validation(_)));

        let body = json!({ "amount": "9.99" });
        let Value::Object(map) = body else { unreachable!() };
        assert!(CheckoutRequest::from_body(&map).is_err());

        let body = json!({ "amount": 1, "interval": "fortnight" });
        let Value::Object(map) = body else { unreachable!() };
        assert!(CheckoutRequest::from_body(&map).is_err());
    }

    #[test]
    fn upstream_body_carries_descriptor_identity_and_cadence() {
        let req = request(json!({ "amount": 9.99, "type": "subscription", "tier": "pro" }));
        let product = req.descriptor().unwrap();
        let mut identity = Map::new();
        identity.insert("user_id".into(), json!("u1"));
        identity.insert("project_id".into(), json!("p1"));

        let body = req.upstream_body(identity, &product);

        assert_eq!(body["user_id"], "u1");
        assert_eq!(body["project_id"], "p1");
        assert_eq!(body["priceCents"], 999);
        assert_eq!(body["productName"], "pro (monthly credits)");
        assert_eq!(body["type"], "subscription");
        assert_eq!(body["interval"], "month");
        assert_eq!(body["intervalCount"], 1);
    }

    #[test]
    fn checkout_url_accepts_both_names() {
        assert_eq!(checkout_url(&json!({ "url": "https://pay/x" })), Some("https://pay/x"));
        assert_eq!(checkout_url(&json!({ "checkoutUrl": "https://pay/y" })), Some("https://pay/y"));
        assert_eq!(checkout_url(&json!({ "url": "" })), None);
        assert_eq!(checkout_url(&json!({})), None);
    }
}
