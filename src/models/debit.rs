//! Check-and-debit request.
//!
//! The gateway does no accounting of its own: it only makes sure `cost` is a positive
//! whole number of credits before asking the parent to debit it.

use serde_json::{Map, Value};

use crate::error::AppError;
use crate::models::identity::Identity;

/// Largest integer an `f64` holds exactly.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// A validated debit, ready to forward.
#[derive(Debug, Clone, PartialEq)]
pub struct DebitRequest {
    pub identity: Identity,
    pub cost: u64,
    pub metadata: Map<String, Value>,
}

impl DebitRequest {
    /// Validate `cost` and `metadata` from a JSON body.
    ///
    /// # Validation
    ///
    /// - `cost` must be a JSON number with no fractional part, greater than zero
    /// - `metadata` may be absent or null (becomes `{}`), otherwise it must be an object
    pub fn from_body(identity: Identity, body: &Map<String, Value>) -> Result<Self, AppError> {
        let cost = parse_cost(body.get("cost"))?;

        let metadata = match body.get("metadata") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Err(AppError::validation("metadata must be an object")),
        };

        Ok(Self {
            identity,
            cost,
            metadata,
        })
    }

    /// Parent-facing JSON body with identity in every casing the route lists.
    pub fn upstream_body(&self, identity_fields: Map<String, Value>) -> Value {
        let mut body = identity_fields;
        body.insert("cost".to_string(), Value::from(self.cost));
        body.insert("metadata".to_string(), Value::Object(self.metadata.clone()));
        Value::Object(body)
    }
}

fn parse_cost(value: Option<&Value>) -> Result<u64, AppError> {
    let invalid = || AppError::validation("cost must be a positive integer");

    let Some(Value::Number(n)) = value else {
        return Err(match value {
            None | Some(Value::Null) => AppError::validation("Missing cost"),
            Some(_) => invalid(),
        });
    };

    if let Some(cost) = n.as_u64() {
        return if cost > 0 { Ok(cost) } else { Err(invalid()) };
    }

    // `5.0` is a whole number even though it was written as a float.
    match n.as_f64() {
        Some(f) if f > 0.0 && f.fract() == 0.0 && f <= MAX_EXACT_FLOAT_INT => Ok(f as u64),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity() -> Identity {
        Identity {
            user_id: "u1".into(),
            project_id: "p1".into(),
        }
    }

    fn body(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn accepts_positive_integers() {
        let req = DebitRequest::from_body(identity(), &body(json!({ "cost": 3 }))).unwrap();
        assert_eq!(req.cost, 3);
        assert!(req.metadata.is_empty());

        let float_whole = DebitRequest::from_body(identity(), &body(json!({ "cost": 2.0 }))).unwrap();
        assert_eq!(float_whole.cost, 2);
    }

    #[test]
    fn rejects_zero_negative_fractional_and_strings() {
        for cost in [json!(0), json!(-5), json!(1.5), json!("5"), json!(true), json!(null)] {
            let result = DebitRequest::from_body(identity(), &body(json!({ "cost": cost })));
            assert!(matches!(result, Err(AppError::Validation(_))), "cost {cost}");
        }

        let missing = DebitRequest::from_body(identity(), &Map::new()).unwrap_err();
        assert_eq!(missing.to_string(), "Missing cost");
    }

    #[test]
    fn metadata_must_be_an_object() {
        let ok = DebitRequest::from_body(
            identity(),
            &body(json!({ "cost": 1, "metadata": { "feature": "export" } })),
        )
        .unwrap();
        assert_eq!(ok.metadata["feature"], "export");

        let bad = DebitRequest::from_body(identity(), &body(json!({ "cost": 1, "metadata": [1] })));
        assert!(bad.is_err());
    }

    #[test]
    fn upstream_body_keeps_metadata() {
        let req = DebitRequest::from_body(
            identity(),
            &body(json!({ "cost": 4, "metadata": { "k": "v" } })),
        )
        .unwrap();
        let mut ids = Map::new();
        ids.insert("userId".into(), json!("u1"));

        assert_eq!(
            req.upstream_body(ids),
            json!({ "userId": "u1", "cost": 4, "metadata": { "k": "v" } })
        );
    }
}
