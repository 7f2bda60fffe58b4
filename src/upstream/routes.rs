//! Per-operation description of the parent's contract.
//!
//! Every path, identifier casing and fixed query flag the parent expects lives in
//! [`ROUTES`]. Handlers look their entry up by [`Operation`] instead of hardcoding
//! variants, so supporting a new alias or path is a one-line edit here.

use reqwest::Method;
use serde_json::{Map, Value};
use std::fmt;

use crate::models::identity::Identity;

/// The four operations the gateway fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Balance,
    Checkout,
    CheckAndDebit,
    Transactions,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Balance => "balance",
            Operation::Checkout => "checkout",
            Operation::CheckAndDebit => "check_and_debit",
            Operation::Transactions => "transactions",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
}

impl Verb {
    pub fn method(&self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
        }
    }
}

/// How one operation is expressed against the parent.
#[derive(Debug)]
pub struct Route {
    pub operation: Operation,
    pub verb: Verb,
    pub path: &'static str,

    /// Names the user id is sent under. Several entries send it under each name.
    pub user_keys: &'static [&'static str],

    /// Names the project id is sent under.
    pub project_keys: &'static [&'static str],

    /// Fixed query parameters appended to every call.
    pub extra_query: &'static [(&'static str, &'static str)],

    /// Message returned to callers when the parent answers non-2xx.
    pub failure_message: &'static str,

    /// Whether the parent's own error text may be returned as `details`.
    pub expose_upstream_detail: bool,
}

pub static ROUTES: [Route; 4] = [
    Route {
        operation: Operation::Balance,
        verb: Verb::Get,
        path: "/api/credits/balance",
        user_keys: &["userId"],
        project_keys: &["projectId"],
        extra_query: &[],
        failure_message: "Upstream request failed",
        expose_upstream_detail: true,
    },
    Route {
        operation: Operation::Checkout,
        verb: Verb::Post,
        path: "/api/credits/checkout",
        user_keys: &["user_id", "userId"],
        project_keys: &["project_id", "projectId"],
        extra_query: &[],
        failure_message: "Failed to create checkout session",
        expose_upstream_detail: false,
    },
    Route {
        operation: Operation::CheckAndDebit,
        verb: Verb::Post,
        path: "/api/credits/check-and-debit",
        user_keys: &["userId", "user_id"],
        project_keys: &["projectId", "project_id"],
        extra_query: &[],
        failure_message: "Upstream request failed",
        expose_upstream_detail: true,
    },
    Route {
        operation: Operation::Transactions,
        verb: Verb::Get,
        path: "/api/credits/transactions",
        user_keys: &["userId"],
        project_keys: &["projectId"],
        extra_query: &[("all", "true")],
        failure_message: "Upstream request failed",
        expose_upstream_detail: true,
    },
];

/// Look up the table entry for an operation.
///
/// [`ROUTES`] is ordered like the variants of [`Operation`].
pub fn route(operation: Operation) -> &'static Route {
    &ROUTES[operation as usize]
}

impl Route {
    /// Identifier pairs in the casings this route expects, for a query string.
    ///
    /// `user_id` is optional so read-only balance lookups can go out with a project only.
    pub fn identity_query(&self, user_id: Option<&str>, project_id: &str) -> Vec<(String, String)> {
        let users = user_id
            .into_iter()
            .flat_map(|u| self.user_keys.iter().map(move |k| (k.to_string(), u.to_string())));
        let projects = self
            .project_keys
            .iter()
            .map(|k| (k.to_string(), project_id.to_string()));
        let extra = self
            .extra_query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()));

        users.chain(projects).chain(extra).collect()
    }

    /// Identifier fields in every casing this route expects, for a JSON body.
    pub fn identity_fields(&self, identity: &Identity) -> Map<String, Value> {
        let mut fields = Map::new();
        for key in self.user_keys {
            fields.insert(key.to_string(), Value::String(identity.user_id.clone()));
        }
        for key in self.project_keys {
            fields.insert(key.to_string(), Value::String(identity.project_id.clone()));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_has_exactly_one_entry() {
        for op in [
            Operation::Balance,
            Operation::Checkout,
            Operation::CheckAndDebit,
            Operation::Transactions,
        ] {
            assert_eq!(ROUTES.iter().filter(|r| r.operation == op).count(), 1);
            assert_eq!(route(op).operation, op);
        }
    }

    #[test]
    fn transactions_query_requests_full_history() {
        let query = route(Operation::Transactions).identity_query(Some("u1"), "p1");
        assert_eq!(
            query,
            vec![
                ("userId".to_string(), "u1".to_string()),
                ("projectId".to_string(), "p1".to_string()),
                ("all".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn balance_query_without_user() {
        let query = route(Operation::Balance).identity_query(None, "p1");
        assert_eq!(query, vec![("projectId".to_string(), "p1".to_string())]);
    }

    #[test]
    fn debit_body_carries_both_casings() {
        let identity = Identity {
            user_id: "u1".into(),
            project_id: "p1".into(),
        };
        let fields = route(Operation::CheckAndDebit).identity_fields(&identity);

        assert_eq!(fields["userId"], "u1");
        assert_eq!(fields["user_id"], "u1");
        assert_eq!(fields["projectId"], "p1");
        assert_eq!(fields["project_id"], "p1");
    }
}
