//! Caller identity and the normalizer that derives it.
//!
//! Callers name the same two identifiers in several ways (`user_id`, `userId`, `uid`;
//! `project_id`, `projectId`), in the query string, the JSON body, or both. Everything
//! downstream only ever sees the canonical [`Identity`].

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::AppError;

/// Accepted names for the user id, in resolution order.
pub const USER_ALIASES: [&str; 3] = ["user_id", "userId", "uid"];

/// Accepted names for the project id, in resolution order.
pub const PROJECT_ALIASES: [&str; 2] = ["project_id", "projectId"];

/// The (user, project) pair scoping every credit operation.
///
/// Both fields are trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub project_id: String,
}

/// Project-scoped lookup for read-only contexts where the user is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScope {
    pub project_id: String,
    pub user_id: Option<String>,
}

/// Raw key/value pairs an identity can be read from.
///
/// Body fields override query parameters with the same key.
#[derive(Debug, Clone, Default)]
pub struct IdentitySource {
    fields: HashMap<String, String>,
}

impl IdentitySource {
    pub fn from_query(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            fields: pairs.into_iter().collect(),
        }
    }

    /// Layer JSON body fields over the current ones.
    ///
    /// Strings and numbers are accepted as identifiers; other JSON types are ignored.
    pub fn with_body(mut self, body: &Map<String, Value>) -> Self {
        for (key, value) in body {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => continue,
            };
            self.fields.insert(key.clone(), text);
        }
        self
    }

    /// First alias carrying a non-empty trimmed value.
    fn lookup(&self, aliases: &[&str]) -> Option<String> {
        aliases
            .iter()
            .filter_map(|alias| self.fields.get(*alias))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .map(str::to_owned)
    }
}

/// Resolve a full identity or fail naming every missing field.
pub fn normalize(source: &IdentitySource) -> Result<Identity, AppError> {
    let user_id = source.lookup(&USER_ALIASES);
    let project_id = source.lookup(&PROJECT_ALIASES);

    match (user_id, project_id) {
        (Some(user_id), Some(project_id)) => Ok(Identity {
            user_id,
            project_id,
        }),
        (None, Some(_)) => Err(AppError::validation("Missing user_id")),
        (Some(_), None) => Err(AppError::validation("Missing project_id")),
        (None, None) => Err(AppError::validation("Missing user_id and project_id")),
    }
}

/// Resolve a project, keeping the user id when one was supplied.
pub fn normalize_project(source: &IdentitySource) -> Result<ProjectScope, AppError> {
    let project_id = source
        .lookup(&PROJECT_ALIASES)
        .ok_or_else(|| AppError::validation("Missing project_id"))?;

    Ok(ProjectScope {
        project_id,
        user_id: source.lookup(&USER_ALIASES),
    })
}
