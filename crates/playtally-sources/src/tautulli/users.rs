use crate::error::SourceError;
use crate::traits::TautulliApi;
use serde_json::Value;
use tracing::{debug, info};

/// Outcome of one user listing tier
#[derive(Debug)]
pub enum UserLookup {
    Found(i64),
    NotFound,
    Failed(SourceError),
}

/// Resolve a username or display name to a Tautulli `user_id`.
///
/// `get_users` is consulted first, matching either `username` or
/// `friendly_name`. If it fails or has no match, `get_user_names` is consulted
/// matching `friendly_name` only. Comparison is case-insensitive equality.
pub async fn resolve_user(api: &dyn TautulliApi, name: &str) -> Result<i64, SourceError> {
    info!("Resolving user_id for '{}'", name);

    match lookup(api, "get_users", name, &["username", "friendly_name"]).await {
        UserLookup::Found(user_id) => {
            info!("Found user_id {}", user_id);
            return Ok(user_id);
        }
        UserLookup::NotFound => debug!("No match in get_users, trying get_user_names"),
        UserLookup::Failed(e) => debug!("get_users failed ({}), trying get_user_names", e),
    }

    match lookup(api, "get_user_names", name, &["friendly_name"]).await {
        UserLookup::Found(user_id) => {
            info!("Found user_id {}", user_id);
            Ok(user_id)
        }
        UserLookup::NotFound => Err(SourceError::UserNotFound(name.to_string())),
        UserLookup::Failed(e) => Err(e),
    }
}

async fn lookup(api: &dyn TautulliApi, command: &str, name: &str, fields: &[&str]) -> UserLookup {
    match api.call(command, &[]).await {
        Ok(data) => match_user(command, &data, name, fields),
        Err(e) => UserLookup::Failed(e),
    }
}

/// Find the first listed user whose `fields` equal `name` ignoring case
pub fn match_user(command: &str, data: &Value, name: &str, fields: &[&str]) -> UserLookup {
    let Some(users) = data.as_array() else {
        return UserLookup::Failed(SourceError::decode(command, "user list is not an array"));
    };
    let wanted = name.to_lowercase();

    let matched = users.iter().find(|user| {
        fields.iter().any(|field| {
            user.get(*field)
                .and_then(text)
                .map(|candidate| candidate.to_lowercase() == wanted)
                .unwrap_or(false)
        })
    });

    match matched {
        None => UserLookup::NotFound,
        Some(user) => match user.get("user_id").and_then(user_id) {
            Some(id) => UserLookup::Found(id),
            None => UserLookup::Failed(SourceError::decode(command, "matched user has no numeric user_id")),
        },
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn user_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
