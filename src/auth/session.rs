use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::{Role, User};
use crate::config::SessionConfig;

pub const SESSION_COOKIE: &str = "session";

/// Client-held session record, stored as percent-encoded JSON in the
/// `session` cookie. The value carries no signature; the guard re-verifies
/// the referenced user against the database on every request instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl SessionData {
    /// Mint a fresh session for a verified user.
    pub fn for_user(user: &User) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// Decode the session cookie. Any failure, from a missing header to
/// malformed JSON, yields `None`; the codec never errors.
pub fn read_session(headers: &HeaderMap) -> Option<SessionData> {
    let raw = cookie_value(headers, SESSION_COOKIE)?;
    let decoded = urlencoding::decode(&raw).ok()?;
    serde_json::from_str(&decoded).ok()
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(COOKIE)?.to_str().ok()?;
    for pair in value.split(';') {
        if let Some((key, val)) = pair.trim().split_once('=') {
            if key.trim() == name {
                return Some(val.trim().to_string());
            }
        }
    }
    None
}

/// Build the `Set-Cookie` value for a freshly minted session.
pub fn session_cookie(
    session: &SessionData,
    config: &SessionConfig,
) -> anyhow::Result<HeaderValue> {
    let encoded = urlencoding::encode(&serde_json::to_string(session)?).into_owned();
    let mut cookie = format!(
        "{SESSION_COOKIE}={encoded}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        config.max_age_secs
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    Ok(HeaderValue::from_str(&cookie)?)
}

/// Build the `Set-Cookie` value that discards the session.
pub fn clear_session_cookie(config: &SessionConfig) -> HeaderValue {
    if config.cookie_secure {
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0; Secure")
    } else {
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
    }
}
