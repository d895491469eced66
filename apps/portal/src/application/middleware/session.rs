use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use core_lib::{Cache, CoreError, domain::account::Account};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AppState;

pub const SESSION_COOKIE: &str = "portal_session";
pub const LOGIN_PATH: &str = "/login/";

/// User context stored in the cache for each session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub identity_id: i64,
    pub profile_id: i64,
    pub email: String,
    pub full_name: String,
}

impl From<&Account> for SessionUser {
    fn from(account: &Account) -> Self {
        Self {
            identity_id: account.identity.id,
            profile_id: account.profile.id,
            email: account.identity.email.clone(),
            full_name: account.profile.full_name.clone(),
        }
    }
}

/// Request extension inserted by [`require_session`].
#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    pub user: SessionUser,
}

fn session_key(session_id: &str) -> String {
    format!("session:{session_id}")
}

fn flash_key(session_id: &str) -> String {
    format!("flash:{session_id}")
}

/// Value of the session cookie, if the request carries one.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub async fn load_session(cache: &dyn Cache, session_id: &str) -> Option<SessionUser> {
    match cache.get(&session_key(session_id)).await {
        Ok(Some(bytes)) => match serde_json::from_slice::<SessionUser>(&bytes) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Failed to deserialize cached session: {}", e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!("Cache error during session lookup: {}", e);
            None
        }
    }
}

/// Stores a new session and returns its id together with the `Set-Cookie` value.
pub async fn start_session(
    cache: &dyn Cache,
    user: &SessionUser,
) -> Result<(String, String), CoreError> {
    let session_id = Uuid::new_v4().simple().to_string();
    let payload = serde_json::to_vec(user).map_err(|e| CoreError::Internal(e.to_string()))?;
    cache.set(&session_key(&session_id), &payload).await?;
    info!("Session started for identity {}", user.identity_id);

    let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
    Ok((session_id, cookie))
}

/// Drops the session and returns a `Set-Cookie` value that expires the cookie.
pub async fn end_session(cache: &dyn Cache, session_id: &str) -> Result<String, CoreError> {
    cache.delete(&session_key(session_id)).await?;
    cache.delete(&flash_key(session_id)).await?;
    Ok(format!(
        "{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
    ))
}

/// Message shown once on the next page rendered for this session.
pub async fn set_flash(cache: &dyn Cache, session_id: &str, message: &str) {
    if let Err(e) = cache.set(&flash_key(session_id), message.as_bytes()).await {
        warn!("Failed to store flash message: {}", e);
    }
}

pub async fn take_flash(cache: &dyn Cache, session_id: &str) -> Option<String> {
    let key = flash_key(session_id);
    let bytes = cache.get(&key).await.ok().flatten()?;
    if let Err(e) = cache.delete(&key).await {
        warn!("Failed to clear flash message: {}", e);
    }
    String::from_utf8(bytes).ok()
}

/// Middleware guarding pages that need a logged-in user. Anonymous requests
/// are redirected to the login page.
pub async fn require_session(
    State(app_state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(session_id) = session_id_from_headers(req.headers()) else {
        debug!("No session cookie on {}", req.uri().path());
        return Redirect::to(LOGIN_PATH).into_response();
    };

    match load_session(app_state.sessions.as_ref(), &session_id).await {
        Some(user) => {
            req.extensions_mut().insert(Session {
                id: session_id,
                user,
            });
            next.run(req).await
        }
        None => {
            debug!("Unknown or expired session on {}", req.uri().path());
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}
