use crate::AppState;
use crate::application::{
    ApplicationError,
    forms::{LoginForm, normalize_email},
    middleware::{
        Session, SessionUser,
        session::{LOGIN_PATH, end_session, set_flash, start_session},
    },
    pages::{Message, login_page},
};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
    Extension, Form,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use core_lib::{CoreError, Repository, domain::account::Account};
use tracing::{info, warn};

pub const LIST_PATH: &str = "/listar";

pub fn hash_password(password: &str) -> Result<String, CoreError> {
    let salt_bytes: [u8; 16] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| CoreError::Internal(format!("password salt: {e}")))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CoreError::Internal(format!("password hash: {e}")))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

/// Looks up the identity by email and checks the password.
/// `None` covers both an unknown email and a wrong password.
pub async fn authenticate(
    repository: &dyn Repository,
    email: &str,
    password: &str,
) -> Result<Option<Account>, CoreError> {
    let Some(identity) = repository.find_identity_by_email(email).await? else {
        return Ok(None);
    };
    if !verify_password(password, &identity.password_hash) {
        return Ok(None);
    }
    let profile = repository
        .find_profile_by_identity(identity.id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("profile of identity {}", identity.id)))?;
    Ok(Some(Account { identity, profile }))
}

/// Starts a session for `account`, queues `flash` and redirects to the listing.
pub async fn login_and_redirect(
    state: &AppState,
    account: &Account,
    flash: Option<&str>,
) -> Result<Response, ApplicationError> {
    let user = SessionUser::from(account);
    let (session_id, cookie) = start_session(state.sessions.as_ref(), &user).await?;
    if let Some(message) = flash {
        set_flash(state.sessions.as_ref(), &session_id, message).await;
    }
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(LIST_PATH)).into_response())
}

// GET / and /login/
pub async fn show_login() -> Result<Response, ApplicationError> {
    login_page(StatusCode::OK, &[])
}

// POST / and /login/
pub async fn handle_login_request(
    State(state): State<AppState>,
    Form(payload): Form<LoginForm>,
) -> Result<Response, ApplicationError> {
    let email = normalize_email(&payload.username);
    if email.is_empty() || payload.senha.is_empty() {
        return login_page(
            StatusCode::UNAUTHORIZED,
            &[Message::error("Usuário ou senha inválidos.")],
        );
    }

    match authenticate(state.repo.as_ref(), &email, &payload.senha).await? {
        Some(account) => {
            info!("Login succeeded for identity {}", account.identity.id);
            login_and_redirect(&state, &account, None).await
        }
        None => {
            warn!("Login failed for {}", email);
            login_page(
                StatusCode::UNAUTHORIZED,
                &[Message::error("Usuário ou senha inválidos.")],
            )
        }
    }
}

// GET /logout/
pub async fn handle_logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, ApplicationError> {
    let cookie = end_session(state.sessions.as_ref(), &session.id).await?;
    info!("Session ended for identity {}", session.user.identity_id);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(LOGIN_PATH)).into_response())
}
