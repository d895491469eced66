use crate::AppState;
use crate::application::{
    ApplicationError,
    middleware::{Session, session::take_flash},
    pages::{Message, request_list_page},
};
use axum::{Extension, extract::State, response::Response};
use core_lib::{CoreError, Repository, domain::staffing_request::RequestSummary};
use tracing::debug;

/// Requests whose provider is reachable through one of the profile's grants.
/// A profile without grants sees nothing.
pub async fn visible_requests(
    repository: &dyn Repository,
    profile_id: i64,
) -> Result<Vec<RequestSummary>, CoreError> {
    let mut provider_ids: Vec<i64> = repository
        .grants_for_profile(profile_id)
        .await?
        .into_iter()
        .filter_map(|grant| grant.provider_id)
        .collect();
    provider_ids.sort_unstable();
    provider_ids.dedup();

    if provider_ids.is_empty() {
        debug!("Profile {} has no provider grants", profile_id);
        return Ok(Vec::new());
    }
    repository.requests_for_providers(&provider_ids).await
}

// GET /listar
pub async fn handle_list_requests(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, ApplicationError> {
    let rows = visible_requests(state.repo.as_ref(), session.user.profile_id).await?;
    let messages: Vec<Message> = take_flash(state.sessions.as_ref(), &session.id)
        .await
        .map(Message::success)
        .into_iter()
        .collect();
    request_list_page(&session.user.full_name, &messages, &rows)
}
