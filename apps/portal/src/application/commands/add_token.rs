use crate::AppState;
use crate::application::{
    ApplicationError,
    forms::{AddTokenForm, FieldErrors},
    pages::{Message, add_token_page},
};
use axum::{Form, extract::State, http::StatusCode, response::Response};
use core_lib::CommandHandler;
use tracing::warn;

use super::{
    login::{authenticate, login_and_redirect},
    redeem_token::{RedeemToken, RedemptionOutcome},
};

// GET /add-token/
pub async fn show_add_token_form() -> Result<Response, ApplicationError> {
    add_token_page(StatusCode::OK, &[], &FieldErrors::default())
}

// POST /add-token/
// Credentials are re-entered, so this works with or without a session.
pub async fn handle_add_token_request(
    State(state): State<AppState>,
    Form(payload): Form<AddTokenForm>,
) -> Result<Response, ApplicationError> {
    let valid = match payload.validate() {
        Ok(valid) => valid,
        Err(errors) => return add_token_page(StatusCode::UNPROCESSABLE_ENTITY, &[], &errors),
    };

    let Some(account) = authenticate(state.repo.as_ref(), &valid.email, &valid.password).await?
    else {
        warn!("Add-token attempt with invalid credentials for {}", valid.email);
        return add_token_page(
            StatusCode::UNAUTHORIZED,
            &[Message::error("Credenciais inválidas.")],
            &FieldErrors::default(),
        );
    };

    let outcome = state
        .redeem_token_handler()
        .handle(RedeemToken {
            profile_id: account.profile.id,
            token: valid.token,
        })
        .await?;

    match outcome {
        RedemptionOutcome::Redeemed(_) => {
            login_and_redirect(&state, &account, Some("Token adicionado com sucesso.")).await
        }
        RedemptionOutcome::Rejected => add_token_page(
            StatusCode::BAD_REQUEST,
            &[Message::error("Token inválido ou já utilizado.")],
            &FieldErrors::default(),
        ),
    }
}
