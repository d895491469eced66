use crate::AppState;
use crate::application::{
    ApplicationError,
    forms::{FieldErrors, RegistrationForm},
    pages::{Message, registration_page},
};
use axum::{Form, extract::State, http::StatusCode, response::Response};
use core_lib::{
    Command, CommandHandler, CoreError, Repository,
    domain::account::{Account, NewAccount},
};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{
    login::{authenticate, hash_password, login_and_redirect},
    redeem_token::{RedeemToken, RedeemTokenHandler, RedemptionOutcome},
};

#[derive(Debug, Clone)]
pub struct RegisterAccount {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub token: String,
}

impl Command for RegisterAccount {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// A new identity was created and the token redeemed for it.
    Registered(Account),
    /// The email already had an account; the token was redeemed for it.
    LinkedExisting(Account),
    /// The email already had an account but the password did not match.
    InvalidCredentials,
    /// The token was not redeemed. A freshly created identity has been removed.
    TokenRejected { existing: bool },
}

pub struct RegisterAccountHandler {
    repository: Arc<dyn Repository>,
    redeemer: RedeemTokenHandler,
}

impl RegisterAccountHandler {
    pub fn new(repository: Arc<dyn Repository>, redeemer: RedeemTokenHandler) -> Self {
        Self {
            repository,
            redeemer,
        }
    }

    async fn redeem(&self, profile_id: i64, token: &str) -> Result<RedemptionOutcome, CoreError> {
        self.redeemer
            .handle(RedeemToken {
                profile_id,
                token: token.to_string(),
            })
            .await
    }

    async fn remove_new_identity(&self, account: &Account) {
        match self.repository.delete_identity(account.identity.id).await {
            Ok(()) => info!(
                "Removed identity {} after failed token redemption",
                account.identity.id
            ),
            Err(e) => error!(
                "Failed to remove identity {} after failed token redemption: {}",
                account.identity.id, e
            ),
        }
    }

    async fn link_existing(
        &self,
        command: &RegisterAccount,
    ) -> Result<RegistrationOutcome, CoreError> {
        let Some(account) =
            authenticate(self.repository.as_ref(), &command.email, &command.password).await?
        else {
            warn!("Registration for existing email {} with wrong password", command.email);
            return Ok(RegistrationOutcome::InvalidCredentials);
        };
        match self.redeem(account.profile.id, &command.token).await? {
            RedemptionOutcome::Redeemed(_) => Ok(RegistrationOutcome::LinkedExisting(account)),
            RedemptionOutcome::Rejected => Ok(RegistrationOutcome::TokenRejected { existing: true }),
        }
    }
}

impl CommandHandler<RegisterAccount> for RegisterAccountHandler {
    type Output = RegistrationOutcome;

    async fn handle(&self, command: RegisterAccount) -> Result<RegistrationOutcome, CoreError> {
        if self
            .repository
            .find_identity_by_email(&command.email)
            .await?
            .is_some()
        {
            return self.link_existing(&command).await;
        }

        let created = self
            .repository
            .create_account(NewAccount {
                email: command.email.clone(),
                password_hash: hash_password(&command.password)?,
                full_name: command.full_name.clone(),
            })
            .await;
        let account = match created {
            Ok(account) => account,
            // Another registration created the email after the lookup above.
            Err(CoreError::AlreadyExists(_)) => return self.link_existing(&command).await,
            Err(e) => return Err(e),
        };
        info!("Identity {} created", account.identity.id);

        match self.redeem(account.profile.id, &command.token).await {
            Ok(RedemptionOutcome::Redeemed(_)) => Ok(RegistrationOutcome::Registered(account)),
            Ok(RedemptionOutcome::Rejected) => {
                self.remove_new_identity(&account).await;
                Ok(RegistrationOutcome::TokenRejected { existing: false })
            }
            Err(e) => {
                self.remove_new_identity(&account).await;
                Err(e)
            }
        }
    }
}

// GET /cadastro/
pub async fn show_registration_form() -> Result<Response, ApplicationError> {
    registration_page(StatusCode::OK, &[], &FieldErrors::default())
}

// POST /cadastro/
pub async fn handle_registration_request(
    State(state): State<AppState>,
    Form(payload): Form<RegistrationForm>,
) -> Result<Response, ApplicationError> {
    let valid = match payload.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            return registration_page(StatusCode::UNPROCESSABLE_ENTITY, &[], &errors);
        }
    };

    let handler = RegisterAccountHandler::new(state.repo.clone(), state.redeem_token_handler());
    let command = RegisterAccount {
        email: valid.email,
        full_name: valid.full_name,
        password: valid.password,
        token: valid.token,
    };

    let (status, text) = match handler.handle(command).await? {
        RegistrationOutcome::Registered(account) => {
            return login_and_redirect(&state, &account, Some("Usuário cadastrado com sucesso!"))
                .await;
        }
        RegistrationOutcome::LinkedExisting(account) => {
            return login_and_redirect(&state, &account, Some("Token associado com sucesso!"))
                .await;
        }
        RegistrationOutcome::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "Credenciais inválidas para usuário existente.",
        ),
        RegistrationOutcome::TokenRejected { existing: true } => {
            (StatusCode::BAD_REQUEST, "Token inválido ou já utilizado.")
        }
        RegistrationOutcome::TokenRejected { existing: false } => (
            StatusCode::BAD_REQUEST,
            "Token inválido. Usuário não foi criado.",
        ),
    };
    registration_page(status, &[Message::error(text)], &FieldErrors::default())
}
