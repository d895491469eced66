use crate::AppState;
use crate::application::{
    ApplicationError,
    forms::{FieldErrors, NewRequestForm},
    middleware::{Session, session::set_flash},
    pages::{Message, new_request_page},
};
use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use core_lib::{
    Command, CommandHandler, CoreError, Repository, SchedulingApi,
    domain::{
        scheduling::RequestSubmission,
        staffing_request::{NewStaffingRequest, StaffingRequest},
    },
};
use std::sync::Arc;
use tracing::{info, warn};

use super::login::LIST_PATH;

#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub profile_id: i64,
    pub professional_type: String,
    pub shift: String,
    pub notes: String,
}

impl Command for SubmitRequest {}

/// Persists a staffing request, then mirrors it to the scheduling service.
/// The local row stands even when mirroring fails.
pub struct SubmitRequestHandler {
    repository: Arc<dyn Repository>,
    scheduling: Arc<dyn SchedulingApi>,
}

impl SubmitRequestHandler {
    pub fn new(repository: Arc<dyn Repository>, scheduling: Arc<dyn SchedulingApi>) -> Self {
        Self {
            repository,
            scheduling,
        }
    }
}

impl CommandHandler<SubmitRequest> for SubmitRequestHandler {
    type Output = StaffingRequest;

    async fn handle(&self, command: SubmitRequest) -> Result<StaffingRequest, CoreError> {
        // The oldest grant decides contract, client and provider.
        let grant = self
            .repository
            .grants_for_profile(command.profile_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                CoreError::Precondition("Nenhum token associado ao seu usuário.".into())
            })?;
        let provider_id = grant.provider_id.ok_or_else(|| {
            CoreError::Precondition("O token associado não possui fornecedor.".into())
        })?;
        let contract = self
            .repository
            .find_contract(grant.contract_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("contract {}", grant.contract_id)))?;

        let stored = self
            .repository
            .insert_request(NewStaffingRequest {
                client_id: contract.client_id,
                provider_id,
                contract_id: contract.id,
                requester_profile_id: command.profile_id,
                professional_type: command.professional_type,
                shift: command.shift,
                notes: command.notes,
            })
            .await?;
        info!(
            "Staffing request {} stored for provider {}",
            stored.id, stored.provider_id
        );

        let submission = RequestSubmission {
            tipo_profissional: stored.professional_type.clone(),
            jornada: stored.shift.clone(),
            observacoes: stored.notes.clone(),
            usuario_solicitante_id: stored.requester_profile_id,
            cli_fornec_id: stored.client_id,
            empresa_contratante_id: stored.provider_id,
            contrato_id: stored.contract_id,
        };
        if let Err(e) = self.scheduling.submit_request(&submission).await {
            warn!(
                "Staffing request {} was not mirrored to the scheduling service: {}",
                stored.id, e
            );
        }

        Ok(stored)
    }
}

// GET /nova/
pub async fn show_new_request_form() -> Result<Response, ApplicationError> {
    new_request_page(StatusCode::OK, &[], &FieldErrors::default())
}

// POST /nova/
pub async fn handle_new_request(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(payload): Form<NewRequestForm>,
) -> Result<Response, ApplicationError> {
    let valid = match payload.validate() {
        Ok(valid) => valid,
        Err(errors) => return new_request_page(StatusCode::UNPROCESSABLE_ENTITY, &[], &errors),
    };

    let handler = SubmitRequestHandler::new(state.repo.clone(), state.scheduling.clone());
    let command = SubmitRequest {
        profile_id: session.user.profile_id,
        professional_type: valid.professional_type,
        shift: valid.shift,
        notes: valid.notes,
    };

    match handler.handle(command).await {
        Ok(_) => {
            set_flash(
                state.sessions.as_ref(),
                &session.id,
                "Solicitação criada com sucesso!",
            )
            .await;
            Ok(Redirect::to(LIST_PATH).into_response())
        }
        Err(CoreError::Precondition(message)) => new_request_page(
            StatusCode::BAD_REQUEST,
            &[Message::error(message)],
            &FieldErrors::default(),
        ),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_lib::{
        adapters::{
            in_memory_repository::InMemoryRepository, in_memory_scheduling::InMemorySchedulingApi,
        },
        domain::{
            account::NewAccount,
            company::{ClientUpsert, ProviderUpsert},
            grant::Redemption,
        },
    };

    async fn profile_with_grant(repo: &InMemoryRepository, grant: bool) -> i64 {
        let account = repo
            .create_account(NewAccount {
                email: "req@example.com".into(),
                password_hash: "hash".into(),
                full_name: "Req User".into(),
            })
            .await
            .unwrap();
        if grant {
            repo.record_redemption(Redemption {
                profile_id: account.profile.id,
                token: "abc123".into(),
                client_email: "c@x.com".into(),
                provider: ProviderUpsert {
                    tax_id: "111".into(),
                    name: "ProvCo".into(),
                    email: "c@x.com".into(),
                    system_url: "http://escala.local/".into(),
                },
                client: ClientUpsert {
                    tax_id: "222".into(),
                    name: "ClientCo".into(),
                    email: "c@x.com".into(),
                    phone: "555".into(),
                },
                contract_id: 7,
            })
            .await
            .unwrap();
        }
        account.profile.id
    }

    fn command(profile_id: i64) -> SubmitRequest {
        SubmitRequest {
            profile_id,
            professional_type: "Enfermeiro".into(),
            shift: "12x36".into(),
            notes: "Plantão noturno".into(),
        }
    }

    #[tokio::test]
    async fn test_submit_stores_and_mirrors() {
        let repo = InMemoryRepository::default();
        let api = InMemorySchedulingApi::default();
        let profile_id = profile_with_grant(&repo, true).await;
        let handler = SubmitRequestHandler::new(Arc::new(repo.clone()), Arc::new(api.clone()));

        let stored = handler.handle(command(profile_id)).await.unwrap();

        let provider = repo.find_provider_by_tax_id("111").await.unwrap().unwrap();
        let client = repo.find_client_by_tax_id("222").await.unwrap().unwrap();
        assert_eq!(stored.provider_id, provider.id);
        assert_eq!(stored.client_id, client.id);
        assert_eq!(stored.contract_id, 7);

        let sent = api.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].contrato_id, 7);
        assert_eq!(sent[0].usuario_solicitante_id, profile_id);
        assert_eq!(sent[0].empresa_contratante_id, provider.id);
        assert_eq!(sent[0].cli_fornec_id, client.id);
    }

    #[tokio::test]
    async fn test_mirroring_failure_keeps_local_row() {
        let repo = InMemoryRepository::default();
        let api = InMemorySchedulingApi::default();
        api.set_fail_submit(true);
        let profile_id = profile_with_grant(&repo, true).await;
        let handler = SubmitRequestHandler::new(Arc::new(repo.clone()), Arc::new(api.clone()));

        let stored = handler.handle(command(profile_id)).await.unwrap();

        let visible = repo
            .requests_for_providers(&[stored.provider_id])
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(api.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_profile_without_grants_is_a_precondition_error() {
        let repo = InMemoryRepository::default();
        let api = InMemorySchedulingApi::default();
        let profile_id = profile_with_grant(&repo, false).await;
        let handler = SubmitRequestHandler::new(Arc::new(repo.clone()), Arc::new(api.clone()));

        let result = handler.handle(command(profile_id)).await;

        assert!(matches!(result, Err(CoreError::Precondition(_))));
        assert!(api.submissions().is_empty());
    }
}
