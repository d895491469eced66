use async_trait::async_trait;
use std::{error::Error as StdError, future::Future};

// Declare modules
pub mod adapters;
pub mod domain;

use domain::{
    account::{Account, Identity, NewAccount, Profile},
    company::{Client, Contract, Provider},
    grant::{Redemption, TokenGrant},
    scheduling::{RequestSubmission, TokenValidation},
    staffing_request::{NewStaffingRequest, RequestSummary, StaffingRequest},
};

// Common error type for the core library
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// State the operation depends on is missing (e.g. a profile without grants).
    #[error("{0}")]
    Precondition(String),
    #[error("Scheduling service error: {0}")]
    Remote(String),
    #[error("Infrastructure error: {0}")]
    Infrastructure(#[from] Box<dyn StdError + Send + Sync>),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                CoreError::AlreadyExists(db.message().to_string())
            }
            _ => CoreError::Infrastructure(Box::new(err)),
        }
    }
}

// Marker trait for commands
pub trait Command: Send + Sync + 'static {}

// Port for handling commands (workflows)
pub trait CommandHandler<C: Command>: Send + Sync {
    type Output: Send;

    fn handle(&self, command: C) -> impl Future<Output = Result<Self::Output, CoreError>> + Send;
}

/// Port for the relational store behind the portal.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, CoreError>;

    /// Creates an identity and its profile. Fails with `AlreadyExists` if the
    /// email is taken.
    async fn create_account(&self, account: NewAccount) -> Result<Account, CoreError>;

    /// Removes an identity together with its profile and the profile's grants.
    async fn delete_identity(&self, identity_id: i64) -> Result<(), CoreError>;

    async fn find_profile_by_identity(&self, identity_id: i64)
        -> Result<Option<Profile>, CoreError>;

    async fn find_provider_by_tax_id(&self, tax_id: &str) -> Result<Option<Provider>, CoreError>;

    async fn find_client_by_tax_id(&self, tax_id: &str) -> Result<Option<Client>, CoreError>;

    async fn find_contract(&self, contract_id: i64) -> Result<Option<Contract>, CoreError>;

    /// Upserts provider, client and contract, then inserts the grant.
    /// Fails with `AlreadyExists` if the token string was already recorded.
    async fn record_redemption(&self, redemption: Redemption) -> Result<TokenGrant, CoreError>;

    /// Grants of a profile, oldest first (ties broken by id).
    async fn grants_for_profile(&self, profile_id: i64) -> Result<Vec<TokenGrant>, CoreError>;

    async fn insert_request(
        &self,
        request: NewStaffingRequest,
    ) -> Result<StaffingRequest, CoreError>;

    /// Requests whose provider is one of `provider_ids`, newest first.
    async fn requests_for_providers(
        &self,
        provider_ids: &[i64],
    ) -> Result<Vec<RequestSummary>, CoreError>;
}

/// Port for the remote scheduling service.
#[async_trait]
pub trait SchedulingApi: Send + Sync {
    /// `None` when the token is unknown, expired or the service is unreachable.
    async fn validate_token(&self, token: &str) -> Option<TokenValidation>;

    /// `true` only if the service acknowledged the token as used.
    async fn consume_token(&self, token: &str) -> bool;

    async fn submit_request(&self, submission: &RequestSubmission) -> Result<(), CoreError>;
}

// Port for caching data (sessions, flash messages)
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError>;
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), CoreError>;
    async fn delete(&self, key: &str) -> Result<(), CoreError>;
}
