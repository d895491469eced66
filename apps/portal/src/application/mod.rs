use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use core_lib::CoreError;
use tracing::{error, warn};

// Declare sub-modules within the application layer
pub mod commands;
pub mod forms;
pub mod middleware;
pub mod pages;
pub mod query;

// Top-level error type for the application layer
#[derive(thiserror::Error, Debug)]
pub enum ApplicationError {
    #[error("Core Error: {0}")]
    Core(#[from] CoreError),

    #[error("Configuration Error: {0}")]
    Configuration(String),

    #[error("Template Error: {0}")]
    Template(String),
}

pub fn map_core_error(err: &CoreError) -> StatusCode {
    match err {
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Validation(_) | CoreError::Precondition(_) => StatusCode::BAD_REQUEST,
        CoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        CoreError::AlreadyExists(_) => StatusCode::CONFLICT,
        CoreError::Remote(_) => StatusCode::BAD_GATEWAY,
        CoreError::Infrastructure(_) | CoreError::Configuration(_) | CoreError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApplicationError::Core(e) => map_core_error(e),
            ApplicationError::Configuration(_) | ApplicationError::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            error!("Request failed: {:?}", self);
            return (status, "Erro interno. Tente novamente mais tarde.").into_response();
        }
        warn!("Request rejected: {}", self);
        (status, self.to_string()).into_response()
    }
}
