use axum::{
    Router,
    extract::Path,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use core_lib::{Cache, Repository, SchedulingApi};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod application;
pub mod config;

use application::{
    commands::{
        RedeemTokenHandler,
        add_token::{handle_add_token_request, show_add_token_form},
        login::{handle_login_request, handle_logout, show_login},
        register_account::{handle_registration_request, show_registration_form},
        submit_request::{handle_new_request, show_new_request_form},
    },
    middleware::require_session,
    pages::embedded_asset,
    query::handle_list_requests,
};

// Holds shared dependencies
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub scheduling: Arc<dyn SchedulingApi>,
    pub sessions: Arc<dyn Cache>,
    /// Stored as the system URL of providers created on redemption.
    pub scheduling_base_url: String,
}

impl AppState {
    pub fn redeem_token_handler(&self) -> RedeemTokenHandler {
        RedeemTokenHandler::new(
            self.repo.clone(),
            self.scheduling.clone(),
            self.scheduling_base_url.clone(),
        )
    }
}

pub fn create_app(app_state: AppState) -> Router {
    let protected = Router::new()
        .route("/logout/", get(handle_logout))
        .route("/listar", get(handle_list_requests))
        .route(
            "/nova/",
            get(show_new_request_form).post(handle_new_request),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            require_session,
        ));

    Router::new()
        .route("/", get(show_login).post(handle_login_request))
        .route("/login/", get(show_login).post(handle_login_request))
        .route(
            "/cadastro/",
            get(show_registration_form).post(handle_registration_request),
        )
        .route(
            "/add-token/",
            get(show_add_token_form).post(handle_add_token_request),
        )
        .route("/health", get(health))
        .route("/assets/{*path}", get(static_asset))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn static_asset(Path(path): Path<String>) -> Response {
    embedded_asset(&format!("assets/{path}"))
}

pub async fn health() -> impl IntoResponse {
    "ok"
}
