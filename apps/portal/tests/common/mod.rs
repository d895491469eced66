#![allow(dead_code)]

use axum::Router;
use axum_test::{TestResponse, TestServer};
use core_lib::{
    Cache, Repository, SchedulingApi,
    adapters::{
        in_memory_cache::InMemoryCache, in_memory_repository::InMemoryRepository,
        in_memory_scheduling::InMemorySchedulingApi,
    },
    domain::{
        account::{Account, NewAccount},
        scheduling::{RemoteClient, RemoteCompany, RemoteContract, TokenValidation},
    },
};
use http::{HeaderValue, header};
use portal::{AppState, application::commands::login::hash_password, create_app};
use std::sync::Arc;

pub const SCHEDULING_URL: &str = "http://escala.test/api/";
pub const PASSWORD: &str = "complexpass123";

pub struct TestApp {
    pub server: TestServer,
    pub repo: InMemoryRepository,
    pub scheduling: InMemorySchedulingApi,
}

// Helper function to set up the test application with in-memory dependencies
pub fn setup_test_app() -> TestApp {
    let repo = InMemoryRepository::default();
    let scheduling = InMemorySchedulingApi::default();
    let sessions: Arc<dyn Cache> = Arc::new(InMemoryCache::default());

    let app_state = AppState {
        repo: Arc::new(repo.clone()) as Arc<dyn Repository>,
        scheduling: Arc::new(scheduling.clone()) as Arc<dyn SchedulingApi>,
        sessions,
        scheduling_base_url: SCHEDULING_URL.to_string(),
    };

    let app: Router = create_app(app_state);
    let server = TestServer::new(app).expect("Failed to create TestServer");
    TestApp {
        server,
        repo,
        scheduling,
    }
}

/// Validation payload for a token of `provider_tax_id` under `contract_id`.
pub fn validation(provider_tax_id: &str, provider_name: &str, contract_id: i64) -> TokenValidation {
    TokenValidation {
        email_cliente: Some("c@x.com".into()),
        empresa_contratante: RemoteCompany {
            cnpj: provider_tax_id.into(),
            razao_social: provider_name.into(),
        },
        contrato_cliente: RemoteContract {
            id: contract_id,
            cli_fornec: RemoteClient {
                cnpj: "222".into(),
                razao_social: "ClientCo".into(),
                email: Some("c@x.com".into()),
                telefone: Some("555".into()),
            },
        },
    }
}

/// `name=value` part of the session cookie set by `response`.
pub fn session_cookie(response: &TestResponse) -> HeaderValue {
    let set_cookie = response.header(header::SET_COOKIE);
    let pair = set_cookie
        .to_str()
        .expect("set-cookie is ascii")
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string();
    HeaderValue::from_str(&pair).expect("valid cookie header")
}

pub fn location(response: &TestResponse) -> String {
    response
        .header(header::LOCATION)
        .to_str()
        .expect("location is ascii")
        .to_string()
}

impl TestApp {
    pub async fn register(&self, email: &str, full_name: &str, token: &str) -> TestResponse {
        self.server
            .post("/cadastro/")
            .form(&[
                ("email", email),
                ("nome_completo", full_name),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
                ("token", token),
            ])
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.server
            .post("/login/")
            .form(&[("username", email), ("senha", password)])
            .await
    }

    /// Registers `email` with a freshly issued token and returns the session cookie.
    pub async fn registered_session(
        &self,
        email: &str,
        token: &str,
        provider_tax_id: &str,
        contract_id: i64,
    ) -> HeaderValue {
        self.scheduling.issue_token(
            token,
            validation(provider_tax_id, &format!("Provider {provider_tax_id}"), contract_id),
        );
        let response = self.register(email, "Test User", token).await;
        assert_eq!(location(&response), "/listar");
        session_cookie(&response)
    }

    /// Account created directly in the store, without any token grant.
    pub async fn account_without_grants(&self, email: &str) -> Account {
        self.repo
            .create_account(NewAccount {
                email: email.into(),
                password_hash: hash_password(PASSWORD).expect("hash password"),
                full_name: "No Grants".into(),
            })
            .await
            .expect("create account")
    }

    pub async fn get_with_session(&self, path: &str, cookie: &HeaderValue) -> TestResponse {
        self.server
            .get(path)
            .add_header(header::COOKIE, cookie.clone())
            .await
    }
}
