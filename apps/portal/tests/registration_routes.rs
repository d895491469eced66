mod common;

use common::{PASSWORD, location, session_cookie, setup_test_app, validation};
use core_lib::Repository;
use http::StatusCode;

#[tokio::test]
async fn test_registration_with_valid_token_logs_in() {
    let app = setup_test_app();
    app.scheduling.issue_token("abc123", validation("111", "ProvCo", 7));

    let response = app.register("new@example.com", "New User", "abc123").await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/listar");
    assert!(app.scheduling.is_consumed("abc123"));

    let identity = app
        .repo
        .find_identity_by_email("new@example.com")
        .await
        .unwrap()
        .expect("identity created");
    let profile = app
        .repo
        .find_profile_by_identity(identity.id)
        .await
        .unwrap()
        .expect("profile created");
    let grants = app.repo.grants_for_profile(profile.id).await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].contract_id, 7);

    let provider = app.repo.find_provider_by_tax_id("111").await.unwrap().unwrap();
    assert_eq!(provider.system_url, common::SCHEDULING_URL);
    assert!(app.repo.find_client_by_tax_id("222").await.unwrap().is_some());

    let listing = app
        .get_with_session("/listar", &session_cookie(&response))
        .await;
    let body = listing.text();
    assert!(body.contains("Usuário cadastrado com sucesso!"));
    assert!(body.contains("New User"));
}

#[tokio::test]
async fn test_registration_with_invalid_token_does_not_keep_identity() {
    let app = setup_test_app();

    let response = app.register("new@example.com", "New User", "bogus").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.text().contains("Token inválido. Usuário não foi criado."));
    assert!(
        app.repo
            .find_identity_by_email("new@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_registration_failing_consumption_does_not_keep_identity() {
    let app = setup_test_app();
    app.scheduling.issue_token("abc123", validation("111", "ProvCo", 7));
    app.scheduling.set_fail_consume(true);

    let response = app.register("new@example.com", "New User", "abc123").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(
        app.repo
            .find_identity_by_email("new@example.com")
            .await
            .unwrap()
            .is_none()
    );
    assert!(app.repo.find_provider_by_tax_id("111").await.unwrap().is_none());
}

#[tokio::test]
async fn test_registration_of_existing_email_links_token() {
    let app = setup_test_app();
    let existing = app.account_without_grants("user@example.com").await;
    app.scheduling.issue_token("abc123", validation("111", "ProvCo", 7));

    let response = app.register("User@Example.com", "Another Name", "abc123").await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    let identity = app
        .repo
        .find_identity_by_email("user@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(identity.id, existing.identity.id);
    let profile = app.repo.find_profile_by_identity(identity.id).await.unwrap().unwrap();
    assert_eq!(profile.full_name, "No Grants");
    assert_eq!(app.repo.grants_for_profile(profile.id).await.unwrap().len(), 1);

    let listing = app
        .get_with_session("/listar", &session_cookie(&response))
        .await;
    assert!(listing.text().contains("Token associado com sucesso!"));
}

#[tokio::test]
async fn test_registration_of_existing_email_with_wrong_password() {
    let app = setup_test_app();
    app.account_without_grants("user@example.com").await;
    app.scheduling.issue_token("abc123", validation("111", "ProvCo", 7));

    let response = app
        .server
        .post("/cadastro/")
        .form(&[
            ("email", "user@example.com"),
            ("nome_completo", "Someone"),
            ("password1", "otherpass999"),
            ("password2", "otherpass999"),
            ("token", "abc123"),
        ])
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert!(response.text().contains("Credenciais inválidas para usuário existente."));
    assert!(!app.scheduling.is_consumed("abc123"));
}

#[tokio::test]
async fn test_registration_with_used_token_for_existing_email() {
    let app = setup_test_app();
    app.registered_session("first@example.com", "abc123", "111", 7)
        .await;
    app.account_without_grants("second@example.com").await;

    let response = app.register("second@example.com", "Second", "abc123").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.text().contains("Token inválido ou já utilizado."));
    assert!(
        app.repo
            .find_identity_by_email("second@example.com")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_registration_form_errors() {
    let app = setup_test_app();

    let response = app
        .server
        .post("/cadastro/")
        .form(&[
            ("email", "not-an-email"),
            ("nome_completo", "New User"),
            ("password1", PASSWORD),
            ("password2", "differentpass456"),
            ("token", ""),
        ])
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.text();
    assert!(body.contains("<strong>email</strong>"));
    assert!(body.contains("<strong>password2</strong>"));
    assert!(body.contains("<strong>token</strong>"));
}

#[tokio::test]
async fn test_add_token_links_additional_grant() {
    let app = setup_test_app();
    app.registered_session("user@example.com", "first", "111", 7)
        .await;
    app.scheduling.issue_token("second", validation("333", "OtherProv", 8));

    let response = app
        .server
        .post("/add-token/")
        .form(&[
            ("email", "user@example.com"),
            ("senha", PASSWORD),
            ("token", "second"),
        ])
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/listar");
    let identity = app
        .repo
        .find_identity_by_email("user@example.com")
        .await
        .unwrap()
        .unwrap();
    let profile = app.repo.find_profile_by_identity(identity.id).await.unwrap().unwrap();
    assert_eq!(app.repo.grants_for_profile(profile.id).await.unwrap().len(), 2);

    let listing = app
        .get_with_session("/listar", &session_cookie(&response))
        .await;
    assert!(listing.text().contains("Token adicionado com sucesso."));
}

#[tokio::test]
async fn test_add_token_with_invalid_credentials() {
    let app = setup_test_app();
    app.account_without_grants("user@example.com").await;
    app.scheduling.issue_token("abc123", validation("111", "ProvCo", 7));

    let response = app
        .server
        .post("/add-token/")
        .form(&[
            ("email", "user@example.com"),
            ("senha", "wrong_password_456"),
            ("token", "abc123"),
        ])
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert!(response.text().contains("Credenciais inválidas."));
    assert!(!app.scheduling.is_consumed("abc123"));
}

#[tokio::test]
async fn test_add_token_with_unknown_token() {
    let app = setup_test_app();
    let account = app.account_without_grants("user@example.com").await;

    let response = app
        .server
        .post("/add-token/")
        .form(&[
            ("email", "user@example.com"),
            ("senha", PASSWORD),
            ("token", "bogus"),
        ])
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.text().contains("Token inválido ou já utilizado."));
    assert!(
        app.repo
            .grants_for_profile(account.profile.id)
            .await
            .unwrap()
            .is_empty()
    );
}
