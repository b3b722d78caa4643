//! API Integration Tests
//!
//! Drives the real routers over in-memory storage, one request at a time.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use walletsync_account::{
    AccountLedger, IdentityDirectory, LocalDirectory, ProfileSyncPropagator, SyncConfig,
};
use walletsync_api::{create_combined_router, AccountState, ApiConfig, IdentityState};
use walletsync_auth::{AuthConfig, AuthService, PasswordConfig};
use walletsync_db::Database;

const SERVICE_TOKEN: &str = "integration-service-token";

struct TestApp {
    router: Router,
    identity: Arc<IdentityState>,
    account: Arc<AccountState>,
}

fn test_app(service_token: Option<&str>) -> TestApp {
    let db = Database::in_memory();

    let mut config = AuthConfig::default();
    config.jwt.secret = "api-integration-test-secret-32-bytes!!".to_string();
    config.password = PasswordConfig {
        memory_cost: 1024,
        time_cost: 1,
        ..PasswordConfig::default()
    };
    config.service.service_token = service_token.map(String::from);

    let auth = AuthService::new(db.identities.clone(), config).unwrap();
    let directory: Arc<dyn IdentityDirectory> =
        Arc::new(LocalDirectory::new(auth.clone(), Duration::from_secs(5)));
    let propagator = Arc::new(ProfileSyncPropagator::spawn(directory.clone(), &SyncConfig::default()));
    let ledger = AccountLedger::new(db.accounts.clone(), directory, propagator);

    let identity = Arc::new(IdentityState::new(db.clone(), auth.clone()));
    let account = Arc::new(AccountState::new(db, ledger, auth.tokens.clone()));
    let router = create_combined_router(identity.clone(), account.clone(), &ApiConfig::default());

    TestApp {
        router,
        identity,
        account,
    }
}

/// Test helper to make a request and get JSON response
async fn json_request(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        request = request.header("Authorization", format!("Bearer {}", token));
    }

    let body = match body {
        Some(json_body) => Body::from(serde_json::to_vec(&json_body).unwrap()),
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!(null));

    (status, json)
}

async fn register_and_login(router: &Router, username: &str, password: &str, name: &str) -> String {
    let (status, _) = json_request(
        router,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "username": username, "password": password, "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = json_request(
        router,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], username);
    body["token"].as_str().unwrap().to_string()
}

// =============================================================================
// Identity service
// =============================================================================

mod identity {
    use super::*;

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let app = test_app(None);
        register_and_login(&app.router, "alice", "pw123", "Alice A").await;

        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({ "username": "alice", "password": "x", "name": "Other" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "USERNAME_TAKEN");
    }

    #[tokio::test]
    async fn registration_requires_all_fields() {
        let app = test_app(None);
        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({ "username": "alice", "password": "pw123" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let app = test_app(None);
        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/register")
                    .header("Content-Type", "application/json")
                    .body(Body::from("{\"username\": "))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Well-formed JSON of the wrong shape is also a 400
        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": 42 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST_BODY");
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let app = test_app(None);
        register_and_login(&app.router, "alice", "pw123", "Alice A").await;

        let (wrong_status, wrong_body) = json_request(
            &app.router,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "nope" })),
        )
        .await;
        let (unknown_status, unknown_body) = json_request(
            &app.router,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "nobody", "password": "pw123" })),
        )
        .await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_body, unknown_body);
    }

    #[tokio::test]
    async fn public_info_only_for_owner() {
        let app = test_app(None);
        let alice = register_and_login(&app.router, "alice", "pw123", "Alice A").await;
        register_and_login(&app.router, "bob", "pw456", "Bob B").await;

        let (status, body) =
            json_request(&app.router, "GET", "/api/v1/authinfo/alice", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "username": "alice", "name": "Alice A" }));

        let (status, _) =
            json_request(&app.router, "GET", "/api/v1/authinfo/bob", Some(&alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = json_request(&app.router, "GET", "/api/v1/authinfo/alice", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn display_name_update_requires_service_token() {
        let app = test_app(Some(SERVICE_TOKEN));
        let alice = register_and_login(&app.router, "alice", "pw123", "Alice A").await;
        let update = json!({ "username": "alice", "name": "Alice Z" });

        let (status, body) = json_request(
            &app.router,
            "PUT",
            "/api/v1/authinfo/update",
            None,
            Some(update.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_SERVICE_CREDENTIAL");

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/v1/authinfo/update")
                    .header("Content-Type", "application/json")
                    .header("X-Service-Token", SERVICE_TOKEN)
                    .body(Body::from(serde_json::to_vec(&update).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (_, body) =
            json_request(&app.router, "GET", "/api/v1/authinfo/alice", Some(&alice), None).await;
        assert_eq!(body["name"], "Alice Z");
    }

    #[tokio::test]
    async fn display_name_update_open_without_service_token() {
        let app = test_app(None);
        let (status, _) = json_request(
            &app.router,
            "PUT",
            "/api/v1/authinfo/update",
            None,
            Some(json!({ "username": "ghost", "name": "Boo" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

// =============================================================================
// Account service
// =============================================================================

mod account {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn alice_end_to_end() {
        let app = test_app(None);
        let token = register_and_login(&app.router, "alice", "pw123", "Alice A").await;

        let (status, body) = json_request(&app.router, "GET", "/api/v1/account", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["name"], "Alice A");
        assert_eq!(body["bank_name"], "");
        assert_eq!(body["wallet"], 0.0);

        let (status, _) = json_request(
            &app.router,
            "POST",
            "/api/v1/account/deposit",
            Some(&token),
            Some(json!({ "amount": 25.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = json_request(&app.router, "GET", "/api/v1/account", Some(&token), None).await;
        assert_eq!(body["wallet"], 25.5);
    }

    #[tokio::test]
    async fn requests_without_valid_token_rejected() {
        let app = test_app(None);

        let (status, body) = json_request(&app.router, "GET", "/api/v1/account", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_TOKEN");

        let (status, body) =
            json_request(&app.router, "GET", "/api/v1/account", Some("not.a.token"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn expired_token_rejected() {
        let app = test_app(None);
        register_and_login(&app.router, "alice", "pw123", "Alice A").await;

        let stale = app
            .identity
            .auth
            .tokens
            .issue_at("alice", Utc::now() - chrono::Duration::hours(2))
            .unwrap();

        let (status, body) =
            json_request(&app.router, "GET", "/api/v1/account", Some(&stale.token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn non_positive_deposit_rejected_without_effect() {
        let app = test_app(None);
        let token = register_and_login(&app.router, "alice", "pw123", "Alice A").await;
        json_request(&app.router, "GET", "/api/v1/account", Some(&token), None).await;

        for amount in [0.0, -10.0] {
            let (status, body) = json_request(
                &app.router,
                "POST",
                "/api/v1/account/deposit",
                Some(&token),
                Some(json!({ "amount": amount })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["code"], "INVALID_AMOUNT");
        }

        let (_, body) = json_request(&app.router, "GET", "/api/v1/account", Some(&token), None).await;
        assert_eq!(body["wallet"], 0.0);
    }

    #[tokio::test]
    async fn deposit_never_creates_account() {
        let app = test_app(None);
        let token = register_and_login(&app.router, "alice", "pw123", "Alice A").await;

        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/v1/account/deposit",
            Some(&token),
            Some(json!({ "amount": 10.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "ACCOUNT_NOT_FOUND");
    }

    #[tokio::test]
    async fn profile_update_visible_and_propagated() {
        let app = test_app(None);
        let token = register_and_login(&app.router, "alice", "pw123", "Alice A").await;

        let (status, body) = json_request(
            &app.router,
            "PUT",
            "/api/v1/account/update",
            Some(&token),
            Some(json!({ "name": "Alice B", "bank_name": "First Bank" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Alice B");
        assert_eq!(body["wallet"], 0.0);

        let (_, body) = json_request(&app.router, "GET", "/api/v1/account", Some(&token), None).await;
        assert_eq!(body["bank_name"], "First Bank");

        app.account.ledger.propagator().shutdown().await;
        let (_, body) =
            json_request(&app.router, "GET", "/api/v1/authinfo/alice", Some(&token), None).await;
        assert_eq!(body["name"], "Alice B");
    }
}

// =============================================================================
// Profiles
// =============================================================================

mod profile {
    use super::*;

    async fn create_internal(router: &Router, service_token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/api/v1/profile/internal")
            .header("Content-Type", "application/json");
        if let Some(token) = service_token {
            request = request.header("X-Service-Token", token);
        }

        let response = router
            .clone()
            .oneshot(request.body(Body::from(serde_json::to_vec(&body).unwrap())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(json!(null)))
    }

    #[tokio::test]
    async fn registration_provisions_profile() {
        let app = test_app(None);
        let token = register_and_login(&app.router, "alice", "pw123", "Alice A").await;

        let (status, body) =
            json_request(&app.router, "GET", "/api/v1/profile/alice", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["display_name"], "Alice A");
        assert_eq!(body["timezone"], "UTC");
        assert_eq!(body["email"], "");
    }

    #[tokio::test]
    async fn profile_is_owner_only() {
        let app = test_app(None);
        register_and_login(&app.router, "alice", "pw123", "Alice A").await;
        let bob = register_and_login(&app.router, "bob", "pw456", "Bob B").await;

        let (status, body) =
            json_request(&app.router, "GET", "/api/v1/profile/alice", Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let (status, _) = json_request(
            &app.router,
            "PUT",
            "/api/v1/profile/alice",
            Some(&bob),
            Some(json!({ "country": "FR" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = json_request(&app.router, "GET", "/api/v1/profile/alice", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let app = test_app(None);
        let token = register_and_login(&app.router, "alice", "pw123", "Alice A").await;

        let (status, body) = json_request(
            &app.router,
            "PUT",
            "/api/v1/profile/alice",
            Some(&token),
            Some(json!({ "email": "alice@example.com", "country": "NZ", "favorite_symbols": ["X"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Profile updated successfully");

        let (_, body) =
            json_request(&app.router, "GET", "/api/v1/profile/alice", Some(&token), None).await;
        assert_eq!(body["email"], "alice@example.com");
        assert_eq!(body["country"], "NZ");
        assert_eq!(body["display_name"], "Alice A");
        assert!(body.get("favorite_symbols").is_none());
    }

    #[tokio::test]
    async fn update_without_known_fields_rejected() {
        let app = test_app(None);
        let token = register_and_login(&app.router, "alice", "pw123", "Alice A").await;

        let (status, body) = json_request(
            &app.router,
            "PUT",
            "/api/v1/profile/alice",
            Some(&token),
            Some(json!({ "favorite_symbols": ["X"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn internal_creation_requires_service_token() {
        let app = test_app(Some(SERVICE_TOKEN));
        let carol = json!({ "username": "carol", "email": "carol@example.com" });

        let (status, body) = create_internal(&app.router, None, carol.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_SERVICE_CREDENTIAL");

        let (status, body) = create_internal(&app.router, Some(SERVICE_TOKEN), carol.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["display_name"], "carol");
        assert_eq!(body["email"], "carol@example.com");
        assert_eq!(body["timezone"], "UTC");

        let (status, body) = create_internal(&app.router, Some(SERVICE_TOKEN), carol).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "PROFILE_EXISTS");

        let (status, _) =
            create_internal(&app.router, Some(SERVICE_TOKEN), json!({ "email": "x@example.com" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn identity_without_profile_is_not_found() {
        let app = test_app(None);
        // Registered below the HTTP layer, so no profile is provisioned
        app.identity.auth.register("dave", "pw789", "Dave D").await.unwrap();

        let (status, body) = json_request(
            &app.router,
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "dave", "password": "pw789" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) =
            json_request(&app.router, "GET", "/api/v1/profile/dave", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "PROFILE_NOT_FOUND");

        let (status, _) = json_request(
            &app.router,
            "PUT",
            "/api/v1/profile/dave",
            Some(&token),
            Some(json!({ "timezone": "Europe/Paris" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

// =============================================================================
// Operational endpoints
// =============================================================================

mod operational {
    use super::*;

    #[tokio::test]
    async fn health_reports_backend() {
        let app = test_app(None);
        let (status, body) = json_request(&app.router, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "memory");
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        let app = test_app(None);
        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("x-request-id").unwrap(),
            "req-123"
        );
    }
}
