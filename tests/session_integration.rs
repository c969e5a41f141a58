//! Integration tests for the session pipeline.
//!
//! These tests wire the real store, API client, refresher and controller
//! together against a wiremock server, the same way the binary does.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use foodcare_session::api::{AuthApi, HttpAuthApi, ProductsApi};
use foodcare_session::auth::{
    AuthError, AuthRequestSigner, CredentialStore, Credentials, SessionController,
    SessionOptions, TokenPair, TokenRefresher,
};
use foodcare_session::secrets::FileSecretStore;
use foodcare_session::transport::ApiClient;

// =============================================================================
// Test Fixtures
// =============================================================================

const TIMEOUT: Duration = Duration::from_secs(5);

/// The full stack over one mock server and one secret file.
struct Stack {
    store: Arc<CredentialStore>,
    session: SessionController,
    products: ProductsApi,
}

impl Stack {
    fn new(server: &MockServer, secrets: &TempDir) -> Self {
        let backend = Arc::new(FileSecretStore::with_path(
            secrets.path().join("secrets.toml"),
        ));
        let store = Arc::new(CredentialStore::open(backend));
        let api: Arc<dyn AuthApi> =
            Arc::new(HttpAuthApi::new(server.uri(), TIMEOUT).expect("auth api"));
        let refresher = Arc::new(TokenRefresher::new(
            Arc::clone(&store),
            Arc::clone(&api),
            "/refresh",
            TIMEOUT,
        ));
        let client = ApiClient::new(
            server.uri(),
            TIMEOUT,
            AuthRequestSigner::new(Arc::clone(&store)),
            refresher,
        )
        .expect("api client");

        Self {
            session: SessionController::new(Arc::clone(&store), api, SessionOptions::default()),
            products: ProductsApi::new(Arc::new(client)),
            store,
        }
    }
}

fn product_listing() -> serde_json::Value {
    json!([{
        "order_product": {
            "order_product_id": "5f0c6a52-8d1e-4c39-9a53-2f6d1d1e4b7a",
            "product_date_start": "2026-10-01",
            "product_date_end": "2026-10-20"
        },
        "product": {
            "product_id": "p1",
            "product_name": "Milk"
        }
    }])
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"user_login": "alice", "password": "secret1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": "u1",
            "access_token": "A1",
            "refresh_token": "R1",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/get_user_by_id/u1"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"user_login": "alice", "user_name": "Alice"}])),
        )
        .mount(server)
        .await;
}

async fn mount_expired_then_refreshed(server: &MockServer, refresh_delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/order/getallproductsuser"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/refresh"))
        .and(body_json(json!({"refresh_token": "R1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "user_id": "u1",
                    "access_token": "A2",
                    "refresh_token": "R2"
                }))
                .set_delay(refresh_delay),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/order/getallproductsuser"))
        .and(query_param("user_id", "u1"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_listing()))
        .mount(server)
        .await;
}

fn alice(access: &str, refresh: &str) -> Credentials {
    Credentials::logged_in(
        "u1",
        Some("alice".to_string()),
        None,
        TokenPair::new(access, refresh, None),
    )
}

// =============================================================================
// Login, refresh, logout
// =============================================================================

#[tokio::test]
async fn login_refresh_logout_end_to_end() {
    let server = MockServer::start().await;
    let secrets = TempDir::new().expect("temp dir");
    mount_login(&server).await;
    mount_expired_then_refreshed(&server, Duration::ZERO).await;

    let stack = Stack::new(&server, &secrets);
    stack.session.login("alice", "secret1").await.expect("login");

    let creds = stack.store.read();
    assert_eq!(creds.user_id.as_deref(), Some("u1"));
    assert_eq!(creds.access_token(), Some("A1"));
    assert_eq!(creds.refresh_token(), Some("R1"));
    assert_eq!(creds.display_name.as_deref(), Some("Alice"));
    assert!(stack.session.state().is_authenticated);

    let products = stack
        .products
        .list_user_products("u1")
        .await
        .expect("products after refresh");
    assert_eq!(products[0].product.product_name, "Milk");

    let creds = stack.store.read();
    assert_eq!(creds.access_token(), Some("A2"));
    assert_eq!(creds.refresh_token(), Some("R2"));
    assert_eq!(creds.user_id.as_deref(), Some("u1"));

    stack.session.logout().await;
    assert!(stack.store.read().is_empty());
    assert!(!stack.session.is_authenticated());
}

#[tokio::test]
async fn session_survives_restart() {
    let server = MockServer::start().await;
    let secrets = TempDir::new().expect("temp dir");
    mount_login(&server).await;

    {
        let stack = Stack::new(&server, &secrets);
        stack.session.login("alice", "secret1").await.expect("login");
    }

    let reopened = Stack::new(&server, &secrets);
    assert!(reopened.session.is_authenticated());
    let user = reopened.session.current_user().expect("user");
    assert_eq!(user.user_id, "u1");
    assert_eq!(user.login.as_deref(), Some("alice"));
    assert_eq!(reopened.store.read().access_token(), Some("A1"));
}

#[tokio::test]
async fn logout_is_persisted() {
    let server = MockServer::start().await;
    let secrets = TempDir::new().expect("temp dir");
    mount_login(&server).await;

    {
        let stack = Stack::new(&server, &secrets);
        stack.session.login("alice", "secret1").await.expect("login");
        stack.session.logout().await;
    }

    let reopened = Stack::new(&server, &secrets);
    assert!(reopened.store.read().is_empty());
}

#[tokio::test]
async fn rejected_login_leaves_store_empty() {
    let server = MockServer::start().await;
    let secrets = TempDir::new().expect("temp dir");
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Incorrect password"})),
        )
        .mount(&server)
        .await;

    let stack = Stack::new(&server, &secrets);
    let err = stack.session.login("alice", "wrong").await.unwrap_err();

    assert!(matches!(err, AuthError::Http { status: 401, .. }));
    assert!(stack.store.read().is_empty());
    assert!(stack.session.state().last_error.is_some());
}

// =============================================================================
// Refresh behaviour
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;
    let secrets = TempDir::new().expect("temp dir");
    mount_expired_then_refreshed(&server, Duration::from_millis(200)).await;

    let stack = Arc::new(Stack::new(&server, &secrets));
    stack.store.write(alice("A1", "R1")).await.expect("seed");

    let tasks: Vec<_> = (0..5)
        .map(|_| {
            let stack = Arc::clone(&stack);
            tokio::spawn(async move { stack.products.list_user_products("u1").await })
        })
        .collect();

    for task in tasks {
        let products = task.await.expect("join").expect("products");
        assert_eq!(products.len(), 1);
    }
    assert_eq!(stack.store.read().access_token(), Some("A2"));
    // The refresh mock's `.expect(1)` is verified when the server drops.
}

#[tokio::test]
async fn rejected_refresh_logs_out() {
    let server = MockServer::start().await;
    let secrets = TempDir::new().expect("temp dir");
    Mock::given(method("GET"))
        .and(path("/order/getallproductsuser"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let stack = Stack::new(&server, &secrets);
    stack.store.write(alice("A1", "R1")).await.expect("seed");

    let err = stack.products.list_user_products("u1").await.unwrap_err();
    assert!(matches!(err, AuthError::NotAuthenticated));
    assert_eq!(err.user_message(), "Your session has ended. Please log in again.");
    assert!(stack.store.read().is_empty());
    assert!(!stack.session.is_authenticated());
}

#[tokio::test]
async fn refreshed_token_still_rejected_is_exhausted() {
    let server = MockServer::start().await;
    let secrets = TempDir::new().expect("temp dir");
    Mock::given(method("GET"))
        .and(path("/order/getallproductsuser"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": "u1",
            "access_token": "A2",
            "refresh_token": "R2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let stack = Stack::new(&server, &secrets);
    stack.store.write(alice("A1", "R1")).await.expect("seed");

    let err = stack.products.list_user_products("u1").await.unwrap_err();
    assert!(matches!(err, AuthError::AuthExhausted));
    // The refreshed session is kept; only this request gave up.
    assert_eq!(stack.store.read().access_token(), Some("A2"));
}

#[tokio::test]
async fn non_auth_errors_pass_through() {
    let server = MockServer::start().await;
    let secrets = TempDir::new().expect("temp dir");
    Mock::given(method("DELETE"))
        .and(path("/delete_order_product_by_id"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/refresh"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let stack = Stack::new(&server, &secrets);
    stack.store.write(alice("A1", "R1")).await.expect("seed");

    let err = stack
        .products
        .delete_user_product(uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Http { status: 404, .. }));
    assert_eq!(stack.store.read().access_token(), Some("A1"));
}

// =============================================================================
// Latest call wins
// =============================================================================

#[tokio::test]
async fn newer_login_supersedes_older() {
    let server = MockServer::start().await;
    let secrets = TempDir::new().expect("temp dir");
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"user_login": "slow", "password": "secret1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "user_id": "u-slow",
                    "access_token": "AS",
                    "refresh_token": "RS"
                }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"user_login": "alice", "password": "secret1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": "u1",
            "access_token": "A1",
            "refresh_token": "R1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let stack = Stack::new(&server, &secrets);
    let (older, newer) = tokio::join!(stack.session.login("slow", "secret1"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        stack.session.login("alice", "secret1").await
    });

    assert!(matches!(older, Err(AuthError::Superseded)));
    newer.expect("newer login");
    assert_eq!(stack.store.read().user_id.as_deref(), Some("u1"));
    assert_eq!(stack.store.read().access_token(), Some("A1"));
}
