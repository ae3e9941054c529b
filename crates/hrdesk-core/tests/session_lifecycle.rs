//! Integration tests for the session manager against a mock backend.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hrdesk_core::api::ApiClient;
use hrdesk_core::auth::store::{TOKEN_KEY, USER_KEY};
use hrdesk_core::auth::{FileStore, KeyValueStore, MemoryStore};
use hrdesk_core::{AuthError, AuthState, RequestOptions, RestoreOutcome, RestorePolicy, SessionManager};
use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{any, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager(base_url: &str, store: Box<dyn KeyValueStore>) -> SessionManager {
    SessionManager::new(ApiClient::new(base_url).unwrap(), store)
}

/// Base URL of a port nothing listens on.
fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

async fn mount_login(server: &MockServer, token: &str, user: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "refresh_token": "r1",
            "employee": user,
            "organization": null
        })))
        .mount(server)
        .await;
}

fn persisted_pair(token: &str, user: serde_json::Value) -> MemoryStore {
    let mut store = MemoryStore::new();
    store.set(TOKEN_KEY, token).unwrap();
    store.set(USER_KEY, &user.to_string()).unwrap();
    store
}

#[tokio::test]
async fn restore_without_token_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut sessions = manager(&server.uri(), Box::new(MemoryStore::new()));
    for _ in 0..2 {
        let outcome = sessions.restore_session().await;
        assert!(matches!(outcome, RestoreOutcome::NoSession));
        assert_eq!(sessions.state(), AuthState::Unauthenticated);
    }
}

#[tokio::test]
async fn login_persists_token_and_user_together() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "a@x.com", "password": "p"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "t1",
            "employee": {"id": 1, "first_name": "A"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let mut sessions = manager(&server.uri(), Box::new(store.clone()));
    let mut ready = sessions.subscribe();

    sessions.login(" a@x.com ", "p").await.unwrap();

    assert_eq!(sessions.state(), AuthState::Authenticated);
    assert!(ready.has_changed().unwrap());
    assert!(ready.borrow_and_update().is_ready());
    assert_eq!(sessions.session().unwrap().token, "t1");
    assert_eq!(sessions.current_user().unwrap().first_name.as_deref(), Some("A"));
    assert!(store.contains(TOKEN_KEY));
    assert!(store.contains(USER_KEY));

    sessions.logout();
    assert_eq!(sessions.state(), AuthState::Unauthenticated);
    assert!(!store.contains(TOKEN_KEY));
    assert!(!store.contains(USER_KEY));
}

#[tokio::test]
async fn restore_after_restart_uses_fresh_user_record() {
    let server = MockServer::start().await;
    mount_login(&server, "t1", json!({"id": 1, "first_name": "A"})).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "first_name": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    {
        let mut sessions = manager(&server.uri(), Box::new(FileStore::new(dir.path())));
        sessions.login("a@x.com", "p").await.unwrap();
    }

    let mut restarted = manager(&server.uri(), Box::new(FileStore::new(dir.path())));
    let outcome = restarted.restore_session().await;

    assert!(outcome.is_restored());
    assert_eq!(restarted.state(), AuthState::Authenticated);
    assert_eq!(restarted.current_user().unwrap().first_name.as_deref(), Some("A2"));

    // The refreshed record replaced the snapshot on disk
    let snapshot = FileStore::new(dir.path()).get(USER_KEY).unwrap().unwrap();
    assert!(snapshot.contains("A2"));
}

#[tokio::test]
async fn restore_accepts_wrapped_identity_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "employee": {"id": 5, "first_name": "Eve", "role": "admin"},
            "organization": {"id": 1, "name": "Acme"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = persisted_pair("t5", json!({"id": 5, "first_name": "Old"}));
    let mut sessions = manager(&server.uri(), Box::new(store));
    assert!(sessions.restore_session().await.is_restored());
    assert_eq!(sessions.current_user().unwrap().display_name(), "Eve (admin)");
}

#[tokio::test]
async fn rejected_token_clears_persisted_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "Token has expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = persisted_pair("stale", json!({"id": 1}));
    let mut sessions = manager(&server.uri(), Box::new(store.clone()));

    let outcome = sessions.restore_session().await;
    assert!(matches!(outcome, RestoreOutcome::Invalidated(AuthError::Rejected { .. })));
    assert_eq!(sessions.state(), AuthState::Unauthenticated);
    assert!(store.is_empty());
    assert!(sessions.gateway().token().is_none());
}

#[tokio::test]
async fn malformed_identity_response_clears_persisted_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let store = persisted_pair("t1", json!({"id": 1}));
    let mut sessions = manager(&server.uri(), Box::new(store.clone()));

    let outcome = sessions.restore_session().await;
    assert!(matches!(outcome, RestoreOutcome::Invalidated(AuthError::InvalidResponse(_))));
    assert!(store.is_empty());
}

#[tokio::test]
async fn unreachable_server_fails_closed_by_default() {
    let store = persisted_pair("t1", json!({"id": 1}));
    let mut sessions = manager(&unreachable_url(), Box::new(store.clone()));

    let outcome = sessions.restore_session().await;
    assert!(matches!(outcome, RestoreOutcome::Invalidated(AuthError::Network(_))));
    assert_eq!(sessions.state(), AuthState::Unauthenticated);
    assert!(store.is_empty());
}

#[tokio::test]
async fn unreachable_server_can_keep_session_for_next_start() {
    let store = persisted_pair("t1", json!({"id": 1}));
    let mut sessions = manager(&unreachable_url(), Box::new(store.clone()))
        .with_policy(RestorePolicy::KeepOnTransportError);

    let outcome = sessions.restore_session().await;
    assert!(matches!(outcome, RestoreOutcome::Deferred(AuthError::Network(_))));
    assert_eq!(sessions.state(), AuthState::Unauthenticated);
    assert!(store.contains(TOKEN_KEY));
    assert!(store.contains(USER_KEY));
}

#[tokio::test]
async fn keep_policy_still_clears_on_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let store = persisted_pair("t1", json!({"id": 1}));
    let mut sessions = manager(&server.uri(), Box::new(store.clone()))
        .with_policy(RestorePolicy::KeepOnTransportError);

    assert!(matches!(sessions.restore_session().await, RestoreOutcome::Invalidated(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn login_rejection_surfaces_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})))
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let mut sessions = manager(&server.uri(), Box::new(store.clone()));

    let err = sessions.login("a@x.com", "wrong").await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected { .. }));
    assert_eq!(err.user_message(), "Invalid credentials");
    assert_eq!(sessions.state(), AuthState::Unauthenticated);
    assert!(store.is_empty());
}

#[tokio::test]
async fn login_transport_failure_surfaces_generic_message() {
    let store = MemoryStore::new();
    let mut sessions = manager(&unreachable_url(), Box::new(store.clone()));

    let err = sessions.login("a@x.com", "p").await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.user_message(), "Network error. Please try again.");
    assert_eq!(sessions.state(), AuthState::Unauthenticated);
    assert!(store.is_empty());
}

#[tokio::test]
async fn login_without_token_in_response_is_invalid() {
    let server = MockServer::start().await;
    mount_login(&server, "", json!({"id": 1})).await;

    let store = MemoryStore::new();
    let mut sessions = manager(&server.uri(), Box::new(store.clone()));
    let err = sessions.login("a@x.com", "p").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidResponse(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn empty_credentials_never_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut sessions = manager(&server.uri(), Box::new(MemoryStore::new()));
    assert!(matches!(sessions.login("a@x.com", "").await, Err(AuthError::MissingCredentials)));
    assert!(matches!(sessions.login("  ", "p").await, Err(AuthError::MissingCredentials)));
}

#[tokio::test]
async fn second_login_replaces_first_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "a@x.com", "password": "p"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "t1", "employee": {"id": 1}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "b@x.com", "password": "q"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "t2", "employee": {"id": 2}
        })))
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let mut sessions = manager(&server.uri(), Box::new(store.clone()));
    sessions.login("a@x.com", "p").await.unwrap();
    sessions.login("b@x.com", "q").await.unwrap();

    assert_eq!(sessions.state(), AuthState::Authenticated);
    assert_eq!(sessions.current_user().unwrap().numeric_id(), Some(2));
    assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("t2"));
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn failed_login_while_authenticated_signs_out() {
    let server = MockServer::start().await;
    mount_login(&server, "t1", json!({"id": 1})).await;

    let store = MemoryStore::new();
    let mut sessions = manager(&server.uri(), Box::new(store.clone()));
    sessions.login("a@x.com", "p").await.unwrap();

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "Account is not active"})))
        .mount(&server)
        .await;

    let err = sessions.login("a@x.com", "p").await.unwrap_err();
    assert_eq!(err.user_message(), "Account is not active");
    assert_eq!(sessions.state(), AuthState::Unauthenticated);
    assert!(store.is_empty());
}

#[tokio::test]
async fn abandoned_login_returns_to_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "t1", "employee": {"id": 1}}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let mut sessions = manager(&server.uri(), Box::new(store.clone()));
    let attempt = tokio::time::timeout(Duration::from_millis(100), sessions.login("a@x.com", "p")).await;

    assert!(attempt.is_err());
    assert_eq!(sessions.state(), AuthState::Unauthenticated);
    assert!(!sessions.is_authenticated());
    assert!(store.is_empty());
}

#[tokio::test]
async fn logout_makes_no_request() {
    let server = MockServer::start().await;
    mount_login(&server, "t1", json!({"id": 1})).await;

    let store = MemoryStore::new();
    let mut sessions = manager(&server.uri(), Box::new(store.clone()));
    sessions.login("a@x.com", "p").await.unwrap();
    let before = server.received_requests().await.unwrap().len();

    sessions.logout();
    sessions.logout();

    assert_eq!(server.received_requests().await.unwrap().len(), before);
    assert_eq!(sessions.state(), AuthState::Unauthenticated);
    assert!(store.is_empty());
}

#[tokio::test]
async fn gateway_carries_current_token_only() {
    let server = MockServer::start().await;
    mount_login(&server, "t1", json!({"id": 1})).await;
    Mock::given(method("GET"))
        .and(path("/api/employees"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let mut sessions = manager(&server.uri(), Box::new(MemoryStore::new()));

    sessions.gateway().call("/api/employees", RequestOptions::get()).await.unwrap();
    sessions.login("a@x.com", "p").await.unwrap();
    sessions.gateway().call("/api/employees", RequestOptions::get()).await.unwrap();
    sessions.logout();
    sessions.gateway().call("/api/employees", RequestOptions::get()).await.unwrap();

    let auth_headers: Vec<Option<String>> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/api/employees")
        .map(|r| {
            r.headers
                .get("authorization")
                .map(|v| v.to_str().unwrap().to_string())
        })
        .collect();

    assert_eq!(auth_headers, vec![None, Some("Bearer t1".to_string()), None]);
}

#[tokio::test]
async fn login_accepts_user_records_without_integer_id() {
    for employee in [json!({"first_name": "A"}), json!({"id": "e-1"})] {
        let server = MockServer::start().await;
        mount_login(&server, "t1", employee.clone()).await;

        let store = MemoryStore::new();
        let mut sessions = manager(&server.uri(), Box::new(store.clone()));
        sessions.login("a@x.com", "p").await.unwrap();

        assert_eq!(sessions.state(), AuthState::Authenticated);
        assert_eq!(sessions.gateway().token(), Some("t1"));
        let snapshot: serde_json::Value =
            serde_json::from_str(&store.get(USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(snapshot, employee);
    }
}

#[tokio::test]
async fn restore_rejects_identity_body_without_user_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"msg": "Token has expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = persisted_pair("t1", json!({"id": 1}));
    let mut sessions = manager(&server.uri(), Box::new(store.clone()));

    let outcome = sessions.restore_session().await;
    assert!(matches!(outcome, RestoreOutcome::Invalidated(AuthError::InvalidResponse(_))));
    assert!(store.is_empty());
}

#[tokio::test]
async fn undecodable_login_response_does_not_echo_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "SECRET-JWT-abc",
            "employee": "SECRET-JWT-abc"
        })))
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let mut sessions = manager(&server.uri(), Box::new(store.clone()));
    let err = sessions.login("a@x.com", "p").await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidResponse(_)));
    assert!(!err.to_string().contains("SECRET-JWT-abc"));
    assert!(!format!("{:?}", err).contains("SECRET-JWT-abc"));
    assert_eq!(sessions.state(), AuthState::Unauthenticated);
    assert!(store.is_empty());
}

#[tokio::test]
async fn token_without_snapshot_is_dropped_without_request() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut store = MemoryStore::new();
    store.set(TOKEN_KEY, "t1").unwrap();
    let mut sessions = manager(&server.uri(), Box::new(store.clone()));

    assert!(matches!(sessions.restore_session().await, RestoreOutcome::NoSession));
    assert!(store.is_empty());
}

/// Log sink shared between the subscriber and the test body.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn info_logs_carry_no_email_or_token() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = MockServer::start().await;
    mount_login(
        &server,
        "tok-secret-9",
        json!({"id": 5, "first_name": "Hana", "email": "hana@x.com"}),
    )
    .await;

    let mut sessions = manager(&server.uri(), Box::new(MemoryStore::new()));
    sessions.login("hana@x.com", "pw").await.unwrap();

    let text = logs.text();
    assert!(text.contains("Login successful"));
    assert!(!text.contains("hana@x.com"));
    assert!(!text.contains("tok-secret-9"));
}
