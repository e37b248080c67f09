//! End-to-end tests of the account routes.
//!
//! Each test drives the full router over a temporary store directory.

#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::Path;

use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use esi::{AppState, Throttle};
use esi_core::AccountStore;
use proptest::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;

struct TestServer {
    dir: TempDir,
    app: NormalizePath<Router>,
}

impl TestServer {
    fn new() -> Self {
        Self::with_state(AppState::new)
    }

    fn with_state(state: impl FnOnce(AccountStore) -> AppState) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let app = esi::app(state(AccountStore::new(dir.path())), false);
        Self { dir, app }
    }

    fn with_files(names: &[&str]) -> Self {
        let server = Self::new();
        for name in names {
            std::fs::write(server.path().join(name), format!(r#"{{"name":"{name}"}}"#))
                .unwrap();
        }
        server
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    async fn send(&self, request: Request<Body>) -> Reply {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        Reply {
            status,
            headers,
            body,
        }
    }

    async fn get(&self, uri: &str) -> Reply {
        self.send(empty(Method::GET, uri)).await
    }

    async fn delete(&self, uri: &str) -> Reply {
        self.send(empty(Method::DELETE, uri)).await
    }

    async fn post_json(&self, uri: &str, body: &Value) -> Reply {
        self.send(json_request(Method::POST, uri, body.to_string()))
            .await
    }
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

fn empty(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn from_peer(uri: &str, peer: &str) -> Request<Body> {
    let mut request = empty(Method::GET, uri);
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

fn json_request(method: Method, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

#[tokio::test]
async fn test_root_lists_routes() {
    let server = TestServer::new();
    let reply = server.get("/").await;

    assert_eq!(reply.status, StatusCode::OK);
    let routes = reply.json();
    assert_eq!(routes.as_array().unwrap().len(), 7);
    assert_eq!(routes[0], "GET     /");
    assert_eq!(routes[1], "POST    /accounts");
}

#[tokio::test]
async fn test_list_then_delete_one() {
    let server = TestServer::with_files(&["a", "b"]);

    let reply = server.get("/accounts").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!(["a", "b"]));

    let reply = server.delete("/accounts/a").await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert!(reply.body.is_empty());

    let reply = server.get("/accounts").await;
    assert_eq!(reply.json(), json!(["b"]));

    let reply = server.get("/accounts/a").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json()["code"], "AccountNotFound");
    assert_eq!(reply.json()["message"], "a was not found");
}

#[tokio::test]
async fn test_head_list() {
    let server = TestServer::with_files(&["a"]);
    let reply = server.send(empty(Method::HEAD, "/accounts")).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.is_empty());
}

#[tokio::test]
async fn test_create_persists_account() {
    let server = TestServer::new();
    let reply = server
        .post_json(
            "/accounts",
            &json!({"name": "work", "emailAddress": "me@example.com"}),
        )
        .await;

    assert_eq!(reply.status, StatusCode::CREATED);
    let created = json!({"id": "work", "name": "work", "emailAddress": "me@example.com"});
    assert_eq!(reply.json(), created);

    let stored: Value =
        serde_json::from_slice(&std::fs::read(server.path().join("work")).unwrap()).unwrap();
    assert_eq!(stored, created);

    let reply = server.get("/accounts").await;
    assert_eq!(reply.json(), json!(["work"]));
}

#[tokio::test]
async fn test_create_from_query_string() {
    let server = TestServer::new();
    let reply = server
        .send(empty(Method::POST, "/accounts?name=Teste%201&emailAddress=t%40example.com"))
        .await;

    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.json()["id"], "Teste 1");
    assert_eq!(reply.json()["emailAddress"], "t@example.com");
    assert_eq!(server.files(), vec!["Teste 1"]);
}

#[tokio::test]
async fn test_create_from_form_body() {
    let server = TestServer::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/accounts")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("name=work&emailAddress=me%40example.com"))
        .unwrap();
    let reply = server.send(request).await;

    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(
        reply.json(),
        json!({"id": "work", "name": "work", "emailAddress": "me@example.com"})
    );
    assert_eq!(server.files(), vec!["work"]);
}

#[tokio::test]
async fn test_create_empty_query_name_uses_body() {
    let server = TestServer::new();
    let reply = server
        .post_json("/accounts?name=", &json!({"name": "work"}))
        .await;

    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.json()["id"], "work");
}

#[tokio::test]
async fn test_create_keeps_well_formed_server_profiles() {
    let server = TestServer::new();
    let reply = server
        .post_json(
            "/accounts",
            &json!({
                "name": "work",
                "outgoingServer": {
                    "serverName": "smtp.example.com",
                    "connectionSecurity": "SSL/TLS"
                },
                "incomingServer": {
                    "serverName": "imap.example.com"
                }
            }),
        )
        .await;

    assert_eq!(reply.status, StatusCode::CREATED);
    let created = reply.json();
    assert_eq!(created["outgoingServer"]["serverName"], "smtp.example.com");
    assert_eq!(created["outgoingServer"]["connectionSecurity"], "SSL/TLS");
    // no "type", so the incoming profile is dropped rather than rejected
    assert!(created.get("incomingServer").is_none());
}

#[tokio::test]
async fn test_create_without_name() {
    let server = TestServer::new();

    for body in [
        json!({}),
        json!({"emailAddress": "me@example.com"}),
        json!({"name": ""}),
        json!({"name": "  "}),
    ] {
        let reply = server.post_json("/accounts", &body).await;
        assert_eq!(reply.status, StatusCode::CONFLICT, "{body}");
        assert_eq!(reply.json()["code"], "MissingName");
    }

    let reply = server.send(empty(Method::POST, "/accounts")).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.json()["code"], "MissingName");

    assert!(server.files().is_empty());
}

#[tokio::test]
async fn test_create_twice() {
    let server = TestServer::new();
    let body = json!({"name": "work"});

    let reply = server.post_json("/accounts", &body).await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let reply = server.post_json("/accounts", &body).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.json()["code"], "AccountExists");
    assert_eq!(reply.json()["message"], "work already exists");
}

#[tokio::test]
async fn test_create_rejects_unsafe_name() {
    let server = TestServer::new();

    for name in ["..", "../escape", "a/b"] {
        let reply = server.post_json("/accounts", &json!({"name": name})).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{name}");
        assert_eq!(reply.json()["code"], "InvalidName");
    }
    assert!(server.files().is_empty());
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let server = TestServer::new();
    let reply = server
        .send(json_request(Method::POST, "/accounts", "{\"name\":"))
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["code"], "InvalidContent");
}

#[tokio::test]
async fn test_unknown_account() {
    let server = TestServer::with_files(&["a"]);

    let reply = server.get("/accounts/nope").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json()["code"], "AccountNotFound");

    let reply = server.delete("/accounts/nope").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json()["code"], "AccountNotFound");

    let reply = server
        .send(json_request(Method::PUT, "/accounts/nope?name=nope", "{}"))
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    // ids never reach outside the store directory
    let reply = server.get("/accounts/..").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    let reply = server.get("/accounts/..%2Fa").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    assert_eq!(server.files(), vec!["a"]);
}

#[tokio::test]
async fn test_get_streams_file_as_stored() {
    let server = TestServer::new();
    std::fs::write(server.path().join("a"), "{ \"x\" : 1 }").unwrap();

    let reply = server.get("/accounts/a").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(reply.body.as_ref(), b"{ \"x\" : 1 }");
}

#[tokio::test]
async fn test_get_without_json_accept_reserializes() {
    let server = TestServer::new();
    std::fs::write(server.path().join("a"), "{ \"x\" : 1 }").unwrap();

    let request = Request::builder()
        .uri("/accounts/a")
        .header(header::ACCEPT, "text/plain")
        .body(Body::empty())
        .unwrap();
    let reply = server.send(request).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body.as_ref(), br#"{"x":1}"#);
}

#[tokio::test]
async fn test_get_unparseable_file_without_json_accept() {
    let server = TestServer::new();
    std::fs::write(server.path().join("a"), "not json").unwrap();

    let request = Request::builder()
        .uri("/accounts/a")
        .header(header::ACCEPT, "text/plain")
        .body(Body::empty())
        .unwrap();
    let reply = server.send(request).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.json()["code"], "InternalError");
}

#[tokio::test]
async fn test_head_account() {
    let server = TestServer::with_files(&["a"]);
    let reply = server.send(empty(Method::HEAD, "/accounts/a")).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.is_empty());
}

#[tokio::test]
async fn test_put_replaces_whole_file() {
    let server = TestServer::with_files(&["a"]);

    let reply = server
        .send(json_request(Method::PUT, "/accounts/a?name=a", r#"{"x":1}"#))
        .await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    let reply = server.get("/accounts/a").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body.as_ref(), br#"{"x":1}"#);
}

#[tokio::test]
async fn test_put_name_from_body() {
    let server = TestServer::with_files(&["a"]);
    let body = r#"{"name":"a","emailAddress":"new@example.com"}"#;

    let reply = server
        .send(json_request(Method::PUT, "/accounts/a", body))
        .await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert_eq!(std::fs::read(server.path().join("a")).unwrap(), body.as_bytes());
}

#[tokio::test]
async fn test_put_without_name() {
    let server = TestServer::with_files(&["a"]);

    let reply = server
        .send(json_request(Method::PUT, "/accounts/a", r#"{"x":1}"#))
        .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.json()["code"], "MissingName");
    assert_eq!(
        std::fs::read_to_string(server.path().join("a")).unwrap(),
        r#"{"name":"a"}"#
    );
}

#[tokio::test]
async fn test_put_requires_json() {
    let server = TestServer::with_files(&["a"]);

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/accounts/a?name=a")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(r#"{"x":1}"#))
        .unwrap();
    let reply = server.send(request).await;

    assert_eq!(reply.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(reply.json()["code"], "UnsupportedMediaType");
}

#[tokio::test]
async fn test_put_rejects_bad_bodies() {
    let server = TestServer::with_files(&["a"]);

    let reply = server
        .send(json_request(Method::PUT, "/accounts/a?name=a", "{"))
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["code"], "InvalidContent");

    let reply = server
        .send(json_request(Method::PUT, "/accounts/a?name=a", Body::empty()))
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["code"], "InvalidContent");
}

#[tokio::test]
async fn test_delete_all_on_empty_store() {
    let server = TestServer::new();
    let reply = server.delete("/accounts").await;

    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert!(server.files().is_empty());
}

#[tokio::test]
async fn test_delete_all() {
    let server = TestServer::with_files(&["a", "b", "c"]);
    let reply = server.delete("/accounts").await;

    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert!(server.files().is_empty());

    let reply = server.get("/accounts").await;
    assert_eq!(reply.json(), json!([]));
}

#[tokio::test]
async fn test_delete_all_with_one_failure() {
    let server = TestServer::with_files(&["a", "c"]);
    // a directory entry cannot be removed as a file
    std::fs::create_dir(server.path().join("b")).unwrap();

    let reply = server.delete("/accounts").await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.json()["code"], "InternalError");
    let message = reply.json()["message"].as_str().unwrap().to_owned();
    assert!(message.starts_with("1 of 3 accounts could not be deleted, first was b"));

    assert_eq!(server.files(), vec!["b"]);
}

#[tokio::test]
async fn test_store_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");
    let app = esi::router(AppState::new(AccountStore::new(&missing)), false);

    let response = app
        .clone()
        .oneshot(empty(Method::GET, "/accounts"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app
        .clone()
        .oneshot(empty(Method::DELETE, "/accounts/a"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app.oneshot(empty(Method::GET, "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id() {
    let server = TestServer::new();

    let reply = server.get("/accounts").await;
    assert!(reply.headers.contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/accounts")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let reply = server.send(request).await;
    assert_eq!(reply.headers["x-request-id"], "req-42");
}

#[tokio::test]
async fn test_audit_enabled_router_serves() {
    let dir = tempfile::tempdir().unwrap();
    let app = esi::router(AppState::new(AccountStore::new(dir.path())), true);

    let response = app.oneshot(empty(Method::GET, "/accounts")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_trailing_slash() {
    let server = TestServer::with_files(&["a", "b"]);

    let reply = server.get("/accounts/").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!(["a", "b"]));

    let reply = server.delete("/accounts/a/").await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert_eq!(server.files(), vec!["b"]);

    let reply = server.get("/accounts/a/").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_throttle_per_client() {
    let burst = NonZeroU32::new(2).unwrap();
    let rate = NonZeroU32::new(1).unwrap();
    let server = TestServer::with_state(|store| {
        AppState::new(store).with_throttle(Throttle::new(burst, rate))
    });

    for _ in 0..2 {
        let reply = server.send(from_peer("/accounts", "10.0.0.1:4000")).await;
        assert_eq!(reply.status, StatusCode::OK);
    }

    let reply = server.send(from_peer("/accounts", "10.0.0.1:4001")).await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(reply.json()["code"], "RequestThrottled");
    assert_eq!(
        reply.json()["message"],
        "You have exceeded your request rate of 1 r/s."
    );

    let reply = server.send(from_peer("/", "10.0.0.2:4000")).await;
    assert_eq!(reply.status, StatusCode::OK);

    // no peer address, no limit
    let reply = server.get("/accounts").await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_method() {
    let server = TestServer::new();
    let reply = server.send(empty(Method::PATCH, "/accounts")).await;
    assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn created_name_is_listed_once(name in "[A-Za-z0-9][A-Za-z0-9 ._@-]{0,23}") {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let listed = runtime.block_on(async {
            let server = TestServer::new();
            let reply = server.post_json("/accounts", &json!({"name": name})).await;
            assert_eq!(reply.status, StatusCode::CREATED);
            server.get("/accounts").await.json()
        });

        let ids = listed.as_array().unwrap();
        prop_assert_eq!(ids.iter().filter(|id| *id == &json!(name)).count(), 1);
    }
}
