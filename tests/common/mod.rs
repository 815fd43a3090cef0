use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode as AxumStatus};
use axum::routing::{get, post};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use latency_poison::config::Config;
use latency_poison::db::MemoryDirectory;

/// A running test server instance backed by an in-memory directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, username: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "username": username,
                "email": format!("{username}@test.com"),
                "password": password,
            }))
            .send()
            .await
            .expect("register request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn login(&self, username: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Register a principal and return an access token for it.
    pub async fn token_for(&self, username: &str) -> String {
        let (body, status) = self.register(username, "password123").await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        let (body, status) = self.login(username, "password123").await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn create_collection(&self, token: &str, name: &str) -> Value {
        let (body, status) = self
            .post_auth("/api/collections", token, &json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::OK, "create collection failed: {body}");
        body
    }

    pub async fn create_endpoint(&self, token: &str, collection_id: &str, endpoint: &Value) -> Value {
        let (body, status) = self
            .post_auth(
                &format!("/api/collections/{collection_id}/endpoints"),
                token,
                endpoint,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create endpoint failed: {body}");
        body
    }

    /// Call `/proxy` with the given query string, optionally authenticated.
    pub async fn proxy(&self, query: &str, token: Option<&str>) -> (Value, StatusCode) {
        let mut req = self.client.get(self.url(&format!("/proxy?{query}")));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.expect("proxy request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn test_config(upstream_timeout: Duration) -> Config {
    Config {
        database_url: None,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        token_ttl: Duration::from_secs(30 * 60),
        upstream_timeout,
        cors_origins: vec!["http://localhost:3000".to_string()],
        seed_demo_user: false,
        log_level: "warn".to_string(),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_timeout(Duration::from_secs(10)).await
}

pub async fn spawn_app_with_timeout(upstream_timeout: Duration) -> TestApp {
    let directory = Arc::new(MemoryDirectory::new());
    let (app, _state) = latency_poison::build_app(directory, test_config(upstream_timeout))
        .expect("Failed to build app");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap();

    TestApp { addr, client }
}

/// A local stand-in for the real dependency behind the proxy. Counts every
/// request it receives.
pub struct Downstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl Downstream {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub async fn spawn_downstream() -> Downstream {
    let hits = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route("/json", get(json_handler))
        .route("/text", get(text_handler))
        .route("/echo", post(echo_handler).get(echo_get_handler))
        .route("/status/{code}", get(status_handler))
        .route("/slow", get(slow_handler))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind downstream");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Downstream failed");
    });

    Downstream { addr, hits }
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

type Hits = State<Arc<AtomicUsize>>;

async fn json_handler(State(hits): Hits) -> ([(&'static str, &'static str); 1], axum::Json<Value>) {
    hits.fetch_add(1, Ordering::SeqCst);
    (
        [("x-downstream", "yes")],
        axum::Json(json!({ "hello": "world" })),
    )
}

async fn text_handler(State(hits): Hits) -> &'static str {
    hits.fetch_add(1, Ordering::SeqCst);
    "plain text, not json"
}

async fn echo_handler(
    State(hits): Hits,
    headers: HeaderMap,
    axum::Json(body): axum::Json<Value>,
) -> axum::Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    let custom = headers
        .get("x-custom")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    axum::Json(json!({ "method": "POST", "received": body, "x_custom": custom }))
}

async fn echo_get_handler(State(hits): Hits, body: String) -> axum::Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    axum::Json(json!({ "method": "GET", "body_len": body.len() }))
}

async fn status_handler(State(hits): Hits, Path(code): Path<u16>) -> (AxumStatus, axum::Json<Value>) {
    hits.fetch_add(1, Ordering::SeqCst);
    let status = AxumStatus::from_u16(code).unwrap_or(AxumStatus::INTERNAL_SERVER_ERROR);
    (status, axum::Json(json!({ "code": code })))
}

async fn slow_handler(State(hits): Hits) -> &'static str {
    hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(5)).await;
    "too late"
}
