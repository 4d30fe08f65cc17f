#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use entity_rest::{
    app, connect, ensure_tables, AppState, ColumnDescriptor, ColumnType, EntityDescriptor, EntityRegistry, Settings,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

pub fn registry() -> EntityRegistry {
    EntityRegistry::builder()
        .register(
            EntityDescriptor::new("T")
                .column(ColumnDescriptor::new("s", ColumnType::Text).required())
                .column(ColumnDescriptor::new("i", ColumnType::Integer))
                .column(ColumnDescriptor::new("f", ColumnType::Float))
                .column(ColumnDescriptor::new("b", ColumnType::Boolean))
                .column(ColumnDescriptor::new("dt", ColumnType::Timestamp))
                .column(ColumnDescriptor::new("d", ColumnType::Date))
                .column(ColumnDescriptor::new("j", ColumnType::Json))
                .column(ColumnDescriptor::new("notes", ColumnType::Text).lazy()),
        )
        .register(
            EntityDescriptor::new("Person")
                .column(ColumnDescriptor::new("name", ColumnType::Text).required().max_len(80))
                .column(ColumnDescriptor::new("age", ColumnType::Integer).required()),
        )
        .register(
            EntityDescriptor::new("Car")
                .column(ColumnDescriptor::new("make", ColumnType::Text).required())
                .column(ColumnDescriptor::new("owner", ColumnType::Reference("Person".into())).required()),
        )
        .build()
        .expect("test registry")
}

pub struct TestApp {
    pub router: Router,
    pub dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
    pub body: Value,
}

impl TestResponse {
    pub fn content_range(&self) -> Option<&str> {
        self.headers.get("content-range").and_then(|v| v.to_str().ok())
    }

    pub fn rows(&self) -> &Vec<Value> {
        self.body.as_array().expect("array body")
    }

    pub fn error_code(&self) -> &str {
        self.body["error"]["code"].as_str().unwrap_or_default()
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_settings(|_| {}).await
    }

    /// In-memory database; the schema patch path points into a fresh temp dir.
    pub async fn with_settings(configure: impl FnOnce(&mut Settings)) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut settings = Settings {
            schema_patch: dir.path().join("patch.yaml"),
            ..Settings::default()
        };
        configure(&mut settings);
        let registry = registry();
        let pool = connect(&settings).await.expect("connect");
        ensure_tables(&pool, &registry).await.expect("tables");
        let router = app(AppState::new(pool, registry, settings));
        TestApp { router, dir }
    }

    pub async fn request(&self, method: Method, uri: &str, headers: &[(&str, &str)], body: Option<Value>) -> TestResponse {
        self.raw_request(method, uri, headers, body.map(|b| b.to_string()).unwrap_or_default())
            .await
    }

    pub async fn raw_request(&self, method: Method, uri: &str, headers: &[(&str, &str)], body: String) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        if !body.is_empty() {
            builder = builder
                .header("content-type", "application/json")
                .header("content-length", body.len().to_string());
        }
        let req = builder.body(Body::from(body)).expect("request");
        let resp = self.router.clone().oneshot(req).await.expect("response");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            text,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, &[], None).await
    }

    pub async fn get_with(&self, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.request(Method::GET, uri, headers, None).await
    }

    pub async fn get_one(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, &[("accept", SINGLE_OBJECT)], None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, &[], Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, &[], Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, &[], None).await
    }

    /// Rows `s = a0..a{n-1}`, `i = 0..n-1`.
    pub async fn seed(&self, n: usize) {
        for k in 0..n {
            let resp = self.post("/t", json!({ "s": format!("a{}", k), "i": k })).await;
            assert_eq!(resp.status, StatusCode::OK, "{}", resp.text);
        }
    }
}
