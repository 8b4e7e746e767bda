//! Shared fixtures for the integration tests.
//!
//! `spawn_fake_rest` serves a PostgREST-compatible table API backed by a
//! `MemoryStore`, recording every request it receives so tests can check
//! the wire dialect.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use edu_remote::{Key, MemoryStore, Order, RemoteError, RemoteStore, Row};
use serde_json::{json, Value};
use tokio::sync::Mutex;

/// A request seen by the fake table service.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub table: String,
    pub query: HashMap<String, String>,
    pub api_key: Option<String>,
    pub authorization: Option<String>,
    pub prefer: Option<String>,
}

/// Handle to a running fake table service.
pub struct FakeRest {
    pub url: String,
    pub store: Arc<MemoryStore>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeRest {
    /// Returns every request received so far.
    pub async fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().await.clone()
    }

    /// Returns the requests with the given HTTP method.
    pub async fn requests_with(&self, method: &str) -> Vec<Recorded> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }
}

#[derive(Clone)]
struct FakeState {
    store: Arc<MemoryStore>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeState {
    async fn record(
        &self,
        method: &'static str,
        table: &str,
        query: &HashMap<String, String>,
        headers: &HeaderMap,
    ) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.requests.lock().await.push(Recorded {
            method,
            table: table.to_string(),
            query: query.clone(),
            api_key: header("apikey"),
            authorization: header("authorization"),
            prefer: header("prefer"),
        });
    }
}

fn key_from(query: &HashMap<String, String>) -> Option<Key> {
    query.iter().find_map(|(column, value)| {
        value
            .strip_prefix("eq.")
            .map(|v| Key::new(column.clone(), v))
    })
}

fn order_from(query: &HashMap<String, String>) -> Option<Order> {
    query
        .get("order")
        .and_then(|o| o.rsplit_once('.'))
        .map(|(column, direction)| {
            if direction == "desc" {
                Order::desc(column)
            } else {
                Order::asc(column)
            }
        })
}

fn failure(err: RemoteError) -> Response {
    match err {
        // PostgREST answers a filter that matches nothing with an empty array.
        RemoteError::NoRows { .. } => (StatusCode::OK, Json(json!([]))).into_response(),
        other => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"message": other.to_string()})),
        )
            .into_response(),
    }
}

fn missing_filter() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"message": "missing eq filter"})),
    )
        .into_response()
}

async fn handle_select(
    State(state): State<FakeState>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.record("GET", &table, &query, &headers).await;
    match state.store.select(&table, order_from(&query).as_ref()).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => failure(e),
    }
}

async fn handle_insert(
    State(state): State<FakeState>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(row): Json<Row>,
) -> Response {
    state.record("POST", &table, &query, &headers).await;
    match state.store.insert(&table, row).await {
        Ok(stored) => (StatusCode::CREATED, Json(vec![stored])).into_response(),
        Err(e) => failure(e),
    }
}

async fn handle_update(
    State(state): State<FakeState>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(patch): Json<Row>,
) -> Response {
    state.record("PATCH", &table, &query, &headers).await;
    let Some(key) = key_from(&query) else {
        return missing_filter();
    };
    match state.store.update(&table, patch, &key).await {
        Ok(stored) => Json(vec![stored]).into_response(),
        Err(e) => failure(e),
    }
}

async fn handle_delete(
    State(state): State<FakeState>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.record("DELETE", &table, &query, &headers).await;
    let Some(key) = key_from(&query) else {
        return missing_filter();
    };
    match state.store.delete(&table, &key).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => failure(e),
    }
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });
    format!("http://{addr}")
}

/// Starts a fake table service over `store`.
pub async fn spawn_fake_rest(store: MemoryStore) -> FakeRest {
    let store = Arc::new(store);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = FakeState {
        store: Arc::clone(&store),
        requests: Arc::clone(&requests),
    };

    let router = Router::new()
        .route(
            "/rest/v1/:table",
            get(handle_select)
                .post(handle_insert)
                .patch(handle_update)
                .delete(handle_delete),
        )
        .with_state(state);

    FakeRest {
        url: serve(router).await,
        store,
        requests,
    }
}

/// Returns a URL on which nothing is listening.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("Failed to get local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

/// Converts a JSON object literal into a row.
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

/// A complete course row.
pub fn course_row(id: u64, title: &str) -> Row {
    row(json!({
        "id": id,
        "title": {"uz": title, "ru": title, "en": title},
        "description": {"uz": "", "ru": "", "en": ""},
        "category": "IT",
        "students": 12,
        "duration": "3 months",
        "image": "https://img.example/course.png"
    }))
}
