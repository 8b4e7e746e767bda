//! End-to-end tests of the site API.
//!
//! The real router runs on an ephemeral port in front of a `ContentStore`
//! that talks to the fake table service over HTTP; requests go through
//! reqwest the way a browser front end would.

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use common::{course_row, serve, spawn_fake_rest, FakeRest};
use edu_content::{
    create_router, AdminGate, AppState, ContentStore, GeminiConfig, GeminiOutlineClient,
    PreferenceStore,
};
use edu_remote::{MemoryStore, Operation, RestClient, RestConfig};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::sync::Mutex;

struct Site {
    url: String,
    remote: FakeRest,
    http: reqwest::Client,
}

impl Site {
    fn api(&self, path: &str) -> String {
        format!("{}/api{path}", self.url)
    }

    async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .http
            .get(self.api(path))
            .send()
            .await
            .expect("request failed");
        let status = response.status();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    async fn login(&self) -> String {
        let response = self
            .http
            .post(self.api("/admin/login"))
            .json(&json!({"username": "admin", "password": "secret"}))
            .send()
            .await
            .expect("login failed");
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.expect("login body");
        body["token"].as_str().expect("token").to_string()
    }
}

fn prefs_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("edu-site-it-{}-{name}", std::process::id()))
        .join("preferences.json")
}

/// Starts the site over `store` and waits for the startup load.
async fn start_site(store: MemoryStore, name: &str) -> Site {
    let remote = spawn_fake_rest(store).await;
    let client =
        RestClient::new(RestConfig::new(&remote.url, "anon-key")).expect("Failed to build client");
    let content = Arc::new(ContentStore::new(Arc::new(client)));
    content.load().await;

    let outline = GeminiOutlineClient::new(GeminiConfig::default()).expect("outline client");
    let path = prefs_path(name);
    let _ = std::fs::remove_file(&path);

    let state = AppState {
        content,
        outline: Arc::new(outline),
        admin: Arc::new(AdminGate::new("admin", "secret", Duration::ZERO)),
        preferences: Arc::new(Mutex::new(PreferenceStore::load(path))),
    };
    Site {
        url: serve(create_router(state)).await,
        remote,
        http: reqwest::Client::new(),
    }
}

#[tokio::test]
async fn test_site_renders_remote_content_in_english() {
    let site = start_site(
        MemoryStore::new().with_rows("courses", vec![course_row(4, "Robotics")]),
        "render",
    )
    .await;

    let (status, body) = site.get_json("/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], json!("ready"));
    assert_eq!(body["counts"]["courses"], json!(1));

    let (status, body) = site.get_json("/site?lang=en").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lang"], json!("en"));
    assert_eq!(body["courses"][0]["title"], json!("Robotics"));
    assert_eq!(body["stats"].as_array().map(Vec::len), Some(4));
    assert!(body.get("messages").is_none());
}

#[tokio::test]
async fn test_language_preference_survives_restart() {
    let site = start_site(MemoryStore::new(), "language").await;

    let response = site
        .http
        .put(site.api("/preferences"))
        .json(&json!({"language": "ru"}))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let (_, body) = site.get_json("/site").await;
    assert_eq!(body["lang"], json!("ru"));
    assert_eq!(body["courses"][1]["title"], json!("Математика"));

    let reloaded = PreferenceStore::load(prefs_path("language"));
    assert_eq!(reloaded.language().code(), "ru");
}

#[tokio::test]
async fn test_contact_message_is_stored_remotely() {
    let site = start_site(MemoryStore::new(), "contact").await;

    let response = site
        .http
        .post(site.api("/contact"))
        .json(&json!({"name": "Aziz", "email": "aziz@example.uz", "message": "Salom"}))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::CREATED);
    let stored: Value = response.json().await.expect("body");
    assert_eq!(stored["id"], json!("1"));

    let rows = site.remote.store.rows("messages").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], json!("Aziz"));

    let (_, status) = site.get_json("/status").await;
    assert_eq!(status["counts"]["messages"], json!(1));
}

#[tokio::test]
async fn test_incomplete_contact_form_is_rejected_without_request() {
    let site = start_site(MemoryStore::new(), "contact-incomplete").await;

    let response = site
        .http
        .post(site.api("/contact"))
        .json(&json!({"name": "Aziz", "email": "", "message": "Salom"}))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(site.remote.requests_with("POST").await.is_empty());
}

#[tokio::test]
async fn test_admin_creates_and_deletes_course() {
    let site = start_site(
        MemoryStore::new().with_rows("courses", vec![course_row(1, "A"), course_row(2, "B")]),
        "admin-crud",
    )
    .await;
    let token = site.login().await;

    let response = site
        .http
        .post(site.api("/admin/courses"))
        .bearer_auth(&token)
        .json(&json!({
            "title": {"uz": "Kimyo", "ru": "Химия", "en": "Chemistry"},
            "category": "Science",
            "students": 0,
            "duration": "6 months",
            "image": ""
        }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.expect("body");
    assert_eq!(created["id"], json!("3"));

    let response = site
        .http
        .delete(site.api("/admin/courses/1"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (_, body) = site.get_json("/site?lang=en").await;
    let titles: Vec<&str> = body["courses"]
        .as_array()
        .expect("courses")
        .iter()
        .filter_map(|c| c["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Chemistry", "B"]);
}

#[tokio::test]
async fn test_failed_admin_write_reports_bad_gateway() {
    let store = MemoryStore::new().with_rows("courses", vec![course_row(1, "A")]);
    store.fail("courses", Operation::Delete).await;
    let site = start_site(store, "admin-fail").await;
    let token = site.login().await;

    let response = site
        .http
        .delete(site.api("/admin/courses/1"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let (_, body) = site.get_json("/status").await;
    assert_eq!(body["counts"]["courses"], json!(1));
}

#[tokio::test]
async fn test_admin_routes_require_session() {
    let site = start_site(MemoryStore::new(), "admin-auth").await;

    let response = site
        .http
        .get(site.api("/admin/content"))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = site
        .http
        .delete(site.api("/admin/courses/1"))
        .bearer_auth("forged-token")
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(site.remote.requests_with("DELETE").await.is_empty());

    let response = site
        .http
        .post(site.api("/admin/login"))
        .json(&json!({"username": "admin", "password": "wrong"}))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let site = start_site(MemoryStore::new(), "logout").await;
    let token = site.login().await;

    let response = site
        .http
        .post(site.api("/admin/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = site
        .http
        .get(site.api("/admin/content"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_outline_without_key_reports_bad_gateway() {
    let site = start_site(MemoryStore::new(), "outline").await;
    let token = site.login().await;

    let response = site
        .http
        .post(site.api("/admin/outline"))
        .bearer_auth(&token)
        .json(&json!({"title": "", "category": "IT"}))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = site
        .http
        .post(site.api("/admin/outline"))
        .bearer_auth(&token)
        .json(&json!({"title": "Python", "category": ""}))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.expect("body");
    assert!(body["error"].as_str().is_some_and(|e| e.contains("authentication")));
}
