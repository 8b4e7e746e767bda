//! Integration tests for content synchronization over HTTP.
//!
//! A fake PostgREST-style table service runs on an ephemeral port; the
//! real `RestClient` and `ContentStore` talk to it.

mod common;

use std::sync::Arc;

use common::{course_row, row, spawn_fake_rest, unreachable_url};
use edu_content::{
    seed, ContentStore, Course, Localized, NewsItem, RecordId, SiteContent, SiteError, Table,
    TeacherImage,
};
use edu_remote::{
    Key, MemoryStore, Operation, Order, RemoteError, RemoteStore, RestClient, RestConfig,
};
use serde_json::json;

fn client(url: &str) -> RestClient {
    RestClient::new(RestConfig::new(url, "anon-key")).expect("Failed to build client")
}

async fn loaded_store(url: &str) -> ContentStore {
    let store = ContentStore::new(Arc::new(client(url)));
    store.load().await;
    store
}

fn course_ids(content: &SiteContent) -> Vec<String> {
    content.courses.iter().map(|c| c.id.to_string()).collect()
}

// ============================================================================
// Wire dialect
// ============================================================================

#[tokio::test]
async fn test_select_sends_auth_and_order() {
    let fake = spawn_fake_rest(MemoryStore::new().with_rows(
        "news",
        vec![
            row(json!({"id": 1, "date": "2024-01-01"})),
            row(json!({"id": 2, "date": "2024-06-01"})),
        ],
    ))
    .await;

    let rows = client(&fake.url)
        .select("news", Some(&Order::desc("date")))
        .await
        .expect("select failed");
    assert_eq!(rows[0]["id"], json!(2));

    let requests = fake.requests().await;
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.table, "news");
    assert_eq!(request.query.get("select").map(String::as_str), Some("*"));
    assert_eq!(request.query.get("order").map(String::as_str), Some("date.desc"));
    assert_eq!(request.api_key.as_deref(), Some("anon-key"));
    assert_eq!(request.authorization.as_deref(), Some("Bearer anon-key"));
}

#[tokio::test]
async fn test_writes_use_eq_filter_and_prefer_header() {
    let fake = spawn_fake_rest(MemoryStore::new().with_rows("courses", vec![course_row(3, "Chess")]))
        .await;
    let client = client(&fake.url);

    client
        .update("courses", row(json!({"students": 40})), &Key::id("3"))
        .await
        .expect("update failed");
    client
        .delete("courses", &Key::id("3"))
        .await
        .expect("delete failed");

    let patch = &fake.requests_with("PATCH").await[0];
    assert_eq!(patch.query.get("id").map(String::as_str), Some("eq.3"));
    assert_eq!(patch.prefer.as_deref(), Some("return=representation"));

    let delete = &fake.requests_with("DELETE").await[0];
    assert_eq!(delete.query.get("id").map(String::as_str), Some("eq.3"));
    assert_eq!(delete.prefer.as_deref(), Some("return=minimal"));
}

#[tokio::test]
async fn test_update_matching_nothing_is_no_rows() {
    let fake = spawn_fake_rest(MemoryStore::new()).await;
    let err = client(&fake.url)
        .update("courses", row(json!({"students": 1})), &Key::id("99"))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::NoRows { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_server_error_is_status_error() {
    let store = MemoryStore::new();
    store.fail("courses", Operation::Select).await;
    let fake = spawn_fake_rest(store).await;

    let err = client(&fake.url).select("courses", None).await.unwrap_err();
    assert!(
        matches!(err, RemoteError::Status { status: 503, .. }),
        "got {err:?}"
    );
}

// ============================================================================
// Startup load
// ============================================================================

#[tokio::test]
async fn test_load_mirrors_remote_rows_verbatim() {
    let fake = spawn_fake_rest(
        MemoryStore::new()
            .with_rows("courses", vec![course_row(7, "Robotics"), course_row(8, "Art")])
            .with_rows(
                "stats",
                vec![row(json!({"id": 1, "items": [
                    {"label": {"en": "Graduates"}, "value": "10"},
                    {"label": {"en": "Courses"}, "value": "2"},
                    {"label": {"en": "Years"}, "value": "1"},
                    {"label": {"en": "Admissions"}, "value": "50%"}
                ]}))],
            ),
    )
    .await;

    let store = loaded_store(&fake.url).await;
    let content = store.snapshot().await.expect("not ready");

    assert_eq!(course_ids(&content), vec!["8", "7"]);
    assert_eq!(content.courses[1].title.en, "Robotics");
    assert_eq!(content.stats.items[3].value, "50%");
    assert_eq!(content.stats.id, Some(RecordId::new("1")));
    assert_eq!(content.news, seed::news());

    // One read per table, eight in total.
    assert_eq!(fake.requests_with("GET").await.len(), 8);
}

#[tokio::test]
async fn test_empty_remote_yields_seed() {
    let fake = spawn_fake_rest(MemoryStore::new()).await;
    let store = loaded_store(&fake.url).await;

    let content = store.snapshot().await.expect("not ready");
    assert_eq!(content, SiteContent::seeded());
    assert_eq!(course_ids(&content), vec!["1", "2"]);
}

#[tokio::test]
async fn test_one_failing_table_does_not_affect_others() {
    let store = MemoryStore::new()
        .with_rows("courses", vec![course_row(5, "Chess")])
        .with_rows("teacher_image", vec![row(json!({"id": 1, "url": "me.png"}))]);
    store.fail("news", Operation::Select).await;
    let fake = spawn_fake_rest(store).await;

    let store = ContentStore::new(Arc::new(client(&fake.url)));
    let summary = store.load().await;

    assert!(summary.fallbacks.contains(&Table::News));
    assert!(!summary.fallbacks.contains(&Table::Courses));
    let content = store.snapshot().await.expect("not ready");
    assert_eq!(content.news, seed::news());
    assert_eq!(course_ids(&content), vec!["5"]);
    assert_eq!(content.teacher_image.url, "me.png");
}

#[tokio::test]
async fn test_unreachable_remote_falls_back_everywhere() {
    let store = loaded_store(&unreachable_url()).await;
    let content = store.snapshot().await.expect("not ready");
    assert_eq!(content, SiteContent::seeded());
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_create_prepends_server_confirmed_record() {
    let fake = spawn_fake_rest(MemoryStore::new().with_rows("courses", vec![course_row(10, "Chess")]))
        .await;
    let store = loaded_store(&fake.url).await;

    let created = store
        .create(Course {
            id: RecordId::new("local-draft"),
            title: Localized::new("Fizika", "Физика", "Physics"),
            category: "Science".to_string(),
            ..Default::default()
        })
        .await
        .expect("create failed");

    assert_eq!(created.id.as_str(), "11");
    let content = store.snapshot().await.expect("not ready");
    assert_eq!(course_ids(&content), vec!["11", "10"]);

    // The draft id never reaches the wire.
    let stored = fake.store.rows("courses").await;
    assert!(stored.iter().all(|r| r["id"] != json!("local-draft")));
    let insert = &fake.requests_with("POST").await[0];
    assert_eq!(insert.prefer.as_deref(), Some("return=representation"));
}

#[tokio::test]
async fn test_create_failure_is_not_retried() {
    let fake = spawn_fake_rest(MemoryStore::new()).await;
    let store = loaded_store(&fake.url).await;
    fake.store.fail("news", Operation::Insert).await;
    let before = store.snapshot().await.expect("not ready");

    let draft = NewsItem {
        id: RecordId::unassigned(),
        title: Localized::new("Yangilik", "Новость", "News"),
        description: Localized::default(),
        content: Localized::default(),
        date: chrono::NaiveDate::from_ymd_opt(2024, 10, 1).expect("valid date"),
        image: String::new(),
        video_url: None,
    };
    let err = store.create(draft).await.unwrap_err();

    assert!(matches!(err, SiteError::RemoteWrite { .. }), "got {err:?}");
    assert_eq!(store.snapshot().await.expect("not ready"), before);
    assert_eq!(fake.requests_with("POST").await.len(), 1);
}

#[tokio::test]
async fn test_update_replaces_only_matching_record() {
    let fake = spawn_fake_rest(MemoryStore::new().with_rows(
        "courses",
        vec![course_row(1, "A"), course_row(2, "B"), course_row(3, "C")],
    ))
    .await;
    let store = loaded_store(&fake.url).await;
    let before = store.snapshot().await.expect("not ready");

    let mut record = before.courses[1].clone();
    record.duration = "1 year".to_string();
    store.update(record).await.expect("update failed");

    let after = store.snapshot().await.expect("not ready");
    assert_eq!(after.courses.len(), before.courses.len());
    assert_eq!(after.courses[1].duration, "1 year");
    assert_eq!(after.courses[0], before.courses[0]);
    assert_eq!(after.courses[2], before.courses[2]);

    let remote = fake.store.rows("courses").await;
    let stored = remote.iter().find(|r| r["id"] == json!(2)).expect("row 2");
    assert_eq!(stored["duration"], json!("1 year"));
}

#[tokio::test]
async fn test_update_sends_null_for_cleared_fields() {
    let mut course = course_row(4, "Chess");
    course.insert("content".into(), json!({"uz": "a", "ru": "b", "en": "c"}));
    let fake = spawn_fake_rest(
        MemoryStore::new()
            .with_rows("courses", vec![course])
            .with_rows(
                "news",
                vec![row(json!({
                    "id": 9,
                    "title": {"en": "Open day"},
                    "date": "2024-05-12",
                    "videoUrl": "https://youtu.be/old"
                }))],
            ),
    )
    .await;
    let store = loaded_store(&fake.url).await;

    let mut item = store.snapshot().await.expect("not ready").news[0].clone();
    item.video_url = None;
    store.update(item).await.expect("news update failed");

    let mut course = store.snapshot().await.expect("not ready").courses[0].clone();
    course.content = None;
    store.update(course).await.expect("course update failed");

    let content = store.snapshot().await.expect("not ready");
    assert_eq!(content.news[0].video_url, None);
    assert_eq!(content.courses[0].content, None);
    assert_eq!(fake.store.rows("news").await[0]["videoUrl"], json!(null));
    assert_eq!(fake.store.rows("courses").await[0]["content"], json!(null));
}

#[tokio::test]
async fn test_delete_course_one_leaves_course_two() {
    let fake = spawn_fake_rest(
        MemoryStore::new().with_rows("courses", vec![course_row(1, "A"), course_row(2, "B")]),
    )
    .await;
    let store = loaded_store(&fake.url).await;

    store
        .delete::<Course>(&RecordId::new("1"))
        .await
        .expect("delete failed");

    let content = store.snapshot().await.expect("not ready");
    assert_eq!(course_ids(&content), vec!["2"]);
    assert_eq!(fake.store.rows("courses").await.len(), 1);
}

#[tokio::test]
async fn test_delete_failure_keeps_mirror() {
    let fake = spawn_fake_rest(MemoryStore::new()).await;
    let store = loaded_store(&fake.url).await;
    fake.store.fail("courses", Operation::Delete).await;

    let err = store
        .delete::<Course>(&RecordId::new("2"))
        .await
        .unwrap_err();
    assert!(matches!(err, SiteError::RemoteWrite { .. }));
    assert_eq!(
        course_ids(&store.snapshot().await.expect("not ready")),
        vec!["1", "2"]
    );
}

#[tokio::test]
async fn test_singleton_insert_then_update() {
    let fake = spawn_fake_rest(MemoryStore::new()).await;
    let store = loaded_store(&fake.url).await;

    store
        .save(TeacherImage {
            id: None,
            url: "one.png".to_string(),
        })
        .await
        .expect("first save failed");
    store
        .save(TeacherImage {
            id: None,
            url: "two.png".to_string(),
        })
        .await
        .expect("second save failed");

    assert_eq!(fake.requests_with("POST").await.len(), 1);
    assert_eq!(fake.requests_with("PATCH").await.len(), 1);
    let rows = fake.store.rows("teacher_image").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["url"], json!("two.png"));
}
