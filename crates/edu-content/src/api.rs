//! HTTP API for the public site and the admin console.
//!
//! # Endpoints
//!
//! Public:
//! - `GET /api/status` - Load state and collection sizes
//! - `GET /api/site?lang=ru` - Localized site content
//! - `POST /api/contact` - Contact form submission
//! - `GET /api/preferences`, `PUT /api/preferences` - Display language
//!
//! Admin (all but login need `Authorization: Bearer <token>`):
//! - `POST /api/admin/login`, `POST /api/admin/logout`
//! - `GET /api/admin/content` - The raw mirror, including inbox tables
//! - `POST /api/admin/{collection}`, `PUT|DELETE /api/admin/{collection}/:id`
//!   for `courses`, `news`, `achievements`, `messages`, `enrollments`
//! - `PUT /api/admin/stats`, `/api/admin/contact-info`, `/api/admin/teacher-image`
//! - `POST /api/admin/outline` - AI course outline draft
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use edu_content::{
//!     create_router, AdminGate, AppState, ContentStore, GeminiConfig, GeminiOutlineClient,
//!     PreferenceStore,
//! };
//! use edu_remote::MemoryStore;
//! use tokio::sync::Mutex;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState {
//!     content: Arc::new(ContentStore::new(Arc::new(MemoryStore::new()))),
//!     outline: Arc::new(GeminiOutlineClient::new(GeminiConfig::default())?),
//!     admin: Arc::new(AdminGate::new("admin", "secret", Duration::from_millis(800))),
//!     preferences: Arc::new(Mutex::new(PreferenceStore::load("preferences.json"))),
//! };
//! state.content.load().await;
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, create_router(state)).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::admin::{bearer_token, AdminGate};
use crate::contact::ContactForm;
use crate::error::SiteError;
use crate::model::{
    Achievement, ContactInfo, ContactMessage, Course, CourseEnrollment, GlobalStats, Lang,
    NewsItem, RecordId, TeacherImage,
};
use crate::outline::{draft_outline, Outline, OutlineGenerator};
use crate::preferences::{PreferenceStore, Preferences};
use crate::store::{ContentStore, Entity, LoadState, SiteContent, Singleton};
use crate::view::SiteView;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Number of records per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionCounts {
    /// Courses.
    pub courses: usize,
    /// News posts.
    pub news: usize,
    /// Achievements.
    pub achievements: usize,
    /// Contact messages.
    pub messages: usize,
    /// Enrollment requests.
    pub enrollments: usize,
}

impl CollectionCounts {
    /// Counts the records in `content`.
    #[must_use]
    pub fn of(content: &SiteContent) -> Self {
        Self {
            courses: content.courses.len(),
            news: content.news.len(),
            achievements: content.achievements.len(),
            messages: content.messages.len(),
            enrollments: content.enrollments.len(),
        }
    }
}

/// Response body for the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Whether the startup load has settled.
    pub state: LoadState,
    /// Collection sizes, once ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<CollectionCounts>,
    /// Current display language.
    pub language: Lang,
}

/// Query string of the site endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteQuery {
    /// Language to render; the saved preference when absent.
    pub lang: Option<Lang>,
}

/// Request body for the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Response body for the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Session token for the `Authorization` header.
    pub token: String,
}

/// Request body for the outline endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OutlineBody {
    /// Course title.
    #[serde(default)]
    pub title: String,
    /// Course category; may be blank.
    #[serde(default)]
    pub category: String,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Mirror of the site content.
    pub content: Arc<ContentStore>,
    /// Outline generator used by the admin console.
    pub outline: Arc<dyn OutlineGenerator>,
    /// Admin credential check and sessions.
    pub admin: Arc<AdminGate>,
    /// Saved display preferences.
    pub preferences: Arc<Mutex<PreferenceStore>>,
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
struct ApiError(SiteError);

impl From<SiteError> for ApiError {
    fn from(err: SiteError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            SiteError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            SiteError::FormIncomplete { .. }
            | SiteError::EmptyOutlineTitle
            | SiteError::UnassignedId { .. } => StatusCode::BAD_REQUEST,
            SiteError::InvalidCredentials | SiteError::Unauthorized => StatusCode::UNAUTHORIZED,
            err if err.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self.0, "Request failed");
        }
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

// ============================================================================
// Admin session extractor
// ============================================================================

/// A verified admin session, taken from the bearer token.
#[derive(Debug)]
struct AdminSession {
    token: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(SiteError::Unauthorized)?
            .to_string();
        state.admin.verify(&token).await?;
        Ok(Self { token })
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints.
///
/// The router carries CORS middleware for browser front ends and tracing
/// middleware for request logging.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut api_routes = Router::new()
        .route("/status", get(handle_status))
        .route("/site", get(handle_site))
        .route("/contact", post(handle_contact))
        .route(
            "/preferences",
            get(handle_get_preferences).put(handle_put_preferences),
        )
        .route("/admin/login", post(handle_login))
        .route("/admin/logout", post(handle_logout))
        .route("/admin/content", get(handle_admin_content))
        .route("/admin/outline", post(handle_outline))
        .route("/admin/stats", put(handle_save_singleton::<GlobalStats>))
        .route("/admin/contact-info", put(handle_save_singleton::<ContactInfo>))
        .route("/admin/teacher-image", put(handle_save_singleton::<TeacherImage>));

    api_routes = collection_routes::<Course>(api_routes, "/admin/courses");
    api_routes = collection_routes::<NewsItem>(api_routes, "/admin/news");
    api_routes = collection_routes::<Achievement>(api_routes, "/admin/achievements");
    api_routes = collection_routes::<ContactMessage>(api_routes, "/admin/messages");
    api_routes = collection_routes::<CourseEnrollment>(api_routes, "/admin/enrollments");

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

fn collection_routes<E: Entity>(
    router: Router<Arc<AppState>>,
    path: &str,
) -> Router<Arc<AppState>> {
    router.route(path, post(handle_create::<E>)).route(
        &format!("{path}/:id"),
        put(handle_update::<E>).delete(handle_delete::<E>),
    )
}

// ============================================================================
// Public Handlers
// ============================================================================

/// Handler for `GET /api/status`.
async fn handle_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let counts = state.content.read(CollectionCounts::of).await.ok();
    let language = state.preferences.lock().await.language();
    Json(StatusResponse {
        state: state.content.state().await,
        counts,
        language,
    })
}

/// Handler for `GET /api/site`.
///
/// Renders the public view in the requested language, falling back to the
/// saved preference.
async fn handle_site(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SiteQuery>,
) -> Result<Json<SiteView>, ApiError> {
    let lang = match query.lang {
        Some(lang) => lang,
        None => state.preferences.lock().await.language(),
    };
    let view = state
        .content
        .read(|content| SiteView::render(content, lang))
        .await?;
    Ok(Json(view))
}

/// Handler for `POST /api/contact`.
async fn handle_contact(
    State(state): State<Arc<AppState>>,
    Json(mut form): Json<ContactForm>,
) -> Result<(StatusCode, Json<ContactMessage>), ApiError> {
    let stored = form.submit(&state.content).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Handler for `GET /api/preferences`.
async fn handle_get_preferences(State(state): State<Arc<AppState>>) -> Json<Preferences> {
    Json(state.preferences.lock().await.get())
}

/// Handler for `PUT /api/preferences`.
async fn handle_put_preferences(
    State(state): State<Arc<AppState>>,
    Json(request): Json<Preferences>,
) -> Result<Json<Preferences>, ApiError> {
    let mut preferences = state.preferences.lock().await;
    preferences.set_language(request.language)?;
    info!(language = %request.language, "Display language changed");
    Ok(Json(preferences.get()))
}

// ============================================================================
// Admin Handlers
// ============================================================================

/// Handler for `POST /api/admin/login`.
async fn handle_login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let token = state
        .admin
        .login(&request.username, &request.password)
        .await?;
    Ok(Json(LoginResponse { token }))
}

/// Handler for `POST /api/admin/logout`.
async fn handle_logout(State(state): State<Arc<AppState>>, session: AdminSession) -> StatusCode {
    state.admin.logout(&session.token).await;
    StatusCode::NO_CONTENT
}

/// Handler for `GET /api/admin/content`.
async fn handle_admin_content(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
) -> Result<Json<SiteContent>, ApiError> {
    let content = state.content.snapshot().await.ok_or(SiteError::NotReady)?;
    Ok(Json(content))
}

/// Handler for `POST /api/admin/outline`.
async fn handle_outline(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    Json(request): Json<OutlineBody>,
) -> Result<Json<Outline>, ApiError> {
    let outline = draft_outline(state.outline.as_ref(), &request.title, &request.category).await?;
    Ok(Json(outline))
}

/// Handler for `POST /api/admin/{collection}`.
async fn handle_create<E: Entity>(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    Json(draft): Json<E>,
) -> Result<(StatusCode, Json<E>), ApiError> {
    let created = state.content.create(draft).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for `PUT /api/admin/{collection}/:id`.
///
/// The id in the path wins over any id in the body.
async fn handle_update<E: Entity>(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    Path(id): Path<String>,
    Json(mut record): Json<E>,
) -> Result<Json<E>, ApiError> {
    record.set_id(RecordId::new(id));
    let updated = state.content.update(record).await?;
    Ok(Json(updated))
}

/// Handler for `DELETE /api/admin/{collection}/:id`.
async fn handle_delete<E: Entity>(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.content.delete::<E>(&RecordId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `PUT /api/admin/{stats,contact-info,teacher-image}`.
async fn handle_save_singleton<S: Singleton>(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    Json(value): Json<S>,
) -> Result<Json<S>, ApiError> {
    let saved = state.content.save(value).await?;
    Ok(Json(saved))
}

// ============================================================================
// Tests
// ============================================================================
