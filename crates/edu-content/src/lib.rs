//! Content, admin and API layer of the educational center site.
//!
//! The crate keeps an in-memory mirror of the site content backed by a
//! remote table service, and exposes it over an HTTP API:
//!
//! - [`ContentStore`] loads every table once at startup and applies
//!   write-then-confirm mutations.
//! - [`ContactForm`] is the public site's only write path.
//! - [`AdminGate`] guards the admin console; [`OutlineGenerator`] drafts
//!   course outlines for it.
//! - [`PreferenceStore`] keeps the display language between runs.
//! - [`create_router`] wires everything into an axum router.

pub mod admin;
pub mod api;
pub mod config;
pub mod contact;
pub mod error;
pub mod model;
pub mod outline;
pub mod preferences;
pub mod seed;
pub mod store;
pub mod view;

pub use admin::{bearer_token, AdminGate, MAX_SESSIONS};
pub use api::{create_router, AppState, ErrorResponse};
pub use config::{AdminConfig, AiConfig, Config, RemoteConfig};
pub use contact::ContactForm;
pub use error::{LlmErrorKind, Result, SiteError};
pub use model::{
    Achievement, ContactInfo, ContactMessage, Course, CourseEnrollment, GlobalStats, Lang,
    Localized, NewsItem, RecordId, SocialLinks, StatItem, Table, TeacherImage,
};
pub use outline::{
    draft_outline, Chapter, GeminiConfig, GeminiOutlineClient, Outline, OutlineGenerator,
    OutlineRequest, DEFAULT_CATEGORY, MIN_CHAPTERS,
};
pub use preferences::{PreferenceStore, Preferences};
pub use store::{ContentStore, Entity, LoadState, LoadSummary, SiteContent, Singleton};
pub use view::SiteView;
