//! In-memory mirror of the remote content tables.
//!
//! The mirror is filled once at startup and afterwards changes only through
//! write-then-confirm mutations: the remote write is issued and awaited
//! first, and the local copy is touched only once the remote store has
//! confirmed it. A failed write leaves the mirror exactly as it was and is
//! never retried.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use edu_content::{ContentStore, Course, Localized, RecordId};
//! use edu_remote::MemoryStore;
//!
//! # tokio_test::block_on(async {
//! let store = ContentStore::new(Arc::new(MemoryStore::new()));
//! store.load().await;
//!
//! // The remote store is empty, so the seed courses are shown.
//! let count = store.read(|c| c.courses.len()).await.unwrap();
//! assert_eq!(count, 2);
//!
//! let draft = Course {
//!     title: Localized::new("Fizika", "Физика", "Physics"),
//!     ..Default::default()
//! };
//! let stored = store.create(draft).await.unwrap();
//! assert!(!stored.id.is_unassigned());
//! # });
//! ```

use std::sync::Arc;

use edu_remote::{Key, Operation, RemoteStore, Row};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, SiteError};
use crate::model::{
    Achievement, ContactInfo, ContactMessage, Course, CourseEnrollment, GlobalStats, NewsItem,
    RecordId, Table, TeacherImage,
};
use crate::seed;

// ============================================================================
// Mirrored content
// ============================================================================

/// Everything the site shows, as last confirmed by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContent {
    /// Course catalogue, newest first.
    pub courses: Vec<Course>,
    /// News feed, newest first.
    pub news: Vec<NewsItem>,
    /// Achievements.
    pub achievements: Vec<Achievement>,
    /// Headline numbers.
    pub stats: GlobalStats,
    /// Contact details.
    pub contact_info: ContactInfo,
    /// Messages from the public contact form.
    pub messages: Vec<ContactMessage>,
    /// Enrollment requests.
    pub enrollments: Vec<CourseEnrollment>,
    /// Portrait for the about section.
    pub teacher_image: TeacherImage,
}

impl SiteContent {
    /// Content made only of seed collections and singleton defaults.
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            courses: seed::courses(),
            news: seed::news(),
            achievements: seed::achievements(),
            stats: seed::stats(),
            contact_info: seed::contact_info(),
            messages: Vec::new(),
            enrollments: Vec::new(),
            teacher_image: seed::teacher_image(),
        }
    }
}

/// Whether the startup load has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// Startup reads are still in flight.
    Loading,
    /// Every startup read has settled.
    Ready,
}

/// What the startup load had to substitute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Tables whose read failed or came back empty, in table order.
    pub fallbacks: Vec<Table>,
}

// ============================================================================
// Record kinds
// ============================================================================

/// A keyed record living in one of the mirrored collections.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Remote table holding the collection.
    const TABLE: Table;

    /// Returns the record id.
    fn id(&self) -> &RecordId;

    /// Replaces the record id.
    fn set_id(&mut self, id: RecordId);

    /// Returns the mirrored collection.
    fn collection(content: &SiteContent) -> &Vec<Self>;

    /// Returns the mirrored collection for mutation.
    fn collection_mut(content: &mut SiteContent) -> &mut Vec<Self>;

    /// Returns the records shown when the remote collection is empty.
    fn seed() -> Vec<Self>;
}

macro_rules! impl_entity {
    ($ty:ty, $table:expr, $field:ident, $seed:expr) => {
        impl Entity for $ty {
            const TABLE: Table = $table;

            fn id(&self) -> &RecordId {
                &self.id
            }

            fn set_id(&mut self, id: RecordId) {
                self.id = id;
            }

            fn collection(content: &SiteContent) -> &Vec<Self> {
                &content.$field
            }

            fn collection_mut(content: &mut SiteContent) -> &mut Vec<Self> {
                &mut content.$field
            }

            fn seed() -> Vec<Self> {
                $seed
            }
        }
    };
}

impl_entity!(Course, Table::Courses, courses, seed::courses());
impl_entity!(NewsItem, Table::News, news, seed::news());
impl_entity!(Achievement, Table::Achievements, achievements, seed::achievements());
impl_entity!(ContactMessage, Table::Messages, messages, Vec::new());
impl_entity!(CourseEnrollment, Table::Enrollments, enrollments, Vec::new());

/// A record of which exactly one logical row exists.
pub trait Singleton: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Remote table holding the row.
    const TABLE: Table;

    /// Returns the stored row id, or `None` for the hardcoded default.
    fn row_id(&self) -> Option<&RecordId>;

    /// Returns the mirrored slot.
    fn slot(content: &SiteContent) -> &Self;

    /// Returns the mirrored slot for mutation.
    fn slot_mut(content: &mut SiteContent) -> &mut Self;

    /// Returns the value shown when the remote table is empty.
    fn fallback() -> Self;
}

macro_rules! impl_singleton {
    ($ty:ty, $table:expr, $field:ident, $fallback:expr) => {
        impl Singleton for $ty {
            const TABLE: Table = $table;

            fn row_id(&self) -> Option<&RecordId> {
                self.id.as_ref().filter(|id| !id.is_unassigned())
            }

            fn slot(content: &SiteContent) -> &Self {
                &content.$field
            }

            fn slot_mut(content: &mut SiteContent) -> &mut Self {
                &mut content.$field
            }

            fn fallback() -> Self {
                $fallback
            }
        }
    };
}

impl_singleton!(GlobalStats, Table::Stats, stats, seed::stats());
impl_singleton!(ContactInfo, Table::ContactInfo, contact_info, seed::contact_info());
impl_singleton!(TeacherImage, Table::TeacherImage, teacher_image, seed::teacher_image());

// ============================================================================
// Row conversion
// ============================================================================

/// Serializes a record into a write payload. The id column is never sent.
fn to_row<T: Serialize>(table: Table, record: &T) -> Result<Row> {
    match serde_json::to_value(record)? {
        Value::Object(mut row) => {
            row.remove("id");
            Ok(row)
        }
        other => Err(SiteError::row_decode(
            table,
            format!("expected an object, got {other}"),
        )),
    }
}

fn from_row<T: DeserializeOwned>(table: Table, row: Row) -> Result<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| SiteError::row_decode(table, e.to_string()))
}

// ============================================================================
// ContentStore
// ============================================================================

/// Shared mirror of the site content.
///
/// Reads are served from memory. Writes go to the remote store first; the
/// lock is only taken after the remote call returns.
#[derive(Debug)]
pub struct ContentStore {
    remote: Arc<dyn RemoteStore>,
    content: RwLock<Option<SiteContent>>,
}

impl ContentStore {
    /// Creates an empty store in the loading state.
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            remote,
            content: RwLock::new(None),
        }
    }

    /// Creates a store that is already ready with `content`.
    #[must_use]
    pub fn with_content(remote: Arc<dyn RemoteStore>, content: SiteContent) -> Self {
        Self {
            remote,
            content: RwLock::new(Some(content)),
        }
    }

    /// Reads every table once and fills the mirror.
    ///
    /// The eight reads run concurrently. A read that fails or returns no
    /// rows is replaced by seed or default data; such failures are logged
    /// and never abort the other reads. The store is ready when this
    /// returns.
    pub async fn load(&self) -> LoadSummary {
        let (
            (courses, courses_ok),
            (news, news_ok),
            (achievements, achievements_ok),
            (stats, stats_ok),
            (contact_info, contact_ok),
            (messages, messages_ok),
            (enrollments, enrollments_ok),
            (teacher_image, image_ok),
        ) = tokio::join!(
            self.read_collection::<Course>(),
            self.read_collection::<NewsItem>(),
            self.read_collection::<Achievement>(),
            self.read_singleton::<GlobalStats>(),
            self.read_singleton::<ContactInfo>(),
            self.read_collection::<ContactMessage>(),
            self.read_collection::<CourseEnrollment>(),
            self.read_singleton::<TeacherImage>(),
        );

        let fallbacks = [
            (Table::Courses, courses_ok),
            (Table::News, news_ok),
            (Table::Achievements, achievements_ok),
            (Table::Stats, stats_ok),
            (Table::ContactInfo, contact_ok),
            (Table::Messages, messages_ok),
            (Table::Enrollments, enrollments_ok),
            (Table::TeacherImage, image_ok),
        ]
        .into_iter()
        .filter(|(_, loaded)| !loaded)
        .map(|(table, _)| table)
        .collect();

        let content = SiteContent {
            courses,
            news,
            achievements,
            stats,
            contact_info,
            messages,
            enrollments,
            teacher_image,
        };
        info!(
            courses = content.courses.len(),
            news = content.news.len(),
            achievements = content.achievements.len(),
            messages = content.messages.len(),
            enrollments = content.enrollments.len(),
            "Site content loaded"
        );

        *self.content.write().await = Some(content);
        LoadSummary { fallbacks }
    }

    /// Returns `(records, loaded_from_remote)`.
    async fn read_collection<E: Entity>(&self) -> (Vec<E>, bool) {
        let table = E::TABLE;
        let order = table.startup_order();
        let rows = match self.remote.select(table.name(), order.as_ref()).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(table = %table, error = %e, "Startup read failed, using seed data");
                return (E::seed(), false);
            }
        };
        if rows.is_empty() {
            debug!(table = %table, "Remote collection empty, using seed data");
            return (E::seed(), false);
        }

        match rows
            .into_iter()
            .map(|row| from_row::<E>(table, row))
            .collect::<Result<Vec<_>>>()
        {
            Ok(records) => (records, true),
            Err(e) => {
                warn!(table = %table, error = %e, "Startup rows unreadable, using seed data");
                (E::seed(), false)
            }
        }
    }

    /// Returns `(value, loaded_from_remote)`.
    async fn read_singleton<S: Singleton>(&self) -> (S, bool) {
        let table = S::TABLE;
        let row = match self.remote.select(table.name(), None).await {
            Ok(rows) => rows.into_iter().next(),
            Err(e) => {
                warn!(table = %table, error = %e, "Startup read failed, using default");
                return (S::fallback(), false);
            }
        };
        let Some(row) = row else {
            debug!(table = %table, "Remote singleton missing, using default");
            return (S::fallback(), false);
        };

        match from_row::<S>(table, row) {
            Ok(value) => (value, true),
            Err(e) => {
                warn!(table = %table, error = %e, "Startup row unreadable, using default");
                (S::fallback(), false)
            }
        }
    }

    /// Returns whether the startup load has settled.
    pub async fn state(&self) -> LoadState {
        if self.content.read().await.is_some() {
            LoadState::Ready
        } else {
            LoadState::Loading
        }
    }

    /// Returns a copy of the mirror, or `None` while loading.
    pub async fn snapshot(&self) -> Option<SiteContent> {
        self.content.read().await.clone()
    }

    /// Runs `f` against the mirror.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::NotReady`] while the startup load is running.
    pub async fn read<R>(&self, f: impl FnOnce(&SiteContent) -> R) -> Result<R> {
        self.content
            .read()
            .await
            .as_ref()
            .map(f)
            .ok_or(SiteError::NotReady)
    }

    async fn ensure_ready(&self) -> Result<()> {
        self.read(|_| ()).await
    }

    /// Inserts `draft` remotely and prepends the confirmed record.
    ///
    /// Any id on the draft is ignored; the returned record carries the id
    /// assigned by the remote store.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::RemoteWrite`] if the insert fails, in which case
    /// the mirror is unchanged.
    pub async fn create<E: Entity>(&self, draft: E) -> Result<E> {
        self.ensure_ready().await?;
        let table = E::TABLE;
        let row = to_row(table, &draft)?;

        let stored = self
            .remote
            .insert(table.name(), row)
            .await
            .map_err(|e| SiteError::remote_write(table, Operation::Insert, e))?;
        let record: E = from_row(table, stored)?;
        if record.id().is_unassigned() {
            return Err(SiteError::MissingRemoteId { table });
        }

        if let Some(content) = self.content.write().await.as_mut() {
            E::collection_mut(content).insert(0, record.clone());
        }
        info!(table = %table, id = %record.id(), "Record created");
        Ok(record)
    }

    /// Replaces the record with the same id, remotely and then locally.
    ///
    /// The record keeps its position in the collection. Every field is
    /// sent, so a cleared optional field is stored as `null`.
    ///
    /// Seed records shown after an empty or failed startup read have no
    /// remote row, so updating one fails with a `NoRows` write error while
    /// deleting one succeeds. Re-create a seed record to make it editable.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::UnassignedId`] for a record without an id and
    /// [`SiteError::RemoteWrite`] if the update fails or matches no row.
    pub async fn update<E: Entity>(&self, record: E) -> Result<E> {
        self.ensure_ready().await?;
        let table = E::TABLE;
        if record.id().is_unassigned() {
            return Err(SiteError::UnassignedId {
                table,
                operation: Operation::Update,
            });
        }
        let key = Key::id(record.id().as_str());
        let patch = to_row(table, &record)?;

        let stored = self
            .remote
            .update(table.name(), patch, &key)
            .await
            .map_err(|e| SiteError::remote_write(table, Operation::Update, e))?;
        let confirmed: E = from_row(table, stored)?;

        let mut guard = self.content.write().await;
        let slot = guard
            .as_mut()
            .and_then(|content| {
                E::collection_mut(content)
                    .iter_mut()
                    .find(|existing| existing.id() == record.id())
            });
        match slot {
            Some(existing) => *existing = confirmed.clone(),
            None => warn!(table = %table, id = %record.id(), "Updated record not in mirror"),
        }
        info!(table = %table, id = %record.id(), "Record updated");
        Ok(confirmed)
    }

    /// Deletes the record with `id`, remotely and then locally.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::RemoteWrite`] if the delete fails, in which case
    /// the record stays in the mirror.
    pub async fn delete<E: Entity>(&self, id: &RecordId) -> Result<()> {
        self.ensure_ready().await?;
        let table = E::TABLE;
        if id.is_unassigned() {
            return Err(SiteError::UnassignedId {
                table,
                operation: Operation::Delete,
            });
        }

        self.remote
            .delete(table.name(), &Key::id(id.as_str()))
            .await
            .map_err(|e| SiteError::remote_write(table, Operation::Delete, e))?;

        if let Some(content) = self.content.write().await.as_mut() {
            E::collection_mut(content).retain(|record| record.id() != id);
        }
        info!(table = %table, id = %id, "Record deleted");
        Ok(())
    }

    /// Saves a singleton.
    ///
    /// A row that exists remotely is updated by id; a slot still holding
    /// its default is inserted and adopts the confirmed row id.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::RemoteWrite`] if the write fails, in which case
    /// the slot is unchanged.
    pub async fn save<S: Singleton>(&self, value: S) -> Result<S> {
        let table = S::TABLE;
        let current_id = self.read(|content| S::slot(content).row_id().cloned()).await?;
        let row = to_row(table, &value)?;

        let stored = match value.row_id().cloned().or(current_id) {
            Some(id) => self
                .remote
                .update(table.name(), row, &Key::id(id.as_str()))
                .await
                .map_err(|e| SiteError::remote_write(table, Operation::Update, e))?,
            None => self
                .remote
                .insert(table.name(), row)
                .await
                .map_err(|e| SiteError::remote_write(table, Operation::Insert, e))?,
        };
        let confirmed: S = from_row(table, stored)?;
        if confirmed.row_id().is_none() {
            return Err(SiteError::MissingRemoteId { table });
        }

        if let Some(content) = self.content.write().await.as_mut() {
            *S::slot_mut(content) = confirmed.clone();
        }
        info!(table = %table, "Singleton saved");
        Ok(confirmed)
    }
}
