//! Content types for the educational center site.
//!
//! Every record kind maps one-to-one onto a remote table. Records are flat
//! and independently keyed; there is no foreign-key enforcement between
//! collections.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use edu_remote::Order;
use serde::{Deserialize, Serialize};

// ============================================================================
// Language and localized text
// ============================================================================

/// Display languages supported by the site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Lang {
    /// Uzbek (default).
    #[default]
    Uz,
    /// Russian.
    Ru,
    /// English.
    En,
}

impl Lang {
    /// Every supported language, in display order.
    pub const ALL: [Self; 3] = [Self::Uz, Self::Ru, Self::En];

    /// Returns the two-letter language code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Uz => "uz",
            Self::Ru => "ru",
            Self::En => "en",
        }
    }

    /// Parses a language code, case-insensitively.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "uz" => Some(Self::Uz),
            "ru" => Some(Self::Ru),
            "en" => Some(Self::En),
            _ => None,
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Lang {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_code(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid language '{s}': expected one of 'uz', 'ru', 'en'"
            ))
        })
    }
}

impl Serialize for Lang {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

/// Text held in every supported language.
///
/// Missing languages deserialize as empty strings, so a partially
/// translated row still renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localized {
    /// Uzbek text.
    #[serde(default)]
    pub uz: String,
    /// Russian text.
    #[serde(default)]
    pub ru: String,
    /// English text.
    #[serde(default)]
    pub en: String,
}

impl Localized {
    /// Creates localized text from the three translations.
    #[must_use]
    pub fn new(uz: impl Into<String>, ru: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            uz: uz.into(),
            ru: ru.into(),
            en: en.into(),
        }
    }

    /// Returns the text for `lang`.
    #[must_use]
    pub fn get(&self, lang: Lang) -> &str {
        match lang {
            Lang::Uz => &self.uz,
            Lang::Ru => &self.ru,
            Lang::En => &self.en,
        }
    }
}

// ============================================================================
// Record ids
// ============================================================================

/// Server-assigned record id.
///
/// The remote store may hand out numeric or textual ids; both are held as
/// text. A record that has not been stored yet carries an unassigned id,
/// which is left out of insert payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    /// Wraps an id value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id of a record the remote store has not seen yet.
    #[must_use]
    pub const fn unassigned() -> Self {
        Self(String::new())
    }

    /// Returns `true` if no id has been assigned.
    #[must_use]
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Signed(n) => Self(n.to_string()),
            RawId::Unsigned(n) => Self(n.to_string()),
        })
    }
}

// ============================================================================
// Tables
// ============================================================================

/// Remote tables backing the site content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Course catalogue.
    Courses,
    /// News feed.
    News,
    /// Achievements of the center and its students.
    Achievements,
    /// Headline numbers (singleton).
    Stats,
    /// Contact details (singleton).
    ContactInfo,
    /// Messages sent through the public contact form.
    Messages,
    /// Course enrollment requests.
    Enrollments,
    /// Portrait shown in the about section (singleton).
    TeacherImage,
}

impl Table {
    /// Returns the remote table name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Courses => "courses",
            Self::News => "news",
            Self::Achievements => "achievements",
            Self::Stats => "stats",
            Self::ContactInfo => "contact_info",
            Self::Messages => "messages",
            Self::Enrollments => "enrollments",
            Self::TeacherImage => "teacher_image",
        }
    }

    /// Returns the order used by the startup read, if any.
    ///
    /// Courses and news come newest first; every other table is unordered.
    #[must_use]
    pub fn startup_order(&self) -> Option<Order> {
        match self {
            Self::Courses => Some(Order::desc("id")),
            Self::News => Some(Order::desc("date")),
            _ => None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Collection records
// ============================================================================

/// A course offered by the center.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "RecordId::is_unassigned")]
    pub id: RecordId,
    /// Course name.
    pub title: Localized,
    /// Short teaser shown on cards.
    #[serde(default)]
    pub description: Localized,
    /// Full syllabus text, if written. Written as `null` when absent so an
    /// update clears the stored column.
    #[serde(default)]
    pub content: Option<Localized>,
    /// Free-form category label.
    #[serde(default)]
    pub category: String,
    /// Number of enrolled students shown on the card.
    #[serde(default)]
    pub students: u32,
    /// Human-readable duration, e.g. "3 months".
    #[serde(default)]
    pub duration: String,
    /// Image URL or embedded data URI.
    #[serde(default)]
    pub image: String,
}

/// A news post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "RecordId::is_unassigned")]
    pub id: RecordId,
    /// Headline.
    pub title: Localized,
    /// Teaser.
    #[serde(default)]
    pub description: Localized,
    /// Body text.
    #[serde(default)]
    pub content: Localized,
    /// Publication date; the feed is sorted on it, newest first.
    pub date: NaiveDate,
    /// Image URL or embedded data URI.
    #[serde(default)]
    pub image: String,
    /// Optional video link; `null` on the wire when absent.
    #[serde(default)]
    pub video_url: Option<String>,
}

/// An achievement of the center or its students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "RecordId::is_unassigned")]
    pub id: RecordId,
    /// Headline.
    pub title: Localized,
    /// Teaser.
    #[serde(default)]
    pub description: Localized,
    /// Body text.
    #[serde(default)]
    pub content: Localized,
    /// Date the achievement happened.
    pub date: NaiveDate,
}

/// A message left through the public contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "RecordId::is_unassigned")]
    pub id: RecordId,
    /// Sender name.
    pub name: String,
    /// Sender email, not validated.
    pub email: String,
    /// Message body.
    pub message: String,
    /// When the message was submitted.
    pub date: DateTime<Utc>,
}

/// A request to join a course.
///
/// `course_id` is a weak reference: deleting the course leaves it dangling,
/// and `course_title` keeps the title as it was at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseEnrollment {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "RecordId::is_unassigned")]
    pub id: RecordId,
    /// Id of the course at submission time.
    pub course_id: RecordId,
    /// Course title snapshot.
    pub course_title: String,
    /// Student full name.
    pub student_name: String,
    /// Student phone number.
    pub student_phone: String,
    /// When the request was submitted.
    pub date: DateTime<Utc>,
}

// ============================================================================
// Singleton records
// ============================================================================

/// One headline number, e.g. "500+ graduates".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatItem {
    /// Caption under the number.
    pub label: Localized,
    /// The number as displayed.
    pub value: String,
}

/// The four headline numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStats {
    /// Id of the stored row; `None` while the hardcoded default is shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Exactly four label/value pairs.
    pub items: [StatItem; 4],
}

/// Social network links shown in the footer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    /// Telegram channel link.
    #[serde(default)]
    pub telegram: String,
    /// Instagram profile link.
    #[serde(default)]
    pub instagram: String,
    /// Facebook page link.
    #[serde(default)]
    pub facebook: String,
    /// YouTube channel link.
    #[serde(default)]
    pub youtube: String,
}

/// Contact details of the center.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Id of the stored row; `None` while the hardcoded default is shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Street address.
    pub address: String,
    /// Public email.
    pub email: String,
    /// Public phone number.
    pub phone: String,
    /// Social network links.
    #[serde(default)]
    pub socials: SocialLinks,
}

/// Portrait shown in the about section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherImage {
    /// Id of the stored row; `None` while the hardcoded default is shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Image URL or embedded data URI.
    pub url: String,
}
