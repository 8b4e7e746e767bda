//! Localized read models for the public site.
//!
//! Localized fields are flattened into the requested language. Messages and
//! enrollments are never part of the public view.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{
    Achievement, ContactInfo, Course, GlobalStats, Lang, NewsItem, RecordId, SocialLinks,
};
use crate::store::SiteContent;

/// A course card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    /// Record id.
    pub id: RecordId,
    /// Course name.
    pub title: String,
    /// Short teaser.
    pub description: String,
    /// Syllabus, empty if not written.
    pub content: String,
    /// Category label.
    pub category: String,
    /// Student count.
    pub students: u32,
    /// Duration label.
    pub duration: String,
    /// Image reference.
    pub image: String,
}

impl CourseView {
    fn render(course: &Course, lang: Lang) -> Self {
        Self {
            id: course.id.clone(),
            title: course.title.get(lang).to_string(),
            description: course.description.get(lang).to_string(),
            content: course
                .content
                .as_ref()
                .map(|c| c.get(lang).to_string())
                .unwrap_or_default(),
            category: course.category.clone(),
            students: course.students,
            duration: course.duration.clone(),
            image: course.image.clone(),
        }
    }
}

/// A news post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsView {
    /// Record id.
    pub id: RecordId,
    /// Headline.
    pub title: String,
    /// Teaser.
    pub description: String,
    /// Body text.
    pub content: String,
    /// Publication date.
    pub date: NaiveDate,
    /// Image reference.
    pub image: String,
    /// Video link, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl NewsView {
    fn render(item: &NewsItem, lang: Lang) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.get(lang).to_string(),
            description: item.description.get(lang).to_string(),
            content: item.content.get(lang).to_string(),
            date: item.date,
            image: item.image.clone(),
            video_url: item.video_url.clone(),
        }
    }
}

/// An achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementView {
    /// Record id.
    pub id: RecordId,
    /// Headline.
    pub title: String,
    /// Teaser.
    pub description: String,
    /// Body text.
    pub content: String,
    /// When it happened.
    pub date: NaiveDate,
}

impl AchievementView {
    fn render(item: &Achievement, lang: Lang) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.get(lang).to_string(),
            description: item.description.get(lang).to_string(),
            content: item.content.get(lang).to_string(),
            date: item.date,
        }
    }
}

/// One headline number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatView {
    /// Caption.
    pub label: String,
    /// Displayed number.
    pub value: String,
}

fn render_stats(stats: &GlobalStats, lang: Lang) -> Vec<StatView> {
    stats
        .items
        .iter()
        .map(|item| StatView {
            label: item.label.get(lang).to_string(),
            value: item.value.clone(),
        })
        .collect()
}

/// Footer contact block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactView {
    /// Street address.
    pub address: String,
    /// Public email.
    pub email: String,
    /// Public phone.
    pub phone: String,
    /// Social links.
    pub socials: SocialLinks,
}

impl From<&ContactInfo> for ContactView {
    fn from(info: &ContactInfo) -> Self {
        Self {
            address: info.address.clone(),
            email: info.email.clone(),
            phone: info.phone.clone(),
            socials: info.socials.clone(),
        }
    }
}

/// Everything the public site renders, in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteView {
    /// Language the text is in.
    pub lang: Lang,
    /// Course cards, newest first.
    pub courses: Vec<CourseView>,
    /// News, newest first.
    pub news: Vec<NewsView>,
    /// Achievements.
    pub achievements: Vec<AchievementView>,
    /// Headline numbers.
    pub stats: Vec<StatView>,
    /// Contact block.
    pub contact: ContactView,
    /// Portrait reference.
    pub teacher_image: String,
}

impl SiteView {
    /// Renders the public view of `content` in `lang`.
    #[must_use]
    pub fn render(content: &SiteContent, lang: Lang) -> Self {
        Self {
            lang,
            courses: content
                .courses
                .iter()
                .map(|c| CourseView::render(c, lang))
                .collect(),
            news: content
                .news
                .iter()
                .map(|n| NewsView::render(n, lang))
                .collect(),
            achievements: content
                .achievements
                .iter()
                .map(|a| AchievementView::render(a, lang))
                .collect(),
            stats: render_stats(&content.stats, lang),
            contact: ContactView::from(&content.contact_info),
            teacher_image: content.teacher_image.url.clone(),
        }
    }
}
