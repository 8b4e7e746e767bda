//! Built-in content shown when the remote store has nothing to offer.
//!
//! Collections fall back to a small seed set; singletons fall back to a
//! hardcoded default so the page always has one row to render.

use chrono::NaiveDate;

use crate::model::{
    Achievement, ContactInfo, Course, GlobalStats, Localized, NewsItem, RecordId, SocialLinks,
    StatItem, TeacherImage,
};

/// Portrait used until an image is uploaded.
pub const DEFAULT_TEACHER_IMAGE: &str =
    "https://images.unsplash.com/photo-1544717305-2782549b5136?w=800";

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// The two courses shown on a fresh install.
#[must_use]
pub fn courses() -> Vec<Course> {
    vec![
        Course {
            id: RecordId::new("1"),
            title: Localized::new("Ingliz tili (IELTS)", "Английский язык (IELTS)", "English (IELTS)"),
            description: Localized::new(
                "IELTS imtihoniga 3 oyda tayyorgarlik",
                "Подготовка к IELTS за 3 месяца",
                "IELTS preparation in 3 months",
            ),
            content: None,
            category: "Languages".to_string(),
            students: 120,
            duration: "3 months".to_string(),
            image: "https://images.unsplash.com/photo-1523050854058-8df90110c9f1?w=800"
                .to_string(),
        },
        Course {
            id: RecordId::new("2"),
            title: Localized::new("Matematika", "Математика", "Mathematics"),
            description: Localized::new(
                "Abituriyentlar uchun chuqurlashtirilgan matematika",
                "Углублённая математика для абитуриентов",
                "Advanced mathematics for university applicants",
            ),
            content: None,
            category: "Exact sciences".to_string(),
            students: 85,
            duration: "6 months".to_string(),
            image: "https://images.unsplash.com/photo-1509228468518-180dd4864904?w=800"
                .to_string(),
        },
    ]
}

/// News shown on a fresh install, newest first.
#[must_use]
pub fn news() -> Vec<NewsItem> {
    vec![
        NewsItem {
            id: RecordId::new("1"),
            title: Localized::new(
                "Yangi o'quv yili boshlandi",
                "Начался новый учебный год",
                "The new academic year has started",
            ),
            description: Localized::new(
                "Barcha guruhlarga qabul davom etmoqda",
                "Продолжается набор во все группы",
                "Enrollment is open for all groups",
            ),
            content: Localized::new(
                "Markazimiz yangi o'quv yilida barcha yo'nalishlar bo'yicha qabulni davom ettirmoqda.",
                "Наш центр продолжает набор по всем направлениям в новом учебном году.",
                "Our center keeps enrolling students in every program for the new academic year.",
            ),
            date: date(2024, 9, 2),
            image: "https://images.unsplash.com/photo-1427504494785-3a9ca7044f45?w=800"
                .to_string(),
            video_url: None,
        },
    ]
}

/// Achievements shown on a fresh install.
#[must_use]
pub fn achievements() -> Vec<Achievement> {
    vec![Achievement {
        id: RecordId::new("1"),
        title: Localized::new(
            "50 nafar talaba IELTS 7.0+",
            "50 студентов с IELTS 7.0+",
            "50 students scored IELTS 7.0+",
        ),
        description: Localized::new(
            "2023-yil natijalari",
            "Результаты 2023 года",
            "Results of 2023",
        ),
        content: Localized::default(),
        date: date(2023, 12, 20),
    }]
}

/// Headline numbers shown until the operator saves their own.
#[must_use]
pub fn stats() -> GlobalStats {
    let item = |uz: &str, ru: &str, en: &str, value: &str| StatItem {
        label: Localized::new(uz, ru, en),
        value: value.to_string(),
    };
    GlobalStats {
        id: None,
        items: [
            item("Bitiruvchilar", "Выпускники", "Graduates", "1000+"),
            item("Kurslar", "Курсы", "Courses", "15+"),
            item("Tajriba yili", "Лет опыта", "Years of experience", "10+"),
            item("Oliygohga kirganlar", "Поступившие в вузы", "University admissions", "95%"),
        ],
    }
}

/// Contact details shown until the operator saves their own.
#[must_use]
pub fn contact_info() -> ContactInfo {
    ContactInfo {
        id: None,
        address: "Tashkent, Uzbekistan".to_string(),
        email: "info@edu-center.uz".to_string(),
        phone: "+998 90 123 45 67".to_string(),
        socials: SocialLinks {
            telegram: "https://t.me/edu_center".to_string(),
            instagram: "https://instagram.com/edu_center".to_string(),
            facebook: "https://facebook.com/edu_center".to_string(),
            youtube: "https://youtube.com/@edu_center".to_string(),
        },
    }
}

/// Portrait shown until the operator uploads one.
#[must_use]
pub fn teacher_image() -> TeacherImage {
    TeacherImage {
        id: None,
        url: DEFAULT_TEACHER_IMAGE.to_string(),
    }
}
