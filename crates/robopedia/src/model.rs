//! # Domain Model
//!
//! Typed records for everything the encyclopedia stores: [`Robot`], [`NewsArticle`],
//! [`User`] and [`Activity`].
//!
//! ## Drafts, Patches and the Default-Fill Policy
//!
//! Records are never built field by field at call sites. Each type has:
//! - a **draft** (`RobotDraft`, ...): every field optional, used by `create`
//! - a **patch** (`RobotPatch`, ...): every field optional, used by `update`
//!
//! Defaults are applied exactly once, when a draft becomes a record
//! (`from_draft` in [`crate::record`]):
//!
//! | Field | Default |
//! |-------|---------|
//! | `year` | current year (also when a stored value is unparsable) |
//! | `features`, `tags`, `gallery` | empty list |
//! | `specifications` | empty map, keys lower-cased |
//! | `featured` | `false` |
//! | `publishDate` | now |
//! | `status` (news) | `published` |
//! | `role` / `status` (users) | `user` / `active` |
//!
//! ## Wire Names
//!
//! JSON field names are camelCase (`mainImage`, `publishDate`) so snapshots written
//! by earlier deployments load unchanged.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Free-form site settings.
pub type Settings = BTreeMap<String, Value>;

pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Parses a user supplied year, falling back to the current year.
pub fn parse_year(raw: &str) -> i32 {
    raw.trim().parse().unwrap_or_else(|_| current_year())
}

fn lenient_year<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|y| i32::try_from(y).ok())
            .unwrap_or_else(current_year),
        Value::String(s) => parse_year(&s),
        _ => current_year(),
    })
}

/// Removes duplicates, keeping the first occurrence of each entry.
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

pub(crate) fn lowercase_keys(specs: BTreeMap<String, String>) -> BTreeMap<String, String> {
    specs
        .into_iter()
        .map(|(k, v)| (k.trim().to_lowercase(), v))
        .collect()
}

// --- Robots ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Robot {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default = "current_year", deserialize_with = "lenient_year")]
    pub year: i32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Long-form text, paragraphs separated by blank lines.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_image: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Robot {
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        paragraphs(&self.content)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RobotDraft {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub name: Option<String>,
    pub manufacturer: Option<String>,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub specifications: Option<BTreeMap<String, String>>,
    pub features: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub main_image: Option<String>,
    pub gallery: Option<Vec<String>>,
    pub featured: Option<bool>,
}

impl RobotDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Partial update for a robot. `id` is absent: it never changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RobotPatch {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub manufacturer: Option<String>,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub specifications: Option<BTreeMap<String, String>>,
    pub features: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub main_image: Option<String>,
    pub gallery: Option<Vec<String>>,
    pub featured: Option<bool>,
}

// --- News ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsStatus {
    Draft,
    #[default]
    Published,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "Utc::now")]
    pub publish_date: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub related_robots: Vec<String>,
    #[serde(default)]
    pub external_links: Vec<ExternalLink>,
    #[serde(default)]
    pub status: NewsStatus,
    #[serde(default)]
    pub views: u64,
}

impl NewsArticle {
    /// The image shown on cards: `featuredImage`, else `image`.
    pub fn cover_image(&self) -> Option<&str> {
        self.featured_image.as_deref().or(self.image.as_deref())
    }

    pub fn is_published(&self) -> bool {
        self.status == NewsStatus::Published
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        paragraphs(&self.content)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsDraft {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub featured_image: Option<String>,
    pub image: Option<String>,
    pub gallery: Option<Vec<String>>,
    pub related_robots: Option<Vec<String>>,
    pub external_links: Option<Vec<ExternalLink>>,
    pub status: Option<NewsStatus>,
}

impl NewsDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsPatch {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub featured_image: Option<String>,
    pub image: Option<String>,
    pub gallery: Option<Vec<String>>,
    pub related_robots: Option<Vec<String>>,
    pub external_links: Option<Vec<ExternalLink>>,
    pub status: Option<NewsStatus>,
    pub views: Option<u64>,
}

// --- Users ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub status: UserStatus,
    /// Salted digest, see [`crate::auth`].
    #[serde(default)]
    pub password: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDraft {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    /// Plain text; hashed when the record is built.
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub password: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
}

// --- Activity log ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

impl Activity {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action: action.into(),
            timestamp: Utc::now(),
        }
    }
}

fn paragraphs(content: &str) -> impl Iterator<Item = &str> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn robot_year_accepts_numeric_strings() {
        let robot: Robot = serde_json::from_value(json!({
            "id": "robot-x", "slug": "x", "name": "X", "year": "2004"
        }))
        .unwrap();
        assert_eq!(robot.year, 2004);
    }

    #[test]
    fn robot_year_defaults_to_current_year_when_unparsable() {
        let robot: Robot = serde_json::from_value(json!({
            "id": "robot-x", "slug": "x", "name": "X", "year": "sometime"
        }))
        .unwrap();
        assert_eq!(robot.year, current_year());

        let missing: Robot =
            serde_json::from_value(json!({"id": "robot-y", "slug": "y", "name": "Y"})).unwrap();
        assert_eq!(missing.year, current_year());
        assert!(missing.features.is_empty());
        assert!(!missing.featured);
    }

    #[test]
    fn robot_serializes_camel_case() {
        let robot: Robot = serde_json::from_value(json!({
            "id": "robot-x", "slug": "x", "name": "X", "mainImage": "images/x.jpg"
        }))
        .unwrap();
        let value = serde_json::to_value(&robot).unwrap();
        assert_eq!(value["mainImage"], "images/x.jpg");
        assert!(value.get("main_image").is_none());
    }

    #[test]
    fn news_defaults_to_published() {
        let article: NewsArticle =
            serde_json::from_value(json!({"id": "news-x", "slug": "x", "title": "X"})).unwrap();
        assert!(article.is_published());
        assert_eq!(article.views, 0);
    }

    #[test]
    fn cover_image_prefers_featured() {
        let mut article: NewsArticle =
            serde_json::from_value(json!({"id": "n", "slug": "n", "title": "N", "image": "a.jpg"}))
                .unwrap();
        assert_eq!(article.cover_image(), Some("a.jpg"));
        article.featured_image = Some("b.jpg".into());
        assert_eq!(article.cover_image(), Some("b.jpg"));
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let robot: Robot = serde_json::from_value(json!({
            "id": "r", "slug": "r", "name": "R", "content": "First.\n\n\n\nSecond.\n\n  "
        }))
        .unwrap();
        assert_eq!(robot.paragraphs().collect::<Vec<_>>(), vec!["First.", "Second."]);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let tags = vec!["a".into(), "b".into(), "a".into(), "c".into()];
        assert_eq!(dedup_preserving_order(tags), vec!["a", "b", "c"]);
    }

    #[test]
    fn parse_year_falls_back() {
        assert_eq!(parse_year(" 1999 "), 1999);
        assert_eq!(parse_year("n/a"), current_year());
    }
}
