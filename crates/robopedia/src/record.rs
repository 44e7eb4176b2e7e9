//! # Records
//!
//! [`Record`] is what the cache and the command layer know about a stored type.
//! Robots, news articles and users implement it; everything generic (merge with the
//! bundled dataset, create/update/delete, search, import) is written once against it.
//!
//! ## Keys
//!
//! Every record has an opaque `id` and a unique human-facing `key`:
//! - robots and news: the slug, derived from the title ([`Record::DERIVED_KEY`])
//! - users: the lower-cased email, always supplied explicitly
//!
//! ## Drafts and Patches
//!
//! `from_draft` is the single place where defaults are filled in. `apply_patch`
//! never touches the id; the key changes only through an explicit key in the patch,
//! or (for derived keys) when the title changes, which the command layer handles.

use crate::auth::hash_password;
use crate::error::{RobopediaError, Result};
use crate::model::{
    current_year, dedup_preserving_order, lowercase_keys, NewsArticle, NewsDraft, NewsPatch,
    Robot, RobotDraft, RobotPatch, User, UserDraft, UserPatch,
};
use crate::store::Collection;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

pub trait Record: Clone + Debug + PartialEq + Serialize + DeserializeOwned {
    type Draft;
    type Patch;

    /// Id prefix for generated ids (`robot-1712345678901`).
    const KIND: &'static str;
    /// Noun used in messages and audit lines.
    const NOUN: &'static str;
    const COLLECTION: Collection;
    /// Whether the key is derived from the title (slugs) or supplied (emails).
    const DERIVED_KEY: bool;

    fn id(&self) -> &str;
    fn key(&self) -> &str;
    fn set_key(&mut self, key: String);
    /// Display name: robot name, article title, user name.
    fn title(&self) -> &str;

    /// Case-insensitive match; `needle` is already lower-cased.
    fn matches(&self, needle: &str) -> bool;

    /// Asset references (images) owned by the record.
    fn assets(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Ordering of the visible collection. Insertion order unless overridden.
    fn sort_view(_records: &mut [Self]) {}

    fn draft_id(draft: &Self::Draft) -> Option<&str>;
    fn draft_key(draft: &Self::Draft) -> Option<String>;
    fn draft_title(draft: &Self::Draft) -> Option<&str>;
    /// Checks required fields before anything is built.
    fn validate_draft(draft: &Self::Draft) -> Result<()>;
    fn from_draft(id: String, key: String, draft: Self::Draft) -> Self;

    fn patch_key(patch: &Self::Patch) -> Option<String>;
    fn apply_patch(&mut self, patch: Self::Patch);
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn any_contains(items: &[String], needle: &str) -> bool {
    items.iter().any(|item| contains(item, needle))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn require(value: Option<&str>, field: &str, noun: &str) -> Result<()> {
    match non_blank(value) {
        Some(_) => Ok(()),
        None => Err(RobopediaError::Validation(format!(
            "A {} needs a {}",
            noun, field
        ))),
    }
}

/// A caller-supplied slug is stored as given, minus surrounding whitespace.
fn explicit_slug(slug: Option<&String>) -> Option<String> {
    non_blank(slug.map(String::as_str)).map(str::to_string)
}

// --- Robot ---

impl Record for Robot {
    type Draft = RobotDraft;
    type Patch = RobotPatch;

    const KIND: &'static str = "robot";
    const NOUN: &'static str = "robot";
    const COLLECTION: Collection = Collection::Robots;
    const DERIVED_KEY: bool = true;

    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.slug
    }

    fn set_key(&mut self, key: String) {
        self.slug = key;
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn matches(&self, needle: &str) -> bool {
        contains(&self.name, needle)
            || contains(&self.description, needle)
            || contains(&self.manufacturer, needle)
            || contains(&self.category, needle)
            || any_contains(&self.features, needle)
            || any_contains(&self.tags, needle)
    }

    fn assets(&self) -> Vec<&str> {
        self.main_image
            .iter()
            .chain(self.gallery.iter())
            .map(String::as_str)
            .collect()
    }

    fn draft_id(draft: &RobotDraft) -> Option<&str> {
        non_blank(draft.id.as_deref())
    }

    fn draft_key(draft: &RobotDraft) -> Option<String> {
        explicit_slug(draft.slug.as_ref())
    }

    fn draft_title(draft: &RobotDraft) -> Option<&str> {
        non_blank(draft.name.as_deref())
    }

    fn validate_draft(draft: &RobotDraft) -> Result<()> {
        require(draft.name.as_deref(), "name", Self::NOUN)
    }

    fn from_draft(id: String, key: String, draft: RobotDraft) -> Self {
        let now = Utc::now();
        Robot {
            id,
            slug: key,
            name: draft.name.unwrap_or_default().trim().to_string(),
            manufacturer: draft.manufacturer.unwrap_or_default(),
            year: draft.year.unwrap_or_else(current_year),
            category: draft.category.unwrap_or_default(),
            description: draft.description.unwrap_or_default(),
            content: draft.content.unwrap_or_default(),
            specifications: lowercase_keys(draft.specifications.unwrap_or_default()),
            features: draft.features.unwrap_or_default(),
            tags: dedup_preserving_order(draft.tags.unwrap_or_default()),
            main_image: draft.main_image,
            gallery: draft.gallery.unwrap_or_default(),
            featured: draft.featured.unwrap_or(false),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    fn patch_key(patch: &RobotPatch) -> Option<String> {
        explicit_slug(patch.slug.as_ref())
    }

    fn apply_patch(&mut self, patch: RobotPatch) {
        if let Some(slug) = Self::patch_key(&patch) {
            self.slug = slug;
        }
        if let Some(name) = non_blank(patch.name.as_deref()) {
            self.name = name.to_string();
        }
        if let Some(v) = patch.manufacturer {
            self.manufacturer = v;
        }
        if let Some(v) = patch.year {
            self.year = v;
        }
        if let Some(v) = patch.category {
            self.category = v;
        }
        if let Some(v) = patch.description {
            self.description = v;
        }
        if let Some(v) = patch.content {
            self.content = v;
        }
        if let Some(v) = patch.specifications {
            self.specifications = lowercase_keys(v);
        }
        if let Some(v) = patch.features {
            self.features = v;
        }
        if let Some(v) = patch.tags {
            self.tags = dedup_preserving_order(v);
        }
        if let Some(v) = patch.main_image {
            self.main_image = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = patch.gallery {
            self.gallery = v;
        }
        if let Some(v) = patch.featured {
            self.featured = v;
        }
        self.updated_at = Some(Utc::now());
    }
}

// --- News ---

impl Record for NewsArticle {
    type Draft = NewsDraft;
    type Patch = NewsPatch;

    const KIND: &'static str = "news";
    const NOUN: &'static str = "news article";
    const COLLECTION: Collection = Collection::News;
    const DERIVED_KEY: bool = true;

    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.slug
    }

    fn set_key(&mut self, key: String) {
        self.slug = key;
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn matches(&self, needle: &str) -> bool {
        contains(&self.title, needle)
            || contains(&self.summary, needle)
            || contains(&self.author, needle)
            || contains(&self.category, needle)
            || any_contains(&self.tags, needle)
    }

    fn assets(&self) -> Vec<&str> {
        self.featured_image
            .iter()
            .chain(self.image.iter())
            .chain(self.gallery.iter())
            .map(String::as_str)
            .collect()
    }

    /// Newest first.
    fn sort_view(records: &mut [Self]) {
        records.sort_by(|a, b| b.publish_date.cmp(&a.publish_date));
    }

    fn draft_id(draft: &NewsDraft) -> Option<&str> {
        non_blank(draft.id.as_deref())
    }

    fn draft_key(draft: &NewsDraft) -> Option<String> {
        explicit_slug(draft.slug.as_ref())
    }

    fn draft_title(draft: &NewsDraft) -> Option<&str> {
        non_blank(draft.title.as_deref())
    }

    fn validate_draft(draft: &NewsDraft) -> Result<()> {
        require(draft.title.as_deref(), "title", Self::NOUN)
    }

    fn from_draft(id: String, key: String, draft: NewsDraft) -> Self {
        NewsArticle {
            id,
            slug: key,
            title: draft.title.unwrap_or_default().trim().to_string(),
            author: draft.author.unwrap_or_default(),
            category: draft.category.unwrap_or_default(),
            summary: draft.summary.unwrap_or_default(),
            content: draft.content.unwrap_or_default(),
            publish_date: draft.publish_date.unwrap_or_else(Utc::now),
            tags: dedup_preserving_order(draft.tags.unwrap_or_default()),
            featured_image: draft.featured_image,
            image: draft.image,
            gallery: draft.gallery.unwrap_or_default(),
            related_robots: draft.related_robots.unwrap_or_default(),
            external_links: draft.external_links.unwrap_or_default(),
            status: draft.status.unwrap_or_default(),
            views: 0,
        }
    }

    fn patch_key(patch: &NewsPatch) -> Option<String> {
        explicit_slug(patch.slug.as_ref())
    }

    fn apply_patch(&mut self, patch: NewsPatch) {
        if let Some(slug) = Self::patch_key(&patch) {
            self.slug = slug;
        }
        if let Some(title) = non_blank(patch.title.as_deref()) {
            self.title = title.to_string();
        }
        if let Some(v) = patch.author {
            self.author = v;
        }
        if let Some(v) = patch.category {
            self.category = v;
        }
        if let Some(v) = patch.summary {
            self.summary = v;
        }
        if let Some(v) = patch.content {
            self.content = v;
        }
        if let Some(v) = patch.publish_date {
            self.publish_date = v;
        }
        if let Some(v) = patch.tags {
            self.tags = dedup_preserving_order(v);
        }
        if let Some(v) = patch.featured_image {
            self.featured_image = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = patch.image {
            self.image = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = patch.gallery {
            self.gallery = v;
        }
        if let Some(v) = patch.related_robots {
            self.related_robots = v;
        }
        if let Some(v) = patch.external_links {
            self.external_links = v;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = patch.views {
            self.views = v;
        }
    }
}

// --- Users ---

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Record for User {
    type Draft = UserDraft;
    type Patch = UserPatch;

    const KIND: &'static str = "user";
    const NOUN: &'static str = "user";
    const COLLECTION: Collection = Collection::Users;
    const DERIVED_KEY: bool = false;

    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.email
    }

    fn set_key(&mut self, key: String) {
        self.email = key;
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn matches(&self, needle: &str) -> bool {
        contains(&self.name, needle) || contains(&self.email, needle)
    }

    fn draft_id(draft: &UserDraft) -> Option<&str> {
        non_blank(draft.id.as_deref())
    }

    fn draft_key(draft: &UserDraft) -> Option<String> {
        non_blank(draft.email.as_deref()).map(normalize_email)
    }

    fn draft_title(draft: &UserDraft) -> Option<&str> {
        non_blank(draft.name.as_deref())
    }

    fn validate_draft(draft: &UserDraft) -> Result<()> {
        require(draft.email.as_deref(), "email", Self::NOUN)?;
        require(draft.name.as_deref(), "name", Self::NOUN)?;
        require(draft.password.as_deref(), "password", Self::NOUN)?;
        if !draft.email.as_deref().unwrap_or_default().contains('@') {
            return Err(RobopediaError::Validation(
                "Email address must contain '@'".to_string(),
            ));
        }
        Ok(())
    }

    fn from_draft(id: String, key: String, draft: UserDraft) -> Self {
        User {
            id,
            email: key,
            name: draft.name.unwrap_or_default().trim().to_string(),
            role: draft.role.unwrap_or_default(),
            status: draft.status.unwrap_or_default(),
            password: hash_password(draft.password.as_deref().unwrap_or_default()),
            created_at: Utc::now(),
            last_login: None,
        }
    }

    fn patch_key(patch: &UserPatch) -> Option<String> {
        non_blank(patch.email.as_deref()).map(normalize_email)
    }

    fn apply_patch(&mut self, patch: UserPatch) {
        if let Some(email) = Self::patch_key(&patch) {
            self.email = email;
        }
        if let Some(name) = non_blank(patch.name.as_deref()) {
            self.name = name.to_string();
        }
        if let Some(v) = patch.role {
            self.role = v;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(password) = non_blank(patch.password.as_deref()) {
            self.password = hash_password(password);
        }
        if let Some(v) = patch.last_login {
            self.last_login = Some(v);
        }
    }
}
