//! # Static Dataset
//!
//! The bundled records every deployment starts with. The JSON files under `data/`
//! are compiled into the library and parsed once by [`StaticDataset::bundled`].
//!
//! The dataset is read-only. Edits to a bundled record are stored as custom
//! records with the same id and shadow the bundled version (see
//! [`crate::store::cache`]).
//!
//! No users ship with the dataset. An administrator can be added at start-up from
//! configuration with [`StaticDataset::with_admin`]; the password is hashed before
//! it is kept anywhere.

use crate::assistant::Assistant;
use crate::auth::hash_password;
use crate::error::{RobopediaError, Result};
use crate::model::{NewsArticle, Robot, User, UserRole, UserStatus};
use chrono::Utc;

const ROBOTS_JSON: &str = include_str!("../data/robots.json");
const NEWS_JSON: &str = include_str!("../data/news.json");
const ASSISTANT_JSON: &str = include_str!("../data/assistant.json");

/// Id of the administrator bootstrapped from configuration.
pub const ADMIN_USER_ID: &str = "user-admin";

#[derive(Debug, Clone, Default)]
pub struct StaticDataset {
    pub robots: Vec<Robot>,
    pub news: Vec<NewsArticle>,
    pub users: Vec<User>,
    pub assistant: Assistant,
}

impl StaticDataset {
    pub fn bundled() -> Result<Self> {
        Ok(Self {
            robots: parse(ROBOTS_JSON, "robots")?,
            news: parse(NEWS_JSON, "news")?,
            users: Vec::new(),
            assistant: parse(ASSISTANT_JSON, "assistant")?,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_robots(mut self, robots: Vec<Robot>) -> Self {
        self.robots = robots;
        self
    }

    pub fn with_news(mut self, news: Vec<NewsArticle>) -> Self {
        self.news = news;
        self
    }

    pub fn with_users(mut self, users: Vec<User>) -> Self {
        self.users = users;
        self
    }

    pub fn with_assistant(mut self, assistant: Assistant) -> Self {
        self.assistant = assistant;
        self
    }

    /// Adds (or replaces) the bootstrap administrator.
    pub fn with_admin(mut self, email: &str, password: &str) -> Self {
        self.users.retain(|u| u.id != ADMIN_USER_ID);
        self.users.push(User {
            id: ADMIN_USER_ID.to_string(),
            email: email.trim().to_lowercase(),
            name: "Administrator".to_string(),
            role: UserRole::Admin,
            status: UserStatus::Active,
            password: hash_password(password),
            created_at: Utc::now(),
            last_login: None,
        });
        self
    }
}

fn parse<T: serde::de::DeserializeOwned>(raw: &str, what: &str) -> Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| RobopediaError::Store(format!("Bundled {} data is invalid: {}", what, e)))
}
