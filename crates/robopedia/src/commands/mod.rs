//! # Command Layer
//!
//! This module contains the **core business logic** of robopedia. Each command lives
//! in its own submodule as plain functions over an [`EntityStore`] (or over the
//! backend directly, for the activity log and settings).
//!
//! ## Role and Responsibilities
//!
//! Commands:
//! - Validate input and enforce the key rules (unique slugs, unique emails)
//! - Mutate the in-memory cache and persist the custom subset through the backend
//! - Return structured [`CmdResult`]s with the affected records and messages
//!
//! Commands never print, never parse arguments and never decide exit codes.
//!
//! ## Errors vs. Outcomes
//!
//! - A missing record is `Ok(None)`, not an error.
//! - Rejected input (validation, duplicate key) is `Err` and nothing is mutated.
//! - A backend that refuses a write is an *outcome*: the in-memory change stays,
//!   `persisted` is `false` and a warning message is attached.
//!
//! ## Generic Over Record
//!
//! Create, update, delete, search and get are written once for every [`Record`]
//! type. Robots, news and users differ only in their `Record` impl.
//!
//! ## Testing Strategy
//!
//! **This is where most of the tests live.** Command tests run against
//! [`crate::store::mem_backend::MemBackend`], which can simulate read and write
//! failures.
//!
//! ## Command Modules
//!
//! - [`create`], [`get`], [`update`], [`delete`], [`search`]: generic record CRUD
//! - [`users`]: login
//! - [`export`] / [`import`]: snapshots of every collection
//! - [`flush`]: retry persisting every warm cache
//! - [`activity`]: the capped audit log
//! - [`settings`]: site settings map
//! - [`assets`]: uploads

use crate::dataset::StaticDataset;
use crate::model::{NewsArticle, Robot, User};
use crate::record::Record;
use crate::store::cache::EntityStore;
use crate::store::StorageBackend;
use chrono::Utc;
use serde::Serialize;

pub mod activity;
pub mod assets;
pub mod create;
pub mod delete;
pub mod export;
pub mod flush;
pub mod get;
pub mod import;
pub mod search;
pub mod settings;
pub mod update;
pub mod users;

/// The entity caches of one facade instance.
#[derive(Debug)]
pub struct Stores {
    pub robots: EntityStore<Robot>,
    pub news: EntityStore<NewsArticle>,
    pub users: EntityStore<User>,
}

impl Stores {
    pub fn new(dataset: &StaticDataset) -> Self {
        Self {
            robots: EntityStore::new(dataset.robots.clone()),
            news: EntityStore::new(dataset.news.clone()),
            users: EntityStore::new(dataset.users.clone()),
        }
    }

    pub fn warm<B: StorageBackend>(&mut self, backend: &B) {
        self.robots.warm(backend);
        self.news.warm(backend);
        self.users.warm(backend);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug)]
pub struct CmdResult<T> {
    /// Records created, modified or removed by the command.
    pub affected: Vec<T>,
    /// Records to display (gets and searches).
    pub listed: Vec<T>,
    /// Whether the backend accepted the write. Always true for reads.
    pub persisted: bool,
    pub messages: Vec<CmdMessage>,
}

impl<T> Default for CmdResult<T> {
    fn default() -> Self {
        Self {
            affected: Vec::new(),
            listed: Vec::new(),
            persisted: true,
            messages: Vec::new(),
        }
    }
}

impl<T> CmdResult<T> {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected(mut self, records: Vec<T>) -> Self {
        self.affected = records;
        self
    }

    pub fn with_listed(mut self, records: Vec<T>) -> Self {
        self.listed = records;
        self
    }

    /// Record the outcome of a flush, warning when the backend refused it.
    pub(crate) fn set_persisted(&mut self, persisted: bool, backend_name: &str) {
        self.persisted = persisted;
        if !persisted {
            self.add_message(CmdMessage::warning(format!(
                "Changes are kept for this session but could not be saved to {}",
                backend_name
            )));
        }
    }
}

impl<T: Record> CmdResult<T> {
    /// Audit log line: `"<verb> <noun> '<title>'"`, e.g. `Created robot 'Atlas'`.
    pub fn audit_line(&self, verb: &str) -> Option<String> {
        self.affected
            .first()
            .map(|record| format!("{} {} '{}'", verb, T::NOUN, record.title()))
    }
}

/// Fresh id `"{kind}-{epochMillis}"`, bumped until it is unused.
pub(crate) fn next_id<T: Record, B: StorageBackend>(
    store: &mut EntityStore<T>,
    backend: &B,
) -> String {
    let mut millis = Utc::now().timestamp_millis();
    loop {
        let id = format!("{}-{}", T::KIND, millis);
        if !store.contains_id(backend, &id) {
            return id;
        }
        millis += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RobotDraft;
    use crate::store::mem_backend::MemBackend;

    #[test]
    fn audit_line_uses_noun_and_title() {
        let robot = Robot::from_draft("robot-1".into(), "atlas".into(), RobotDraft::named("Atlas"));
        let result = CmdResult::default().with_affected(vec![robot]);
        assert_eq!(
            result.audit_line("Created").as_deref(),
            Some("Created robot 'Atlas'")
        );
        assert_eq!(CmdResult::<Robot>::default().audit_line("Created"), None);
    }

    #[test]
    fn next_id_skips_taken_ids() {
        let backend = MemBackend::new();
        let mut store = EntityStore::<Robot>::new(Vec::new());
        let first = next_id(&mut store, &backend);
        store.insert(
            &backend,
            Robot::from_draft(first.clone(), "a".into(), RobotDraft::named("A")),
        );
        let second = next_id(&mut store, &backend);
        assert!(second.starts_with("robot-"));
        assert_ne!(first, second);
    }
}
