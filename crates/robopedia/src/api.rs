//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single entry
//! point for every robopedia operation, whatever client drives it.
//!
//! ## Role and Responsibilities
//!
//! The facade:
//! - **Owns the state**: the backend and one [`EntityStore`](crate::store::cache::EntityStore)
//!   per record type. There are no globals; two facades never share a cache.
//! - **Dispatches** to the command functions in [`crate::commands`].
//! - **Returns structured types**, never strings meant for a terminal.
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: that belongs in `commands/*.rs`.
//! - **Audit logging**: callers decide which actions are worth an activity entry and
//!   call [`RobopediaApi::record_activity`] with [`CmdResult::audit_line`].
//!
//! ## Lifecycle
//!
//! Construct once per process with a backend and the static dataset. Caches warm
//! lazily on first access, or eagerly with [`RobopediaApi::warm`]. Every mutation
//! saves immediately; [`RobopediaApi::flush`] retries saves that failed, including
//! those left pending by an earlier process.
//!
//! ## Generic Over StorageBackend
//!
//! `RobopediaApi<B: StorageBackend>` is generic over the backend:
//! - Production: `LocalBackend`, or `FallbackBackend<GithubBackend, LocalBackend>` /
//!   `FallbackBackend<FirestoreBackend, LocalBackend>`
//! - Testing: `MemBackend`
//!
//! ## Testing Strategy
//!
//! API tests check wiring and the end-to-end flows. Command logic is tested in the
//! command modules, storage behavior in the store modules.

use crate::assistant::Assistant;
use crate::commands::{self, CmdResult, Stores};
use crate::commands::export::Snapshot;
use crate::dataset::StaticDataset;
use crate::error::Result;
use crate::model::{
    Activity, NewsArticle, NewsDraft, NewsPatch, Robot, RobotDraft, RobotPatch, Settings, User,
    UserDraft, UserPatch,
};
use crate::store::{Collection, StorageBackend};
use serde_json::Value;
use std::path::Path;

pub struct RobopediaApi<B: StorageBackend> {
    backend: B,
    stores: Stores,
    assistant: Assistant,
    activity_limit: usize,
    asset_dir: String,
}

impl<B: StorageBackend> RobopediaApi<B> {
    pub fn new(backend: B, dataset: StaticDataset) -> Self {
        Self {
            backend,
            stores: Stores::new(&dataset),
            assistant: dataset.assistant,
            activity_limit: commands::activity::DEFAULT_LIMIT,
            asset_dir: commands::assets::DEFAULT_ASSET_DIR.to_string(),
        }
    }

    pub fn with_activity_limit(mut self, limit: usize) -> Self {
        self.activity_limit = limit;
        self
    }

    /// Directory uploads are stored under.
    pub fn with_asset_dir(mut self, dir: impl Into<String>) -> Self {
        self.asset_dir = dir.into();
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Load every cache now instead of on first access.
    pub fn warm(&mut self) {
        self.stores.warm(&self.backend);
    }

    /// Drop cached state and load everything again.
    pub fn reload(&mut self) {
        self.stores.robots.reload(&self.backend);
        self.stores.news.reload(&self.backend);
        self.stores.users.reload(&self.backend);
    }

    /// Save every warm cache again. Use after a mutation reported `persisted = false`.
    pub fn flush(&self) -> CmdResult<Collection> {
        commands::flush::run(&self.stores, &self.backend)
    }

    // --- Robots ---

    pub fn get_all_robots(&mut self) -> Vec<Robot> {
        commands::get::all(&mut self.stores.robots, &self.backend)
    }

    pub fn get_robot_by_id(&mut self, id: &str) -> Option<Robot> {
        commands::get::by_id(&mut self.stores.robots, &self.backend, id)
    }

    pub fn get_robot_by_slug(&mut self, slug: &str) -> Option<Robot> {
        commands::get::by_key(&mut self.stores.robots, &self.backend, slug)
    }

    pub fn create_robot(&mut self, draft: RobotDraft) -> Result<CmdResult<Robot>> {
        commands::create::run(&mut self.stores.robots, &self.backend, draft)
    }

    pub fn update_robot(&mut self, id: &str, patch: RobotPatch) -> Result<Option<CmdResult<Robot>>> {
        commands::update::run(&mut self.stores.robots, &self.backend, id, patch)
    }

    pub fn delete_robot(&mut self, id: &str) -> Result<Option<CmdResult<Robot>>> {
        commands::delete::run(&mut self.stores.robots, &self.backend, id)
    }

    pub fn search_robots(&mut self, term: &str) -> CmdResult<Robot> {
        commands::search::run(&mut self.stores.robots, &self.backend, term)
    }

    pub fn featured_robots(&mut self) -> Vec<Robot> {
        commands::get::featured_robots(&mut self.stores.robots, &self.backend)
    }

    pub fn robots_by_category(&mut self, category: &str) -> Vec<Robot> {
        commands::get::robots_by_category(&mut self.stores.robots, &self.backend, category)
    }

    // --- News ---

    pub fn get_all_news(&mut self) -> Vec<NewsArticle> {
        commands::get::all(&mut self.stores.news, &self.backend)
    }

    pub fn get_news_by_id(&mut self, id: &str) -> Option<NewsArticle> {
        commands::get::by_id(&mut self.stores.news, &self.backend, id)
    }

    pub fn get_news_by_slug(&mut self, slug: &str) -> Option<NewsArticle> {
        commands::get::by_key(&mut self.stores.news, &self.backend, slug)
    }

    pub fn create_news(&mut self, draft: NewsDraft) -> Result<CmdResult<NewsArticle>> {
        commands::create::run(&mut self.stores.news, &self.backend, draft)
    }

    pub fn update_news(
        &mut self,
        id: &str,
        patch: NewsPatch,
    ) -> Result<Option<CmdResult<NewsArticle>>> {
        commands::update::run(&mut self.stores.news, &self.backend, id, patch)
    }

    pub fn delete_news(&mut self, id: &str) -> Result<Option<CmdResult<NewsArticle>>> {
        commands::delete::run(&mut self.stores.news, &self.backend, id)
    }

    pub fn search_news(&mut self, term: &str) -> CmdResult<NewsArticle> {
        commands::search::run(&mut self.stores.news, &self.backend, term)
    }

    pub fn published_news(&mut self) -> Vec<NewsArticle> {
        commands::get::published_news(&mut self.stores.news, &self.backend)
    }

    pub fn news_for_robot(&mut self, robot_id: &str) -> Vec<NewsArticle> {
        commands::get::news_for_robot(&mut self.stores.news, &self.backend, robot_id)
    }

    // --- Users ---

    pub fn get_all_users(&mut self) -> Vec<User> {
        commands::get::all(&mut self.stores.users, &self.backend)
    }

    pub fn get_user_by_id(&mut self, id: &str) -> Option<User> {
        commands::get::by_id(&mut self.stores.users, &self.backend, id)
    }

    pub fn get_user_by_email(&mut self, email: &str) -> Option<User> {
        let email = email.trim().to_lowercase();
        commands::get::by_key(&mut self.stores.users, &self.backend, &email)
    }

    pub fn create_user(&mut self, draft: UserDraft) -> Result<CmdResult<User>> {
        commands::create::run(&mut self.stores.users, &self.backend, draft)
    }

    pub fn update_user(&mut self, id: &str, patch: UserPatch) -> Result<Option<CmdResult<User>>> {
        commands::update::run(&mut self.stores.users, &self.backend, id, patch)
    }

    pub fn delete_user(&mut self, id: &str) -> Result<Option<CmdResult<User>>> {
        commands::delete::run(&mut self.stores.users, &self.backend, id)
    }

    pub fn search_users(&mut self, term: &str) -> CmdResult<User> {
        commands::search::run(&mut self.stores.users, &self.backend, term)
    }

    pub fn authenticate(&mut self, email: &str, password: &str) -> Option<User> {
        commands::users::authenticate(&mut self.stores.users, &self.backend, email, password)
    }

    // --- Backup ---

    pub fn snapshot(&mut self) -> Result<Snapshot> {
        commands::export::snapshot(&mut self.stores, &self.backend)
    }

    pub fn export(&mut self, path: &Path) -> Result<CmdResult<Collection>> {
        commands::export::run(&mut self.stores, &self.backend, path)
    }

    pub fn import(&mut self, path: &Path) -> Result<CmdResult<Collection>> {
        let snapshot = commands::import::read_snapshot(path)?;
        self.import_snapshot(snapshot)
    }

    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> Result<CmdResult<Collection>> {
        commands::import::run(&mut self.stores, &self.backend, snapshot)
    }

    // --- Assets, activity, settings ---

    /// Uploads a file and returns the URL to reference it by.
    pub fn upload_asset(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        commands::assets::upload(&self.backend, &self.asset_dir, original_name, bytes)
    }

    /// Appends an entry to the activity log. Returns whether it was saved.
    pub fn record_activity(&self, action: &str) -> bool {
        commands::activity::record(&self.backend, action, self.activity_limit)
    }

    pub fn recent_activities(&self, count: usize) -> Vec<Activity> {
        commands::activity::recent(&self.backend, count)
    }

    pub fn settings(&self) -> Settings {
        commands::settings::get(&self.backend)
    }

    pub fn get_setting(&self, key: &str) -> Option<Value> {
        self.settings().remove(key)
    }

    pub fn set_setting(&self, key: &str, value: Value) -> Result<bool> {
        commands::settings::set(&self.backend, key, value)
    }

    pub fn remove_setting(&self, key: &str) -> bool {
        commands::settings::remove(&self.backend, key)
    }

    pub fn assistant_reply(&self, message: &str) -> &str {
        self.assistant.reply(message)
    }
}
