//! Reads. These warm the cache on first use and never fail: a backend that cannot
//! be read leaves only the bundled records visible.

use crate::model::{NewsArticle, Robot};
use crate::record::Record;
use crate::store::cache::EntityStore;
use crate::store::StorageBackend;

pub fn all<T: Record, B: StorageBackend>(store: &mut EntityStore<T>, backend: &B) -> Vec<T> {
    store.all(backend)
}

pub fn by_id<T: Record, B: StorageBackend>(
    store: &mut EntityStore<T>,
    backend: &B,
    id: &str,
) -> Option<T> {
    store.get(backend, id)
}

/// Lookup by slug (robots, news) or email (users).
pub fn by_key<T: Record, B: StorageBackend>(
    store: &mut EntityStore<T>,
    backend: &B,
    key: &str,
) -> Option<T> {
    store.get_by_key(backend, key)
}

pub fn featured_robots<B: StorageBackend>(
    store: &mut EntityStore<Robot>,
    backend: &B,
) -> Vec<Robot> {
    store.all(backend).into_iter().filter(|r| r.featured).collect()
}

pub fn robots_by_category<B: StorageBackend>(
    store: &mut EntityStore<Robot>,
    backend: &B,
    category: &str,
) -> Vec<Robot> {
    store
        .all(backend)
        .into_iter()
        .filter(|r| r.category.eq_ignore_ascii_case(category))
        .collect()
}

/// Published articles, newest first.
pub fn published_news<B: StorageBackend>(
    store: &mut EntityStore<NewsArticle>,
    backend: &B,
) -> Vec<NewsArticle> {
    store
        .all(backend)
        .into_iter()
        .filter(NewsArticle::is_published)
        .collect()
}

/// Articles whose related robots include `robot_id`.
pub fn news_for_robot<B: StorageBackend>(
    store: &mut EntityStore<NewsArticle>,
    backend: &B,
    robot_id: &str,
) -> Vec<NewsArticle> {
    store
        .all(backend)
        .into_iter()
        .filter(|a| a.related_robots.iter().any(|id| id == robot_id))
        .collect()
}
