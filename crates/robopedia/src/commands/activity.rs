//! The audit log: one entry per admin action, newest first, capped.

use crate::model::Activity;
use crate::store::{Collection, StorageBackend};
use serde_json::Value;
use tracing::warn;

pub const DEFAULT_LIMIT: usize = 100;

/// Prepends an entry and keeps the newest `limit`. Returns whether it was saved.
///
/// An unreadable log is not overwritten.
pub fn record<B: StorageBackend>(backend: &B, action: &str, limit: usize) -> bool {
    let mut entries = match load(backend) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Activity log unavailable, not recording '{}': {}", action, e);
            return false;
        }
    };

    entries.insert(0, Activity::new(action));
    entries.truncate(limit.max(1));

    let payload: Vec<Value> = match entries.iter().map(serde_json::to_value).collect() {
        Ok(values) => values,
        Err(e) => {
            warn!("Could not serialize activity log: {}", e);
            return false;
        }
    };
    match backend.save(Collection::Activities, &payload) {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not save activity log: {}", e);
            false
        }
    }
}

/// The newest `count` entries.
pub fn recent<B: StorageBackend>(backend: &B, count: usize) -> Vec<Activity> {
    match load(backend) {
        Ok(mut entries) => {
            entries.truncate(count);
            entries
        }
        Err(e) => {
            warn!("Activity log unavailable: {}", e);
            Vec::new()
        }
    }
}

/// Newest first, whatever order the backend returns documents in.
fn load<B: StorageBackend>(backend: &B) -> crate::error::Result<Vec<Activity>> {
    let raw = backend.load(Collection::Activities)?;
    let mut entries: Vec<Activity> = raw
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(entries)
}
