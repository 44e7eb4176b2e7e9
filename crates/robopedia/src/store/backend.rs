use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The persisted collections. Each maps to one key, file or document collection,
/// depending on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Robots,
    News,
    Users,
    Activities,
    Settings,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Robots,
        Collection::News,
        Collection::Users,
        Collection::Activities,
        Collection::Settings,
    ];

    /// Storage key / file stem / document collection id.
    pub fn key(self) -> &'static str {
        match self {
            Collection::Robots => "robots",
            Collection::News => "news",
            Collection::Users => "users",
            Collection::Activities => "activities",
            Collection::Settings => "settings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Abstract interface for raw persistence.
///
/// This trait handles the "where" of storage (local directory, GitHub repository,
/// document database), while [`super::cache::EntityStore`] handles the "what"
/// (merging with the bundled dataset, custom subsets, slug rules).
///
/// Backends report failures honestly through `Result`; turning them into
/// degraded-but-available behavior is the cache's job.
pub trait StorageBackend {
    /// Short name used in logs and messages.
    fn name(&self) -> &'static str;

    // --- Records ---

    /// Load the persisted custom records of a collection.
    /// Returns Ok(empty) when nothing has been stored yet.
    fn load(&self, collection: Collection) -> Result<Vec<Value>>;

    /// Replace the stored snapshot of a collection.
    fn save(&self, collection: Collection, records: &[Value]) -> Result<()>;

    /// Records whose `field` equals `value`, at most `limit` of them.
    ///
    /// The default filters a full `load`; backends with a query API override it.
    fn query(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> Result<Vec<Value>> {
        let matches = self
            .load(collection)?
            .into_iter()
            .filter(|record| record.get(field) == Some(value));
        Ok(match limit {
            Some(n) => matches.take(n).collect(),
            None => matches.collect(),
        })
    }

    // --- Assets ---

    /// Store a binary asset under a logical path, returning a resolvable URL.
    fn upload_asset(&self, path: &str, bytes: &[u8]) -> Result<String>;

    /// Remove an asset. Missing assets are not an error.
    fn delete_asset(&self, path: &str) -> Result<()>;

    /// Whether deleting a record should also delete the assets it references.
    fn tracks_assets(&self) -> bool {
        false
    }

    // --- Sync ---

    /// Push snapshots that only reached a fallback store, one result per collection.
    ///
    /// Backends without a fallback have nothing pending.
    fn sync_pending(&self) -> Result<Vec<(Collection, Result<()>)>> {
        Ok(Vec::new())
    }
}

/// Remembers which collections hold writes the primary backend never received.
///
/// Kept by the secondary of a [`super::fallback::FallbackBackend`], so the marker
/// survives the process that failed to save.
pub trait SyncJournal {
    fn pending(&self) -> Result<Vec<Collection>>;

    fn set_pending(&self, collection: Collection, pending: bool) -> Result<()>;
}
