use super::backend::{Collection, StorageBackend, SyncJournal};
use crate::error::Result;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Decorator pairing a primary backend with a secondary one.
///
/// - `load`: primary wins; its result is mirrored into the secondary as the last
///   known-good snapshot. When the primary fails, the secondary's snapshot is served.
/// - `save`: primary first. When it fails the records are written to the secondary,
///   the collection is marked pending in the secondary's [`SyncJournal`] and the
///   primary's error is still returned, so callers report non-success.
/// - pending collections are read from the secondary and never overwritten by a
///   primary load until [`StorageBackend::sync_pending`] or a later save succeeds.
/// - assets: primary first, secondary on failure.
///
/// The usual pairing is a remote backend over a [`super::local::LocalBackend`].
pub struct FallbackBackend<P, S> {
    primary: P,
    secondary: S,
}

impl<P: StorageBackend, S: StorageBackend + SyncJournal> FallbackBackend<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn secondary(&self) -> &S {
        &self.secondary
    }

    /// An unreadable journal counts as pending: the local copy is never clobbered.
    fn is_pending(&self, collection: Collection) -> bool {
        match self.secondary.pending() {
            Ok(pending) => pending.contains(&collection),
            Err(e) => {
                warn!("Cannot read the sync journal of {}: {}", self.secondary.name(), e);
                true
            }
        }
    }

    fn push(&self, collection: Collection) -> Result<()> {
        let records = self.secondary.load(collection)?;
        self.primary.save(collection, &records)?;
        self.secondary.set_pending(collection, false)?;
        info!(
            "Pushed {} pending {} to {}",
            records.len(),
            collection,
            self.primary.name()
        );
        Ok(())
    }
}

impl<P: StorageBackend, S: StorageBackend + SyncJournal> StorageBackend for FallbackBackend<P, S> {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    fn load(&self, collection: Collection) -> Result<Vec<Value>> {
        if self.is_pending(collection) {
            debug!(
                "{} has changes {} never received, using {} copy",
                collection,
                self.primary.name(),
                self.secondary.name()
            );
            return self.secondary.load(collection);
        }

        match self.primary.load(collection) {
            Ok(records) => {
                if let Err(e) = self.secondary.save(collection, &records) {
                    debug!(
                        "Could not mirror {} into {}: {}",
                        collection,
                        self.secondary.name(),
                        e
                    );
                }
                Ok(records)
            }
            Err(e) => {
                warn!(
                    "Loading {} from {} failed ({}), using {} snapshot",
                    collection,
                    self.primary.name(),
                    e,
                    self.secondary.name()
                );
                self.secondary.load(collection)
            }
        }
    }

    fn save(&self, collection: Collection, records: &[Value]) -> Result<()> {
        match self.primary.save(collection, records) {
            Ok(()) => {
                if let Err(e) = self.secondary.save(collection, records) {
                    debug!("Could not mirror {} snapshot: {}", collection, e);
                }
                if let Err(e) = self.secondary.set_pending(collection, false) {
                    warn!("Could not clear pending mark on {}: {}", collection, e);
                }
                Ok(())
            }
            Err(e) => {
                warn!(
                    "Saving {} to {} failed ({}), writing to {} instead",
                    collection,
                    self.primary.name(),
                    e,
                    self.secondary.name()
                );
                self.secondary.save(collection, records)?;
                self.secondary.set_pending(collection, true)?;
                Err(e)
            }
        }
    }

    fn query(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> Result<Vec<Value>> {
        if self.is_pending(collection) {
            return self.secondary.query(collection, field, value, limit);
        }
        self.primary
            .query(collection, field, value, limit)
            .or_else(|e| {
                warn!("Query on {} failed ({}), using snapshot", self.primary.name(), e);
                self.secondary.query(collection, field, value, limit)
            })
    }

    fn upload_asset(&self, path: &str, bytes: &[u8]) -> Result<String> {
        self.primary.upload_asset(path, bytes).or_else(|e| {
            warn!(
                "Uploading {} to {} failed ({}), storing in {}",
                path,
                self.primary.name(),
                e,
                self.secondary.name()
            );
            self.secondary.upload_asset(path, bytes)
        })
    }

    fn delete_asset(&self, path: &str) -> Result<()> {
        let primary = self.primary.delete_asset(path);
        let secondary = self.secondary.delete_asset(path);
        primary.or(secondary)
    }

    fn tracks_assets(&self) -> bool {
        self.primary.tracks_assets() || self.secondary.tracks_assets()
    }

    fn sync_pending(&self) -> Result<Vec<(Collection, Result<()>)>> {
        let pending = self.secondary.pending()?;
        Ok(pending
            .into_iter()
            .map(|collection| (collection, self.push(collection)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;
    use serde_json::json;

    #[test]
    fn successful_load_is_mirrored() {
        let primary = MemBackend::new().with_records(Collection::Robots, vec![json!({"id": "a"})]);
        let backend = FallbackBackend::new(primary, MemBackend::new());

        let records = backend.load(Collection::Robots).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(backend.secondary().stored(Collection::Robots), records);
    }

    #[test]
    fn failed_load_serves_snapshot() {
        let primary = MemBackend::new();
        primary.set_simulate_read_error(true);
        let secondary =
            MemBackend::new().with_records(Collection::News, vec![json!({"id": "cached"})]);
        let backend = FallbackBackend::new(primary, secondary);

        let records = backend.load(Collection::News).unwrap();
        assert_eq!(records, vec![json!({"id": "cached"})]);
    }

    #[test]
    fn failed_save_writes_secondary_and_reports_error() {
        let primary = MemBackend::new();
        primary.set_simulate_write_error(true);
        let backend = FallbackBackend::new(primary, MemBackend::new());

        let result = backend.save(Collection::Robots, &[json!({"id": "a"})]);
        assert!(result.is_err());
        assert_eq!(
            backend.secondary().stored(Collection::Robots),
            vec![json!({"id": "a"})]
        );
    }

    #[test]
    fn failed_save_survives_the_next_load() {
        let primary = MemBackend::new().with_records(Collection::Robots, vec![json!({"id": "old"})]);
        primary.set_simulate_write_error(true);
        let backend = FallbackBackend::new(primary, MemBackend::new());
        let edited = vec![json!({"id": "old"}), json!({"id": "new-edit"})];

        assert!(backend.save(Collection::Robots, &edited).is_err());
        assert_eq!(backend.secondary().pending().unwrap(), vec![Collection::Robots]);

        assert_eq!(backend.load(Collection::Robots).unwrap(), edited);
        assert_eq!(backend.secondary().stored(Collection::Robots), edited);
        let found = backend
            .query(Collection::Robots, "id", &json!("new-edit"), None)
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn sync_pending_pushes_the_local_copy() {
        let primary = MemBackend::new();
        primary.set_simulate_write_error(true);
        let backend = FallbackBackend::new(primary, MemBackend::new());
        let _ = backend.save(Collection::News, &[json!({"id": "news-1"})]);

        let failed = backend.sync_pending().unwrap();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].1.is_err());
        assert_eq!(backend.secondary().pending().unwrap(), vec![Collection::News]);

        backend.primary().set_simulate_write_error(false);
        let synced = backend.sync_pending().unwrap();
        assert_eq!(synced.len(), 1);
        assert!(synced[0].1.is_ok());
        assert_eq!(backend.primary().stored(Collection::News), vec![json!({"id": "news-1"})]);
        assert!(backend.secondary().pending().unwrap().is_empty());
        assert!(backend.sync_pending().unwrap().is_empty());
    }

    #[test]
    fn successful_save_clears_the_pending_mark() {
        let primary = MemBackend::new();
        primary.set_simulate_write_error(true);
        let backend = FallbackBackend::new(primary, MemBackend::new());
        let _ = backend.save(Collection::Users, &[json!({"id": "user-1"})]);

        backend.primary().set_simulate_write_error(false);
        backend.save(Collection::Users, &[json!({"id": "user-2"})]).unwrap();
        assert!(backend.secondary().pending().unwrap().is_empty());
        assert_eq!(backend.load(Collection::Users).unwrap(), vec![json!({"id": "user-2"})]);
    }

    #[test]
    fn failed_upload_goes_to_secondary() {
        let primary = MemBackend::new();
        primary.set_simulate_asset_error(true);
        let backend = FallbackBackend::new(primary, MemBackend::new());

        let url = backend.upload_asset("images/1-a.png", b"png").unwrap();
        assert_eq!(url, "memory://images/1-a.png");
        assert!(backend.secondary().has_asset("images/1-a.png"));
    }
}
