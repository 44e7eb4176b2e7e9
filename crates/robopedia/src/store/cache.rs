use super::backend::StorageBackend;
use crate::record::Record;
use serde_json::Value;
use tracing::{debug, warn};

/// Where a cached record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Bundled dataset, untouched.
    Default,
    /// Created, modified or imported; part of the persisted custom subset.
    Custom,
}

#[derive(Debug, Clone)]
pub struct Entry<T> {
    pub record: T,
    pub origin: Origin,
}

/// In-memory view of one collection: bundled defaults merged with the custom
/// records persisted by the backend.
///
/// ## Lifecycle
///
/// `Uninitialized` → first access (or [`EntityStore::warm`]) loads the backend once,
/// merges, and the store is `Warm` for the rest of its life. Only
/// [`EntityStore::reload`] rebuilds it.
///
/// ## Merge
///
/// A custom record whose id matches a default replaces it in place; other custom
/// records are appended in load order. A later duplicate id in the loaded data
/// replaces the earlier one.
///
/// ## Persistence
///
/// The backend only ever receives the `Custom` entries ([`EntityStore::flush`]),
/// so the bundled dataset is never copied into storage. A failed load is logged and
/// treated as "no custom records"; a failed flush is reported as `false` and the
/// in-memory state is kept, so calling `flush` again is a valid retry.
#[derive(Debug)]
pub struct EntityStore<T: Record> {
    defaults: Vec<T>,
    /// None until warmed.
    entries: Option<Vec<Entry<T>>>,
}

impl<T: Record> EntityStore<T> {
    pub fn new(defaults: Vec<T>) -> Self {
        Self {
            defaults,
            entries: None,
        }
    }

    pub fn is_warm(&self) -> bool {
        self.entries.is_some()
    }

    pub fn defaults(&self) -> &[T] {
        &self.defaults
    }

    /// Load and merge if not done yet.
    pub fn warm<B: StorageBackend>(&mut self, backend: &B) {
        self.entries(backend);
    }

    /// Discard the cached state and load again.
    pub fn reload<B: StorageBackend>(&mut self, backend: &B) {
        self.entries = None;
        self.warm(backend);
    }

    fn entries<B: StorageBackend>(&mut self, backend: &B) -> &mut Vec<Entry<T>> {
        let defaults = &self.defaults;
        self.entries
            .get_or_insert_with(|| load_and_merge(defaults, backend))
    }

    // --- Reads ---

    /// The visible collection, in view order.
    pub fn all<B: StorageBackend>(&mut self, backend: &B) -> Vec<T> {
        let mut records: Vec<T> = self
            .entries(backend)
            .iter()
            .map(|e| e.record.clone())
            .collect();
        T::sort_view(&mut records);
        records
    }

    pub fn get<B: StorageBackend>(&mut self, backend: &B, id: &str) -> Option<T> {
        self.entries(backend)
            .iter()
            .find(|e| e.record.id() == id)
            .map(|e| e.record.clone())
    }

    pub fn get_by_key<B: StorageBackend>(&mut self, backend: &B, key: &str) -> Option<T> {
        self.entries(backend)
            .iter()
            .find(|e| e.record.key() == key)
            .map(|e| e.record.clone())
    }

    pub fn origin<B: StorageBackend>(&mut self, backend: &B, id: &str) -> Option<Origin> {
        self.entries(backend)
            .iter()
            .find(|e| e.record.id() == id)
            .map(|e| e.origin)
    }

    pub fn contains_id<B: StorageBackend>(&mut self, backend: &B, id: &str) -> bool {
        self.entries(backend).iter().any(|e| e.record.id() == id)
    }

    /// Whether `key` is used by any record other than `except_id`.
    pub fn key_taken<B: StorageBackend>(
        &mut self,
        backend: &B,
        key: &str,
        except_id: Option<&str>,
    ) -> bool {
        self.entries(backend)
            .iter()
            .any(|e| e.record.key() == key && Some(e.record.id()) != except_id)
    }

    // --- Mutations (in memory only; call flush to persist) ---

    pub fn insert<B: StorageBackend>(&mut self, backend: &B, record: T) {
        self.entries(backend).push(Entry {
            record,
            origin: Origin::Custom,
        });
    }

    /// Replace the record with the same id, marking it custom.
    /// Returns false if no such record exists.
    pub fn replace<B: StorageBackend>(&mut self, backend: &B, record: T) -> bool {
        match self
            .entries(backend)
            .iter_mut()
            .find(|e| e.record.id() == record.id())
        {
            Some(entry) => {
                entry.record = record;
                entry.origin = Origin::Custom;
                true
            }
            None => false,
        }
    }

    pub fn remove<B: StorageBackend>(&mut self, backend: &B, id: &str) -> Option<T> {
        let entries = self.entries(backend);
        let pos = entries.iter().position(|e| e.record.id() == id)?;
        Some(entries.remove(pos).record)
    }

    /// Replace every custom record with `records`. Records identical to the bundled
    /// record with the same id stay `Default`.
    ///
    /// A record whose key already belongs to another id is skipped. Returns how many
    /// were skipped.
    pub fn replace_custom<B: StorageBackend>(&mut self, backend: &B, records: Vec<T>) -> usize {
        // Make sure a pending lazy load can't overwrite the replacement later
        self.entries(backend);
        let mut entries: Vec<Entry<T>> = self
            .defaults
            .iter()
            .map(|d| Entry {
                record: d.clone(),
                origin: Origin::Default,
            })
            .collect();

        let mut skipped = 0;
        for record in records {
            let clash = entries
                .iter()
                .any(|e| e.record.key() == record.key() && e.record.id() != record.id());
            if clash {
                warn!(
                    "Skipping {} '{}': key '{}' is already used",
                    T::NOUN,
                    record.id(),
                    record.key()
                );
                skipped += 1;
                continue;
            }
            overlay(&mut entries, &self.defaults, record);
        }
        self.entries = Some(entries);
        skipped
    }

    // --- Persistence ---

    /// Records to persist: custom entries only.
    pub fn custom_records(&self) -> Vec<T> {
        self.entries
            .iter()
            .flatten()
            .filter(|e| e.origin == Origin::Custom)
            .map(|e| e.record.clone())
            .collect()
    }

    /// Persist the custom subset. Returns whether the backend accepted it.
    ///
    /// An uninitialized store has nothing to say about the backend's contents and
    /// writes nothing.
    pub fn flush<B: StorageBackend>(&self, backend: &B) -> bool {
        if !self.is_warm() {
            return true;
        }

        let payload: Vec<Value> = match self
            .custom_records()
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()
        {
            Ok(values) => values,
            Err(e) => {
                warn!("Could not serialize {}: {}", T::COLLECTION, e);
                return false;
            }
        };

        match backend.save(T::COLLECTION, &payload) {
            Ok(()) => {
                debug!("Saved {} custom {} to {}", payload.len(), T::COLLECTION, backend.name());
                true
            }
            Err(e) => {
                warn!("Saving {} to {} failed: {}", T::COLLECTION, backend.name(), e);
                false
            }
        }
    }
}

fn load_and_merge<T: Record, B: StorageBackend>(defaults: &[T], backend: &B) -> Vec<Entry<T>> {
    let loaded = match backend.load(T::COLLECTION) {
        Ok(records) => records,
        Err(e) => {
            warn!(
                "Could not load {} from {} ({}), serving bundled data only",
                T::COLLECTION,
                backend.name(),
                e
            );
            Vec::new()
        }
    };
    let merged = merge(defaults, loaded);
    debug!(
        "Warmed {} cache: {} records ({} bundled)",
        T::COLLECTION,
        merged.len(),
        defaults.len()
    );
    merged
}

fn merge<T: Record>(defaults: &[T], loaded: Vec<Value>) -> Vec<Entry<T>> {
    let mut entries: Vec<Entry<T>> = defaults
        .iter()
        .map(|d| Entry {
            record: d.clone(),
            origin: Origin::Default,
        })
        .collect();

    for raw in loaded {
        match serde_json::from_value::<T>(raw) {
            Ok(record) => overlay(&mut entries, defaults, record),
            Err(e) => warn!("Skipping malformed {} record: {}", T::COLLECTION, e),
        }
    }
    entries
}

fn overlay<T: Record>(entries: &mut Vec<Entry<T>>, defaults: &[T], record: T) {
    let unchanged_default = defaults
        .iter()
        .any(|d| d.id() == record.id() && *d == record);
    let origin = if unchanged_default {
        Origin::Default
    } else {
        Origin::Custom
    };

    match entries.iter_mut().find(|e| e.record.id() == record.id()) {
        Some(entry) => {
            entry.record = record;
            entry.origin = origin;
        }
        None => entries.push(Entry { record, origin }),
    }
}
