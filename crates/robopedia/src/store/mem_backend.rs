use super::backend::{Collection, StorageBackend, SyncJournal};
use crate::error::{RobopediaError, Result};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since the core is single-threaded.
/// This keeps the `StorageBackend` trait on `&self` for all methods.
#[derive(Default)]
pub struct MemBackend {
    collections: RefCell<HashMap<Collection, Vec<Value>>>,
    assets: RefCell<HashMap<String, Vec<u8>>>,
    save_calls: RefCell<Vec<(Collection, Vec<Value>)>>,
    pending: RefCell<Vec<Collection>>,
    simulate_read_error: RefCell<bool>,
    simulate_write_error: RefCell<bool>,
    simulate_asset_error: RefCell<bool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection as if it had been persisted earlier.
    pub fn with_records(self, collection: Collection, records: Vec<Value>) -> Self {
        self.collections.borrow_mut().insert(collection, records);
        self
    }

    /// Enable read error simulation for testing degraded loads.
    pub fn set_simulate_read_error(&self, simulate: bool) {
        *self.simulate_read_error.borrow_mut() = simulate;
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    pub fn set_simulate_asset_error(&self, simulate: bool) {
        *self.simulate_asset_error.borrow_mut() = simulate;
    }

    /// Snapshot currently stored for a collection.
    pub fn stored(&self, collection: Collection) -> Vec<Value> {
        self.collections
            .borrow()
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Every payload passed to `save`, in call order (failed calls included).
    pub fn save_calls(&self) -> Vec<(Collection, Vec<Value>)> {
        self.save_calls.borrow().clone()
    }

    pub fn has_asset(&self, path: &str) -> bool {
        self.assets.borrow().contains_key(path)
    }
}

impl SyncJournal for MemBackend {
    fn pending(&self) -> Result<Vec<Collection>> {
        Ok(self.pending.borrow().clone())
    }

    fn set_pending(&self, collection: Collection, pending: bool) -> Result<()> {
        let mut marks = self.pending.borrow_mut();
        marks.retain(|c| *c != collection);
        if pending {
            marks.push(collection);
        }
        Ok(())
    }
}

impl StorageBackend for MemBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn load(&self, collection: Collection) -> Result<Vec<Value>> {
        if *self.simulate_read_error.borrow() {
            return Err(RobopediaError::Store("Simulated read error".to_string()));
        }
        Ok(self.stored(collection))
    }

    fn save(&self, collection: Collection, records: &[Value]) -> Result<()> {
        self.save_calls
            .borrow_mut()
            .push((collection, records.to_vec()));
        if *self.simulate_write_error.borrow() {
            return Err(RobopediaError::Store("Simulated write error".to_string()));
        }
        self.collections
            .borrow_mut()
            .insert(collection, records.to_vec());
        Ok(())
    }

    fn upload_asset(&self, path: &str, bytes: &[u8]) -> Result<String> {
        if *self.simulate_asset_error.borrow() {
            return Err(RobopediaError::Store("Simulated asset error".to_string()));
        }
        self.assets
            .borrow_mut()
            .insert(path.to_string(), bytes.to_vec());
        Ok(format!("memory://{}", path))
    }

    fn delete_asset(&self, path: &str) -> Result<()> {
        if *self.simulate_asset_error.borrow() {
            return Err(RobopediaError::Store("Simulated asset error".to_string()));
        }
        self.assets.borrow_mut().remove(path);
        Ok(())
    }

    fn tracks_assets(&self) -> bool {
        true
    }
}
