//! Site settings: one JSON object stored as the single record of the `settings`
//! collection.

use crate::error::{RobopediaError, Result};
use crate::model::Settings;
use crate::store::{Collection, StorageBackend};
use serde_json::Value;
use tracing::warn;

/// Current settings; empty when nothing is stored or the backend is unreadable.
pub fn get<B: StorageBackend>(backend: &B) -> Settings {
    load(backend).unwrap_or_else(|e| {
        warn!("Settings unavailable: {}", e);
        Settings::new()
    })
}

/// Sets one key. Returns whether the change was saved.
pub fn set<B: StorageBackend>(backend: &B, key: &str, value: Value) -> Result<bool> {
    let key = key.trim();
    if key.is_empty() {
        return Err(RobopediaError::Validation(
            "Setting name must not be empty".to_string(),
        ));
    }
    Ok(modify(backend, |settings| {
        settings.insert(key.to_string(), value);
    }))
}

/// Removes one key. Returns whether the change was saved.
pub fn remove<B: StorageBackend>(backend: &B, key: &str) -> bool {
    modify(backend, |settings| {
        settings.remove(key.trim());
    })
}

/// Replaces all settings.
pub fn replace<B: StorageBackend>(backend: &B, settings: &Settings) -> bool {
    save(backend, settings)
}

fn modify<B: StorageBackend>(backend: &B, change: impl FnOnce(&mut Settings)) -> bool {
    // Never overwrite settings we could not read
    let mut settings = match load(backend) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Settings unavailable, change not saved: {}", e);
            return false;
        }
    };
    change(&mut settings);
    save(backend, &settings)
}

fn load<B: StorageBackend>(backend: &B) -> Result<Settings> {
    match backend.load(Collection::Settings)?.into_iter().next() {
        Some(Value::Object(map)) => Ok(map.into_iter().collect()),
        Some(_) => Err(RobopediaError::Store(
            "Stored settings are not an object".to_string(),
        )),
        None => Ok(Settings::new()),
    }
}

fn save<B: StorageBackend>(backend: &B, settings: &Settings) -> bool {
    let object: serde_json::Map<String, Value> = settings
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    match backend.save(Collection::Settings, &[Value::Object(object)]) {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not save settings: {}", e);
            false
        }
    }
}
