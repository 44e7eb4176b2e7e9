use crate::auth::{hash_password, is_hashed};
use crate::commands::export::Snapshot;
use crate::commands::{CmdMessage, CmdResult, Stores};
use crate::error::{RobopediaError, Result};
use crate::model::{Activity, User};
use crate::record::Record;
use crate::store::cache::EntityStore;
use crate::store::{Collection, StorageBackend};
use flate2::read::GzDecoder;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::warn;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Reads a snapshot file, plain or gzip-compressed.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let bytes = fs::read(path).map_err(RobopediaError::Io)?;
    parse_snapshot(&bytes)
}

pub fn parse_snapshot(bytes: &[u8]) -> Result<Snapshot> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut text = String::new();
        GzDecoder::new(bytes)
            .read_to_string(&mut text)
            .map_err(RobopediaError::Io)?;
        serde_json::from_str(&text).map_err(RobopediaError::Serialization)
    } else {
        serde_json::from_slice(bytes).map_err(RobopediaError::Serialization)
    }
}

/// Replaces the custom records of every collection present in the snapshot.
///
/// Collections missing from the snapshot are untouched. Malformed records are
/// skipped with a warning; records identical to a bundled one stay bundled.
pub fn run<B: StorageBackend>(
    stores: &mut Stores,
    backend: &B,
    snapshot: Snapshot,
) -> Result<CmdResult<Collection>> {
    let mut result = CmdResult::default();
    let mut persisted = true;

    if let Some(raw) = snapshot.robots {
        persisted &= replace(&mut stores.robots, backend, raw, &mut result);
    }
    if let Some(raw) = snapshot.news {
        persisted &= replace(&mut stores.news, backend, raw, &mut result);
    }
    if let Some(raw) = snapshot.users {
        persisted &= replace_users(&mut stores.users, backend, raw, &mut result);
    }
    if let Some(settings) = snapshot.settings {
        persisted &= crate::commands::settings::replace(backend, &settings);
        result.affected.push(Collection::Settings);
    }
    if let Some(activities) = snapshot.activities {
        persisted &= save_activities(backend, &activities);
        result.affected.push(Collection::Activities);
    }

    if result.affected.is_empty() {
        result.add_message(CmdMessage::info("Nothing to import"));
    } else {
        let names: Vec<_> = result.affected.iter().map(|c| c.key()).collect();
        result.add_message(CmdMessage::success(format!(
            "Imported {}",
            names.join(", ")
        )));
    }
    result.set_persisted(persisted, backend.name());
    Ok(result)
}

fn replace<T: Record, B: StorageBackend>(
    store: &mut EntityStore<T>,
    backend: &B,
    raw: Vec<Value>,
    result: &mut CmdResult<Collection>,
) -> bool {
    let records = parse_records::<T>(raw, result);
    let clashing = store.replace_custom(backend, records);
    note_clashes::<T>(clashing, result);
    result.affected.push(T::COLLECTION);
    store.flush(backend)
}

fn replace_users<B: StorageBackend>(
    store: &mut EntityStore<User>,
    backend: &B,
    raw: Vec<Value>,
    result: &mut CmdResult<Collection>,
) -> bool {
    let users = parse_records::<User>(raw, result)
        .into_iter()
        .map(|mut user| {
            // Older backups stored clear text passwords
            if !is_hashed(&user.password) {
                user.password = hash_password(&user.password);
            }
            user
        })
        .collect();
    let clashing = store.replace_custom(backend, users);
    note_clashes::<User>(clashing, result);
    result.affected.push(Collection::Users);
    store.flush(backend)
}

fn note_clashes<T: Record>(clashing: usize, result: &mut CmdResult<Collection>) {
    if clashing > 0 {
        result.add_message(CmdMessage::warning(format!(
            "Skipped {} {} record(s) with a duplicate key",
            clashing,
            T::COLLECTION
        )));
    }
}

fn parse_records<T: Record>(raw: Vec<Value>, result: &mut CmdResult<Collection>) -> Vec<T> {
    let total = raw.len();
    let records: Vec<T> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<T>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping malformed {} in import: {}", T::NOUN, e);
                None
            }
        })
        .collect();

    let skipped = total - records.len();
    if skipped > 0 {
        result.add_message(CmdMessage::warning(format!(
            "Skipped {} malformed {} record(s)",
            skipped,
            T::COLLECTION
        )));
    }
    records
}

fn save_activities<B: StorageBackend>(backend: &B, activities: &[Activity]) -> bool {
    let payload: Vec<Value> = match activities.iter().map(serde_json::to_value).collect() {
        Ok(values) => values,
        Err(e) => {
            warn!("Could not serialize activities: {}", e);
            return false;
        }
    };
    match backend.save(Collection::Activities, &payload) {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not save imported activities: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::commands::export::{snapshot, write_snapshot};
    use crate::commands::{create, get};
    use crate::model::RobotDraft;
    use crate::store::cache::Origin;
    use crate::store::mem_backend::MemBackend;
    use crate::test_utils::sample_dataset;
    use serde_json::json;

    #[test]
    fn export_then_import_keeps_defaults_out_of_storage() {
        let backend = MemBackend::new();
        let mut stores = Stores::new(&sample_dataset());
        create::run(&mut stores.robots, &backend, RobotDraft::named("Custom")).unwrap();
        let snap = snapshot(&mut stores, &backend).unwrap();

        let fresh = MemBackend::new();
        let mut restored = Stores::new(&sample_dataset());
        let result = run(&mut restored, &fresh, snap).unwrap();
        assert!(result.persisted);

        assert_eq!(get::all(&mut restored.robots, &fresh).len(), 3);
        assert_eq!(fresh.stored(Collection::Robots).len(), 1);
        assert_eq!(
            restored.robots.origin(&fresh, "robot-001"),
            Some(Origin::Default)
        );
    }

    #[test]
    fn absent_collections_are_untouched() {
        let backend = MemBackend::new();
        let mut stores = Stores::new(&sample_dataset());
        create::run(&mut stores.robots, &backend, RobotDraft::named("Keep Me")).unwrap();

        let snap = Snapshot {
            news: Some(vec![]),
            ..Default::default()
        };
        let result = run(&mut stores, &backend, snap).unwrap();
        assert_eq!(result.affected, vec![Collection::News]);
        assert!(get::by_key(&mut stores.robots, &backend, "keep-me").is_some());
    }

    #[test]
    fn present_collection_replaces_custom_records() {
        let backend = MemBackend::new();
        let mut stores = Stores::new(&sample_dataset());
        create::run(&mut stores.robots, &backend, RobotDraft::named("Old Custom")).unwrap();

        let snap = Snapshot {
            robots: Some(vec![
                json!({"id": "robot-77", "slug": "imported", "name": "Imported"}),
                json!({"name": "no id"}),
            ]),
            ..Default::default()
        };
        let result = run(&mut stores, &backend, snap).unwrap();
        assert!(result.messages.iter().any(|m| m.content.contains("Skipped 1")));
        assert!(get::by_key(&mut stores.robots, &backend, "old-custom").is_none());
        assert!(get::by_id(&mut stores.robots, &backend, "robot-77").is_some());
        assert_eq!(backend.stored(Collection::Robots).len(), 1);
    }

    #[test]
    fn records_reusing_a_slug_are_skipped() {
        let backend = MemBackend::new();
        let mut stores = Stores::new(&sample_dataset());
        let snap = Snapshot {
            robots: Some(vec![
                json!({"id": "robot-77", "slug": "atlas", "name": "Fake Atlas"}),
                json!({"id": "robot-78", "slug": "twin", "name": "Twin"}),
                json!({"id": "robot-79", "slug": "twin", "name": "Twin Again"}),
            ]),
            ..Default::default()
        };
        let result = run(&mut stores, &backend, snap).unwrap();

        assert!(result
            .messages
            .iter()
            .any(|m| m.content == "Skipped 2 robots record(s) with a duplicate key"));
        assert_eq!(get::by_key(&mut stores.robots, &backend, "atlas").unwrap().id, "robot-001");
        assert_eq!(get::by_key(&mut stores.robots, &backend, "twin").unwrap().id, "robot-78");
        assert_eq!(backend.stored(Collection::Robots).len(), 1);
    }

    #[test]
    fn clear_text_passwords_are_hashed() {
        let backend = MemBackend::new();
        let mut stores = Stores::new(&sample_dataset());
        let snap = Snapshot {
            users: Some(vec![json!({
                "id": "user-1", "email": "ada@example.com", "name": "Ada", "password": "plain"
            })]),
            ..Default::default()
        };
        run(&mut stores, &backend, snap).unwrap();
        let user = get::by_key(&mut stores.users, &backend, "ada@example.com").unwrap();
        assert_ne!(user.password, "plain");
        assert!(verify_password(&user.password, "plain"));
    }

    #[test]
    fn reads_plain_and_gzip_files() {
        let snap = Snapshot {
            settings: Some([("a".to_string(), json!(1))].into_iter().collect()),
            ..Default::default()
        };
        for gzip in [false, true] {
            let mut bytes = Vec::new();
            write_snapshot(&mut bytes, &snap, gzip).unwrap();
            assert_eq!(parse_snapshot(&bytes).unwrap(), snap);
        }
        assert!(parse_snapshot(b"not json").is_err());
    }

    #[test]
    fn failed_save_is_reported() {
        let backend = MemBackend::new();
        backend.set_simulate_write_error(true);
        let mut stores = Stores::new(&sample_dataset());
        let snap = Snapshot {
            robots: Some(vec![]),
            ..Default::default()
        };
        let result = run(&mut stores, &backend, snap).unwrap();
        assert!(!result.persisted);
    }
}
