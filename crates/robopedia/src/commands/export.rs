use crate::commands::activity;
use crate::commands::settings;
use crate::commands::{CmdMessage, CmdResult, Stores};
use crate::error::{RobopediaError, Result};
use crate::model::{Activity, Settings};
use crate::record::Record;
use crate::store::cache::EntityStore;
use crate::store::{Collection, StorageBackend};
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Backup of every collection.
///
/// Every field is optional so partial backups can be imported. Records are kept as
/// raw JSON and validated per record on import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robots: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<Activity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

/// `robopedia-backup-2024-05-01.json`
pub fn default_file_name() -> String {
    format!("robopedia-backup-{}.json", Utc::now().format("%Y-%m-%d"))
}

/// The merged view of every collection: bundled and custom records alike.
pub fn snapshot<B: StorageBackend>(stores: &mut Stores, backend: &B) -> Result<Snapshot> {
    Ok(Snapshot {
        robots: Some(values(&mut stores.robots, backend)?),
        users: Some(values(&mut stores.users, backend)?),
        news: Some(values(&mut stores.news, backend)?),
        settings: Some(settings::get(backend)),
        activities: Some(activity::recent(backend, usize::MAX)),
        exported_at: Some(Utc::now()),
    })
}

/// Writes a snapshot to `path`, gzip-compressed when the name ends in `.gz`.
pub fn run<B: StorageBackend>(
    stores: &mut Stores,
    backend: &B,
    path: &Path,
) -> Result<CmdResult<Collection>> {
    let snapshot = snapshot(stores, backend)?;
    let file = File::create(path).map_err(RobopediaError::Io)?;
    write_snapshot(file, &snapshot, is_gzip_path(path))?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Exported {} robots, {} news articles and {} users to {}",
        count(&snapshot.robots),
        count(&snapshot.news),
        count(&snapshot.users),
        path.display()
    )));
    Ok(result.with_affected(vec![
        Collection::Robots,
        Collection::Users,
        Collection::News,
        Collection::Settings,
        Collection::Activities,
    ]))
}

pub fn write_snapshot<W: Write>(writer: W, snapshot: &Snapshot, gzip: bool) -> Result<()> {
    if gzip {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        serde_json::to_writer_pretty(&mut encoder, snapshot)
            .map_err(RobopediaError::Serialization)?;
        encoder.finish().map_err(RobopediaError::Io)?;
    } else {
        let mut writer = writer;
        serde_json::to_writer_pretty(&mut writer, snapshot)
            .map_err(RobopediaError::Serialization)?;
        writer.flush().map_err(RobopediaError::Io)?;
    }
    Ok(())
}

pub(crate) fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

fn values<T: Record, B: StorageBackend>(
    store: &mut EntityStore<T>,
    backend: &B,
) -> Result<Vec<Value>> {
    store
        .all(backend)
        .iter()
        .map(|record| serde_json::to_value(record).map_err(RobopediaError::Serialization))
        .collect()
}

fn count<T>(items: &Option<Vec<T>>) -> usize {
    items.as_ref().map(Vec::len).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{create, settings};
    use crate::model::RobotDraft;
    use crate::store::mem_backend::MemBackend;
    use crate::test_utils::sample_dataset;
    use flate2::read::GzDecoder;
    use serde_json::json;
    use std::io::Read;

    #[test]
    fn snapshot_holds_merged_view() {
        let backend = MemBackend::new();
        let mut stores = Stores::new(&sample_dataset());
        create::run(&mut stores.robots, &backend, RobotDraft::named("Custom")).unwrap();
        settings::set(&backend, "siteName", json!("Robopedia")).unwrap();

        let snap = snapshot(&mut stores, &backend).unwrap();
        assert_eq!(snap.robots.as_ref().unwrap().len(), 3);
        assert_eq!(snap.news.as_ref().unwrap().len(), 1);
        assert_eq!(
            snap.settings.unwrap().get("siteName"),
            Some(&json!("Robopedia"))
        );
    }

    #[test]
    fn gzip_output_decompresses_to_json() {
        let snapshot = Snapshot {
            robots: Some(vec![json!({"id": "robot-1"})]),
            ..Default::default()
        };
        let mut buffer = Vec::new();
        write_snapshot(&mut buffer, &snapshot, true).unwrap();
        assert_eq!(&buffer[..2], &[0x1f, 0x8b]);

        let mut text = String::new();
        GzDecoder::new(&buffer[..]).read_to_string(&mut text).unwrap();
        let back: Snapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back.robots, snapshot.robots);
        assert!(back.users.is_none());
    }

    #[test]
    fn exports_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json.gz");
        let backend = MemBackend::new();
        let mut stores = Stores::new(&sample_dataset());

        let result = run(&mut stores, &backend, &path).unwrap();
        assert!(result.persisted);
        assert!(path.exists());
        assert!(is_gzip_path(&path));
        assert!(!is_gzip_path(Path::new("backup.json")));
    }
}
