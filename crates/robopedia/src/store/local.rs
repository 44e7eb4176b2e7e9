//! Local key-value backend.
//!
//! A directory stands in for browser-local storage: every key is one file holding
//! a string value.
//!
//! ```text
//! <root>/
//! ├── robots.json            # key "robots": JSON list of custom robots
//! ├── news.json              # key "news"
//! ├── users.json / activities.json / settings.json
//! ├── uploadedFiles.json     # key "uploadedFiles": index of uploaded assets
//! ├── pendingSync.json       # key "pendingSync": collections a remote never received
//! └── file%3Aimages%2F....   # key "file:<path>": base64 payload of one asset
//! ```
//!
//! Assets are addressed by their logical path. [`LocalBackend::data_url`] turns a
//! path back into a `data:` URL for rendering.

use super::backend::{Collection, StorageBackend, SyncJournal};
use super::{mime_for_path, percent_encode};
use crate::error::{RobopediaError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const UPLOADED_FILES_KEY: &str = "uploadedFiles";
const PENDING_SYNC_KEY: &str = "pendingSync";
const FILE_KEY_PREFIX: &str = "file:";

/// One entry of the uploaded file index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub path: String,
    pub mime: String,
    pub size: usize,
    pub uploaded_at: DateTime<Utc>,
}

pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // --- Raw key-value access ---

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(path).map(Some).map_err(RobopediaError::Io)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(RobopediaError::Io)?;
        }

        // Atomic write: tmp then rename
        let tmp_path = self.root.join(format!(".kv-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_path, value).map_err(RobopediaError::Io)?;
        fs::rename(&tmp_path, self.key_path(key)).map_err(RobopediaError::Io)?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(path).map_err(RobopediaError::Io)?;
        }
        Ok(())
    }

    // --- Assets ---

    pub fn uploaded_files(&self) -> Result<Vec<UploadedFile>> {
        match self.get_item(UPLOADED_FILES_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(RobopediaError::Serialization),
            None => Ok(Vec::new()),
        }
    }

    fn save_uploaded_files(&self, files: &[UploadedFile]) -> Result<()> {
        let raw = serde_json::to_string(files).map_err(RobopediaError::Serialization)?;
        self.set_item(UPLOADED_FILES_KEY, &raw)
    }

    /// `data:` URL for an uploaded asset, or None if the path is unknown.
    pub fn data_url(&self, path: &str) -> Result<Option<String>> {
        let payload = self.get_item(&file_key(path))?;
        Ok(payload.map(|b64| format!("data:{};base64,{}", mime_for_path(path), b64)))
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let file_name = if key.starts_with(FILE_KEY_PREFIX) {
            encode_key(key)
        } else {
            format!("{}.json", encode_key(key))
        };
        self.root.join(file_name)
    }
}

impl SyncJournal for LocalBackend {
    fn pending(&self) -> Result<Vec<Collection>> {
        match self.get_item(PENDING_SYNC_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(RobopediaError::Serialization),
            None => Ok(Vec::new()),
        }
    }

    fn set_pending(&self, collection: Collection, pending: bool) -> Result<()> {
        let mut collections = self.pending()?;
        let present = collections.contains(&collection);
        if present == pending {
            return Ok(());
        }
        if pending {
            collections.push(collection);
        } else {
            collections.retain(|c| *c != collection);
        }

        if collections.is_empty() {
            self.remove_item(PENDING_SYNC_KEY)
        } else {
            let raw = serde_json::to_string(&collections).map_err(RobopediaError::Serialization)?;
            self.set_item(PENDING_SYNC_KEY, &raw)
        }
    }
}

impl StorageBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    fn load(&self, collection: Collection) -> Result<Vec<Value>> {
        let Some(raw) = self.get_item(collection.key())? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw).map_err(RobopediaError::Serialization)? {
            Value::Array(records) => Ok(records),
            other => Err(RobopediaError::Store(format!(
                "Key '{}' holds {} instead of a list",
                collection,
                json_kind(&other)
            ))),
        }
    }

    fn save(&self, collection: Collection, records: &[Value]) -> Result<()> {
        let raw = serde_json::to_string(records).map_err(RobopediaError::Serialization)?;
        self.set_item(collection.key(), &raw)
    }

    fn upload_asset(&self, path: &str, bytes: &[u8]) -> Result<String> {
        self.set_item(&file_key(path), &STANDARD.encode(bytes))?;

        let mut files = self.uploaded_files()?;
        files.retain(|f| f.path != path);
        files.push(UploadedFile {
            path: path.to_string(),
            mime: mime_for_path(path).to_string(),
            size: bytes.len(),
            uploaded_at: Utc::now(),
        });
        self.save_uploaded_files(&files)?;

        Ok(path.to_string())
    }

    fn delete_asset(&self, path: &str) -> Result<()> {
        let mut files = self.uploaded_files()?;
        let before = files.len();
        files.retain(|f| f.path != path);
        if files.len() != before {
            self.save_uploaded_files(&files)?;
        }
        self.remove_item(&file_key(path))
    }

    fn tracks_assets(&self) -> bool {
        true
    }
}

fn file_key(path: &str) -> String {
    format!("{FILE_KEY_PREFIX}{path}")
}

fn encode_key(key: &str) -> String {
    percent_encode(key)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
