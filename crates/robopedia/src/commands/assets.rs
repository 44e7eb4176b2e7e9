use crate::error::{RobopediaError, Result};
use crate::slug::sanitize_file_name;
use crate::store::StorageBackend;
use chrono::Utc;
use tracing::info;

pub const DEFAULT_ASSET_DIR: &str = "images";

/// Logical path for an upload: `{dir}/{epochMillis}-{sanitized name}`.
pub fn asset_path(dir: &str, original_name: &str) -> String {
    format!(
        "{}/{}-{}",
        dir.trim_matches('/'),
        Utc::now().timestamp_millis(),
        sanitize_file_name(original_name)
    )
}

/// Stores `bytes` and returns the URL the backend resolves it to.
pub fn upload<B: StorageBackend>(
    backend: &B,
    dir: &str,
    original_name: &str,
    bytes: &[u8],
) -> Result<String> {
    if bytes.is_empty() {
        return Err(RobopediaError::Validation(format!(
            "Refusing to upload empty file {}",
            original_name
        )));
    }
    let path = asset_path(dir, original_name);
    let url = backend.upload_asset(&path, bytes)?;
    info!("Uploaded {} ({} bytes) to {}", path, bytes.len(), backend.name());
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;

    #[test]
    fn path_is_timestamped_and_sanitized() {
        let path = asset_path("/images/", "My Photo (1).PNG");
        let (dir, file) = path.split_once('/').unwrap();
        assert_eq!(dir, "images");
        let (millis, name) = file.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(name, "My_Photo__1_.PNG");
    }

    #[test]
    fn upload_returns_backend_url() {
        let backend = MemBackend::new();
        let url = upload(&backend, DEFAULT_ASSET_DIR, "a.png", b"data").unwrap();
        assert!(url.starts_with("memory://images/"));
        assert!(backend.has_asset(url.trim_start_matches("memory://")));
    }

    #[test]
    fn failures_are_reported() {
        let backend = MemBackend::new();
        assert!(upload(&backend, DEFAULT_ASSET_DIR, "a.png", b"").is_err());
        backend.set_simulate_asset_error(true);
        assert!(upload(&backend, DEFAULT_ASSET_DIR, "a.png", b"data").is_err());
    }
}
