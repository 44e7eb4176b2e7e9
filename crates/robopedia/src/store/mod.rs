//! # Storage Layer
//!
//! This module defines how robopedia persists records. The [`StorageBackend`] trait
//! is the one abstraction boundary of the system: the command layer and the
//! [`cache::EntityStore`] talk only to it, never to a concrete backend.
//!
//! ## Two Layers
//!
//! 1. **Backends** store raw JSON snapshots of the *custom* records of a collection
//!    plus binary assets. They know nothing about the bundled dataset.
//! 2. **The cache** ([`cache::EntityStore`]) merges the bundled dataset with what a
//!    backend returns and decides what gets written back.
//!
//! ## Failure Model
//!
//! Backends return honest errors. Degrading is done in exactly two places:
//! - [`cache::EntityStore`]: a failed load is logged and treated as empty; a failed
//!   save becomes `persisted = false` on the command result.
//! - [`fallback::FallbackBackend`]: pairs a remote backend with a local snapshot so
//!   reads survive outages and writes land somewhere. Writes the remote never got
//!   are journaled locally ([`SyncJournal`]) until `sync_pending` pushes them.
//!
//! ## Implementations
//!
//! - [`local::LocalBackend`]: key-value files in a directory.
//! - [`github::GithubBackend`]: JSON files committed to a GitHub repository.
//! - [`firestore::FirestoreBackend`]: one Firestore document per record.
//! - [`mem_backend::MemBackend`]: in memory, for tests.
//!
//! ## Concurrency
//!
//! Single-threaded and sequential. Nothing coordinates two processes writing the
//! same backend: the last save wins.

pub mod backend;
pub mod cache;
pub mod fallback;
pub mod firestore;
pub mod github;
pub mod local;
pub mod mem_backend;

pub use backend::{Collection, StorageBackend, SyncJournal};

/// Percent-encodes everything except ASCII alphanumerics and `-`, `_`, `.`.
pub(crate) fn percent_encode(raw: &str) -> String {
    raw.bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.') {
                (b as char).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect()
}

/// MIME type derived from the file extension.
pub fn mime_for_path(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
