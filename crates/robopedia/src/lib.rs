//! # Robopedia Architecture
//!
//! Robopedia is the **storage core of a robotics encyclopedia**: robots, news
//! articles and the users, settings and activity log of its admin panel. Pages and
//! admin screens are clients; this crate owns the records and where they live.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Clients (robopedia-cli, a web front end, ...)              │
//! │  - Parse input, render output, write audit lines            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - RobopediaApi<B>: owns the backend and the caches         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Create / update / delete / search, written once per      │
//! │    Record type; import, export, activity, settings          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - EntityStore: bundled dataset ∪ custom records            │
//! │  - StorageBackend: local, GitHub, Firestore, memory         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bundled vs. Custom Records
//!
//! Every deployment ships the same [`dataset::StaticDataset`]. What a deployment adds
//! or edits is its *custom* data, and only that is ever written to a backend. A
//! custom record with the id of a bundled one replaces it in every view.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward the code never prints and never exits. Backend failures are
//! logged with `tracing` and surface as degraded results (`persisted = false`, or
//! only bundled records visible), never as panics.
//!
//! ## Module Overview
//!
//! - [`api`]: the facade, entry point for all operations
//! - [`commands`]: business logic for each operation
//! - [`store`]: backends and the entity cache
//! - [`model`]: record types, drafts and patches
//! - [`record`]: the trait that makes the commands generic
//! - [`dataset`]: bundled records and assistant replies
//! - [`slug`]: slug derivation and file name sanitizing
//! - [`auth`]: password hashing
//! - [`assistant`]: canned assistant replies
//! - [`config`]: configuration management
//! - [`error`]: error types

pub mod api;
pub mod assistant;
pub mod auth;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod error;
pub mod model;
pub mod record;
pub mod slug;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
