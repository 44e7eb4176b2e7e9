//! # Configuration
//!
//! Robopedia configuration is managed by [`confique`], which layers environment
//! variables over TOML files over compiled defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `ROBOPEDIA_BACKEND`, `ROBOPEDIA_DATA_DIR`,
//!    `GITHUB_TOKEN`, `FIREBASE_API_KEY`, ...
//! 2. **Project config**: `robopedia.toml` in the working directory.
//! 3. **Global config**: `robopedia.toml` in the OS config directory (via `directories`).
//! 4. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `backend` | `local` | `local`, `github` or `firestore` |
//! | `data_dir` | `.robopedia` | Local key-value directory (also the fallback snapshot) |
//! | `activity_limit` | `100` | Activity log entries kept |
//! | `admin_email` / `admin_password` | none | Bootstrap admin account |
//! | `github.*` | | Repository used as database |
//! | `firestore.*` | | Firestore project and storage bucket |
//!
//! Secrets (tokens, API keys, the admin password) are read from the environment
//! and never compiled in.

use crate::error::{RobopediaError, Result};
use confique::Config;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_FILE_NAME: &str = "robopedia.toml";

/// Which persistence backend a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Local,
    Github,
    Firestore,
}

impl FromStr for BackendKind {
    type Err = RobopediaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "github" => Ok(BackendKind::Github),
            "firestore" | "firebase" => Ok(BackendKind::Firestore),
            other => Err(RobopediaError::Validation(format!(
                "Unknown backend '{}' (expected local, github or firestore)",
                other
            ))),
        }
    }
}

// Accept any string form so environment values deserialize the same as TOML.
impl<'de> Deserialize<'de> for BackendKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Local => "local",
            BackendKind::Github => "github",
            BackendKind::Firestore => "firestore",
        })
    }
}

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GithubConfig {
    #[config(env = "ROBOPEDIA_GITHUB_OWNER", default = "")]
    pub owner: String,

    #[config(env = "ROBOPEDIA_GITHUB_REPO", default = "")]
    pub repo: String,

    #[config(env = "ROBOPEDIA_GITHUB_BRANCH", default = "main")]
    pub branch: String,

    /// Directory holding `robots.json`, `news.json`, ...
    #[config(default = "data")]
    pub data_dir: String,

    /// Directory uploaded assets are committed to.
    #[config(default = "images")]
    pub images_dir: String,

    #[config(env = "GITHUB_TOKEN")]
    pub token: Option<String>,

    #[config(default = "https://api.github.com")]
    pub api_base: String,
}

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    #[config(env = "FIREBASE_PROJECT_ID", default = "")]
    pub project_id: String,

    #[config(env = "FIREBASE_API_KEY")]
    pub api_key: Option<String>,

    /// OAuth bearer token, for rules that require an authenticated client.
    #[config(env = "FIREBASE_TOKEN")]
    pub token: Option<String>,

    /// Firebase Storage bucket for assets (e.g. `my-project.appspot.com`).
    #[config(env = "FIREBASE_STORAGE_BUCKET")]
    pub bucket: Option<String>,

    #[config(default = "https://firestore.googleapis.com/v1")]
    pub api_base: String,

    #[config(default = "https://firebasestorage.googleapis.com/v0")]
    pub storage_base: String,
}

/// Configuration for robopedia, stored in `robopedia.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RobopediaConfig {
    #[config(env = "ROBOPEDIA_BACKEND", default = "local")]
    pub backend: BackendKind,

    #[config(env = "ROBOPEDIA_DATA_DIR", default = ".robopedia")]
    pub data_dir: PathBuf,

    #[config(env = "ROBOPEDIA_ACTIVITY_LIMIT", default = 100)]
    pub activity_limit: usize,

    #[config(env = "ROBOPEDIA_ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    #[config(env = "ROBOPEDIA_ADMIN_PASSWORD")]
    pub admin_password: Option<String>,

    #[config(nested)]
    pub github: GithubConfig,

    #[config(nested)]
    pub firestore: FirestoreConfig,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: "main".to_string(),
            data_dir: "data".to_string(),
            images_dir: "images".to_string(),
            token: None,
            api_base: "https://api.github.com".to_string(),
        }
    }
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            api_key: None,
            token: None,
            bucket: None,
            api_base: "https://firestore.googleapis.com/v1".to_string(),
            storage_base: "https://firebasestorage.googleapis.com/v0".to_string(),
        }
    }
}

impl Default for RobopediaConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            data_dir: PathBuf::from(".robopedia"),
            activity_limit: 100,
            admin_email: None,
            admin_password: None,
            github: GithubConfig::default(),
            firestore: FirestoreConfig::default(),
        }
    }
}

impl RobopediaConfig {
    /// Load from the environment and the given files (earlier files win).
    /// Missing files are skipped.
    pub fn load_from(files: &[PathBuf]) -> Result<Self> {
        let mut builder = Self::builder().env();
        for file in files {
            builder = builder.file(file);
        }
        let config = builder.load()?;
        config.validate()?;
        Ok(config)
    }

    /// Config files searched for a working directory: project first, then global.
    pub fn search_paths(project_dir: &Path) -> Vec<PathBuf> {
        let mut paths = vec![project_dir.join(CONFIG_FILE_NAME)];
        if let Some(dirs) = directories::ProjectDirs::from("org", "robopedia", "robopedia") {
            paths.push(dirs.config_dir().join(CONFIG_FILE_NAME));
        }
        paths
    }

    /// Checks the settings the selected backend needs.
    pub fn validate(&self) -> Result<()> {
        match self.backend {
            BackendKind::Local => Ok(()),
            BackendKind::Github => {
                if self.github.owner.trim().is_empty() || self.github.repo.trim().is_empty() {
                    return Err(RobopediaError::Validation(
                        "The github backend needs github.owner and github.repo".to_string(),
                    ));
                }
                Ok(())
            }
            BackendKind::Firestore => {
                if self.firestore.project_id.trim().is_empty() {
                    return Err(RobopediaError::Validation(
                        "The firestore backend needs firestore.project_id".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Admin account to bootstrap, when both halves are configured.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (self.admin_email.as_deref(), self.admin_password.as_deref()) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email, password))
            }
            _ => None,
        }
    }
}
