//! GitHub repository backend.
//!
//! Each collection is one JSON file in a repository, read and committed through the
//! GitHub contents API:
//!
//! - `GET  /repos/{owner}/{repo}/contents/{path}?ref={branch}` → `{content, sha}`
//!   (`content` is base64). A 404 means nothing has been stored yet.
//! - `PUT  /repos/{owner}/{repo}/contents/{path}` with `{message, content, sha?, branch}`.
//!   `sha` is omitted only when the file is created.
//! - `DELETE` the same path with `{message, sha, branch}` for assets.
//!
//! Reads work anonymously on public repositories. Writes need a token, either from
//! configuration or via [`GithubBackend::authenticate`]; without one they fail with
//! [`RobopediaError::Unauthenticated`].

use super::backend::{Collection, StorageBackend};
use crate::config::GithubConfig;
use crate::error::{RobopediaError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use tracing::{debug, info};

const RAW_BASE: &str = "https://raw.githubusercontent.com";

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    content: CommitContent,
}

#[derive(Debug, Deserialize)]
struct CommitContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
    branch: &'a str,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    message: &'a str,
    sha: String,
    branch: &'a str,
}

/// A file fetched from the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub bytes: Vec<u8>,
    pub sha: String,
}

pub struct GithubBackend {
    client: Client,
    config: GithubConfig,
    token: RefCell<Option<String>>,
}

impl GithubBackend {
    pub fn new(config: GithubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("robopedia"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = Client::builder().default_headers(headers).build()?;
        let token = config.token.clone().filter(|t| !t.trim().is_empty());

        Ok(Self {
            client,
            config,
            token: RefCell::new(token),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.borrow().is_some()
    }

    /// Validates a token against `GET /user` and keeps it for later writes.
    /// Returns the account login.
    pub fn authenticate(&self, token: &str) -> Result<String> {
        let url = format!("{}/user", self.api_base());
        let response = self.client.get(url).bearer_auth(token).send()?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(RobopediaError::Unauthenticated);
        }
        let user: GithubUser = expect_success(response)?.json()?;

        *self.token.borrow_mut() = Some(token.to_string());
        info!("Authenticated with GitHub as {}", user.login);
        Ok(user.login)
    }

    pub fn sign_out(&self) {
        *self.token.borrow_mut() = None;
    }

    /// Fetch a file at the configured branch. Ok(None) on 404.
    pub fn get_file(&self, path: &str) -> Result<Option<RemoteFile>> {
        let request = self
            .client
            .get(self.contents_url(path))
            .query(&[("ref", self.config.branch.as_str())]);
        let response = self.authorized(request).send()?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("{} does not exist yet", path);
            return Ok(None);
        }

        let body: ContentsResponse = expect_success(response)?.json()?;
        Ok(Some(RemoteFile {
            bytes: decode_content(&body.content)?,
            sha: body.sha,
        }))
    }

    /// Create or update a file, returning the new blob sha.
    pub fn put_file(&self, path: &str, bytes: &[u8], message: &str) -> Result<String> {
        self.require_token()?;
        let sha = self.get_file(path)?.map(|f| f.sha);

        let body = PutRequest {
            message,
            content: STANDARD.encode(bytes),
            sha,
            branch: &self.config.branch,
        };
        let request = self.client.put(self.contents_url(path)).json(&body);
        let commit: CommitResponse = expect_success(self.authorized(request).send()?)?.json()?;

        info!("Committed {} ({})", path, commit.content.sha);
        Ok(commit.content.sha)
    }

    pub fn delete_file(&self, path: &str, message: &str) -> Result<()> {
        self.require_token()?;
        let Some(existing) = self.get_file(path)? else {
            return Ok(());
        };

        let body = DeleteRequest {
            message,
            sha: existing.sha,
            branch: &self.config.branch,
        };
        let request = self.client.delete(self.contents_url(path)).json(&body);
        expect_success(self.authorized(request).send()?)?;
        info!("Deleted {}", path);
        Ok(())
    }

    pub fn raw_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            RAW_BASE, self.config.owner, self.config.repo, self.config.branch, path
        )
    }

    fn api_base(&self) -> &str {
        self.config.api_base.trim_end_matches('/')
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base(),
            self.config.owner,
            self.config.repo,
            path.trim_start_matches('/')
        )
    }

    fn collection_path(&self, collection: Collection) -> String {
        let dir = self.config.data_dir.trim_matches('/');
        if dir.is_empty() {
            format!("{}.json", collection.key())
        } else {
            format!("{}/{}.json", dir, collection.key())
        }
    }

    /// Repository path of an asset this backend uploaded, if `reference` is one.
    fn owned_asset_path(&self, reference: &str) -> Option<String> {
        let raw_prefix = self.raw_url("");
        let path = reference.strip_prefix(&raw_prefix).unwrap_or(reference);
        let images = format!("{}/", self.config.images_dir.trim_matches('/'));
        path.starts_with(&images).then(|| path.to_string())
    }

    fn require_token(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(RobopediaError::Unauthenticated)
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.borrow().as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl StorageBackend for GithubBackend {
    fn name(&self) -> &'static str {
        "github"
    }

    fn load(&self, collection: Collection) -> Result<Vec<Value>> {
        let path = self.collection_path(collection);
        match self.get_file(&path)? {
            Some(file) => {
                let records: Vec<Value> =
                    serde_json::from_slice(&file.bytes).map_err(RobopediaError::Serialization)?;
                debug!("Loaded {} {} from {}", records.len(), collection, path);
                Ok(records)
            }
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, collection: Collection, records: &[Value]) -> Result<()> {
        let path = self.collection_path(collection);
        let body = serde_json::to_vec_pretty(records).map_err(RobopediaError::Serialization)?;
        let message = format!("Update {} ({} records)", collection, records.len());
        self.put_file(&path, &body, &message)?;
        Ok(())
    }

    fn upload_asset(&self, path: &str, bytes: &[u8]) -> Result<String> {
        self.put_file(path, bytes, &format!("Upload {}", path))?;
        Ok(self.raw_url(path))
    }

    fn delete_asset(&self, path: &str) -> Result<()> {
        match self.owned_asset_path(path) {
            Some(repo_path) => self.delete_file(&repo_path, &format!("Delete {}", repo_path)),
            None => {
                debug!("Skipping asset outside {}: {}", self.config.images_dir, path);
                Ok(())
            }
        }
    }

    fn tracks_assets(&self) -> bool {
        true
    }
}

/// Decodes the base64 `content` field; GitHub wraps it at 60 columns.
pub fn decode_content(content: &str) -> Result<Vec<u8>> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| RobopediaError::Store(format!("Invalid base64 content: {}", e)))
}

fn expect_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(text);
    Err(RobopediaError::Remote {
        status: status.as_u16(),
        message,
    })
}
