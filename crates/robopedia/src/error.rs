use thiserror::Error;

#[derive(Error, Debug)]
pub enum RobopediaError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("A {kind} with slug '{slug}' already exists")]
    DuplicateSlug { kind: &'static str, slug: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote store returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Not authenticated with the remote store")]
    Unauthenticated,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),
}

impl RobopediaError {
    /// True for failures caused by the caller's input rather than by storage.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            RobopediaError::Validation(_) | RobopediaError::DuplicateSlug { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RobopediaError>;
