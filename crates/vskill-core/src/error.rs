//! Error types for the video skills

use std::path::PathBuf;
use thiserror::Error;

use crate::models::IndexKind;

/// Phrases in backend error text that mean the video lacks the requested index
const NEEDS_INDEX_PHRASES: &[&str] = &["not indexed", "no scene", "no results"];

const ALREADY_INDEXED_PHRASES: &[&str] = &["already"];

/// Only these phrases make the transcript skill generate a transcript
const TRANSCRIPT_MISSING_PHRASES: &[&str] = &["does not exist", "generate transcript"];

const PROCESSING_PHRASES: &[&str] = &["processing"];

const NOT_FOUND_PHRASES: &[&str] = &["not found", "no transcript"];

/// Classified reason behind a backend failure
///
/// The backend only reports free-text messages, so the kind is derived once
/// when the failure enters the core and carried alongside the raw message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// The video has no usable index of the requested kind
    NotIndexed,
    /// An index creation raced with an existing index
    AlreadyIndexed,
    /// The backend is still working on the resource
    Processing,
    /// No transcript has been generated for the video yet
    TranscriptMissing,
    /// The addressed resource does not exist
    NotFound,
    /// Anything the phrase table does not recognize
    Other,
}

impl BackendErrorKind {
    /// Classify a backend error message by case-insensitive phrase matching
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        let matches = |phrases: &[&str]| phrases.iter().any(|p| lower.contains(p));

        if matches(NEEDS_INDEX_PHRASES) {
            BackendErrorKind::NotIndexed
        } else if matches(ALREADY_INDEXED_PHRASES) {
            BackendErrorKind::AlreadyIndexed
        } else if matches(TRANSCRIPT_MISSING_PHRASES) {
            BackendErrorKind::TranscriptMissing
        } else if matches(PROCESSING_PHRASES) {
            BackendErrorKind::Processing
        } else if matches(NOT_FOUND_PHRASES) {
            BackendErrorKind::NotFound
        } else {
            BackendErrorKind::Other
        }
    }

    /// Whether a search failing with this kind may succeed once an index exists
    pub fn needs_index(self) -> bool {
        matches!(self, BackendErrorKind::NotIndexed)
    }
}

#[derive(Debug, Error)]
pub enum SkillError {
    // Resolution errors
    #[error("Video '{id}' not found")]
    VideoNotFound { id: String },

    // Indexing errors
    #[error("{kind} indexing of video '{video_id}' not ready after {attempts} checks")]
    IndexingTimeout {
        video_id: String,
        kind: IndexKind,
        attempts: u32,
    },

    // Backend errors
    #[error("{message}")]
    Backend {
        kind: BackendErrorKind,
        message: String,
    },

    #[error("Backend client unavailable: {reason}")]
    ClientUnavailable { reason: String },

    // Input errors
    #[error("Invalid {field} '{value}': expected {expected}")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SkillError {
    /// Wrap a raw backend message, classifying it on the way in
    pub fn backend(message: impl Into<String>) -> Self {
        let message = message.into();
        SkillError::Backend {
            kind: BackendErrorKind::classify(&message),
            message,
        }
    }

    /// The classified backend kind, if this error came from the backend
    pub fn backend_kind(&self) -> Option<BackendErrorKind> {
        match self {
            SkillError::Backend { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether this error signals that the requested index is missing
    pub fn needs_index(&self) -> bool {
        self.backend_kind().is_some_and(BackendErrorKind::needs_index)
    }
}

impl From<serde_json::Error> for SkillError {
    fn from(err: serde_json::Error) -> Self {
        SkillError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SkillError>;
