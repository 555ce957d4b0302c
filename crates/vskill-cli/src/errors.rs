use serde::Serialize;
use std::fmt;
use vskill_core::config::API_KEY_VAR;
use vskill_core::error::{BackendErrorKind, SkillError};
use vskill_core::models::IndexKind;

/// Stable error codes reported in the `error` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingDependency,
    MissingApiKey,

    // Input validation
    InvalidJson,
    NoInput,
    MissingVideoId,
    MissingQuery,
    MissingSource,
    InvalidAction,
    InvalidFormat,
    InvalidSearchType,
    InvalidIndexType,
    InvalidExtractionType,
    FileNotFound,

    VideoNotFound,

    // Recoverable states
    NotIndexed,
    Processing,
    IndexingTimeout,
    NoTranscript,

    // Catch-alls per skill
    SearchError,
    SceneIndexError,
    UploadError,
    TranscriptError,
}

/// The skill a failure is reported for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skill {
    Search,
    SceneIndex,
    Transcript,
    Upload,
}

impl Skill {
    pub fn generic_code(self) -> ErrorCode {
        match self {
            Skill::Search => ErrorCode::SearchError,
            Skill::SceneIndex => ErrorCode::SceneIndexError,
            Skill::Transcript => ErrorCode::TranscriptError,
            Skill::Upload => ErrorCode::UploadError,
        }
    }

    /// Sample input shown when none was given
    pub fn example(self) -> &'static str {
        match self {
            Skill::Search => r#"{"url": "https://youtu.be/xxx", "query": "search term"}"#,
            Skill::SceneIndex => r#"{"video_id": "m-xxx", "action": "search", "query": "person walking"}"#,
            Skill::Transcript => r#"{"video_id": "m-xxx", "format": "both"}"#,
            Skill::Upload => r#"{"url": "https://youtu.be/xxx", "name": "My video"}"#,
        }
    }
}

/// A failed skill invocation, rendered as `{success: false, error, message}`
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub code: ErrorCode,
    pub message: String,
    pub example: Option<&'static str>,
}

impl Failure {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            example: None,
        }
    }

    pub fn with_example(mut self, example: &'static str) -> Self {
        self.example = Some(example);
        self
    }

    /// Map a core error to the code this skill reports for it
    pub fn from_skill(err: SkillError, skill: Skill) -> Self {
        match err {
            SkillError::VideoNotFound { ref id } => {
                Failure::new(ErrorCode::VideoNotFound, format!("Video '{}' not found", id))
            }
            SkillError::IndexingTimeout { kind, .. } => {
                let what = match kind {
                    IndexKind::Scene => "Scene indexing",
                    IndexKind::SpokenWord => "Indexing",
                };
                Failure::new(
                    ErrorCode::IndexingTimeout,
                    format!("{} is taking longer than expected. Try again later.", what),
                )
            }
            SkillError::Backend { kind, message } => Self::from_backend(kind, message, skill),
            SkillError::ClientUnavailable { reason } => Failure::new(ErrorCode::MissingDependency, reason),
            SkillError::ConfigMissing { ref key } if key == API_KEY_VAR => Failure::new(
                ErrorCode::MissingApiKey,
                format!("Set {} environment variable", API_KEY_VAR),
            ),
            SkillError::InvalidValue { field, .. } => {
                let code = match field {
                    "search_type" => ErrorCode::InvalidSearchType,
                    "index_type" => ErrorCode::InvalidIndexType,
                    "extraction_type" => ErrorCode::InvalidExtractionType,
                    "format" => ErrorCode::InvalidFormat,
                    "action" => ErrorCode::InvalidAction,
                    _ => skill.generic_code(),
                };
                Failure::new(code, err.to_string())
            }
            SkillError::FileNotFound { .. } => Failure::new(ErrorCode::FileNotFound, err.to_string()),
            other => Failure::new(skill.generic_code(), other.to_string()),
        }
    }

    fn from_backend(kind: BackendErrorKind, message: String, skill: Skill) -> Self {
        match (skill, kind) {
            (Skill::Search, BackendErrorKind::NotIndexed) => Failure::new(
                ErrorCode::NotIndexed,
                "Video not indexed. Index its spoken words before searching.",
            ),
            (Skill::SceneIndex, BackendErrorKind::NotIndexed) => Failure::new(
                ErrorCode::NotIndexed,
                "No scene index found. Create one first with action='create'.",
            ),
            (Skill::Transcript, BackendErrorKind::TranscriptMissing | BackendErrorKind::NotFound) => {
                Failure::new(
                    ErrorCode::NoTranscript,
                    "No transcript available. Video may still be processing.",
                )
            }
            (Skill::Transcript, BackendErrorKind::Processing) => Failure::new(
                ErrorCode::Processing,
                "Transcript is being generated. Try again in a few minutes.",
            ),
            (_, BackendErrorKind::Processing) => Failure::new(ErrorCode::Processing, message),
            _ => Failure::new(skill.generic_code(), message),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_codes_serialize_screaming_snake() {
        let json = serde_json::to_value(ErrorCode::InvalidExtractionType).unwrap();
        assert_eq!(json, "INVALID_EXTRACTION_TYPE");
        assert_eq!(serde_json::to_value(ErrorCode::NoInput).unwrap(), "NO_INPUT");
    }

    #[test]
    fn test_backend_kinds_map_per_skill() {
        let not_indexed = || SkillError::backend("Video is not indexed");

        assert_eq!(Failure::from_skill(not_indexed(), Skill::Search).code, ErrorCode::NotIndexed);
        assert_eq!(Failure::from_skill(not_indexed(), Skill::SceneIndex).code, ErrorCode::NotIndexed);
        assert_eq!(Failure::from_skill(not_indexed(), Skill::Upload).code, ErrorCode::UploadError);

        let missing = SkillError::backend("Transcript does not exist");
        assert_eq!(Failure::from_skill(missing, Skill::Transcript).code, ErrorCode::NoTranscript);

        let processing = SkillError::backend("Still processing");
        assert_eq!(Failure::from_skill(processing, Skill::Transcript).code, ErrorCode::Processing);
    }

    #[test]
    fn test_generic_code_keeps_raw_message() {
        let failure = Failure::from_skill(SkillError::backend("Quota exceeded"), Skill::SceneIndex);
        assert_eq!(failure.code, ErrorCode::SceneIndexError);
        assert_eq!(failure.message, "Quota exceeded");
    }

    #[test]
    fn test_input_errors() {
        let err = SkillError::InvalidValue {
            field: "extraction_type",
            value: "frame".into(),
            expected: "'time_based' or 'shot_based'",
        };
        assert_eq!(Failure::from_skill(err, Skill::SceneIndex).code, ErrorCode::InvalidExtractionType);

        let err = SkillError::FileNotFound { path: PathBuf::from("/nope.mp4") };
        let failure = Failure::from_skill(err, Skill::Upload);
        assert_eq!(failure.code, ErrorCode::FileNotFound);
        assert!(failure.message.contains("/nope.mp4"));

        let err = SkillError::ConfigMissing { key: API_KEY_VAR.to_string() };
        assert_eq!(Failure::from_skill(err, Skill::Search).code, ErrorCode::MissingApiKey);
    }
}
