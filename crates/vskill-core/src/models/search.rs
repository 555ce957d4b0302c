use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{IndexKind, VideoRef};
use crate::error::SkillError;

/// A backend search hit before normalization
///
/// Kept untyped because the shot schema differs between index kinds.
pub type RawShot = serde_json::Map<String, serde_json::Value>;

/// Search strategy requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Semantic,
    Keyword,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Semantic => "semantic",
            SearchType::Keyword => "keyword",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "semantic" => Ok(SearchType::Semantic),
            "keyword" => Ok(SearchType::Keyword),
            _ => Err(SkillError::InvalidValue {
                field: "search_type",
                value: s.to_string(),
                expected: "'semantic' or 'keyword'",
            }),
        }
    }
}

/// What a search runs against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    Video(VideoRef),
    Collection,
}

impl SearchScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchScope::Video(_) => "video",
            SearchScope::Collection => "collection",
        }
    }
}

/// A search as requested by a skill caller
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub scope: SearchScope,
    pub search_type: SearchType,
    pub index_kind: IndexKind,

    /// Maximum number of shots; backend default when absent
    pub result_threshold: Option<usize>,

    /// Minimum relevance in [0, 1]; backend default when absent
    pub score_threshold: Option<f64>,

    /// Restrict a scene search to one scene index
    pub scene_index_id: Option<String>,
}

impl SearchRequest {
    /// Create a semantic spoken-word search with backend-default thresholds
    pub fn new(query: impl Into<String>, scope: SearchScope) -> Self {
        Self {
            query: query.into(),
            scope,
            search_type: SearchType::Semantic,
            index_kind: IndexKind::SpokenWord,
            result_threshold: None,
            score_threshold: None,
            scene_index_id: None,
        }
    }

    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    pub fn with_index_kind(mut self, kind: IndexKind) -> Self {
        self.index_kind = kind;
        self
    }

    pub fn with_result_threshold(mut self, threshold: usize) -> Self {
        self.result_threshold = Some(threshold);
        self
    }

    pub fn with_score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    pub fn with_scene_index(mut self, index_id: Option<String>) -> Self {
        self.scene_index_id = index_id;
        self
    }

    /// The backend-facing parameters of this request
    pub fn params(&self) -> SearchParams {
        SearchParams {
            query: self.query.clone(),
            search_type: self.search_type,
            index_kind: self.index_kind,
            result_threshold: self.result_threshold,
            score_threshold: self.score_threshold,
            scene_index_id: self.scene_index_id.clone(),
        }
    }
}

/// Parameters of one backend search call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchParams {
    pub query: String,
    pub search_type: SearchType,
    #[serde(rename = "index_type")]
    pub index_kind: IndexKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_threshold: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f64>,
    #[serde(rename = "index_id", skip_serializing_if = "Option::is_none")]
    pub scene_index_id: Option<String>,
}

/// Unrounded time range of a shot, the input to stream compilation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotRange {
    pub video_id: String,
    pub start: f64,
    pub end: f64,
}

/// A normalized search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultShot {
    pub video_id: String,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub score: Option<f64>,
    pub stream_url: Option<String>,
}

/// Result of an orchestrated search
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchOutcome {
    /// The resolved video, absent for collection searches
    pub video_id: Option<String>,

    /// Shots in backend rank order
    pub shots: Vec<ResultShot>,

    /// Stream stitching all shots together, only for non-empty results
    pub compiled_stream_url: Option<String>,
}

impl SearchOutcome {
    pub fn total(&self) -> usize {
        self.shots.len()
    }
}
