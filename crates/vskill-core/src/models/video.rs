use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

static YOUTUBE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/)([\w-]+)")
        .expect("youtube id pattern is valid")
});

/// Caller-supplied reference to a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoRef {
    /// Backend video id
    ById(String),
    /// Source URL, deduplicated against the collection before uploading
    ByUrl(String),
}

impl VideoRef {
    /// Build a reference from the optional `video_id` and `url` inputs
    ///
    /// A URL wins over an id when both are given. Blank values count as absent.
    pub fn from_inputs(video_id: Option<&str>, url: Option<&str>) -> Option<Self> {
        match (non_blank(video_id), non_blank(url)) {
            (_, Some(url)) => Some(VideoRef::ByUrl(url.to_string())),
            (Some(id), None) => Some(VideoRef::ById(id.to_string())),
            (None, None) => None,
        }
    }

    /// The id or URL, for messages
    pub fn as_str(&self) -> &str {
        match self {
            VideoRef::ById(id) => id,
            VideoRef::ByUrl(url) => url,
        }
    }
}

/// Treat blank strings as absent
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Extract the short matching token used to recognize an already uploaded URL
///
/// Only YouTube-style URLs yield a token; other URLs skip deduplication.
pub fn source_token(url: &str) -> Option<String> {
    YOUTUBE_ID.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

/// A video as known to the backend
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoHandle {
    /// Stable backend id
    pub id: String,

    /// Human readable name
    #[serde(default)]
    pub display_name: Option<String>,

    /// Length of the video in seconds
    #[serde(default)]
    pub duration_seconds: Option<f64>,

    /// Original source the video was uploaded from
    #[serde(default)]
    pub source: Option<String>,

    /// Playable stream of the full video
    #[serde(default)]
    pub stream_url: Option<String>,
}

impl VideoHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    /// Name and source concatenated, the string URL deduplication scans
    pub fn source_descriptor(&self) -> String {
        format!(
            "{}{}",
            self.display_name.as_deref().unwrap_or_default(),
            self.source.as_deref().unwrap_or_default()
        )
    }

    /// Whether this video was uploaded from a source carrying `token`
    pub fn matches_token(&self, token: &str) -> bool {
        self.source_descriptor().contains(token)
    }
}

/// Where an upload reads its media from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    Url(String),
    File(PathBuf),
}
