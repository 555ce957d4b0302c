use serde::Serialize;
use vskill_core::models::{IndexDescriptor, ResultShot, TranscriptSegment, VideoHandle};

const UNNAMED: &str = "Unnamed";

/// Output for the search skill
#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub success: bool,
    pub query: String,
    pub scope: &'static str,
    pub video_id: Option<String>,
    pub results: Vec<SearchResultItem>,
    pub total_results: usize,
    pub compiled_stream_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub video_id: String,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub score: Option<f64>,
    pub stream_url: Option<String>,
}

impl From<ResultShot> for SearchResultItem {
    fn from(shot: ResultShot) -> Self {
        Self {
            video_id: shot.video_id,
            start: shot.start,
            end: shot.end,
            text: shot.text,
            score: shot.score,
            stream_url: shot.stream_url,
        }
    }
}

/// Output for `scene-index` with `action: "search"`
#[derive(Debug, Serialize)]
pub struct SceneSearchOutput {
    pub success: bool,
    pub action: &'static str,
    pub video_id: Option<String>,
    pub query: String,
    pub results: Vec<SceneResultItem>,
    pub total_results: usize,
    pub compiled_stream_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SceneResultItem {
    pub start: f64,
    pub end: f64,
    pub description: String,
    pub score: Option<f64>,
    pub stream_url: Option<String>,
}

impl From<ResultShot> for SceneResultItem {
    fn from(shot: ResultShot) -> Self {
        Self {
            start: shot.start,
            end: shot.end,
            description: shot.text,
            score: shot.score,
            stream_url: shot.stream_url,
        }
    }
}

/// Output for `scene-index` with `action: "create"`
#[derive(Debug, Serialize)]
pub struct SceneCreateOutput {
    pub success: bool,
    pub action: &'static str,
    pub video_id: String,
    pub index_id: Option<String>,
    pub message: &'static str,
    pub config: SceneConfigOutput,
}

#[derive(Debug, Serialize)]
pub struct SceneConfigOutput {
    pub extraction_type: &'static str,
    pub time_interval: Option<u32>,
    pub frame_count: u32,
    pub prompt: String,
}

/// Output for `scene-index` with `action: "list"`
#[derive(Debug, Serialize)]
pub struct SceneListOutput {
    pub success: bool,
    pub action: &'static str,
    pub video_id: String,
    pub indexes: Vec<SceneIndexItem>,
}

#[derive(Debug, Serialize)]
pub struct SceneIndexItem {
    pub id: Option<String>,
    pub status: String,
    pub created: Option<String>,
}

impl From<IndexDescriptor> for SceneIndexItem {
    fn from(index: IndexDescriptor) -> Self {
        Self {
            id: index.id,
            status: index.status,
            created: index.created_at,
        }
    }
}

/// Output for the transcript skill
#[derive(Debug, Serialize)]
pub struct TranscriptOutput {
    pub success: bool,
    pub video_id: String,
    pub video_name: String,
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Vec<TranscriptSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
}

/// A video as shown by the upload skill
#[derive(Debug, Serialize)]
pub struct VideoItem {
    pub id: String,
    pub name: String,
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
}

impl VideoItem {
    pub fn summary(video: VideoHandle) -> Self {
        Self {
            name: video.display_name.unwrap_or_else(|| UNNAMED.to_string()),
            id: video.id,
            duration: video.duration_seconds,
            stream_url: None,
        }
    }

    pub fn detailed(video: VideoHandle) -> Self {
        let stream_url = video.stream_url.clone();
        Self {
            stream_url,
            ..Self::summary(video)
        }
    }
}

/// Output for `upload` with `action: "upload"` or `"info"`
#[derive(Debug, Serialize)]
pub struct VideoOutput {
    pub success: bool,
    pub action: &'static str,
    pub video: VideoItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Output for `upload` with `action: "list"`
#[derive(Debug, Serialize)]
pub struct VideoListOutput {
    pub success: bool,
    pub action: &'static str,
    pub videos: Vec<VideoItem>,
    pub total: usize,
}
