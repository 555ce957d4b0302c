//! Upload command implementation

use super::{non_blank, parse_input, SkillContext, SkillOutcome};
use crate::errors::{ErrorCode, Failure, Skill};
use crate::output_types::{VideoItem, VideoListOutput, VideoOutput};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::str::FromStr;
use vskill_core::error::{Result, SkillError};
use vskill_core::models::UploadSource;
use vskill_core::ports::VideoBackend;

const UPLOADED_MESSAGE: &str = "Video uploaded successfully. Use this video_id to test other skills.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadAction {
    Upload,
    List,
    Info,
}

impl FromStr for UploadAction {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "upload" => Ok(UploadAction::Upload),
            "list" => Ok(UploadAction::List),
            "info" => Ok(UploadAction::Info),
            _ => Err(SkillError::InvalidValue {
                field: "action",
                value: s.to_string(),
                expected: "'upload', 'list', or 'info'",
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UploadInput {
    pub action: Option<String>,
    pub url: Option<String>,
    pub file: Option<PathBuf>,
    pub name: Option<String>,
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadTask {
    Upload { source: UploadSource, name: Option<String> },
    List,
    Info { video_id: String },
}

impl UploadInput {
    pub fn validate(self) -> std::result::Result<UploadTask, Failure> {
        let action: UploadAction = self
            .action
            .as_deref()
            .unwrap_or("upload")
            .parse()
            .map_err(|e| Failure::from_skill(e, Skill::Upload))?;

        match action {
            UploadAction::List => Ok(UploadTask::List),
            UploadAction::Info => {
                let video_id = non_blank(self.video_id.as_deref()).ok_or_else(|| {
                    Failure::new(ErrorCode::MissingVideoId, "video_id required for info action")
                })?;
                Ok(UploadTask::Info { video_id: video_id.to_string() })
            }
            UploadAction::Upload => {
                let name = non_blank(self.name.as_deref()).map(str::to_string);
                let source = match (non_blank(self.url.as_deref()), self.file) {
                    (Some(url), _) => UploadSource::Url(url.to_string()),
                    (None, Some(file)) if !file.as_os_str().is_empty() => {
                        if !file.is_file() {
                            return Err(Failure::from_skill(
                                SkillError::FileNotFound { path: file },
                                Skill::Upload,
                            ));
                        }
                        UploadSource::File(file)
                    }
                    _ => {
                        return Err(Failure::new(ErrorCode::MissingSource, "Provide 'url' or 'file' to upload"))
                    }
                };
                Ok(UploadTask::Upload { source, name })
            }
        }
    }
}

pub fn execute(input: Value, ctx: &SkillContext) -> SkillOutcome {
    let task = parse_input::<UploadInput>(input)?.validate()?;
    let backend = ctx.connect(Skill::Upload)?;

    let document = run(task, &backend).map_err(|e| Failure::from_skill(e, Skill::Upload))?;
    Ok(document)
}

pub fn run<B: VideoBackend + ?Sized>(task: UploadTask, backend: &B) -> Result<Value> {
    let document = match task {
        UploadTask::Upload { source, name } => {
            let video = backend.upload(&source, name.as_deref())?;
            tracing::info!(video_id = %video.id, "Uploaded video");
            serde_json::to_value(VideoOutput {
                success: true,
                action: "upload",
                video: VideoItem::summary(video),
                message: Some(UPLOADED_MESSAGE),
            })?
        }
        UploadTask::List => {
            let videos: Vec<VideoItem> = backend.list_videos()?.into_iter().map(VideoItem::summary).collect();
            serde_json::to_value(VideoListOutput {
                success: true,
                action: "list",
                total: videos.len(),
                videos,
            })?
        }
        UploadTask::Info { video_id } => {
            let video = backend
                .get_video(&video_id)?
                .ok_or(SkillError::VideoNotFound { id: video_id })?;
            serde_json::to_value(VideoOutput {
                success: true,
                action: "info",
                video: VideoItem::detailed(video),
                message: None,
            })?
        }
    };

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vskill_core::models::VideoHandle;
    use vskill_store::MemoryBackend;

    fn task(value: Value) -> std::result::Result<UploadTask, Failure> {
        serde_json::from_value::<UploadInput>(value).unwrap().validate()
    }

    #[test]
    fn test_validation_codes() {
        assert_eq!(task(json!({})).unwrap_err().code, ErrorCode::MissingSource);
        assert_eq!(task(json!({"action": "info"})).unwrap_err().code, ErrorCode::MissingVideoId);
        assert_eq!(task(json!({"action": "delete"})).unwrap_err().code, ErrorCode::InvalidAction);
        assert_eq!(
            task(json!({"file": "/definitely/not/here.mp4"})).unwrap_err().code,
            ErrorCode::FileNotFound
        );
    }

    #[test]
    fn test_upload_local_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"fake video").unwrap();

        let backend = MemoryBackend::new();
        let doc = run(task(json!({"file": path})).unwrap(), &backend).unwrap();

        assert_eq!(doc["action"], "upload");
        assert_eq!(doc["video"]["name"], "clip.mp4");
        assert_eq!(doc["message"], UPLOADED_MESSAGE);
        assert!(doc["video"].get("stream_url").is_none());
    }

    #[test]
    fn test_list_and_info() {
        let backend = MemoryBackend::new()
            .with_video(VideoHandle::new("m-1").with_name("Demo").with_duration(12.5))
            .with_video(VideoHandle::new("m-2"));

        let list = run(UploadTask::List, &backend).unwrap();
        assert_eq!(list["total"], 2);
        assert_eq!(list["videos"][1]["name"], "Unnamed");
        assert_eq!(list["videos"][0]["duration"], 12.5);

        let info = run(UploadTask::Info { video_id: "m-1".into() }, &backend).unwrap();
        assert_eq!(info["video"]["name"], "Demo");

        let err = run(UploadTask::Info { video_id: "m-9".into() }, &backend).unwrap_err();
        assert_eq!(Failure::from_skill(err, Skill::Upload).code, ErrorCode::VideoNotFound);
    }
}
