//! Scene-index command implementation

use super::{non_blank, parse_input, to_document, SkillContext, SkillOutcome};
use crate::errors::{ErrorCode, Failure, Skill};
use crate::output_types::{
    SceneConfigOutput, SceneCreateOutput, SceneIndexItem, SceneListOutput, SceneResultItem,
    SceneSearchOutput,
};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use vskill_core::error::{Result, SkillError};
use vskill_core::models::{
    IndexKind, SceneExtraction, SceneIndexParams, SearchRequest, SearchScope, VideoRef,
    DEFAULT_SCENE_PROMPT,
};
use vskill_core::ports::{RetryPolicy, Sleeper, ThreadSleeper, VideoBackend};
use vskill_retrieval::{SceneIndexer, SearchOrchestrator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneAction {
    Create,
    Search,
    List,
}

impl FromStr for SceneAction {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(SceneAction::Create),
            "search" => Ok(SceneAction::Search),
            "list" => Ok(SceneAction::List),
            _ => Err(SkillError::InvalidValue {
                field: "action",
                value: s.to_string(),
                expected: "'create', 'search', or 'list'",
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SceneIndexInput {
    pub video_id: Option<String>,
    pub url: Option<String>,
    pub action: Option<String>,
    pub query: Option<String>,
    pub prompt: Option<String>,
    pub extraction_type: Option<String>,
    pub time_interval: Option<u32>,
    pub frame_count: Option<u32>,
    pub index_id: Option<String>,
}

/// A checked scene-index invocation
#[derive(Debug, Clone, PartialEq)]
pub enum SceneTask {
    Create { video: VideoRef, params: SceneIndexParams },
    List { video: VideoRef },
    Search {
        request: SearchRequest,
        recovery: SceneIndexParams,
    },
}

impl SceneIndexInput {
    pub fn validate(self) -> std::result::Result<SceneTask, Failure> {
        let action: SceneAction = self
            .action
            .as_deref()
            .unwrap_or("search")
            .parse()
            .map_err(|e| Failure::from_skill(e, Skill::SceneIndex))?;

        let query = non_blank(self.query.as_deref()).map(str::to_string);
        if action == SceneAction::Search && query.is_none() {
            return Err(Failure::new(ErrorCode::MissingQuery, "query is required for search action"));
        }

        let video = VideoRef::from_inputs(self.video_id.as_deref(), self.url.as_deref())
            .ok_or_else(|| Failure::new(ErrorCode::MissingVideoId, "video_id or url is required"))?;

        let time_interval = self.time_interval.unwrap_or(5);
        let frame_count = self.frame_count.unwrap_or(3);
        let prompt = non_blank(self.prompt.as_deref()).unwrap_or(DEFAULT_SCENE_PROMPT).to_string();

        match action {
            SceneAction::Create => {
                let extraction = SceneExtraction::parse(
                    self.extraction_type.as_deref().unwrap_or("time_based"),
                    time_interval,
                    frame_count,
                )
                .map_err(|e| Failure::from_skill(e, Skill::SceneIndex))?;
                Ok(SceneTask::Create {
                    video,
                    params: SceneIndexParams { extraction, prompt },
                })
            }
            SceneAction::List => Ok(SceneTask::List { video }),
            SceneAction::Search => {
                let request = SearchRequest::new(query.unwrap_or_default(), SearchScope::Video(video))
                    .with_index_kind(IndexKind::Scene)
                    .with_scene_index(non_blank(self.index_id.as_deref()).map(str::to_string));
                // Recovery always builds a time-based index
                let recovery = SceneIndexParams {
                    extraction: SceneExtraction::TimeBased { time_interval, frame_count },
                    prompt,
                };
                Ok(SceneTask::Search { request, recovery })
            }
        }
    }
}

pub fn execute(input: Value, ctx: &SkillContext) -> SkillOutcome {
    let task = parse_input::<SceneIndexInput>(input)?.validate()?;
    let backend = ctx.connect(Skill::SceneIndex)?;

    let output = run(task, &backend, &ThreadSleeper, ctx.retry_policy())
        .map_err(|e| Failure::from_skill(e, Skill::SceneIndex))?;
    to_document(&output, Skill::SceneIndex)
}

pub fn run<B, S>(task: SceneTask, backend: &B, sleeper: &S, policy: RetryPolicy) -> Result<Value>
where
    B: VideoBackend + ?Sized,
    S: Sleeper + ?Sized,
{
    let document = match task {
        SceneTask::Create { video, params } => {
            let created = SceneIndexer::new(backend).create(&video, params)?;
            let extraction = created.params.extraction;
            serde_json::to_value(SceneCreateOutput {
                success: true,
                action: "create",
                video_id: created.video.id,
                index_id: created.index_id,
                message: "Scene index created successfully",
                config: SceneConfigOutput {
                    extraction_type: extraction.extraction_type(),
                    time_interval: extraction.time_interval(),
                    frame_count: extraction.frame_count(),
                    prompt: created.params.prompt,
                },
            })?
        }
        SceneTask::List { video } => {
            let (video, indexes) = SceneIndexer::new(backend).list(&video)?;
            serde_json::to_value(SceneListOutput {
                success: true,
                action: "list",
                video_id: video.id,
                indexes: indexes.into_iter().map(SceneIndexItem::from).collect(),
            })?
        }
        SceneTask::Search { request, recovery } => {
            let outcome = SearchOrchestrator::new(backend, sleeper, policy)
                .with_scene_params(recovery)
                .search(&request)?;
            let total_results = outcome.total();
            serde_json::to_value(SceneSearchOutput {
                success: true,
                action: "search",
                video_id: outcome.video_id,
                query: request.query,
                results: outcome.shots.into_iter().map(SceneResultItem::from).collect(),
                total_results,
                compiled_stream_url: outcome.compiled_stream_url,
            })?
        }
    };

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use vskill_core::models::VideoHandle;
    use vskill_store::{MemoryBackend, RecordingSleeper};

    fn task(value: Value) -> std::result::Result<SceneTask, Failure> {
        serde_json::from_value::<SceneIndexInput>(value).unwrap().validate()
    }

    #[test]
    fn test_validation_codes() {
        assert_eq!(task(json!({"video_id": "m-1", "action": "delete"})).unwrap_err().code, ErrorCode::InvalidAction);
        assert_eq!(task(json!({"video_id": "m-1"})).unwrap_err().code, ErrorCode::MissingQuery);
        assert_eq!(task(json!({"action": "list"})).unwrap_err().code, ErrorCode::MissingVideoId);
        assert_eq!(
            task(json!({"video_id": "m-1", "action": "create", "extraction_type": "frame"}))
                .unwrap_err()
                .code,
            ErrorCode::InvalidExtractionType
        );
    }

    #[test]
    fn test_create_echoes_config() {
        let backend = MemoryBackend::new().with_video(VideoHandle::new("m-1"));
        let task = task(json!({
            "video_id": "m-1",
            "action": "create",
            "extraction_type": "shot_based",
            "frame_count": 4
        }))
        .unwrap();

        let doc = run(task, &backend, &RecordingSleeper::new(), RetryPolicy::default()).unwrap();
        assert_eq!(doc["success"], true);
        assert_eq!(doc["config"]["extraction_type"], "shot_based");
        assert_eq!(doc["config"]["time_interval"], Value::Null);
        assert_eq!(doc["config"]["frame_count"], 4);
        assert_eq!(doc["config"]["prompt"], DEFAULT_SCENE_PROMPT);
        assert!(doc["index_id"].is_string());
    }

    #[test]
    fn test_list_reports_status_and_created() {
        let backend = MemoryBackend::new()
            .with_video(VideoHandle::new("m-1"))
            .with_ready_index("m-1", IndexKind::Scene);

        let doc = run(
            task(json!({"video_id": "m-1", "action": "list"})).unwrap(),
            &backend,
            &RecordingSleeper::new(),
            RetryPolicy::default(),
        )
        .unwrap();

        assert_eq!(doc["indexes"].as_array().unwrap().len(), 1);
        assert_eq!(doc["indexes"][0]["status"], "done");
        assert!(doc["indexes"][0]["created"].is_string());
    }

    #[test]
    fn test_search_builds_scene_index_on_demand() {
        let backend = MemoryBackend::new()
            .with_video(VideoHandle::new("m-1"))
            .with_shots(
                "m-1",
                IndexKind::Scene,
                vec![json!({"start": 4.04, "end": 9.96, "text": "a red car", "confidence": 0.91})
                    .as_object()
                    .cloned()
                    .unwrap()],
            );
        let sleeper = RecordingSleeper::new();

        let doc = run(
            task(json!({"video_id": "m-1", "query": "car"})).unwrap(),
            &backend,
            &sleeper,
            RetryPolicy::new(30, Duration::from_secs(10)),
        )
        .unwrap();

        assert_eq!(doc["action"], "search");
        assert_eq!(doc["total_results"], 1);
        assert_eq!(doc["results"][0]["description"], "a red car");
        assert_eq!(doc["results"][0]["start"], 4.0);
        assert_eq!(doc["results"][0]["end"], 10.0);
        assert_eq!(backend.calls().create_index, 1);
        assert_eq!(sleeper.sleeps().len(), 1);
    }
}
