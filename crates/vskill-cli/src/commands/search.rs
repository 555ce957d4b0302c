//! Search command implementation

use super::{non_blank, parse_input, to_document, SkillContext, SkillOutcome};
use crate::errors::{ErrorCode, Failure, Skill};
use crate::output_types::{SearchOutput, SearchResultItem};
use serde::Deserialize;
use serde_json::Value;
use vskill_core::error::{Result, SkillError};
use vskill_core::models::{IndexKind, SearchRequest, SearchScope, SearchType, VideoRef};
use vskill_core::ports::{RetryPolicy, Sleeper, ThreadSleeper, VideoBackend};
use vskill_retrieval::SearchOrchestrator;

const DEFAULT_RESULT_THRESHOLD: usize = 5;
const DEFAULT_SCORE_THRESHOLD: f64 = 0.2;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchInput {
    pub query: Option<String>,
    pub video_id: Option<String>,
    pub url: Option<String>,
    pub scope: Option<String>,
    pub search_type: Option<String>,
    pub index_type: Option<String>,
    pub result_threshold: Option<usize>,
    pub score_threshold: Option<f64>,
}

impl SearchInput {
    /// Check the input and build the request, before any backend call
    pub fn validate(self) -> std::result::Result<SearchRequest, Failure> {
        let query = non_blank(self.query.as_deref())
            .ok_or_else(|| Failure::new(ErrorCode::MissingQuery, "query is required"))?
            .to_string();

        let scope = if self.scope.as_deref() == Some("collection") {
            SearchScope::Collection
        } else {
            let video = VideoRef::from_inputs(self.video_id.as_deref(), self.url.as_deref()).ok_or_else(|| {
                Failure::new(ErrorCode::MissingVideoId, "video_id or url required when scope is 'video'")
            })?;
            SearchScope::Video(video)
        };

        let search_type: SearchType = self
            .search_type
            .as_deref()
            .unwrap_or("semantic")
            .parse()
            .map_err(|e| Failure::from_skill(e, Skill::Search))?;
        let index_kind: IndexKind = self
            .index_type
            .as_deref()
            .unwrap_or("spoken_word")
            .parse()
            .map_err(|e| Failure::from_skill(e, Skill::Search))?;

        let score_threshold = self.score_threshold.unwrap_or(DEFAULT_SCORE_THRESHOLD);
        if !(0.0..=1.0).contains(&score_threshold) {
            let err = SkillError::InvalidValue {
                field: "score_threshold",
                value: score_threshold.to_string(),
                expected: "a number between 0 and 1",
            };
            return Err(Failure::from_skill(err, Skill::Search));
        }

        Ok(SearchRequest::new(query, scope)
            .with_search_type(search_type)
            .with_index_kind(index_kind)
            .with_result_threshold(self.result_threshold.unwrap_or(DEFAULT_RESULT_THRESHOLD))
            .with_score_threshold(score_threshold))
    }
}

pub fn execute(input: Value, ctx: &SkillContext) -> SkillOutcome {
    let request = parse_input::<SearchInput>(input)?.validate()?;
    let backend = ctx.connect(Skill::Search)?;

    let output = run(&request, &backend, &ThreadSleeper, ctx.retry_policy())
        .map_err(|e| Failure::from_skill(e, Skill::Search))?;
    to_document(&output, Skill::Search)
}

pub fn run<B, S>(request: &SearchRequest, backend: &B, sleeper: &S, policy: RetryPolicy) -> Result<SearchOutput>
where
    B: VideoBackend + ?Sized,
    S: Sleeper + ?Sized,
{
    let outcome = SearchOrchestrator::new(backend, sleeper, policy).search(request)?;

    let total_results = outcome.total();
    Ok(SearchOutput {
        success: true,
        query: request.query.clone(),
        scope: request.scope.as_str(),
        video_id: outcome.video_id,
        results: outcome.shots.into_iter().map(SearchResultItem::from).collect(),
        total_results,
        compiled_stream_url: outcome.compiled_stream_url,
    })
}
