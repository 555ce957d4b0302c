use crate::format::ResultFormatter;
use crate::poller::IndexReadinessPoller;
use crate::resolver::VideoResolver;
use vskill_core::error::Result;
use vskill_core::models::{
    IndexCreateParams, IndexKind, RawShot, SceneIndexParams, SearchOutcome, SearchParams,
    SearchRequest, SearchScope,
};
use vskill_core::ports::{RetryPolicy, Sleeper, VideoBackend};

/// Outcome of the first search attempt on a video
enum FirstAttempt {
    Done(Vec<RawShot>),
    Recover,
}

/// Runs a search, building the missing index and retrying once when needed
///
/// A request makes at most two backend search calls. Collection searches
/// have no single video to index and never recover.
pub struct SearchOrchestrator<'a, B: VideoBackend + ?Sized, S: Sleeper + ?Sized> {
    backend: &'a B,
    poller: IndexReadinessPoller<'a, B, S>,
    formatter: ResultFormatter,
    scene_params: SceneIndexParams,
}

impl<'a, B: VideoBackend + ?Sized, S: Sleeper + ?Sized> SearchOrchestrator<'a, B, S> {
    pub fn new(backend: &'a B, sleeper: &'a S, policy: RetryPolicy) -> Self {
        Self {
            backend,
            poller: IndexReadinessPoller::new(backend, sleeper, policy),
            formatter: ResultFormatter::new(),
            scene_params: SceneIndexParams::default(),
        }
    }

    /// Settings used when a scene search has to build its index
    pub fn with_scene_params(mut self, params: SceneIndexParams) -> Self {
        self.scene_params = params;
        self
    }

    pub fn search(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        let params = request.params();

        let (video_id, raw) = match &request.scope {
            SearchScope::Collection => (None, self.backend.search_collection(&params)?),
            SearchScope::Video(video_ref) => {
                let video = VideoResolver::new(self.backend).resolve(video_ref)?;
                let raw = self.search_video(&video.id, &params)?;
                (Some(video.id), raw)
            }
        };

        let formatted = self.formatter.format(&raw, video_id.as_deref());
        let compiled_stream_url = if formatted.ranges.is_empty() {
            None
        } else {
            Some(self.backend.compile_shots(&formatted.ranges)?)
        };

        tracing::debug!(
            scope = request.scope.as_str(),
            results = formatted.shots.len(),
            "Search complete"
        );

        Ok(SearchOutcome {
            video_id,
            shots: formatted.shots,
            compiled_stream_url,
        })
    }

    fn search_video(&self, video_id: &str, params: &SearchParams) -> Result<Vec<RawShot>> {
        match self.first_attempt(video_id, params)? {
            FirstAttempt::Done(shots) => Ok(shots),
            FirstAttempt::Recover => {
                let created = self.poller.ensure_ready(video_id, &self.create_params(params.index_kind))?;

                // A pinned index id cannot name the index just built
                if created && params.scene_index_id.is_some() {
                    let retry = SearchParams { scene_index_id: None, ..params.clone() };
                    return self.backend.search_video(video_id, &retry);
                }

                // Final attempt; an empty result is a valid answer here
                self.backend.search_video(video_id, params)
            }
        }
    }

    fn first_attempt(&self, video_id: &str, params: &SearchParams) -> Result<FirstAttempt> {
        match self.backend.search_video(video_id, params) {
            Ok(shots) if !shots.is_empty() => Ok(FirstAttempt::Done(shots)),
            Ok(_) => {
                tracing::info!(%video_id, kind = %params.index_kind, "No results, checking index");
                Ok(FirstAttempt::Recover)
            }
            Err(e) if e.needs_index() => {
                tracing::info!(%video_id, kind = %params.index_kind, "Video not indexed: {}", e);
                Ok(FirstAttempt::Recover)
            }
            Err(e) => Err(e),
        }
    }

    fn create_params(&self, kind: IndexKind) -> IndexCreateParams {
        match kind {
            IndexKind::SpokenWord => IndexCreateParams::SpokenWord,
            IndexKind::Scene => IndexCreateParams::Scene(self.scene_params.clone()),
        }
    }
}
