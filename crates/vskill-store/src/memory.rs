//! In-memory backend implementation for development and testing.
//!
//! These implementations use `RwLock::unwrap()` intentionally. Lock poisoning
//! only occurs when another thread panicked while holding the lock, which is
//! an unrecoverable state.

use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use vskill_core::error::{Result, SkillError};
use vskill_core::models::{
    IndexCreateParams, IndexDescriptor, IndexKind, RawShot, SearchParams, ShotRange,
    TranscriptSegment, UploadSource, VideoHandle,
};
use vskill_core::ports::{Sleeper, VideoBackend};

const NOT_INDEXED: &str = "Video is not indexed for this index type";
const COLLECTION_NOT_INDEXED: &str = "Collection is not indexed for this index type";
const INDEX_EXISTS: &str = "Index already exists for this video";
const TRANSCRIPT_MISSING: &str = "Transcript does not exist for this video, generate transcript first";
const TRANSCRIPT_PROCESSING: &str = "Transcript generation is processing";
const TRANSCRIPT_UNAVAILABLE: &str = "No transcript available for this video";

/// Number of calls made to each backend operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallLog {
    pub list_videos: u32,
    pub get_video: u32,
    pub upload: u32,
    pub search: u32,
    pub compile: u32,
    pub list_indexes: u32,
    pub create_index: u32,
    pub get_transcript: u32,
    pub generate_transcript: u32,
}

/// An index known to the memory backend
#[derive(Debug, Clone)]
struct IndexState {
    id: String,
    /// Status checks still needed before the index reports ready, `None` for never
    checks_left: Option<u32>,
    created_at: String,
}

impl IndexState {
    fn status(&self) -> &'static str {
        match self.checks_left {
            Some(0) => "done",
            _ => "processing",
        }
    }

    fn is_ready(&self) -> bool {
        self.checks_left == Some(0)
    }
}

#[derive(Debug, Clone)]
enum TranscriptState {
    Ready(Vec<TranscriptSegment>),
    /// Produced once generation is requested
    Missing(Vec<TranscriptSegment>),
    Processing,
    /// Refused without any hint that generation would help
    Unavailable,
}

#[derive(Debug, Default)]
struct State {
    videos: Vec<VideoHandle>,
    shots: HashMap<(String, IndexKind), Vec<RawShot>>,
    indexes: HashMap<(String, IndexKind), IndexState>,
    transcripts: HashMap<String, TranscriptState>,

    /// Status checks a freshly created index needs before it is ready
    index_delay: Option<u32>,
    status_failures: u32,
    search_failures: VecDeque<String>,
    create_failure: Option<String>,
    reject_duplicate_index: bool,

    compiled: Vec<Vec<ShotRange>>,
    calls: CallLog,
    next_id: u64,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

/// In-memory implementation of VideoBackend
///
/// Searches succeed only against ready indexes. Indexes created through the
/// port become ready after a configurable number of status checks.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    state: Arc<RwLock<State>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty backend whose new indexes are ready on the first check
    pub fn new() -> Self {
        let state = State {
            index_delay: Some(0),
            ..State::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn with_video(self, video: VideoHandle) -> Self {
        self.state.write().unwrap().videos.push(video);
        self
    }

    /// Content returned by searches against `kind` on a video, once indexed
    pub fn with_shots(self, video_id: &str, kind: IndexKind, shots: Vec<RawShot>) -> Self {
        let shots = shots
            .into_iter()
            .map(|mut shot| {
                shot.entry("video_id").or_insert_with(|| Value::String(video_id.to_string()));
                shot
            })
            .collect();
        self.state
            .write()
            .unwrap()
            .shots
            .insert((video_id.to_string(), kind), shots);
        self
    }

    /// Register an index that is already built
    pub fn with_ready_index(self, video_id: &str, kind: IndexKind) -> Self {
        {
            let mut state = self.state.write().unwrap();
            let id = state.next_id("idx");
            state.indexes.insert(
                (video_id.to_string(), kind),
                IndexState {
                    id,
                    checks_left: Some(0),
                    created_at: "2025-01-01T00:00:00Z".to_string(),
                },
            );
        }
        self
    }

    /// Number of status checks new indexes need before reporting ready
    pub fn with_index_delay(self, checks: u32) -> Self {
        self.state.write().unwrap().index_delay = Some(checks);
        self
    }

    /// New indexes never become ready
    pub fn with_index_never_ready(self) -> Self {
        self.state.write().unwrap().index_delay = None;
        self
    }

    /// Fail the next `count` index status queries
    pub fn with_status_failures(self, count: u32) -> Self {
        self.state.write().unwrap().status_failures = count;
        self
    }

    /// Fail the next search call with `message`; repeatable
    pub fn with_search_failure(self, message: impl Into<String>) -> Self {
        self.state.write().unwrap().search_failures.push_back(message.into());
        self
    }

    /// Fail every index creation with `message`
    pub fn with_create_failure(self, message: impl Into<String>) -> Self {
        self.state.write().unwrap().create_failure = Some(message.into());
        self
    }

    /// Reject creating an index that already exists
    pub fn with_duplicate_rejection(self) -> Self {
        self.state.write().unwrap().reject_duplicate_index = true;
        self
    }

    pub fn with_transcript(self, video_id: &str, segments: Vec<TranscriptSegment>) -> Self {
        self.state
            .write()
            .unwrap()
            .transcripts
            .insert(video_id.to_string(), TranscriptState::Ready(segments));
        self
    }

    /// A transcript that only exists after generation is requested
    pub fn with_ungenerated_transcript(self, video_id: &str, segments: Vec<TranscriptSegment>) -> Self {
        self.state
            .write()
            .unwrap()
            .transcripts
            .insert(video_id.to_string(), TranscriptState::Missing(segments));
        self
    }

    pub fn with_processing_transcript(self, video_id: &str) -> Self {
        self.state
            .write()
            .unwrap()
            .transcripts
            .insert(video_id.to_string(), TranscriptState::Processing);
        self
    }

    pub fn with_unavailable_transcript(self, video_id: &str) -> Self {
        self.state
            .write()
            .unwrap()
            .transcripts
            .insert(video_id.to_string(), TranscriptState::Unavailable);
        self
    }

    /// Snapshot of the call counters
    pub fn calls(&self) -> CallLog {
        self.state.read().unwrap().calls.clone()
    }

    /// Every shot list passed to `compile_shots`, in call order
    pub fn compiled(&self) -> Vec<Vec<ShotRange>> {
        self.state.read().unwrap().compiled.clone()
    }

    pub fn videos(&self) -> Vec<VideoHandle> {
        self.state.read().unwrap().videos.clone()
    }

    fn search_ready(state: &State, video_id: &str, params: &SearchParams) -> Option<Vec<RawShot>> {
        let key = (video_id.to_string(), params.index_kind);
        let index = state.indexes.get(&key).filter(|index| index.is_ready())?;

        if params.scene_index_id.as_deref().is_some_and(|id| id != index.id) {
            return Some(Vec::new());
        }

        Some(state.shots.get(&key).cloned().unwrap_or_default())
    }
}

fn truncate(mut shots: Vec<RawShot>, params: &SearchParams) -> Vec<RawShot> {
    if let Some(limit) = params.result_threshold {
        shots.truncate(limit);
    }
    shots
}

impl VideoBackend for MemoryBackend {
    fn list_videos(&self) -> Result<Vec<VideoHandle>> {
        let mut state = self.state.write().unwrap();
        state.calls.list_videos += 1;
        Ok(state.videos.clone())
    }

    fn get_video(&self, video_id: &str) -> Result<Option<VideoHandle>> {
        let mut state = self.state.write().unwrap();
        state.calls.get_video += 1;
        Ok(state.videos.iter().find(|v| v.id == video_id).cloned())
    }

    fn upload(&self, source: &UploadSource, name: Option<&str>) -> Result<VideoHandle> {
        let mut state = self.state.write().unwrap();
        state.calls.upload += 1;

        let (source, default_name) = match source {
            UploadSource::Url(url) => (url.clone(), None),
            UploadSource::File(path) => {
                if !path.is_file() {
                    return Err(SkillError::FileNotFound { path: path.clone() });
                }
                let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
                (path.display().to_string(), file_name)
            }
        };

        let id = state.next_id("m");
        let mut video = VideoHandle::new(&id).with_source(source);
        video.display_name = name.map(str::to_string).or(default_name);
        video.stream_url = Some(format!("memory://stream/{}", id));

        tracing::debug!(video_id = %video.id, "Stored uploaded video");
        state.videos.push(video.clone());
        Ok(video)
    }

    fn search_video(&self, video_id: &str, params: &SearchParams) -> Result<Vec<RawShot>> {
        let mut state = self.state.write().unwrap();
        state.calls.search += 1;

        if let Some(message) = state.search_failures.pop_front() {
            return Err(SkillError::backend(message));
        }

        match Self::search_ready(&state, video_id, params) {
            Some(shots) => Ok(truncate(shots, params)),
            None => Err(SkillError::backend(NOT_INDEXED)),
        }
    }

    fn search_collection(&self, params: &SearchParams) -> Result<Vec<RawShot>> {
        let mut state = self.state.write().unwrap();
        state.calls.search += 1;

        if let Some(message) = state.search_failures.pop_front() {
            return Err(SkillError::backend(message));
        }

        let ids: Vec<String> = state.videos.iter().map(|v| v.id.clone()).collect();
        let mut indexed = false;
        let mut shots = Vec::new();
        for id in ids {
            if let Some(found) = Self::search_ready(&state, &id, params) {
                indexed = true;
                shots.extend(found);
            }
        }

        if !indexed {
            return Err(SkillError::backend(COLLECTION_NOT_INDEXED));
        }
        Ok(truncate(shots, params))
    }

    fn compile_shots(&self, shots: &[ShotRange]) -> Result<String> {
        let mut state = self.state.write().unwrap();
        state.calls.compile += 1;
        state.compiled.push(shots.to_vec());
        Ok(format!("memory://compiled/{}", state.compiled.len()))
    }

    fn list_indexes(&self, video_id: &str, kind: IndexKind) -> Result<Vec<IndexDescriptor>> {
        let mut state = self.state.write().unwrap();
        state.calls.list_indexes += 1;

        if state.status_failures > 0 {
            state.status_failures -= 1;
            return Err(SkillError::backend("Temporary failure reading index status"));
        }

        let Some(index) = state.indexes.get_mut(&(video_id.to_string(), kind)) else {
            return Ok(Vec::new());
        };

        let descriptor = IndexDescriptor {
            id: Some(index.id.clone()),
            status: index.status().to_string(),
            created_at: Some(index.created_at.clone()),
        };

        if let Some(left) = index.checks_left.as_mut() {
            *left = left.saturating_sub(1);
        }

        Ok(vec![descriptor])
    }

    fn create_index(&self, video_id: &str, params: &IndexCreateParams) -> Result<Option<String>> {
        let mut state = self.state.write().unwrap();
        state.calls.create_index += 1;

        if let Some(message) = state.create_failure.clone() {
            return Err(SkillError::backend(message));
        }

        let key = (video_id.to_string(), params.kind());
        if let Some(existing) = state.indexes.get(&key) {
            if state.reject_duplicate_index {
                return Err(SkillError::backend(INDEX_EXISTS));
            }
            return Ok(Some(existing.id.clone()));
        }

        let id = state.next_id("idx");
        let index = IndexState {
            id: id.clone(),
            checks_left: state.index_delay,
            created_at: format!("2025-01-01T00:00:{:02}Z", state.next_id % 60),
        };
        state.indexes.insert(key, index);
        Ok(Some(id))
    }

    fn get_transcript(&self, video_id: &str, force: bool) -> Result<Vec<TranscriptSegment>> {
        let mut state = self.state.write().unwrap();
        state.calls.get_transcript += 1;

        if force {
            if let Some(TranscriptState::Missing(segments)) = state.transcripts.get(video_id).cloned() {
                state
                    .transcripts
                    .insert(video_id.to_string(), TranscriptState::Ready(segments));
            }
        }

        match state.transcripts.get(video_id) {
            Some(TranscriptState::Ready(segments)) => Ok(segments.clone()),
            Some(TranscriptState::Missing(_)) => Err(SkillError::backend(TRANSCRIPT_MISSING)),
            Some(TranscriptState::Processing) => Err(SkillError::backend(TRANSCRIPT_PROCESSING)),
            Some(TranscriptState::Unavailable) => Err(SkillError::backend(TRANSCRIPT_UNAVAILABLE)),
            None if state.videos.iter().any(|v| v.id == video_id) => {
                Err(SkillError::backend(TRANSCRIPT_MISSING))
            }
            None => Err(SkillError::backend(format!("Video {} not found", video_id))),
        }
    }

    fn generate_transcript(&self, video_id: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.calls.generate_transcript += 1;

        match state.transcripts.get(video_id).cloned() {
            Some(TranscriptState::Missing(segments)) => {
                state
                    .transcripts
                    .insert(video_id.to_string(), TranscriptState::Ready(segments));
                Ok(())
            }
            Some(TranscriptState::Processing) => Err(SkillError::backend(TRANSCRIPT_PROCESSING)),
            Some(TranscriptState::Ready(_)) => Ok(()),
            Some(TranscriptState::Unavailable) => Err(SkillError::backend(TRANSCRIPT_UNAVAILABLE)),
            None => Err(SkillError::backend(format!("Video {} not found", video_id))),
        }
    }

    fn get_transcript_text(&self, video_id: &str) -> Result<String> {
        let state = self.state.read().unwrap();
        match state.transcripts.get(video_id) {
            Some(TranscriptState::Ready(segments)) => Ok(segments
                .iter()
                .map(|s| s.text.as_str())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")),
            Some(TranscriptState::Processing) => Err(SkillError::backend(TRANSCRIPT_PROCESSING)),
            Some(TranscriptState::Unavailable) => Err(SkillError::backend(TRANSCRIPT_UNAVAILABLE)),
            _ => Err(SkillError::backend(TRANSCRIPT_MISSING)),
        }
    }
}

/// Sleeper that records requested waits instead of blocking
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn total(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vskill_core::models::{SearchRequest, SearchScope, VideoRef};

    fn shot(start: f64, end: f64, text: &str) -> RawShot {
        match json!({ "start": start, "end": end, "text": text }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn params(video_id: &str) -> SearchParams {
        SearchRequest::new("q", SearchScope::Video(VideoRef::ById(video_id.to_string()))).params()
    }

    #[test]
    fn test_search_requires_ready_index() {
        let backend = MemoryBackend::new()
            .with_video(VideoHandle::new("m-1"))
            .with_shots("m-1", IndexKind::SpokenWord, vec![shot(1.0, 2.0, "a")]);

        let err = backend.search_video("m-1", &params("m-1")).unwrap_err();
        assert!(err.needs_index());

        backend
            .create_index("m-1", &IndexCreateParams::SpokenWord)
            .unwrap();
        let shots = backend.search_video("m-1", &params("m-1")).unwrap();
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0]["video_id"], "m-1");
        assert_eq!(backend.calls().search, 2);
    }

    #[test]
    fn test_index_ready_after_delay() {
        let backend = MemoryBackend::new().with_index_delay(2);
        backend
            .create_index("m-1", &IndexCreateParams::SpokenWord)
            .unwrap();

        let statuses: Vec<bool> = (0..3)
            .map(|_| backend.list_indexes("m-1", IndexKind::SpokenWord).unwrap()[0].is_ready())
            .collect();
        assert_eq!(statuses, vec![false, false, true]);
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let backend = MemoryBackend::new()
            .with_ready_index("m-1", IndexKind::Scene)
            .with_duplicate_rejection();

        let err = backend
            .create_index("m-1", &IndexCreateParams::Scene(Default::default()))
            .unwrap_err();
        assert_eq!(
            err.backend_kind(),
            Some(vskill_core::BackendErrorKind::AlreadyIndexed)
        );
    }

    #[test]
    fn test_ungenerated_transcript() {
        let backend = MemoryBackend::new()
            .with_ungenerated_transcript("m-1", vec![TranscriptSegment::new(0.0, 1.0, "hi")]);

        assert!(backend.get_transcript("m-1", false).is_err());
        backend.generate_transcript("m-1").unwrap();
        assert_eq!(backend.get_transcript("m-1", false).unwrap().len(), 1);
        assert_eq!(backend.get_transcript_text("m-1").unwrap(), "hi");
    }

    #[test]
    fn test_recording_sleeper() {
        let sleeper = RecordingSleeper::new();
        sleeper.sleep(Duration::from_secs(10));
        sleeper.sleep(Duration::from_secs(10));
        assert_eq!(sleeper.total(), Duration::from_secs(20));
    }
}
