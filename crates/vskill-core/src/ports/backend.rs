use crate::error::Result;
use crate::models::{
    IndexCreateParams, IndexDescriptor, IndexKind, RawShot, SearchParams, ShotRange,
    TranscriptSegment, UploadSource, VideoHandle,
};

/// Port for the remote video-management backend
///
/// Every method is a blocking call scoped to the connection's default
/// collection. Failures carry the backend's raw message, already classified.
pub trait VideoBackend {
    /// List every video in the collection, in backend order
    fn list_videos(&self) -> Result<Vec<VideoHandle>>;

    /// Fetch a single video, `None` when the id is unknown
    fn get_video(&self, video_id: &str) -> Result<Option<VideoHandle>>;

    /// Upload a new video from a URL or a local file
    fn upload(&self, source: &UploadSource, name: Option<&str>) -> Result<VideoHandle>;

    /// Search within one video
    fn search_video(&self, video_id: &str, params: &SearchParams) -> Result<Vec<RawShot>>;

    /// Search across the whole collection
    fn search_collection(&self, params: &SearchParams) -> Result<Vec<RawShot>>;

    /// Stitch shots into a single playable stream and return its URL
    fn compile_shots(&self, shots: &[ShotRange]) -> Result<String>;

    /// List the indexes of `kind` that exist on a video
    fn list_indexes(&self, video_id: &str, kind: IndexKind) -> Result<Vec<IndexDescriptor>>;

    /// Start building an index, returning its id when the backend reports one
    fn create_index(&self, video_id: &str, params: &IndexCreateParams) -> Result<Option<String>>;

    /// Fetch the timed transcript, regenerating it first when `force` is set
    fn get_transcript(&self, video_id: &str, force: bool) -> Result<Vec<TranscriptSegment>>;

    /// Generate a transcript for a video that has none
    fn generate_transcript(&self, video_id: &str) -> Result<()>;

    /// Fetch the transcript as plain text
    fn get_transcript_text(&self, video_id: &str) -> Result<String>;
}
