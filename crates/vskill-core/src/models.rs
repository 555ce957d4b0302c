pub mod index;
pub mod search;
pub mod transcript;
pub mod video;

pub use index::{
    IndexCreateParams, IndexDescriptor, IndexKind, IndexStatus, SceneExtraction,
    SceneIndexParams, DEFAULT_SCENE_PROMPT,
};
pub use search::{
    RawShot, ResultShot, SearchOutcome, SearchParams, SearchRequest, SearchScope, SearchType,
    ShotRange,
};
pub use transcript::TranscriptSegment;
pub use video::{source_token, UploadSource, VideoHandle, VideoRef};
