use vskill_core::error::Result;
use vskill_core::models::{IndexCreateParams, IndexDescriptor, IndexKind, SceneIndexParams, VideoHandle, VideoRef};
use vskill_core::ports::VideoBackend;

use crate::resolver::VideoResolver;

/// A scene index creation request accepted by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct SceneIndexCreated {
    pub video: VideoHandle,
    pub index_id: Option<String>,
    pub params: SceneIndexParams,
}

/// Direct scene index management, without waiting for readiness
pub struct SceneIndexer<'a, B: VideoBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: VideoBackend + ?Sized> SceneIndexer<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Start building a scene index; the backend finishes it asynchronously
    pub fn create(&self, video: &VideoRef, params: SceneIndexParams) -> Result<SceneIndexCreated> {
        let video = VideoResolver::new(self.backend).resolve(video)?;
        let index_id = self
            .backend
            .create_index(&video.id, &IndexCreateParams::Scene(params.clone()))?;

        tracing::info!(
            video_id = %video.id,
            extraction_type = params.extraction.extraction_type(),
            "Scene index requested"
        );

        Ok(SceneIndexCreated { video, index_id, params })
    }

    pub fn list(&self, video: &VideoRef) -> Result<(VideoHandle, Vec<IndexDescriptor>)> {
        let video = VideoResolver::new(self.backend).resolve(video)?;
        let indexes = self.backend.list_indexes(&video.id, IndexKind::Scene)?;
        Ok((video, indexes))
    }
}
