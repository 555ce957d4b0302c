use vskill_core::error::{Result, SkillError};
use vskill_core::models::{source_token, UploadSource, VideoHandle, VideoRef};
use vskill_core::ports::VideoBackend;

/// Turns a caller's video reference into a backend video
pub struct VideoResolver<'a, B: VideoBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: VideoBackend + ?Sized> VideoResolver<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Resolve a reference to exactly one video
    ///
    /// URLs are matched against the collection by source token before
    /// falling back to an upload.
    pub fn resolve(&self, video: &VideoRef) -> Result<VideoHandle> {
        tracing::debug!(video = video.as_str(), "Resolving video");
        match video {
            VideoRef::ById(id) => self
                .backend
                .get_video(id)?
                .ok_or_else(|| SkillError::VideoNotFound { id: id.clone() }),
            VideoRef::ByUrl(url) => self.resolve_url(url),
        }
    }

    fn resolve_url(&self, url: &str) -> Result<VideoHandle> {
        if let Some(token) = source_token(url) {
            let existing = self
                .backend
                .list_videos()?
                .into_iter()
                .find(|video| video.matches_token(&token));

            if let Some(video) = existing {
                tracing::debug!(video_id = %video.id, %token, "Reusing uploaded video");
                return Ok(video);
            }
        } else {
            tracing::debug!(%url, "No source token in URL, skipping dedup");
        }

        // Concurrent callers may both miss the scan and upload twice
        tracing::info!(%url, "Uploading video; not deduplicated against concurrent uploads");
        self.backend.upload(&UploadSource::Url(url.to_string()), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vskill_store::MemoryBackend;

    #[test]
    fn test_resolve_by_id() {
        let backend = MemoryBackend::new().with_video(VideoHandle::new("vid_1").with_name("Demo"));
        let resolver = VideoResolver::new(&backend);

        let video = resolver.resolve(&VideoRef::ById("vid_1".into())).unwrap();
        assert_eq!(video.display_name.as_deref(), Some("Demo"));

        let err = resolver.resolve(&VideoRef::ById("vid_2".into())).unwrap_err();
        assert!(matches!(err, SkillError::VideoNotFound { ref id } if id == "vid_2"));
    }

    #[test]
    fn test_existing_url_is_not_uploaded() {
        let backend = MemoryBackend::new()
            .with_video(VideoHandle::new("m-1").with_source("https://www.youtube.com/watch?v=zzz"))
            .with_video(VideoHandle::new("m-2").with_source("https://www.youtube.com/watch?v=abc123"));
        let resolver = VideoResolver::new(&backend);

        let video = resolver.resolve(&VideoRef::ByUrl("https://youtu.be/abc123".into())).unwrap();
        assert_eq!(video.id, "m-2");
        assert_eq!(backend.calls().upload, 0);
    }

    #[test]
    fn test_first_match_wins() {
        let backend = MemoryBackend::new()
            .with_video(VideoHandle::new("m-1").with_name("abc123 clip"))
            .with_video(VideoHandle::new("m-2").with_source("https://youtu.be/abc123"));

        let video = VideoResolver::new(&backend)
            .resolve(&VideoRef::ByUrl("https://www.youtube.com/shorts/abc123".into()))
            .unwrap();
        assert_eq!(video.id, "m-1");
    }

    #[test]
    fn test_unknown_url_uploads() {
        let backend = MemoryBackend::new()
            .with_video(VideoHandle::new("m-1").with_source("https://youtu.be/other"));

        let video = VideoResolver::new(&backend)
            .resolve(&VideoRef::ByUrl("https://youtu.be/fresh".into()))
            .unwrap();
        assert_eq!(video.source.as_deref(), Some("https://youtu.be/fresh"));
        assert_eq!(backend.calls().upload, 1);
        assert_eq!(backend.videos().len(), 2);
    }

    #[test]
    fn test_url_without_token_skips_scan() {
        let backend = MemoryBackend::new()
            .with_video(VideoHandle::new("m-1").with_source("https://cdn.example.com/a.mp4"));

        VideoResolver::new(&backend)
            .resolve(&VideoRef::ByUrl("https://cdn.example.com/a.mp4".into()))
            .unwrap();

        let calls = backend.calls();
        assert_eq!(calls.list_videos, 0);
        assert_eq!(calls.upload, 1);
    }
}
