use std::fmt;
use std::str::FromStr;
use vskill_core::error::{BackendErrorKind, Result, SkillError};
use vskill_core::models::{TranscriptSegment, VideoHandle, VideoRef};
use vskill_core::ports::VideoBackend;

use crate::resolver::VideoResolver;

/// Which transcript renderings to return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranscriptFormat {
    #[default]
    Timestamped,
    Text,
    Both,
}

impl TranscriptFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptFormat::Timestamped => "timestamped",
            TranscriptFormat::Text => "text",
            TranscriptFormat::Both => "both",
        }
    }

    fn wants_segments(self) -> bool {
        matches!(self, TranscriptFormat::Timestamped | TranscriptFormat::Both)
    }

    fn wants_text(self) -> bool {
        matches!(self, TranscriptFormat::Text | TranscriptFormat::Both)
    }
}

impl fmt::Display for TranscriptFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranscriptFormat {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "timestamped" => Ok(TranscriptFormat::Timestamped),
            "text" => Ok(TranscriptFormat::Text),
            "both" => Ok(TranscriptFormat::Both),
            _ => Err(SkillError::InvalidValue {
                field: "format",
                value: s.to_string(),
                expected: "'timestamped', 'text', or 'both'",
            }),
        }
    }
}

/// A video's transcript in the requested renderings
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptView {
    pub video: VideoHandle,
    pub segments: Option<Vec<TranscriptSegment>>,
    pub text: Option<String>,
}

impl TranscriptView {
    pub fn segment_count(&self) -> Option<usize> {
        self.segments.as_ref().map(Vec::len)
    }

    pub fn word_count(&self) -> Option<usize> {
        self.text.as_ref().map(|t| t.split_whitespace().count())
    }
}

/// Fetches transcripts, generating them first when the video has none
pub struct TranscriptFetcher<'a, B: VideoBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: VideoBackend + ?Sized> TranscriptFetcher<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    pub fn fetch(&self, video: &VideoRef, format: TranscriptFormat, force: bool) -> Result<TranscriptView> {
        let video = VideoResolver::new(self.backend).resolve(video)?;

        // The text rendering needs an existing transcript too
        let segments = self.ensure_transcript(&video.id, force)?;

        let text = if format.wants_text() {
            Some(self.backend.get_transcript_text(&video.id)?)
        } else {
            None
        };

        Ok(TranscriptView {
            video,
            segments: format.wants_segments().then_some(segments),
            text,
        })
    }

    fn ensure_transcript(&self, video_id: &str, force: bool) -> Result<Vec<TranscriptSegment>> {
        match self.backend.get_transcript(video_id, force) {
            Err(e) if e.backend_kind() == Some(BackendErrorKind::TranscriptMissing) => {
                tracing::info!(%video_id, "Generating missing transcript");
                self.backend.generate_transcript(video_id)?;
                self.backend.get_transcript(video_id, false)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vskill_store::MemoryBackend;

    fn segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new(0.0, 1.2, "Welcome to"),
            TranscriptSegment::new(1.2, 2.5, "the pricing talk"),
        ]
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("both".parse::<TranscriptFormat>().unwrap(), TranscriptFormat::Both);
        assert!(matches!(
            "srt".parse::<TranscriptFormat>(),
            Err(SkillError::InvalidValue { field: "format", .. })
        ));
    }

    #[test]
    fn test_timestamped_only() {
        let backend = MemoryBackend::new()
            .with_video(VideoHandle::new("m-1").with_name("Talk").with_duration(2.5))
            .with_transcript("m-1", segments());

        let view = TranscriptFetcher::new(&backend)
            .fetch(&VideoRef::ById("m-1".into()), TranscriptFormat::Timestamped, false)
            .unwrap();

        assert_eq!(view.segment_count(), Some(2));
        assert!(view.text.is_none());
        assert_eq!(view.video.display_name.as_deref(), Some("Talk"));
    }

    #[test]
    fn test_missing_transcript_is_generated() {
        let backend = MemoryBackend::new()
            .with_video(VideoHandle::new("m-1"))
            .with_ungenerated_transcript("m-1", segments());

        let view = TranscriptFetcher::new(&backend)
            .fetch(&VideoRef::ById("m-1".into()), TranscriptFormat::Both, false)
            .unwrap();

        assert_eq!(view.segment_count(), Some(2));
        assert_eq!(view.word_count(), Some(5));
        assert_eq!(backend.calls().generate_transcript, 1);
        assert_eq!(backend.calls().get_transcript, 2);
    }

    #[test]
    fn test_unavailable_transcript_is_not_generated() {
        let backend = MemoryBackend::new()
            .with_video(VideoHandle::new("m-1"))
            .with_unavailable_transcript("m-1");

        let err = TranscriptFetcher::new(&backend)
            .fetch(&VideoRef::ById("m-1".into()), TranscriptFormat::Timestamped, false)
            .unwrap_err();

        assert_eq!(err.backend_kind(), Some(BackendErrorKind::NotFound));
        assert_eq!(backend.calls().generate_transcript, 0);
        assert_eq!(backend.calls().get_transcript, 1);
    }

    #[test]
    fn test_processing_transcript_fails() {
        let backend = MemoryBackend::new()
            .with_video(VideoHandle::new("m-1"))
            .with_processing_transcript("m-1");

        let err = TranscriptFetcher::new(&backend)
            .fetch(&VideoRef::ById("m-1".into()), TranscriptFormat::Text, false)
            .unwrap_err();

        assert_eq!(err.backend_kind(), Some(BackendErrorKind::Processing));
        assert_eq!(backend.calls().generate_transcript, 0);
    }
}
