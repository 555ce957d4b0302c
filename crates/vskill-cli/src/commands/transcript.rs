//! Transcript command implementation

use super::{parse_input, to_document, SkillContext, SkillOutcome};
use crate::errors::{ErrorCode, Failure, Skill};
use crate::output_types::TranscriptOutput;
use serde::Deserialize;
use serde_json::Value;
use vskill_core::error::Result;
use vskill_core::models::VideoRef;
use vskill_core::ports::VideoBackend;
use vskill_retrieval::{TranscriptFetcher, TranscriptFormat};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TranscriptInput {
    pub video_id: Option<String>,
    pub url: Option<String>,
    pub format: Option<String>,
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptTask {
    pub video: VideoRef,
    pub format: TranscriptFormat,
    pub force: bool,
}

impl TranscriptInput {
    pub fn validate(self) -> std::result::Result<TranscriptTask, Failure> {
        let format = match self.format.as_deref() {
            Some(raw) => raw.parse().map_err(|e| Failure::from_skill(e, Skill::Transcript))?,
            None => TranscriptFormat::default(),
        };

        let video = VideoRef::from_inputs(self.video_id.as_deref(), self.url.as_deref())
            .ok_or_else(|| Failure::new(ErrorCode::MissingVideoId, "video_id or url is required"))?;

        Ok(TranscriptTask { video, format, force: self.force })
    }
}

pub fn execute(input: Value, ctx: &SkillContext) -> SkillOutcome {
    let task = parse_input::<TranscriptInput>(input)?.validate()?;
    let backend = ctx.connect(Skill::Transcript)?;

    let output = run(&task, &backend).map_err(|e| Failure::from_skill(e, Skill::Transcript))?;
    to_document(&output, Skill::Transcript)
}

pub fn run<B: VideoBackend + ?Sized>(task: &TranscriptTask, backend: &B) -> Result<TranscriptOutput> {
    let view = TranscriptFetcher::new(backend).fetch(&task.video, task.format, task.force)?;

    let segment_count = view.segment_count();
    let word_count = view.word_count();
    let video_name = view.video.display_name.clone().unwrap_or_else(|| view.video.id.clone());

    Ok(TranscriptOutput {
        success: true,
        video_id: view.video.id,
        video_name,
        duration: view.video.duration_seconds,
        transcript: view.segments,
        segment_count,
        text: view.text,
        word_count,
    })
}
