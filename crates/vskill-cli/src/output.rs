use crate::commands::SkillOutcome;
use serde_json::{json, Map, Value};
use std::io::Write;

/// Writes one pretty-printed JSON object per invocation
pub struct OutputWriter<W: Write> {
    out: W,
}

impl OutputWriter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> OutputWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write the outcome and report whether it was a success
    pub fn result(&mut self, outcome: &SkillOutcome) -> anyhow::Result<bool> {
        let (value, success) = render(outcome);
        writeln!(self.out, "{}", serde_json::to_string_pretty(&value)?)?;
        self.out.flush()?;
        Ok(success)
    }
}

/// The JSON document for an outcome, and whether it reports success
pub fn render(outcome: &SkillOutcome) -> (Value, bool) {
    match outcome {
        Ok(value) => {
            let success = value.get("success").and_then(Value::as_bool).unwrap_or(false);
            (value.clone(), success)
        }
        Err(failure) => {
            let mut object = Map::new();
            object.insert("success".into(), json!(false));
            object.insert("error".into(), json!(failure.code));
            object.insert("message".into(), json!(failure.message));
            if let Some(example) = failure.example {
                object.insert("example".into(), json!(example));
            }
            (Value::Object(object), false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorCode, Failure};

    #[test]
    fn test_failure_document() {
        let outcome: SkillOutcome = Err(Failure::new(ErrorCode::MissingVideoId, "video_id or url is required"));
        let mut buf = Vec::new();
        let success = OutputWriter::new(&mut buf).result(&outcome).unwrap();
        assert!(!success);

        let parsed: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["success"], false);
        assert_eq!(parsed["error"], "MISSING_VIDEO_ID");
        assert_eq!(parsed["message"], "video_id or url is required");
        assert!(parsed.get("example").is_none());

        // Pretty printed
        assert!(String::from_utf8(buf).unwrap().contains("\n  \"success\": false"));
    }

    #[test]
    fn test_success_document_passes_through() {
        let outcome: SkillOutcome = Ok(json!({"success": true, "total": 0}));
        let (value, success) = render(&outcome);
        assert!(success);
        assert_eq!(value["total"], 0);
    }
}
