//! Normalization of raw search hits

use serde_json::Value;
use vskill_core::models::{RawShot, ResultShot, ShotRange};

/// Ordered candidate keys for each result field; the first present non-null wins
#[derive(Debug, Clone, Copy)]
pub struct FieldTable {
    pub video_id: &'static [&'static str],
    pub start: &'static [&'static str],
    pub end: &'static [&'static str],
    pub text: &'static [&'static str],
    pub score: &'static [&'static str],
    pub stream_url: &'static [&'static str],
}

pub const FIELDS: FieldTable = FieldTable {
    video_id: &["video_id"],
    start: &["start"],
    end: &["end"],
    text: &["text", "description"],
    score: &["search_score", "score", "relevance_score", "confidence"],
    stream_url: &["stream_url"],
};

/// Shots ready for output plus the unrounded ranges for compilation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormattedShots {
    pub shots: Vec<ResultShot>,
    pub ranges: Vec<ShotRange>,
}

/// Turns untyped backend hits into result shots, preserving backend order
#[derive(Debug, Clone, Copy)]
pub struct ResultFormatter {
    fields: FieldTable,
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self { fields: FIELDS }
    }
}

impl ResultFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format hits; `default_video_id` fills hits without their own video id
    pub fn format(&self, raw: &[RawShot], default_video_id: Option<&str>) -> FormattedShots {
        let mut formatted = FormattedShots::default();

        for shot in raw {
            let video_id = self
                .text(shot, self.fields.video_id)
                .or_else(|| default_video_id.map(str::to_string))
                .unwrap_or_default();
            let start = self.number(shot, self.fields.start).unwrap_or(0.0);
            let end = self.number(shot, self.fields.end).unwrap_or(start);

            formatted.ranges.push(ShotRange {
                video_id: video_id.clone(),
                start,
                end,
            });
            formatted.shots.push(ResultShot {
                video_id,
                start: round_to(start, 1),
                end: round_to(end, 1),
                text: self.text(shot, self.fields.text).unwrap_or_default(),
                score: self.number(shot, self.fields.score).map(|s| round_to(s, 3)),
                stream_url: self.text(shot, self.fields.stream_url),
            });
        }

        formatted
    }

    fn lookup<'s>(&self, shot: &'s RawShot, keys: &[&str]) -> Option<&'s Value> {
        keys.iter()
            .filter_map(|key| shot.get(*key))
            .find(|value| !value.is_null())
    }

    fn number(&self, shot: &RawShot, keys: &[&str]) -> Option<f64> {
        match self.lookup(shot, keys)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn text(&self, shot: &RawShot, keys: &[&str]) -> Option<String> {
        match self.lookup(shot, keys)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn raw(value: Value) -> RawShot {
        match value {
            Value::Object(map) => map,
            _ => panic!("raw shot must be an object"),
        }
    }

    #[test]
    fn test_rounding() {
        let formatted = ResultFormatter::new().format(
            &[raw(json!({"start": 12.34, "end": 45.678, "search_score": 0.8321, "text": "pricing"}))],
            Some("vid_1"),
        );

        let shot = &formatted.shots[0];
        assert_eq!(shot.start, 12.3);
        assert_eq!(shot.end, 45.7);
        assert_eq!(shot.score, Some(0.832));
        assert_eq!(shot.video_id, "vid_1");
        assert_eq!(shot.text, "pricing");

        // Compilation keeps the exact range
        assert_eq!(formatted.ranges[0].start, 12.34);
        assert_eq!(formatted.ranges[0].end, 45.678);
    }

    #[test]
    fn test_score_fallback_order() {
        let formatter = ResultFormatter::new();
        let cases = [
            (json!({"score": 0.5, "confidence": 0.9}), Some(0.5)),
            (json!({"search_score": null, "relevance_score": 0.25}), Some(0.25)),
            (json!({"confidence": "0.4444"}), Some(0.444)),
            (json!({}), None),
        ];

        for (value, expected) in cases {
            let formatted = formatter.format(&[raw(value)], None);
            assert_eq!(formatted.shots[0].score, expected);
        }
    }

    #[test]
    fn test_own_video_id_and_stream_kept() {
        let formatted = ResultFormatter::new().format(
            &[raw(json!({"video_id": "m-9", "stream_url": "https://s/1", "description": "a cat"}))],
            Some("m-1"),
        );
        let shot = &formatted.shots[0];
        assert_eq!(shot.video_id, "m-9");
        assert_eq!(shot.stream_url.as_deref(), Some("https://s/1"));
        assert_eq!(shot.text, "a cat");
    }

    proptest! {
        #[test]
        fn prop_order_preserved_and_rounding_close(starts in prop::collection::vec(0.0f64..10_000.0, 0..20)) {
            let shots: Vec<RawShot> = starts
                .iter()
                .enumerate()
                .map(|(i, s)| raw(json!({"start": s, "end": s + 1.0, "text": i.to_string()})))
                .collect();

            let formatted = ResultFormatter::new().format(&shots, None);
            prop_assert_eq!(formatted.shots.len(), starts.len());

            for (i, (shot, start)) in formatted.shots.iter().zip(&starts).enumerate() {
                prop_assert_eq!(&shot.text, &i.to_string());
                prop_assert!((shot.start - start).abs() <= 0.05 + 1e-9);
            }
        }
    }
}
