//! VideoDB response shapes and their translation into core models

use serde::Deserialize;
use serde_json::Value;
use vskill_core::models::{IndexDescriptor, RawShot, TranscriptSegment, VideoHandle};

/// Envelope wrapping every VideoDB response
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub success: Option<bool>,

    /// `processing` while an asynchronous job is still running
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn is_processing(&self) -> bool {
        self.status.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("processing"))
    }

    /// URL to poll for the result of a processing job
    pub fn output_url(&self) -> Option<&str> {
        self.data.get("output_url").and_then(Value::as_str)
    }

    pub fn is_failure(&self) -> bool {
        self.success == Some(false)
            || self.status.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("failed"))
    }
}

/// Video record as returned by the collection endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct VideoDto {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Seconds, sent either as a number or a numeric string
    #[serde(default)]
    pub length: Option<Value>,
    #[serde(default)]
    pub duration: Option<Value>,
    #[serde(default, alias = "source_url")]
    pub source: Option<String>,
    #[serde(default)]
    pub stream_url: Option<String>,
}

impl From<VideoDto> for VideoHandle {
    fn from(dto: VideoDto) -> Self {
        let duration_seconds =
            dto.length.as_ref().and_then(as_seconds).or_else(|| dto.duration.as_ref().and_then(as_seconds));
        VideoHandle {
            id: dto.id,
            display_name: dto.name,
            duration_seconds,
            source: dto.source,
            stream_url: dto.stream_url,
        }
    }
}

fn as_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a list of videos from `data.videos` or a bare array
pub(crate) fn videos(data: Value) -> Result<Vec<VideoHandle>, serde_json::Error> {
    let list = match data {
        Value::Object(mut map) => map.remove("videos").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    let dtos: Vec<VideoDto> = serde_json::from_value(list)?;
    Ok(dtos.into_iter().map(VideoHandle::from).collect())
}

pub(crate) fn video(data: Value) -> Result<VideoHandle, serde_json::Error> {
    serde_json::from_value::<VideoDto>(data).map(VideoHandle::from)
}

/// Flatten search results into one raw shot per hit
///
/// VideoDB groups hits per video under `results[].docs`; the group's
/// `video_id` and `stream_url` are copied onto hits that lack them.
pub(crate) fn shots(data: Value) -> Vec<RawShot> {
    let groups = match data {
        Value::Object(mut map) => map.remove("results").or_else(|| map.remove("shots")),
        Value::Array(items) => Some(Value::Array(items)),
        _ => None,
    };

    let Some(Value::Array(groups)) = groups else {
        return Vec::new();
    };

    let mut shots = Vec::new();
    for group in groups {
        let Value::Object(mut group) = group else { continue };

        let docs = group.remove("docs").or_else(|| group.remove("shots"));
        match docs {
            Some(Value::Array(docs)) => {
                for doc in docs {
                    if let Value::Object(mut shot) = doc {
                        for key in ["video_id", "stream_url"] {
                            if !shot.contains_key(key) {
                                if let Some(value) = group.get(key) {
                                    shot.insert(key.to_string(), value.clone());
                                }
                            }
                        }
                        shots.push(shot);
                    }
                }
            }
            // A flat hit rather than a group
            _ => shots.push(group),
        }
    }
    shots
}

/// Read index listings from `scene_indexes`, `indexes`, or a bare array
pub(crate) fn indexes(data: Value) -> Vec<IndexDescriptor> {
    let list = match data {
        Value::Object(mut map) => ["scene_indexes", "spoken_word_indexes", "indexes"]
            .iter()
            .find_map(|key| map.remove(*key)),
        Value::Array(items) => Some(Value::Array(items)),
        _ => None,
    };

    let Some(Value::Array(items)) = list else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| {
            let Value::Object(item) = item else { return None };
            let text = |keys: &[&str]| {
                keys.iter().find_map(|k| item.get(*k).and_then(Value::as_str)).map(str::to_string)
            };
            Some(IndexDescriptor {
                id: text(&["scene_index_id", "index_id", "id"]),
                status: text(&["status"]).unwrap_or_default(),
                created_at: text(&["created_at", "created"]),
            })
        })
        .collect()
}

/// Id of a freshly created index, if the backend reported one
pub(crate) fn created_index_id(data: &Value) -> Option<String> {
    ["scene_index_id", "index_id", "id"]
        .iter()
        .find_map(|k| data.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

/// Read timed transcript segments from `word_timestamps` or a bare array
pub(crate) fn transcript(data: Value) -> Result<Vec<TranscriptSegment>, serde_json::Error> {
    let list = match data {
        Value::Object(mut map) => map.remove("word_timestamps").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(list)
}

pub(crate) fn transcript_text(data: &Value) -> String {
    data.get("text").and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Stream URL of a compiled timeline
pub(crate) fn stream_url(data: &Value) -> Option<String> {
    ["stream_url", "player_url"]
        .iter()
        .find_map(|k| data.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_video_length_as_string_or_number() {
        let a = video(json!({"id": "m-1", "name": "Demo", "length": "61.5"})).unwrap();
        assert_eq!(a.duration_seconds, Some(61.5));

        let b = video(json!({"id": "m-2", "length": 12})).unwrap();
        assert_eq!(b.duration_seconds, Some(12.0));
        assert_eq!(b.display_name, None);

        let c = video(json!({"id": "m-3", "duration": 7.25})).unwrap();
        assert_eq!(c.duration_seconds, Some(7.25));
    }

    #[test]
    fn test_videos_from_wrapped_list() {
        let list = videos(json!({"videos": [{"id": "m-1"}, {"id": "m-2", "source_url": "https://youtu.be/x"}]}))
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].source.as_deref(), Some("https://youtu.be/x"));
    }

    #[test]
    fn test_shots_flattened_with_group_fields() {
        let data = json!({
            "results": [
                {
                    "video_id": "m-1",
                    "stream_url": "https://stream/m-1",
                    "docs": [
                        {"start": 1.0, "end": 2.0, "text": "a", "search_score": 0.9},
                        {"start": 3.0, "end": 4.0, "text": "b", "video_id": "m-9"}
                    ]
                },
                {"video_id": "m-2", "docs": [{"start": 5.0, "end": 6.0}]}
            ]
        });

        let shots = shots(data);
        assert_eq!(shots.len(), 3);
        assert_eq!(shots[0]["video_id"], "m-1");
        assert_eq!(shots[0]["stream_url"], "https://stream/m-1");
        assert_eq!(shots[1]["video_id"], "m-9");
        assert_eq!(shots[2]["video_id"], "m-2");
        assert!(shots[2].get("stream_url").is_none());
    }

    #[test]
    fn test_shots_missing_results() {
        assert!(shots(json!({})).is_empty());
        assert!(shots(Value::Null).is_empty());
    }

    #[test]
    fn test_indexes_from_scene_listing() {
        let list = indexes(json!({
            "scene_indexes": [
                {"scene_index_id": "s-1", "status": "done", "created_at": "2024-05-01"},
                {"scene_index_id": "s-2", "status": "processing"}
            ]
        }));
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id.as_deref(), Some("s-1"));
        assert!(list[0].is_ready());
        assert!(!list[1].is_ready());
    }

    #[test]
    fn test_envelope_states() {
        let processing: Envelope = serde_json::from_value(json!({
            "success": true,
            "status": "processing",
            "data": {"output_url": "https://api/async/1"}
        }))
        .unwrap();
        assert!(processing.is_processing());
        assert_eq!(processing.output_url(), Some("https://api/async/1"));

        let failed: Envelope =
            serde_json::from_value(json!({"success": false, "message": "Video not indexed"})).unwrap();
        assert!(failed.is_failure());
    }

    #[test]
    fn test_transcript_segments() {
        let segments = transcript(json!({
            "word_timestamps": [{"start": 0.0, "end": 0.4, "text": "hello"}, {"start": 0.4, "end": 0.9}]
        }))
        .unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].text, "");
    }
}
