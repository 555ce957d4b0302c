use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SkillError;

/// Default vision prompt used when a scene index is created without one
pub const DEFAULT_SCENE_PROMPT: &str =
    "Describe the visual content including people, objects, and actions.";

/// Shot-detection threshold sent with shot-based scene extraction
pub const SHOT_THRESHOLD: u32 = 20;

/// Kind of index a search runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    SpokenWord,
    Scene,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::SpokenWord => "spoken_word",
            IndexKind::Scene => "scene",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spoken_word" => Ok(IndexKind::SpokenWord),
            "scene" => Ok(IndexKind::Scene),
            _ => Err(SkillError::InvalidValue {
                field: "index_type",
                value: s.to_string(),
                expected: "'spoken_word' or 'scene'",
            }),
        }
    }
}

/// Local reading of a backend index status string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    Ready,
    Pending,
    Unknown,
}

impl IndexStatus {
    /// Classify free-text status: "done" or "ready" anywhere means ready
    pub fn classify(status: &str) -> Self {
        let lower = status.trim().to_lowercase();
        if lower.is_empty() {
            IndexStatus::Unknown
        } else if lower.contains("done") || lower.contains("ready") {
            IndexStatus::Ready
        } else {
            IndexStatus::Pending
        }
    }
}

/// An index as listed by the backend
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexDescriptor {
    #[serde(default)]
    pub id: Option<String>,

    /// Free-text status reported by the backend
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl IndexDescriptor {
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            status: status.into(),
            created_at: None,
        }
    }

    pub fn readiness(&self) -> IndexStatus {
        IndexStatus::classify(&self.status)
    }

    pub fn is_ready(&self) -> bool {
        self.readiness() == IndexStatus::Ready
    }
}

/// How frames are sampled when building a scene index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneExtraction {
    /// One scene every `time_interval` seconds
    TimeBased { time_interval: u32, frame_count: u32 },
    /// One scene per detected shot change
    ShotBased { threshold: u32, frame_count: u32 },
}

impl SceneExtraction {
    /// Build an extraction from the `extraction_type` input and its settings
    pub fn parse(
        extraction_type: &str,
        time_interval: u32,
        frame_count: u32,
    ) -> Result<Self, SkillError> {
        match extraction_type.to_lowercase().as_str() {
            "time_based" => Ok(SceneExtraction::TimeBased { time_interval, frame_count }),
            "shot_based" => Ok(SceneExtraction::ShotBased {
                threshold: SHOT_THRESHOLD,
                frame_count,
            }),
            _ => Err(SkillError::InvalidValue {
                field: "extraction_type",
                value: extraction_type.to_string(),
                expected: "'time_based' or 'shot_based'",
            }),
        }
    }

    pub fn extraction_type(&self) -> &'static str {
        match self {
            SceneExtraction::TimeBased { .. } => "time_based",
            SceneExtraction::ShotBased { .. } => "shot_based",
        }
    }

    /// The backend's `extraction_config` object
    pub fn config(&self) -> serde_json::Value {
        match *self {
            SceneExtraction::TimeBased { time_interval, frame_count } => {
                serde_json::json!({ "time": time_interval, "frame_count": frame_count })
            }
            SceneExtraction::ShotBased { threshold, frame_count } => {
                serde_json::json!({ "threshold": threshold, "frame_count": frame_count })
            }
        }
    }

    pub fn time_interval(&self) -> Option<u32> {
        match *self {
            SceneExtraction::TimeBased { time_interval, .. } => Some(time_interval),
            SceneExtraction::ShotBased { .. } => None,
        }
    }

    pub fn frame_count(&self) -> u32 {
        match *self {
            SceneExtraction::TimeBased { frame_count, .. }
            | SceneExtraction::ShotBased { frame_count, .. } => frame_count,
        }
    }
}

/// Settings for a scene index creation
#[derive(Debug, Clone, PartialEq)]
pub struct SceneIndexParams {
    pub extraction: SceneExtraction,
    pub prompt: String,
}

impl Default for SceneIndexParams {
    fn default() -> Self {
        Self {
            extraction: SceneExtraction::TimeBased { time_interval: 5, frame_count: 3 },
            prompt: DEFAULT_SCENE_PROMPT.to_string(),
        }
    }
}

/// Parameters for creating an index, passed through to the backend as-is
#[derive(Debug, Clone, PartialEq)]
pub enum IndexCreateParams {
    SpokenWord,
    Scene(SceneIndexParams),
}

impl IndexCreateParams {
    pub fn kind(&self) -> IndexKind {
        match self {
            IndexCreateParams::SpokenWord => IndexKind::SpokenWord,
            IndexCreateParams::Scene(_) => IndexKind::Scene,
        }
    }
}
