//! vskill retrieval - search orchestration over the video backend
//!
//! Resolves caller references to videos, builds missing indexes on demand,
//! and normalizes search hits into result shots.

pub mod format;
pub mod orchestrator;
pub mod poller;
pub mod resolver;
pub mod scene;
pub mod transcript;

pub use format::{FormattedShots, ResultFormatter};
pub use orchestrator::SearchOrchestrator;
pub use poller::IndexReadinessPoller;
pub use resolver::VideoResolver;
pub use scene::{SceneIndexCreated, SceneIndexer};
pub use transcript::{TranscriptFetcher, TranscriptFormat, TranscriptView};
