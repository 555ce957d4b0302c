//! vskill store - in-memory video backend
//!
//! A scriptable implementation of the backend port used by the retrieval
//! and CLI tests, and for running the skills without network access.

pub mod memory;

pub use memory::{CallLog, MemoryBackend, RecordingSleeper};
