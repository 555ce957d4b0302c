//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod backend;
pub mod clock;

pub use backend::VideoBackend;
pub use clock::{RetryPolicy, Sleeper, ThreadSleeper};
