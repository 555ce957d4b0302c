//! Video Skills Core - Domain models, errors, and configuration
//!
//! This crate contains the domain types shared by every skill and the port
//! definitions the backend adapters implement.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{BackendErrorKind, Result, SkillError};
