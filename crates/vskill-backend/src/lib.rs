//! VideoDB adapter for the video backend port

mod videodb;
mod wire;

pub use videodb::VideoDbBackend;
