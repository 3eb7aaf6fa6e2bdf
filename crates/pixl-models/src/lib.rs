//! Shared data models for the Pixl backend.
//!
//! This crate provides the types exchanged between the transport layer and
//! the transform pipelines:
//! - Data-URL parsing
//! - Media format allowlists
//! - Job descriptions and transform output
//! - Encoding configuration constants

pub mod data_url;
pub mod encoding;
pub mod format;
pub mod job;

// Re-export common types
pub use data_url::{DataUrl, DataUrlError};
pub use encoding::VideoEncoding;
pub use format::{ImageFormat, VideoFormat};
pub use job::{ImageJob, TransformOutput, VideoJob, DEFAULT_TARGET_HEIGHT};
