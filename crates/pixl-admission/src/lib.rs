//! Admission control for transform jobs.
//!
//! This crate decides whether a new job may begin:
//! - [`RateLimiter`] enforces a per-identity request quota over a rolling
//!   window, with a background sweep for idle identities.
//! - [`ProcessRegistry`] tracks in-flight jobs with a forced-expiry safety
//!   net for callers that never release their slot.
//! - [`AdmissionController`] composes the two behind a single
//!   check/start/end/status contract.
//!
//! All counters are process-local; horizontally scaled deployments enforce
//! limits independently per instance.

pub mod config;
pub mod controller;
pub mod rate_limit;
pub mod registry;

pub use config::AdmissionConfig;
pub use controller::{AdmissionController, AdmissionDecision, ProcessGuard, StatusSnapshot};
pub use rate_limit::{RateDecision, RateLimiter, UNKNOWN_IDENTITY};
pub use registry::{ProcessId, ProcessRegistry};
