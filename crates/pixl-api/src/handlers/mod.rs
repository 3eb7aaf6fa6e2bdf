//! Request handlers.

pub mod health;
pub mod image;
pub mod status;
pub mod video;

pub use health::*;
pub use image::*;
pub use status::*;
pub use video::*;

use axum::http::HeaderMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize a rendition height that may arrive as a number, a numeric
/// string, or garbage. Anything non-numeric or non-positive becomes `None`,
/// which the job constructor replaces with the default height.
pub(crate) fn lenient_height<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_height))
}

fn coerce_height(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    if n >= 1.0 && n <= u32::MAX as f64 {
        Some(n.floor() as u32)
    } else {
        None
    }
}

/// Resolve the caller identity from request headers.
///
/// The first `x-forwarded-for` hop is the identity; callers without one
/// pool into the shared "unknown" identity downstream.
pub(crate) fn caller_identity(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
