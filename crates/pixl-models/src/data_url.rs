//! Data-URL parsing.
//!
//! Media payloads arrive inline as `data:<mime>;base64,<body>` strings. The
//! parser splits the framing, checks the mime prefix, and decodes the body
//! without interpreting the bytes.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;

/// Errors produced while parsing a data URL.
#[derive(Debug, Error)]
pub enum DataUrlError {
    #[error("Payload is not a data URL")]
    MissingFraming,

    #[error("Data URL is not base64-encoded")]
    NotBase64,

    #[error("Invalid base64 body: {0}")]
    InvalidBody(#[from] base64::DecodeError),

    #[error("Unexpected mime prefix: expected {expected}/*")]
    WrongKind { expected: &'static str },
}

/// A parsed data URL: mime type plus decoded payload bytes.
#[derive(Debug, Clone)]
pub struct DataUrl {
    mime: String,
    bytes: Vec<u8>,
}

impl DataUrl {
    /// Parse a `data:<mime>;base64,<body>` string.
    ///
    /// `expected_kind` is the required top-level mime type (`"image"` or
    /// `"video"`); a payload of any other kind is rejected before decoding.
    pub fn parse(raw: &str, expected_kind: &'static str) -> Result<Self, DataUrlError> {
        let (header, body) = raw.split_once(',').ok_or(DataUrlError::MissingFraming)?;

        let header = header
            .strip_prefix("data:")
            .ok_or(DataUrlError::MissingFraming)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(DataUrlError::NotBase64)?;

        let prefix = format!("{}/", expected_kind);
        if !mime.starts_with(&prefix) {
            return Err(DataUrlError::WrongKind {
                expected: expected_kind,
            });
        }

        let bytes = BASE64.decode(body.trim())?;

        Ok(Self {
            mime: mime.to_string(),
            bytes,
        })
    }

    /// Full mime type, e.g. `image/png`.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Decoded payload bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the parsed URL, returning the payload bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Encode bytes as a data URL string.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}
