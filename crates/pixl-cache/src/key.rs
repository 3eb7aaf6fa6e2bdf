//! Job identity hashing.

use sha2::{Digest, Sha256};

/// Content-addressed key for a transform job: SHA-256 over the raw payload
/// plus a canonical rendering of the parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobKey(String);

impl JobKey {
    /// Compute the key for a payload and parameter set.
    ///
    /// Parameters are sorted by name and rendered as `name=value` pairs, so
    /// the key does not depend on the order or formatting the caller used.
    pub fn compute(payload: &[u8], params: &[(&str, String)]) -> Self {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by_key(|(name, _)| *name);

        let mut hasher = Sha256::new();
        hasher.update(payload);
        for (name, value) in sorted {
            hasher.update(b"\0");
            hasher.update(name.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
        }

        Self(format!("{:x}", hasher.finalize()))
    }

    /// Hex representation, safe for use as a file name.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let params = [("height", "144".to_string()), ("quality", "85".to_string())];
        let a = JobKey::compute(b"payload", &params);
        let b = JobKey::compute(b"payload", &params);
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_ignores_parameter_order() {
        let a = JobKey::compute(
            b"payload",
            &[("height", "144".to_string()), ("quality", "85".to_string())],
        );
        let b = JobKey::compute(
            b"payload",
            &[("quality", "85".to_string()), ("height", "144".to_string())],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_distinguishes_payloads_and_params() {
        let params = [("height", "144".to_string())];
        let base = JobKey::compute(b"payload", &params);

        assert_ne!(base, JobKey::compute(b"other", &params));
        assert_ne!(
            base,
            JobKey::compute(b"payload", &[("height", "240".to_string())])
        );
    }

    #[test]
    fn test_key_is_hex_filename_safe() {
        let key = JobKey::compute(b"x", &[]);
        assert_eq!(key.as_hex().len(), 64);
        assert!(key.as_hex().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
