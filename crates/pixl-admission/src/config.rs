//! Admission configuration.

use std::time::Duration;

/// Admission control configuration.
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Requests allowed per identity per window
    pub per_identity_limit: u32,
    /// Rate-limit window length
    pub window: Duration,
    /// Maximum concurrently running jobs
    pub max_concurrent: usize,
    /// Forced-expiry lifetime for a job slot
    pub max_process_lifetime: Duration,
    /// Coarse per-job cost used for the wait estimate
    pub average_job_cost: Duration,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            per_identity_limit: 10,
            window: Duration::from_secs(60),
            max_concurrent: 10,
            max_process_lifetime: Duration::from_secs(15 * 60),
            average_job_cost: Duration::from_secs(30),
        }
    }
}

impl AdmissionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            per_identity_limit: env_parse("RATE_LIMIT_PER_IDENTITY", defaults.per_identity_limit),
            window: Duration::from_secs(env_parse(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.window.as_secs(),
            )),
            max_concurrent: env_parse("MAX_CONCURRENT_JOBS", defaults.max_concurrent),
            max_process_lifetime: Duration::from_secs(env_parse(
                "MAX_JOB_LIFETIME_SECS",
                defaults.max_process_lifetime.as_secs(),
            )),
            average_job_cost: Duration::from_secs(env_parse(
                "AVERAGE_JOB_COST_SECS",
                defaults.average_job_cost.as_secs(),
            )),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
