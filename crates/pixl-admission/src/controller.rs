//! Admission controller.
//!
//! Composes the rate limiter and the process registry behind one
//! check/start/end/status contract. Global capacity exhaustion takes
//! precedence over per-identity quota.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::config::AdmissionConfig;
use crate::rate_limit::{RateLimiter, UNKNOWN_IDENTITY};
use crate::registry::{ProcessId, ProcessRegistry};

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub allowed: bool,
    /// Requests left in the caller's window. Zero when rejected for
    /// capacity, since the quota was never consulted.
    pub remaining: u32,
    /// True when rejected because the global concurrency cap is reached.
    pub busy: bool,
}

/// Read-only snapshot of admission state for polling clients.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusSnapshot {
    pub active_processes: usize,
    /// Coarse estimate (active x average job cost), not a queue position.
    pub estimated_wait_secs: u64,
}

/// Gate for starting transform jobs.
pub struct AdmissionController {
    limiter: Arc<RateLimiter>,
    registry: Arc<ProcessRegistry>,
    config: AdmissionConfig,
}

impl AdmissionController {
    pub fn new(config: AdmissionConfig) -> Arc<Self> {
        let limiter = Arc::new(RateLimiter::new(config.per_identity_limit, config.window));
        let registry = ProcessRegistry::new(config.max_process_lifetime);
        Arc::new(Self {
            limiter,
            registry,
            config,
        })
    }

    /// Check whether a caller may submit a job right now.
    ///
    /// Capacity is tested first: when the concurrency cap is reached the
    /// caller's quota is not consulted (and not consumed).
    pub fn check(&self, identity: Option<&str>) -> AdmissionDecision {
        if self.registry.active_count() >= self.config.max_concurrent {
            counter!("pixl_admission_rejected_total", "reason" => "busy").increment(1);
            return AdmissionDecision {
                allowed: false,
                remaining: 0,
                busy: true,
            };
        }

        let identity = identity.unwrap_or(UNKNOWN_IDENTITY);
        let decision = self.limiter.check(identity);
        if !decision.allowed {
            counter!("pixl_admission_rejected_total", "reason" => "rate_limited").increment(1);
        }
        AdmissionDecision {
            allowed: decision.allowed,
            remaining: decision.remaining,
            busy: false,
        }
    }

    /// Allocate a job slot. The returned guard releases it on drop, so
    /// every exit path of the caller gives the slot back.
    pub fn start_process(&self) -> ProcessGuard {
        let id = self.registry.start();
        counter!("pixl_jobs_started_total").increment(1);
        ProcessGuard {
            registry: Arc::clone(&self.registry),
            id,
        }
    }

    /// Release a job slot by id. Idempotent.
    pub fn end_process(&self, id: ProcessId) {
        self.registry.end(id);
    }

    /// Snapshot of current load for polling clients.
    pub fn status(&self) -> StatusSnapshot {
        let active = self.registry.active_count();
        StatusSnapshot {
            active_processes: active,
            estimated_wait_secs: active as u64 * self.config.average_job_cost.as_secs(),
        }
    }

    /// Spawn the rate-limit sweep loop.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        Arc::clone(&self.limiter).spawn_sweeper()
    }
}

/// RAII job slot: ends the registered process when dropped.
pub struct ProcessGuard {
    registry: Arc<ProcessRegistry>,
    id: ProcessId,
}

impl ProcessGuard {
    pub fn id(&self) -> ProcessId {
        self.id
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        self.registry.end(self.id);
    }
}
