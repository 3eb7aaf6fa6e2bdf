//! In-flight job tracking.
//!
//! Every running transform owns a registry slot. Slots are normally ended
//! by the caller; a per-slot forced-expiry timer guards against callers
//! that never do (e.g. a crashed request task).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Identifier for a registered job. Monotonic, never reused while live.
pub type ProcessId = u64;

struct Handle {
    started: Instant,
    expiry: JoinHandle<()>,
}

struct Inner {
    next_id: ProcessId,
    handles: HashMap<ProcessId, Handle>,
}

/// Registry of in-flight jobs with a forced-expiry safety net.
///
/// One mutex guards the whole map so start/end pairs interleaved across
/// tasks can never drive the active count negative.
pub struct ProcessRegistry {
    inner: Mutex<Inner>,
    max_lifetime: Duration,
    // Handed to expiry timers so they never keep the registry alive
    weak_self: Weak<Self>,
}

impl ProcessRegistry {
    pub fn new(max_lifetime: Duration) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                handles: HashMap::new(),
            }),
            max_lifetime,
            weak_self: weak_self.clone(),
        })
    }

    /// Register a new job and arm its forced-expiry timer.
    ///
    /// Any handle that already exceeded the maximum lifetime is ended first,
    /// so a stuck caller cannot pin capacity forever.
    pub fn start(&self) -> ProcessId {
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let expired: Vec<ProcessId> = inner
            .handles
            .iter()
            .filter(|(_, h)| now.duration_since(h.started) >= self.max_lifetime)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            if let Some(handle) = inner.handles.remove(&id) {
                handle.expiry.abort();
                warn!(process_id = id, "Force-expired stale job slot");
            }
        }

        let id = inner.next_id;
        inner.next_id += 1;

        let registry = self.weak_self.clone();
        let lifetime = self.max_lifetime;
        // The deadline is fixed here, not at the task's first poll
        let deadline = now + lifetime;
        let expiry = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(registry) = Weak::upgrade(&registry) {
                warn!(
                    process_id = id,
                    lifetime_secs = lifetime.as_secs(),
                    "Job exceeded maximum lifetime, releasing its slot"
                );
                registry.end(id);
            }
        });

        inner.handles.insert(
            id,
            Handle {
                started: now,
                expiry,
            },
        );
        debug!(process_id = id, active = inner.handles.len(), "Job slot started");
        id
    }

    /// Release a job slot. Idempotent: ending an unknown or already-ended
    /// id is a no-op, so double-ending never corrupts the count.
    pub fn end(&self, id: ProcessId) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = inner.handles.remove(&id) {
            handle.expiry.abort();
            debug!(process_id = id, active = inner.handles.len(), "Job slot ended");
        }
    }

    /// Number of live job slots.
    pub fn active_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .handles
            .len()
    }
}
