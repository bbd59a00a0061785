//! Per-worker render session table

use crate::render::{RenderError, RenderSession, SessionFactory, WorkerId};
use crate::NoSessionBoundError;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared handle to a bound session
///
/// Only the owning worker locks it, so the lock is never contended in
/// correct use.
pub type SessionHandle = Arc<Mutex<Box<dyn RenderSession>>>;

/// Binds one render session per worker
///
/// Backed by a sharded map, so calls for different workers never wait on a
/// single global lock. The registry only manages lifecycle; it never creates
/// sessions itself.
#[derive(Default)]
pub struct RenderSessionRegistry {
    sessions: DashMap<WorkerId, SessionHandle>,
}

impl RenderSessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `session` to `worker`
    ///
    /// Rebinding overwrites the previous session without closing it; the
    /// displaced handle is returned so the caller can close it.
    pub fn bind(&self, worker: WorkerId, session: Box<dyn RenderSession>) -> Option<SessionHandle> {
        let handle = Arc::new(Mutex::new(session));
        let displaced = self.sessions.insert(worker.clone(), handle);

        if displaced.is_some() {
            warn!(
                "Worker {} rebound its render session; the previous session was not closed",
                worker
            );
        } else {
            info!("Bound render session for worker {}", worker);
        }
        displaced
    }

    /// Returns the session bound to `worker`
    pub fn get(&self, worker: &WorkerId) -> Result<SessionHandle, NoSessionBoundError> {
        self.sessions
            .get(worker)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| NoSessionBoundError(worker.clone()))
    }

    /// Closes and unbinds the session of `worker`
    ///
    /// Releasing a worker with no binding is a no-op. The binding is removed
    /// even if closing the session fails.
    pub fn release(&self, worker: &WorkerId) -> Result<(), RenderError> {
        let Some((_, handle)) = self.sessions.remove(worker) else {
            debug!("Worker {} has no render session to release", worker);
            return Ok(());
        };

        info!("Releasing render session for worker {}", worker);
        let mut session = handle.lock();
        session.close()
    }

    pub fn is_bound(&self, worker: &WorkerId) -> bool {
        self.sessions.contains_key(worker)
    }

    /// Number of bound workers
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Worker startup hook: creates a session and binds it to `worker`
///
/// A session left over from an earlier run of the same worker is released
/// first.
pub fn on_worker_start(
    registry: &RenderSessionRegistry,
    factory: &dyn SessionFactory,
    worker: WorkerId,
) -> Result<(), RenderError> {
    if registry.is_bound(&worker) {
        if let Err(e) = registry.release(&worker) {
            warn!("Failed to close stale render session of worker {}: {}", worker, e);
        }
    }

    let session = factory.create()?;
    registry.bind(worker, session);
    Ok(())
}

/// Worker shutdown hook: releases the session of `worker`
pub fn on_worker_stop(registry: &RenderSessionRegistry, worker: &WorkerId) -> Result<(), RenderError> {
    registry.release(worker)
}
