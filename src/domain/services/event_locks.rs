use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::timeout;
use tracing::warn;

use crate::error::AppError;

/// Mutual exclusion keyed by event id. Callers on different events never
/// contend; callers on the same event queue in FIFO order.
#[derive(Clone, Default)]
pub struct EventLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl EventLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, event_id: &str, wait: Duration) -> Result<EventLockGuard, AppError> {
        let mutex = self.locks
            .entry(event_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let acquired = timeout(wait, mutex.lock_owned()).await;
        match acquired {
            Ok(guard) => Ok(EventLockGuard {
                guard: Some(guard),
                event_id: event_id.to_string(),
                locks: self.locks.clone(),
            }),
            Err(_) => {
                warn!(event_id = %event_id, "Gave up waiting for event lock after {:?}", wait);
                self.prune(event_id);
                Err(AppError::LockTimeout(event_id.to_string()))
            }
        }
    }

    /// Number of events with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn prune(&self, event_id: &str) {
        // The map's own reference is the only one left once nobody holds or
        // waits on the mutex.
        self.locks.remove_if(event_id, |_, m| Arc::strong_count(m) == 1);
    }
}

pub struct EventLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    event_id: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Drop for EventLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.remove_if(&self.event_id, |_, m| Arc::strong_count(m) == 1);
    }
}
