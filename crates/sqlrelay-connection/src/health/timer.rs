//! Single-slot liveness timer
//!
//! At most one probe is ever pending. Scheduling a new one aborts the
//! previous pending task before spawning its replacement.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

struct Pending {
    generation: u64,
    delay: Duration,
    handle: JoinHandle<()>,
}

/// A resettable one-shot timer holding at most one pending task
pub struct LivenessTimer {
    slot: Mutex<Option<Pending>>,
    next_generation: AtomicU64,
    closed: AtomicBool,
    scheduled: AtomicU64,
    cancelled: AtomicU64,
    fired: AtomicU64,
}

impl LivenessTimer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(None),
            next_generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            scheduled: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            fired: AtomicU64::new(0),
        })
    }

    /// Run `task` after `delay`, replacing whatever was pending.
    ///
    /// Does nothing once the timer is closed. Must be called from within a
    /// Tokio runtime.
    pub fn reset<F>(self: &Arc<Self>, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_closed() {
            tracing::trace!("liveness timer closed, not scheduling");
            return;
        }

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let timer = Arc::downgrade(self);

        let mut slot = self.slot.lock();
        if let Some(previous) = slot.take() {
            previous.handle.abort();
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let claimed = timer.upgrade().is_some_and(|timer| timer.claim(generation));
            if claimed {
                task.await;
            }
        });

        self.scheduled.fetch_add(1, Ordering::SeqCst);
        *slot = Some(Pending {
            generation,
            delay,
            handle,
        });
    }

    /// Abort the pending task, if any
    pub fn cancel(&self) {
        if let Some(previous) = self.slot.lock().take() {
            previous.handle.abort();
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Cancel and refuse all further scheduling
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Delay of the pending task, if one is waiting
    pub fn pending_delay(&self) -> Option<Duration> {
        self.slot.lock().as_ref().map(|pending| pending.delay)
    }

    pub fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Total number of tasks ever scheduled
    pub fn scheduled_count(&self) -> u64 {
        self.scheduled.load(Ordering::SeqCst)
    }

    /// Number of pending tasks aborted before firing
    pub fn cancelled_count(&self) -> u64 {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Number of tasks that fired
    pub fn fired_count(&self) -> u64 {
        self.fired.load(Ordering::SeqCst)
    }

    // A fired task leaves the slot without aborting itself. A stale
    // generation means it was superseded between waking and claiming.
    fn claim(&self, generation: u64) -> bool {
        let mut slot = self.slot.lock();
        match slot.as_ref() {
            Some(pending) if pending.generation == generation => {
                *slot = None;
                self.fired.fetch_add(1, Ordering::SeqCst);
                true
            }
            _ => false,
        }
    }
}

impl Drop for LivenessTimer {
    fn drop(&mut self) {
        if let Some(previous) = self.slot.get_mut().take() {
            previous.handle.abort();
        }
    }
}
