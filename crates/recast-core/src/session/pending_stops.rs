use crate::{CaptureResult, recorder::Recorder};

use std::sync::{Arc, Mutex};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, instrument};
use uuid::Uuid;

/// A disposal that has not finished yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingStop {
    /// Registration id, unique per tracker.
    pub id: u64,
    /// Session whose recorder is being disposed.
    pub session_id: Uuid,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    entries: Vec<PendingStop>,
}

/// In-flight recorder disposals.
///
/// Registration and removal happen under one mutex and [`count`] takes the
/// same mutex, so every observation matches the set of unfinished tasks.
///
/// [`count`]: PendingStops::count
#[derive(Debug, Clone)]
pub struct PendingStops {
    registry: Arc<Mutex<Registry>>,
    remaining: Arc<watch::Sender<usize>>,
}

impl Default for PendingStops {
    fn default() -> Self {
        Self::new()
    }
}

// Removes its entry when the disposal task ends, even by panic.
struct Deregister {
    stops: PendingStops,
    id: u64,
}

impl Drop for Deregister {
    fn drop(&mut self) {
        let mut registry = self
            .stops
            .registry
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        registry.entries.retain(|e| e.id != self.id);
        self.stops.remaining.send_replace(registry.entries.len());
    }
}

impl PendingStops {
    /// Empty tracker.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            remaining: Arc::new(watch::Sender::new(0)),
        }
    }

    /// Dispose `recorder` on the blocking pool and track it until done.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip(self, recorder), fields(session_id = %session_id))]
    pub fn track(
        &self,
        session_id: Uuid,
        mut recorder: Box<dyn Recorder>,
    ) -> JoinHandle<CaptureResult<()>> {
        // registered before the task exists, so it can never finish unseen
        let id = {
            let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push(PendingStop { id, session_id });
            self.remaining.send_replace(registry.entries.len());
            debug!(pending_stops = registry.entries.len(), "Tracking recorder disposal");
            id
        };

        let guard = Deregister {
            stops: self.clone(),
            id,
        };
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            recorder.dispose()
        })
    }

    /// Number of unfinished disposals.
    pub fn count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }

    /// Unfinished disposals, oldest first.
    pub fn snapshot(&self) -> Vec<PendingStop> {
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .clone()
    }

    /// Resolve once every tracked disposal has finished.
    pub async fn wait_all(&self) {
        let mut remaining = self.remaining.subscribe();
        if remaining.wait_for(|count| *count == 0).await.is_err() {
            debug!("Pending stop tracker closed");
        }
    }
}
