//! Session state machine and its supporting pieces.

mod orchestrator;
mod pending_stops;
mod recent;
mod settings;
mod stopwatch;
mod surfaces;

pub(crate) use orchestrator::unique_output_path;

pub use {
    orchestrator::{Orchestrator, OrchestratorDeps, TICK},
    pending_stops::{PendingStop, PendingStops},
    recent::{RecentItem, RecentItemType, RecentList, RecentStatus},
    settings::{SessionPlan, SessionSettings},
    stopwatch::Stopwatch,
    surfaces::{ClickAction, MessageSurface, RegionLock, Shell},
};

use crate::{CaptureError, CaptureResult};

/// Recording state visible to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    /// No session.
    #[default]
    NotRecording,
    /// A session is capturing (or waiting out its start delay).
    Recording,
    /// A session is paused.
    Paused,
}

impl RecorderState {
    /// True while a session exists, paused or not.
    pub fn is_active(self) -> bool {
        self != RecorderState::NotRecording
    }
}

/// OS power notifications forwarded by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
    /// The system is about to sleep.
    Suspend,
    /// The system woke up.
    Resume,
}

/// Work posted by background tasks back to the loop that owns the
/// [`Orchestrator`]. Each carries the generation of the session it belongs
/// to; events from earlier sessions are discarded.
#[derive(Debug)]
pub enum SessionEvent {
    /// Periodic timer tick.
    Tick {
        /// Session generation.
        generation: u64,
    },
    /// The start delay ran out.
    DelayElapsed {
        /// Session generation.
        generation: u64,
    },
    /// The recorder reported a runtime fault.
    Fault {
        /// Session generation.
        generation: u64,
        /// What went wrong.
        error: CaptureError,
    },
    /// A recorder disposal completed.
    StopFinished {
        /// Session generation.
        generation: u64,
        /// Outcome of the dispose.
        outcome: CaptureResult<()>,
    },
}
