//! Recast Core Library
//!
//! Recording session orchestration for screen and audio capture: the session
//! state machine, capture pipeline assembly, overlay compositing, recorder
//! pumps and non-blocking shutdown that flushes every output exactly once.
//!
//! Capture devices, encoders and user-facing surfaces are supplied by the
//! host through the capability traits in [`capture`], [`writer`] and
//! [`session`].
//!
//! # Example
//!
//! ```no_run
//! use recast_core::{Orchestrator, OrchestratorDeps, SessionPlan};
//!
//! async fn run(deps: OrchestratorDeps, plan: SessionPlan) {
//!     let (mut orchestrator, mut events) = Orchestrator::new(deps);
//!
//!     if orchestrator.begin_session(plan).is_err() {
//!         return;
//!     }
//!     while let Some(event) = events.recv().await {
//!         orchestrator.handle_event(event);
//!         if !orchestrator.state().is_active() {
//!             break;
//!         }
//!     }
//!     orchestrator.shutdown().await;
//! }
//! ```

pub mod capture;
pub mod overlay;
pub mod recorder;
pub mod session;
pub mod writer;

mod error;

pub use {
    error::{BuildStage, CaptureError, CaptureResult, SessionError, SessionResult},
    session::{
        Orchestrator, OrchestratorDeps, PowerEvent, RecorderState, SessionEvent, SessionPlan,
        SessionSettings,
    },
};

#[cfg(test)]
mod tests;
