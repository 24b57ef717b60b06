//! Runtime binding of capture providers and a writer for one session.
//!
//! Every recorder is a [`PumpedRecorder`] driving a job on its own thread.
//! The thread is spawned on the first `start`, parked on `pause`, and joined
//! by `dispose`, which then flushes the writer exactly once.

mod audio;
mod frame;
mod pump;
mod vfr;

pub use {
    audio::AudioJob,
    frame::FrameJob,
    pump::{PumpJob, PumpedRecorder},
    vfr::VfrJob,
};

use crate::{CaptureError, CaptureResult};

use tokio::sync::mpsc;
use tracing::{debug, error};

/// Constant frame rate video recorder with optional audio.
pub type FrameRecorder = PumpedRecorder<FrameJob>;

/// Audio-only recorder.
pub type AudioRecorder = PumpedRecorder<AudioJob>;

/// Variable frame rate recorder that writes frames only when they change.
pub type VfrRecorder = PumpedRecorder<VfrJob>;

/// A start/pause/dispose-able capture unit.
pub trait Recorder: Send {
    /// Begin or resume pumping.
    fn start(&mut self) -> CaptureResult<()>;

    /// Halt pumping without releasing anything.
    fn pause(&mut self) -> CaptureResult<()>;

    /// Stop pumping, flush and close the output, release providers.
    ///
    /// Blocks until the pump thread has exited. Idempotent.
    fn dispose(&mut self) -> CaptureResult<()>;
}

/// Channel end a recorder reports runtime faults through.
#[derive(Debug, Clone)]
pub struct FaultSender(mpsc::UnboundedSender<CaptureError>);

impl FaultSender {
    /// Report a fault to the session that owns the recorder.
    pub fn raise(&self, fault: CaptureError) {
        if fault.is_cancellation() {
            debug!("Recorder cancelled");
        } else {
            error!(error = %fault, "Recorder fault");
        }

        if self.0.send(fault).is_err() {
            debug!("Fault receiver already gone");
        }
    }
}

/// Create a fault channel for one recorder.
pub fn fault_channel() -> (FaultSender, mpsc::UnboundedReceiver<CaptureError>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FaultSender(tx), rx)
}
