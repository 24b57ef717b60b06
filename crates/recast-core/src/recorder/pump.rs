use crate::{
    CaptureError, CaptureResult,
    recorder::{FaultSender, Recorder},
};

use std::{
    sync::{Arc, Condvar, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};

use tracing::{debug, info, instrument, warn};

/// Work a recorder pump performs between `start` and `dispose`.
pub trait PumpJob: Send + 'static {
    /// Name given to the pump thread.
    fn thread_name(&self) -> &'static str;

    /// Called each time pumping (re)starts.
    fn resume(&mut self) -> CaptureResult<()>;

    /// Pump one unit of work; returns how long to wait before the next one.
    fn step(&mut self) -> CaptureResult<Duration>;

    /// Called each time pumping halts (pause, fault or shutdown).
    fn suspend(&mut self) -> CaptureResult<()>;

    /// Flush and close the output, releasing every provider.
    fn finish(self) -> CaptureResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PumpState {
    Idle,
    Running,
    Shutdown,
}

struct PumpControl {
    state: Mutex<PumpState>,
    signal: Condvar,
}

impl PumpControl {
    fn new() -> Self {
        Self {
            state: Mutex::new(PumpState::Idle),
            signal: Condvar::new(),
        }
    }

    fn set(&self, next: PumpState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        // shutdown is terminal
        if *state != PumpState::Shutdown {
            *state = next;
        }
        self.signal.notify_all();
    }

    /// Blocks while idle; false once shut down.
    fn wait_runnable(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let state = self
            .signal
            .wait_while(state, |s| *s == PumpState::Idle)
            .unwrap_or_else(|e| e.into_inner());
        *state == PumpState::Running
    }

    /// Waits up to `timeout`, returning early when the state leaves `Running`.
    fn sleep(&self, timeout: Duration) -> PumpState {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let (state, _) = self
            .signal
            .wait_timeout_while(state, timeout, |s| *s == PumpState::Running)
            .unwrap_or_else(|e| e.into_inner());
        *state
    }
}

fn pump<J: PumpJob>(mut job: J, control: Arc<PumpControl>, faults: FaultSender) -> J {
    while control.wait_runnable() {
        match job.resume() {
            Ok(()) => loop {
                match job.step() {
                    Ok(wait) => {
                        if control.sleep(wait) != PumpState::Running {
                            break;
                        }
                    }
                    Err(e) => {
                        faults.raise(e);
                        control.set(PumpState::Idle);
                        break;
                    }
                }
            },
            Err(e) => {
                faults.raise(e);
                control.set(PumpState::Idle);
            }
        }

        if let Err(e) = job.suspend() {
            warn!(error = %e, "Failed to suspend recorder");
        }
    }

    debug!("Pump exiting");
    job
}

/// Drives a [`PumpJob`] on a dedicated thread.
pub struct PumpedRecorder<J: PumpJob> {
    job: Option<J>,
    thread: Option<JoinHandle<J>>,
    control: Arc<PumpControl>,
    faults: FaultSender,
    disposed: bool,
}

impl<J: PumpJob> PumpedRecorder<J> {
    /// Wrap `job`; runtime faults go to `faults`.
    pub fn new(job: J, faults: FaultSender) -> Self {
        Self {
            job: Some(job),
            thread: None,
            control: Arc::new(PumpControl::new()),
            faults,
            disposed: false,
        }
    }
}

impl<J: PumpJob> Recorder for PumpedRecorder<J> {
    #[instrument(skip(self))]
    fn start(&mut self) -> CaptureResult<()> {
        if self.disposed {
            return Err(CaptureError::device("Recorder already disposed"));
        }

        self.control.set(PumpState::Running);

        if let Some(job) = self.job.take() {
            let name = job.thread_name();
            let control = Arc::clone(&self.control);
            let faults = self.faults.clone();
            let handle = thread::Builder::new()
                .name(name.to_string())
                .spawn(move || pump(job, control, faults))?;
            self.thread = Some(handle);
            info!(thread = name, "Recorder pump started");
        }

        Ok(())
    }

    #[instrument(skip(self))]
    fn pause(&mut self) -> CaptureResult<()> {
        if !self.disposed {
            self.control.set(PumpState::Idle);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    fn dispose(&mut self) -> CaptureResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        self.control.set(PumpState::Shutdown);

        let job = match self.thread.take() {
            Some(handle) => Some(
                handle
                    .join()
                    .map_err(|_| CaptureError::device("Recorder pump panicked"))?,
            ),
            None => self.job.take(),
        };

        match job {
            Some(job) => {
                job.finish()?;
                info!("Recorder disposed");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<J: PumpJob> Drop for PumpedRecorder<J> {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            warn!(error = %e, "Recorder dropped without a clean dispose");
        }
    }
}
