use std::time::Duration;

use tokio::time::Instant;

/// Monotonic stopwatch that only advances while running.
///
/// Reads tokio's clock, so paused-time tests control it.
#[derive(Debug, Default)]
pub struct Stopwatch {
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl Stopwatch {
    /// Start or resume. No-op while running.
    pub fn start(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    /// Freeze the current reading.
    pub fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    /// Stop and zero.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.running_since = None;
    }

    /// Whether the stopwatch is advancing.
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Total running time.
    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.running_since.map_or(Duration::ZERO, |s| s.elapsed())
    }
}
