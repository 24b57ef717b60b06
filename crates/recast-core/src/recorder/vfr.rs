use crate::{
    CaptureResult,
    capture::{Frame, ImageProvider},
    recorder::PumpJob,
    writer::VideoFileWriter,
};

use std::{
    hash::{DefaultHasher, Hash, Hasher},
    time::{Duration, Instant},
};

use tracing::trace;

struct Held {
    frame: Frame,
    fingerprint: u64,
    since: Instant,
}

/// Writes a frame only once the source shows something different, giving it
/// a display duration equal to how long it stayed on screen.
pub struct VfrJob {
    images: Box<dyn ImageProvider>,
    writer: Box<dyn VideoFileWriter>,
    held: Option<Held>,
    poll: Duration,
}

impl VfrJob {
    /// Poll `images` at most `frame_rate` times per second.
    pub fn new(
        images: Box<dyn ImageProvider>,
        writer: Box<dyn VideoFileWriter>,
        frame_rate: u32,
    ) -> Self {
        Self {
            images,
            writer,
            held: None,
            poll: Duration::from_secs(1) / frame_rate.max(1),
        }
    }

    fn fingerprint(frame: &Frame) -> u64 {
        let mut hasher = DefaultHasher::new();
        frame.dimensions().hash(&mut hasher);
        frame.as_raw().hash(&mut hasher);
        hasher.finish()
    }

    fn flush(&mut self, now: Instant) -> CaptureResult<()> {
        if let Some(held) = self.held.take() {
            self.writer
                .write_frame(&held.frame, now.duration_since(held.since))?;
        }
        Ok(())
    }
}

impl PumpJob for VfrJob {
    fn thread_name(&self) -> &'static str {
        "recast-vfr-pump"
    }

    fn resume(&mut self) -> CaptureResult<()> {
        Ok(())
    }

    fn step(&mut self) -> CaptureResult<Duration> {
        let began = Instant::now();
        let frame = self.images.capture()?;
        let fingerprint = Self::fingerprint(&frame);
        let now = Instant::now();

        if self
            .held
            .as_ref()
            .is_some_and(|held| held.fingerprint == fingerprint)
        {
            trace!("Frame unchanged");
        } else {
            self.flush(now)?;
            self.held = Some(Held {
                frame,
                fingerprint,
                since: now,
            });
        }

        Ok(self.poll.saturating_sub(began.elapsed()))
    }

    fn suspend(&mut self) -> CaptureResult<()> {
        // paused time must not stretch the held frame
        self.flush(Instant::now())
    }

    fn finish(mut self) -> CaptureResult<()> {
        self.flush(Instant::now())?;
        let Self {
            images, mut writer, ..
        } = self;
        drop(images);
        writer.dispose()
    }
}
