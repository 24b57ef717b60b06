use crate::{
    CaptureResult,
    capture::{AudioProvider, ImageProvider},
    recorder::PumpJob,
    writer::VideoFileWriter,
};

use std::time::{Duration, Instant};

/// Captures frames at a fixed rate, muxing audio when a provider is attached.
///
/// The written timeline follows the wall clock of the running segments. A
/// capture slower than the frame interval repeats the frame until the
/// timeline catches up, so audio muxed alongside is never cut short.
pub struct FrameJob {
    images: Box<dyn ImageProvider>,
    writer: Box<dyn VideoFileWriter>,
    audio: Option<Box<dyn AudioProvider>>,
    interval: Duration,
    /// Media time written so far.
    written: Duration,
    /// Running time of the segments before the current one.
    ran: Duration,
    /// Start of the current running segment.
    segment: Option<Instant>,
}

impl FrameJob {
    /// Pump `images` (and `audio`) into `writer` at `frame_rate` fps.
    pub fn new(
        images: Box<dyn ImageProvider>,
        writer: Box<dyn VideoFileWriter>,
        audio: Option<Box<dyn AudioProvider>>,
        frame_rate: u32,
    ) -> Self {
        Self {
            images,
            writer,
            audio,
            interval: Duration::from_secs(1) / frame_rate.max(1),
            written: Duration::ZERO,
            ran: Duration::ZERO,
            segment: None,
        }
    }

    /// Wall time spent running, excluding pauses.
    fn running_time(&self) -> Duration {
        self.ran + self.segment.map(|at| at.elapsed()).unwrap_or_default()
    }

    fn drain_audio(&mut self) -> CaptureResult<()> {
        if let Some(audio) = self.audio.as_mut() {
            let chunk = audio.read()?;
            if !chunk.is_empty() {
                self.writer.write_audio(&chunk)?;
            }
        }
        Ok(())
    }
}

impl PumpJob for FrameJob {
    fn thread_name(&self) -> &'static str {
        "recast-frame-pump"
    }

    fn resume(&mut self) -> CaptureResult<()> {
        self.segment = Some(Instant::now());
        match self.audio.as_mut() {
            Some(audio) => audio.start(),
            None => Ok(()),
        }
    }

    fn step(&mut self) -> CaptureResult<Duration> {
        if self.segment.is_none() {
            self.segment = Some(Instant::now());
        }

        let frame = self.images.capture()?;

        // Each write covers one interval; repeat until the timeline passes now.
        let now = self.running_time();
        loop {
            self.writer.write_frame(&frame, self.interval)?;
            self.written += self.interval;
            if self.written > now {
                break;
            }
        }
        self.drain_audio()?;

        Ok(self.written.saturating_sub(self.running_time()))
    }

    fn suspend(&mut self) -> CaptureResult<()> {
        if let Some(at) = self.segment.take() {
            self.ran += at.elapsed();
        }
        if let Some(audio) = self.audio.as_mut() {
            audio.stop()?;
        }
        self.drain_audio()
    }

    fn finish(self) -> CaptureResult<()> {
        let Self {
            images,
            mut writer,
            audio,
            ..
        } = self;
        drop(images);
        drop(audio);
        writer.dispose()
    }
}
