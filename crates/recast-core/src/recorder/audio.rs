use crate::{
    CaptureResult,
    capture::AudioProvider,
    recorder::PumpJob,
    writer::AudioFileWriter,
};

use std::time::Duration;

const POLL: Duration = Duration::from_millis(50);

/// Moves buffered samples from an audio provider into an audio file.
pub struct AudioJob {
    audio: Box<dyn AudioProvider>,
    writer: Box<dyn AudioFileWriter>,
}

impl AudioJob {
    /// Pump `audio` into `writer`.
    pub fn new(audio: Box<dyn AudioProvider>, writer: Box<dyn AudioFileWriter>) -> Self {
        Self { audio, writer }
    }

    fn drain(&mut self) -> CaptureResult<()> {
        let chunk = self.audio.read()?;
        if !chunk.is_empty() {
            self.writer.write(&chunk)?;
        }
        Ok(())
    }
}

impl PumpJob for AudioJob {
    fn thread_name(&self) -> &'static str {
        "recast-audio-pump"
    }

    fn resume(&mut self) -> CaptureResult<()> {
        self.audio.start()
    }

    fn step(&mut self) -> CaptureResult<Duration> {
        self.drain()?;
        Ok(POLL)
    }

    fn suspend(&mut self) -> CaptureResult<()> {
        self.audio.stop()?;
        self.drain()
    }

    fn finish(self) -> CaptureResult<()> {
        let Self { audio, mut writer } = self;
        drop(audio);
        writer.dispose()
    }
}
