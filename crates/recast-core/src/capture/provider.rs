use crate::{
    CaptureResult,
    capture::{AudioChunk, Frame, WaveFormat},
};

use std::time::Duration;

/// Source of video frames. Device resources are released on drop.
pub trait ImageProvider: Send {
    /// Frame width in pixels.
    fn width(&self) -> u32;

    /// Frame height in pixels.
    fn height(&self) -> u32;

    /// Capture the next frame.
    fn capture(&mut self) -> CaptureResult<Frame>;

    /// Cap how long `capture` may block waiting for new content.
    ///
    /// Returns `false` when the provider has no such wait.
    fn set_timeout(&mut self, _timeout: Duration) -> bool {
        false
    }
}

/// Source of audio samples. Device resources are released on drop.
pub trait AudioProvider: Send {
    /// Layout of the samples returned by [`AudioProvider::read`].
    fn wave_format(&self) -> WaveFormat;

    /// Begin buffering samples from the device.
    fn start(&mut self) -> CaptureResult<()>;

    /// Stop buffering samples; the device stays open.
    fn stop(&mut self) -> CaptureResult<()>;

    /// Drain whatever has been buffered since the last read.
    fn read(&mut self) -> CaptureResult<AudioChunk>;
}

/// Opens the user's selected audio devices for a session.
pub trait AudioSource: Send + Sync {
    /// Open a provider sized for the session's frame rate.
    fn audio_provider(&self, frame_rate: u32) -> CaptureResult<Box<dyn AudioProvider>>;
}
