//! File writer capabilities.
//!
//! Writers are chosen per video-source-kind. The orchestrator never inspects
//! concrete writer types; it asks each family for its [`WriterCapabilities`].

mod preview;

pub use preview::{PreviewSurface, PreviewWriter};

use crate::{
    CaptureResult,
    capture::{AudioChunk, Frame, WaveFormat},
};

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// External encoder binaries some writer families depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExternalEncoder {
    /// The `ffmpeg` executable.
    FFmpeg,
}

impl std::fmt::Display for ExternalEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExternalEncoder::FFmpeg => write!(f, "FFmpeg"),
        }
    }
}

/// Checks whether external encoders are installed.
pub trait EncoderProbe: Send + Sync {
    /// True when `encoder` can be launched.
    fn is_available(&self, encoder: ExternalEncoder) -> bool;
}

/// What a writer family can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriterCapabilities {
    /// External encoder that must be present before recording.
    pub required_encoder: Option<ExternalEncoder>,
    /// Whether an audio track can be muxed in.
    pub carries_audio: bool,
    /// Whether frames may have individual display durations.
    pub variable_frame_rate: bool,
}

/// Parameters for creating a video writer.
#[derive(Debug, Clone)]
pub struct VideoWriterArgs {
    /// Output file path.
    pub path: PathBuf,
    /// Nominal frames per second.
    pub frame_rate: u32,
    /// Video quality, 1-100.
    pub video_quality: u8,
    /// Audio quality, 1-100.
    pub audio_quality: u8,
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// Audio layout when an audio provider is attached.
    pub audio_format: Option<WaveFormat>,
}

/// Sink for composited frames and optional audio.
pub trait VideoFileWriter: Send {
    /// Capabilities of this writer instance.
    fn capabilities(&self) -> WriterCapabilities;

    /// Append a frame that stays on screen for `duration`.
    fn write_frame(&mut self, frame: &Frame, duration: Duration) -> CaptureResult<()>;

    /// Append audio. Writers that cannot carry audio ignore it.
    fn write_audio(&mut self, _chunk: &AudioChunk) -> CaptureResult<()> {
        Ok(())
    }

    /// Flush and close the output. A second call is a no-op.
    fn dispose(&mut self) -> CaptureResult<()>;
}

/// Sink for audio-only sessions.
pub trait AudioFileWriter: Send {
    /// Append audio samples.
    fn write(&mut self, chunk: &AudioChunk) -> CaptureResult<()>;

    /// Flush and close the output. A second call is a no-op.
    fn dispose(&mut self) -> CaptureResult<()>;
}

/// A selectable video writer family (GIF, FFmpeg, ...).
pub trait WriterKind: Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    /// Container extension including the dot; empty for non-file output.
    fn extension(&self) -> &str;

    /// Family capabilities, queried before any resource is allocated.
    fn capabilities(&self) -> WriterCapabilities;

    /// Open a writer for one session.
    fn create(&self, args: VideoWriterArgs) -> CaptureResult<Box<dyn VideoFileWriter>>;
}

/// A selectable audio-only writer family (WAV, ...).
pub trait AudioTarget: Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    /// Container extension including the dot.
    fn extension(&self) -> &str;

    /// External encoder that must be present before recording.
    fn required_encoder(&self) -> Option<ExternalEncoder> {
        None
    }

    /// Open a writer for one session.
    fn create(
        &self,
        path: &Path,
        format: WaveFormat,
        quality: u8,
    ) -> CaptureResult<Box<dyn AudioFileWriter>>;
}
