//! MP4 output through an external `ffmpeg` process.
//!
//! Raw RGBA frames are piped to ffmpeg's stdin. When audio is attached the
//! video goes to a sibling `.part.mp4`, the samples to a sibling `.part.wav`,
//! and `dispose` muxes both into the final file.

use crate::backend::wav_target::WavFileWriter;

use recast_core::{
    CaptureError, CaptureResult,
    capture::{AudioChunk, Frame},
    writer::{
        AudioFileWriter, EncoderProbe, ExternalEncoder, VideoFileWriter, VideoWriterArgs,
        WriterCapabilities, WriterKind,
    },
};

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
    time::Duration,
};

use tracing::{debug, info, instrument, warn};

const FFMPEG: &str = "ffmpeg";

const CAPABILITIES: WriterCapabilities = WriterCapabilities {
    required_encoder: Some(ExternalEncoder::FFmpeg),
    carries_audio: true,
    variable_frame_rate: false,
};

/// Map 1-100 quality onto an x264 CRF (18 best, 51 worst).
pub(crate) fn crf(quality: u8) -> u8 {
    let quality = quality.clamp(1, 100);
    51 - (u16::from(quality) * 33 / 100) as u8
}

/// Map 1-100 quality onto an AAC bitrate in kbit/s.
pub(crate) fn audio_bitrate_kbps(quality: u8) -> u32 {
    64 + u32::from(quality.clamp(1, 100)) * 256 / 100
}

fn part_path(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(format!("part.{extension}"))
}

/// Checks for `ffmpeg` on the PATH.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandProbe;

impl EncoderProbe for CommandProbe {
    fn is_available(&self, encoder: ExternalEncoder) -> bool {
        let program = match encoder {
            ExternalEncoder::FFmpeg => FFMPEG,
        };
        let available = Command::new(program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success());

        debug!(%encoder, available, "Probed external encoder");
        available
    }
}

/// H.264 MP4 via ffmpeg.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegWriterKind;

impl WriterKind for FfmpegWriterKind {
    fn name(&self) -> &str {
        "MP4 (FFmpeg)"
    }

    fn extension(&self) -> &str {
        ".mp4"
    }

    fn capabilities(&self) -> WriterCapabilities {
        CAPABILITIES
    }

    #[instrument(skip(self))]
    fn create(&self, args: VideoWriterArgs) -> CaptureResult<Box<dyn VideoFileWriter>> {
        Ok(Box::new(FfmpegWriter::spawn(FFMPEG, args)?))
    }
}

struct AudioTrack {
    writer: WavFileWriter,
    wav_path: PathBuf,
    video_path: PathBuf,
}

impl AudioTrack {
    /// Close and delete the partial WAV of an encode that never started.
    fn discard(self) {
        let Self {
            writer, wav_path, ..
        } = self;
        drop(writer);
        match fs::remove_file(&wav_path) {
            Ok(()) => debug!(path = ?wav_path, "Removed unused audio part"),
            Err(e) => warn!(path = ?wav_path, error = %e, "Failed to remove unused audio part"),
        }
    }
}

/// A running ffmpeg encode.
pub struct FfmpegWriter {
    process: Option<(Child, ChildStdin)>,
    output: PathBuf,
    audio: Option<AudioTrack>,
    audio_quality: u8,
    frames: u64,
}

impl FfmpegWriter {
    /// Start `program` as the encoder. Nothing is left on disk when it fails
    /// to start.
    pub(crate) fn spawn(program: &str, args: VideoWriterArgs) -> CaptureResult<Self> {
        let (video_path, audio) = match args.audio_format {
            Some(format) => {
                let wav_path = part_path(&args.path, "wav");
                let video_path = part_path(&args.path, "mp4");
                let writer = WavFileWriter::create(&wav_path, format)?;
                (
                    video_path.clone(),
                    Some(AudioTrack {
                        writer,
                        wav_path,
                        video_path,
                    }),
                )
            }
            None => (args.path.clone(), None),
        };

        let spawned = Command::new(program)
            .args(["-y", "-loglevel", "error"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgba"])
            .arg("-s")
            .arg(format!("{}x{}", args.width, args.height))
            .arg("-r")
            .arg(args.frame_rate.max(1).to_string())
            .args(["-i", "-"])
            .args(["-c:v", "libx264", "-preset", "veryfast"])
            .arg("-crf")
            .arg(crf(args.video_quality).to_string())
            .args(["-pix_fmt", "yuv420p"])
            // odd sizes are rejected by yuv420p
            .args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"])
            .arg(&video_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn();

        let mut process = match spawned {
            Ok(process) => process,
            Err(e) => {
                if let Some(track) = audio {
                    track.discard();
                }
                return Err(CaptureError::encode(format!(
                    "Failed to start {program}: {e}"
                )));
            }
        };

        let Some(stdin) = process.stdin.take() else {
            if let Err(e) = process.kill() {
                warn!(error = %e, "Failed to stop ffmpeg without stdin");
            }
            if let Some(track) = audio {
                track.discard();
            }
            return Err(CaptureError::encode("Failed to capture ffmpeg stdin"));
        };

        info!(path = ?args.path, with_audio = audio.is_some(), "FFmpeg writer started");

        Ok(Self {
            process: Some((process, stdin)),
            output: args.path,
            audio,
            audio_quality: args.audio_quality,
            frames: 0,
        })
    }

    fn finish_video(&mut self) -> CaptureResult<()> {
        let Some((process, stdin)) = self.process.take() else {
            return Ok(());
        };
        // EOF tells ffmpeg to finish the file
        drop(stdin);

        let output = process
            .wait_with_output()
            .map_err(|e| CaptureError::encode(format!("Failed to wait for ffmpeg: {}", e)))?;

        if !output.status.success() {
            return Err(CaptureError::encode(format!(
                "ffmpeg exited with error: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        debug!(frames = self.frames, "FFmpeg video encode finished");
        Ok(())
    }

    fn mux(&self, track: &AudioTrack) -> CaptureResult<()> {
        let output = Command::new(FFMPEG)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(&track.video_path)
            .arg("-i")
            .arg(&track.wav_path)
            .args(["-c:v", "copy", "-c:a", "aac"])
            .arg("-b:a")
            .arg(format!("{}k", audio_bitrate_kbps(self.audio_quality)))
            .arg("-shortest")
            .arg(&self.output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| CaptureError::encode(format!("Failed to start ffmpeg mux: {}", e)))?;

        if !output.status.success() {
            return Err(CaptureError::encode(format!(
                "ffmpeg mux failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        for part in [&track.video_path, &track.wav_path] {
            if let Err(e) = fs::remove_file(part) {
                warn!(path = ?part, error = %e, "Failed to remove intermediate file");
            }
        }
        Ok(())
    }
}

impl VideoFileWriter for FfmpegWriter {
    fn capabilities(&self) -> WriterCapabilities {
        CAPABILITIES
    }

    fn write_frame(&mut self, frame: &Frame, _duration: Duration) -> CaptureResult<()> {
        let Some((_, stdin)) = self.process.as_mut() else {
            return Err(CaptureError::encode("FFmpeg writer already disposed"));
        };

        stdin
            .write_all(frame.as_raw())
            .map_err(|e| CaptureError::encode(format!("Failed to pipe frame: {}", e)))?;
        self.frames += 1;

        Ok(())
    }

    fn write_audio(&mut self, chunk: &AudioChunk) -> CaptureResult<()> {
        match self.audio.as_mut() {
            Some(track) => track.writer.write(chunk),
            None => Ok(()),
        }
    }

    #[instrument(skip(self))]
    fn dispose(&mut self) -> CaptureResult<()> {
        if self.process.is_none() && self.audio.is_none() {
            return Ok(());
        }

        let video = self.finish_video();

        let Some(mut track) = self.audio.take() else {
            return video;
        };
        track.writer.dispose()?;
        video?;
        self.mux(&track)?;

        info!(path = ?self.output, "FFmpeg output muxed");
        Ok(())
    }
}

impl Drop for FfmpegWriter {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            warn!(error = %e, "FFmpeg writer dropped without a clean dispose");
        }
    }
}
