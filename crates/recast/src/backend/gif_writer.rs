use recast_core::{
    CaptureError, CaptureResult,
    capture::Frame,
    writer::{VideoFileWriter, VideoWriterArgs, WriterCapabilities, WriterKind},
};

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use image::{
    Delay,
    codecs::gif::{GifEncoder, Repeat},
};
use tracing::{debug, info, instrument};

const CAPABILITIES: WriterCapabilities = WriterCapabilities {
    required_encoder: None,
    carries_audio: false,
    variable_frame_rate: true,
};

/// Map 1-100 quality onto the quantizer speed (1 best, 30 fastest).
pub(crate) fn gif_speed(quality: u8) -> i32 {
    let quality = i32::from(quality.clamp(1, 100));
    1 + (100 - quality) * 29 / 100
}

struct Sink {
    file: BufWriter<File>,
    failed: Option<String>,
}

/// File handle shared with the encoder.
///
/// The encoder writes its trailer on drop and swallows errors there, so the
/// sink keeps the first failure and `dispose` flushes it explicitly.
#[derive(Clone)]
struct SharedSink(Arc<Mutex<Sink>>);

impl SharedSink {
    fn new(file: File) -> Self {
        Self(Arc::new(Mutex::new(Sink {
            file: BufWriter::new(file),
            failed: None,
        })))
    }

    fn lock(&self) -> MutexGuard<'_, Sink> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flush to disk, reporting any write the encoder could not.
    fn finish(&self) -> CaptureResult<()> {
        let mut sink = self.lock();
        if let Some(reason) = sink.failed.take() {
            return Err(CaptureError::encode(format!("Failed to write GIF: {reason}")));
        }
        sink.file.flush()?;
        sink.file.get_ref().sync_all()?;
        Ok(())
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut sink = self.lock();
        sink.file.write(buf).inspect_err(|e| {
            sink.failed.get_or_insert_with(|| e.to_string());
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut sink = self.lock();
        sink.file.flush().inspect_err(|e| {
            sink.failed.get_or_insert_with(|| e.to_string());
        })
    }
}

/// Animated GIF output, encoded in-process.
#[derive(Debug, Default, Clone, Copy)]
pub struct GifWriterKind;

impl WriterKind for GifWriterKind {
    fn name(&self) -> &str {
        "GIF"
    }

    fn extension(&self) -> &str {
        ".gif"
    }

    fn capabilities(&self) -> WriterCapabilities {
        CAPABILITIES
    }

    #[instrument(skip(self))]
    fn create(&self, args: VideoWriterArgs) -> CaptureResult<Box<dyn VideoFileWriter>> {
        let sink = SharedSink::new(File::create(&args.path)?);
        let mut encoder = GifEncoder::new_with_speed(sink.clone(), gif_speed(args.video_quality));
        encoder.set_repeat(Repeat::Infinite)?;

        info!(path = ?args.path, width = args.width, height = args.height, "GIF writer created");

        Ok(Box::new(GifWriter {
            encoder: Some(encoder),
            sink,
            frames: 0,
        }))
    }
}

/// Writes each frame with its own display duration.
pub struct GifWriter {
    encoder: Option<GifEncoder<SharedSink>>,
    sink: SharedSink,
    frames: u64,
}

impl VideoFileWriter for GifWriter {
    fn capabilities(&self) -> WriterCapabilities {
        CAPABILITIES
    }

    fn write_frame(&mut self, frame: &Frame, duration: Duration) -> CaptureResult<()> {
        let Some(encoder) = self.encoder.as_mut() else {
            return Err(CaptureError::encode("GIF writer already disposed"));
        };

        let delay = Delay::from_saturating_duration(duration);
        encoder.encode_frame(image::Frame::from_parts(frame.clone(), 0, 0, delay))?;
        self.frames += 1;

        Ok(())
    }

    #[instrument(skip(self))]
    fn dispose(&mut self) -> CaptureResult<()> {
        let Some(encoder) = self.encoder.take() else {
            return Ok(());
        };
        // writes the trailer into the sink
        drop(encoder);
        self.sink.finish()?;

        debug!(frames = self.frames, "GIF writer closed");
        Ok(())
    }
}
