use recast_core::{
    CaptureError, CaptureResult,
    capture::{AudioChunk, WaveFormat},
    writer::{AudioFileWriter, AudioTarget},
};

use std::{fs::File, io::BufWriter, path::Path};

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{debug, info, instrument};

const BITS_PER_SAMPLE: u16 = 16;

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

/// 16-bit PCM WAV files. Quality has no effect on uncompressed output.
#[derive(Debug, Default, Clone, Copy)]
pub struct WavTarget;

impl AudioTarget for WavTarget {
    fn name(&self) -> &str {
        "WAV"
    }

    fn extension(&self) -> &str {
        ".wav"
    }

    #[instrument(skip(self))]
    fn create(
        &self,
        path: &Path,
        format: WaveFormat,
        _quality: u8,
    ) -> CaptureResult<Box<dyn AudioFileWriter>> {
        Ok(Box::new(WavFileWriter::create(path, format)?))
    }
}

/// Streams samples into a WAV file; the header is fixed up on dispose.
pub struct WavFileWriter {
    writer: Option<WavWriter<BufWriter<File>>>,
    samples_written: u64,
}

impl WavFileWriter {
    /// Create (truncate) `path`.
    pub fn create(path: &Path, format: WaveFormat) -> CaptureResult<Self> {
        let spec = WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        };

        let writer = WavWriter::create(path, spec)
            .map_err(|e| CaptureError::encode(format!("Failed to create WAV writer: {}", e)))?;

        debug!(path = ?path, sample_rate = format.sample_rate, "WAV file created");

        Ok(Self {
            writer: Some(writer),
            samples_written: 0,
        })
    }
}

impl AudioFileWriter for WavFileWriter {
    fn write(&mut self, chunk: &AudioChunk) -> CaptureResult<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(CaptureError::encode("WAV writer already finalized"));
        };

        for &sample in &chunk.samples {
            writer
                .write_sample(to_i16(sample))
                .map_err(|e| CaptureError::encode(format!("Failed to write sample: {}", e)))?;
        }
        self.samples_written += chunk.samples.len() as u64;

        Ok(())
    }

    #[instrument(skip(self))]
    fn dispose(&mut self) -> CaptureResult<()> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };

        writer
            .finalize()
            .map_err(|e| CaptureError::encode(format!("Failed to finalize WAV: {}", e)))?;

        info!(samples = self.samples_written, "WAV file finalized");
        Ok(())
    }
}
