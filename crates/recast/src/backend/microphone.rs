//! Default microphone capture through cpal.

use recast_core::{
    CaptureError, CaptureResult,
    capture::{AudioChunk, AudioProvider, AudioSource, WaveFormat},
};

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use tracing::{debug, error, info, instrument};

/// Samples kept between reads (10 seconds at 48kHz stereo). The recorder
/// drains every 50ms, so this only fills if the pump stalls.
pub(crate) const MAX_BUFFER_SAMPLES: usize = 48_000 * 2 * 10;

/// Opens the system default input device.
#[derive(Debug, Default, Clone, Copy)]
pub struct MicrophoneSource;

impl AudioSource for MicrophoneSource {
    #[instrument(skip(self))]
    fn audio_provider(&self, _frame_rate: u32) -> CaptureResult<Box<dyn AudioProvider>> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::device("No microphone found"))?;

        let config = device
            .default_input_config()
            .map_err(|e| CaptureError::device(format!("Failed to get config: {}", e)))?;
        let config: StreamConfig = config.into();

        info!(
            sample_rate = config.sample_rate,
            channels = config.channels,
            "Microphone opened"
        );

        Ok(Box::new(MicrophoneProvider {
            device,
            config,
            stream: None,
            samples: Arc::new(Mutex::new(VecDeque::new())),
            shutdown: Arc::new(AtomicBool::new(false)),
        }))
    }
}

/// Buffers microphone samples while started.
pub struct MicrophoneProvider {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    samples: Arc<Mutex<VecDeque<f32>>>,
    // Set before the stream is dropped so a late callback writes nothing.
    shutdown: Arc<AtomicBool>,
}

impl AudioProvider for MicrophoneProvider {
    fn wave_format(&self) -> WaveFormat {
        WaveFormat {
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
        }
    }

    #[instrument(skip(self))]
    fn start(&mut self) -> CaptureResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let samples = Arc::clone(&self.samples);
        let shutdown = Arc::clone(&self.shutdown);
        self.shutdown.store(false, Ordering::Release);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    let mut buf = samples.lock().unwrap_or_else(|e| {
                        error!("Sample buffer lock poisoned, recovering: {}", e);
                        e.into_inner()
                    });
                    buf.extend(data.iter().copied());
                    while buf.len() > MAX_BUFFER_SAMPLES {
                        buf.pop_front();
                    }
                },
                |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| CaptureError::device(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| CaptureError::device(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        debug!("Microphone stream started");

        Ok(())
    }

    #[instrument(skip(self))]
    fn stop(&mut self) -> CaptureResult<()> {
        self.shutdown.store(true, Ordering::Release);

        if let Some(stream) = self.stream.take() {
            drop(stream);
            debug!("Microphone stream stopped");
        }

        Ok(())
    }

    fn read(&mut self) -> CaptureResult<AudioChunk> {
        let mut buf = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        Ok(AudioChunk::new(buf.drain(..).collect()))
    }
}
