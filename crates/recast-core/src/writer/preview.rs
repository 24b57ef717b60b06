use crate::{
    CaptureResult,
    capture::{AudioChunk, Frame},
    writer::{VideoFileWriter, WriterCapabilities},
};

use std::{sync::Arc, time::Duration};

use tracing::debug;

/// Live preview of the frames being recorded.
pub trait PreviewSurface: Send + Sync {
    /// Prepare for frames of the given size.
    fn init(&self, width: u32, height: u32);

    /// Show a frame that was just written.
    fn show(&self, frame: &Frame);
}

/// Mirrors every written frame to a [`PreviewSurface`].
///
/// Same contract as the wrapped writer; capabilities and `dispose` are
/// forwarded to it.
pub struct PreviewWriter {
    inner: Box<dyn VideoFileWriter>,
    preview: Arc<dyn PreviewSurface>,
    disposed: bool,
}

impl PreviewWriter {
    /// Wrap `inner`, mirroring frames to `preview`.
    pub fn new(inner: Box<dyn VideoFileWriter>, preview: Arc<dyn PreviewSurface>) -> Self {
        Self {
            inner,
            preview,
            disposed: false,
        }
    }
}

impl VideoFileWriter for PreviewWriter {
    fn capabilities(&self) -> WriterCapabilities {
        self.inner.capabilities()
    }

    fn write_frame(&mut self, frame: &Frame, duration: Duration) -> CaptureResult<()> {
        self.inner.write_frame(frame, duration)?;
        self.preview.show(frame);
        Ok(())
    }

    fn write_audio(&mut self, chunk: &AudioChunk) -> CaptureResult<()> {
        self.inner.write_audio(chunk)
    }

    fn dispose(&mut self) -> CaptureResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        debug!("Disposing writer behind preview");
        self.inner.dispose()
    }
}
