use crate::{
    CaptureResult,
    capture::{Frame, ImageProvider, PointTransform},
    overlay::{Anchor, Overlay, draw},
};

use image::imageops::{self, FilterType};
use tracing::warn;

/// Builds the source-specific overlay (e.g. a webcam inset) for a session.
pub trait OverlayFactory: Send + Sync {
    /// Create the overlay; failures are logged and the overlay is skipped.
    fn create(&self) -> CaptureResult<Box<dyn Overlay>>;
}

/// Insets a second image provider (typically a camera) into a corner.
pub struct PictureInPictureOverlay {
    provider: Box<dyn ImageProvider>,
    scale_percent: u32,
    anchor: Anchor,
    warned: bool,
}

impl PictureInPictureOverlay {
    /// Inset `provider` at `scale_percent` of the frame width.
    pub fn new(provider: Box<dyn ImageProvider>, scale_percent: u32, anchor: Anchor) -> Self {
        Self {
            provider,
            scale_percent: scale_percent.clamp(1, 100),
            anchor,
            warned: false,
        }
    }
}

impl Overlay for PictureInPictureOverlay {
    fn name(&self) -> &'static str {
        "picture-in-picture"
    }

    fn draw(&mut self, frame: &mut Frame, _transform: &PointTransform) {
        let inset = match self.provider.capture() {
            Ok(inset) => inset,
            Err(e) => {
                // a camera that stops delivering would flood the log otherwise
                if !self.warned {
                    warn!(error = %e, "Picture-in-picture source failed, skipping inset");
                    self.warned = true;
                }
                return;
            }
        };
        if inset.width() == 0 || inset.height() == 0 {
            return;
        }

        let width = (frame.width() * self.scale_percent / 100).max(1);
        let height = (u64::from(inset.height()) * u64::from(width) / u64::from(inset.width()))
            .max(1) as u32;
        let scaled = imageops::resize(&inset, width, height, FilterType::Triangle);

        let (x, y) = draw::anchored(frame, width, height, self.anchor);
        draw::blit(frame, &scaled, x, y);
    }
}
