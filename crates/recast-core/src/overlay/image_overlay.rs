use crate::{
    CaptureResult,
    capture::{Frame, PointTransform},
    overlay::{ImageOverlaySettings, Overlay, draw},
};

use image::imageops::{self, FilterType};
use tracing::debug;

/// A user image stamped at a fixed position.
pub struct CustomImageOverlay {
    tile: Frame,
    x: i64,
    y: i64,
}

impl CustomImageOverlay {
    /// Load, resize and fade the image described by `settings`.
    ///
    /// Fails when the file cannot be read or decoded.
    pub fn new(settings: &ImageOverlaySettings) -> CaptureResult<Self> {
        let mut tile = image::open(&settings.path)?.into_rgba8();

        if let Some((width, height)) = settings.size {
            tile = imageops::resize(&tile, width.max(1), height.max(1), FilterType::Triangle);
        }

        let opacity = u16::from(settings.opacity.min(100));
        if opacity < 100 {
            for pixel in tile.pixels_mut() {
                pixel.0[3] = (u16::from(pixel.0[3]) * opacity / 100) as u8;
            }
        }

        debug!(
            path = %settings.path.display(),
            width = tile.width(),
            height = tile.height(),
            "Loaded image overlay"
        );

        Ok(Self {
            tile,
            x: i64::from(settings.x),
            y: i64::from(settings.y),
        })
    }
}

impl Overlay for CustomImageOverlay {
    fn name(&self) -> &'static str {
        "custom-image"
    }

    fn draw(&mut self, frame: &mut Frame, _transform: &PointTransform) {
        draw::blit(frame, &self.tile, self.x, self.y);
    }
}
