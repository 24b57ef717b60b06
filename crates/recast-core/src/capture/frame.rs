use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A captured RGBA video frame.
pub type Frame = image::RgbaImage;

/// Maps screen coordinates into frame coordinates for a capture source.
pub type PointTransform = Arc<dyn Fn(Point) -> Point + Send + Sync>;

/// Transform for sources whose frame origin is the screen origin.
pub fn identity_transform() -> PointTransform {
    Arc::new(|p| p)
}

/// A pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal offset in pixels.
    pub x: i32,
    /// Vertical offset in pixels.
    pub y: i32,
}

impl Point {
    /// Create a point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a rectangle.
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clip against a `width` x `height` frame, returning pixel bounds as
    /// `(x0, y0, x1, y1)` with exclusive ends, or `None` when fully outside.
    pub fn clip(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = i64::from(self.x).max(0);
        let y0 = i64::from(self.y).max(0);
        let x1 = (i64::from(self.x) + i64::from(self.width)).min(i64::from(width));
        let y1 = (i64::from(self.y) + i64::from(self.height)).min(i64::from(height));

        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

/// PCM layout produced by an audio provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveFormat {
    /// Samples per second.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

/// A block of interleaved `f32` samples in the provider's [`WaveFormat`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioChunk {
    /// Interleaved samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
}

impl AudioChunk {
    /// Wrap raw samples.
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    /// True when the chunk carries no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
