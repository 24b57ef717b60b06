use crate::capture::Rect;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// RGBA color as stored in settings.
pub type Color = [u8; 4];

/// Corner a decoration is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Top-left corner.
    #[default]
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    BottomRight,
}

/// A rectangle that is blacked out in every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CensorRegion {
    /// Whether the region is applied.
    #[serde(default = "enabled")]
    pub display: bool,
    /// Area to redact, in frame coordinates.
    pub rect: Rect,
}

/// Highlight drawn under the mouse pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerSettings {
    /// Whether the highlight is drawn.
    pub display: bool,
    /// Highlight radius in pixels.
    pub radius: u32,
    /// Highlight color.
    pub color: Color,
}

impl Default for PointerSettings {
    fn default() -> Self {
        Self {
            display: false,
            radius: 18,
            color: [255, 235, 59, 110],
        }
    }
}

/// Ripple drawn where the mouse was clicked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickSettings {
    /// Whether clicks are drawn.
    pub display: bool,
    /// Ripple radius in pixels.
    pub radius: u32,
    /// Ripple color.
    pub color: Color,
    /// How long a click stays visible.
    pub linger_ms: u64,
}

impl Default for ClickSettings {
    fn default() -> Self {
        Self {
            display: false,
            radius: 24,
            color: [33, 150, 243, 160],
            linger_ms: 350,
        }
    }
}

/// Caption of recently pressed keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystrokeSettings {
    /// Whether keystrokes are drawn.
    pub display: bool,
    /// Glyph scale factor.
    pub scale: u32,
    /// Text color.
    pub color: Color,
    /// How long the caption stays after the last key.
    pub linger_ms: u64,
    /// Corner the caption is pinned to.
    pub anchor: Anchor,
}

impl Default for KeystrokeSettings {
    fn default() -> Self {
        Self {
            display: false,
            scale: 4,
            color: [255, 255, 255, 255],
            linger_ms: 1500,
            anchor: Anchor::BottomLeft,
        }
    }
}

/// Running time caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElapsedSettings {
    /// Whether the caption is drawn.
    pub display: bool,
    /// Glyph scale factor.
    pub scale: u32,
    /// Text color.
    pub color: Color,
    /// Corner the caption is pinned to.
    pub anchor: Anchor,
}

impl Default for ElapsedSettings {
    fn default() -> Self {
        Self {
            display: false,
            scale: 4,
            color: [255, 255, 255, 255],
            anchor: Anchor::TopRight,
        }
    }
}

/// A user-defined text caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlaySettings {
    /// Whether the caption is drawn.
    #[serde(default = "enabled")]
    pub display: bool,
    /// Caption text.
    pub text: String,
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Glyph scale factor.
    #[serde(default = "default_scale")]
    pub scale: u32,
    /// Text color.
    #[serde(default = "white")]
    pub color: Color,
}

/// A user-defined image stamped onto every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageOverlaySettings {
    /// Whether the image is drawn.
    #[serde(default = "enabled")]
    pub display: bool,
    /// Image file to load.
    pub path: PathBuf,
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Optional target size; the image is resized when set.
    #[serde(default)]
    pub size: Option<(u32, u32)>,
    /// Opacity, 0-100.
    #[serde(default = "opaque")]
    pub opacity: u8,
}

/// Every decoration applied to recorded frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    /// Redacted regions.
    pub censored: Vec<CensorRegion>,
    /// Pointer highlight.
    pub pointer: PointerSettings,
    /// Click ripples.
    pub clicks: ClickSettings,
    /// Keystroke caption.
    pub keystrokes: KeystrokeSettings,
    /// Running time caption.
    pub elapsed: ElapsedSettings,
    /// Text captions.
    pub custom_text: Vec<TextOverlaySettings>,
    /// Image stamps.
    pub custom_images: Vec<ImageOverlaySettings>,
}

fn enabled() -> bool {
    true
}

fn default_scale() -> u32 {
    4
}

fn white() -> Color {
    [255, 255, 255, 255]
}

fn opaque() -> u8 {
    100
}
