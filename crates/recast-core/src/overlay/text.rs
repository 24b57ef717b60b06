use crate::{
    capture::{Frame, PointTransform},
    overlay::{Color, Overlay, TextOverlaySettings, draw},
};

use std::sync::Arc;

use image::Rgba;

/// Renders overlay text into an RGBA tile.
pub trait TextRenderer: Send + Sync {
    /// Render `text` at `scale` in `color` on a translucent backdrop.
    fn render(&self, text: &str, scale: u32, color: Color) -> Frame;
}

const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;
const BACKDROP: Rgba<u8> = Rgba([0, 0, 0, 160]);

/// Built-in 3x5 block font covering digits, `:`, `.` and space.
///
/// Enough for the elapsed caption. Unknown characters render as blank cells,
/// so hosts that want full text inject their own [`TextRenderer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitFont;

impl DigitFont {
    fn glyph(c: char) -> [u8; 5] {
        match c {
            '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
            '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
            '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
            '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
            '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
            '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
            '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
            '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
            '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
            '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
            ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
            '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
            _ => [0; 5],
        }
    }
}

impl TextRenderer for DigitFont {
    fn render(&self, text: &str, scale: u32, color: Color) -> Frame {
        let scale = scale.max(1);
        let cells = text.chars().count() as u32;
        // one column of spacing between glyphs, one cell of padding around
        let width = (cells * (GLYPH_W + 1) + 1) * scale;
        let height = (GLYPH_H + 2) * scale;
        let mut tile = Frame::from_pixel(width, height, BACKDROP);
        let ink = Rgba(color);

        for (i, c) in text.chars().enumerate() {
            let left = (1 + i as u32 * (GLYPH_W + 1)) * scale;
            for (row, bits) in Self::glyph(c).iter().enumerate() {
                for col in 0..GLYPH_W {
                    if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                        continue;
                    }
                    let x = left + col * scale;
                    let y = (1 + row as u32) * scale;
                    for dy in 0..scale {
                        for dx in 0..scale {
                            tile.put_pixel(x + dx, y + dy, ink);
                        }
                    }
                }
            }
        }

        tile
    }
}

/// Fixed caption at a user-chosen position.
pub struct TextOverlay {
    tile: Frame,
    x: i64,
    y: i64,
}

impl TextOverlay {
    /// Pre-render the caption described by `settings`.
    pub fn new(settings: &TextOverlaySettings, renderer: &Arc<dyn TextRenderer>) -> Self {
        Self {
            tile: renderer.render(&settings.text, settings.scale, settings.color),
            x: i64::from(settings.x),
            y: i64::from(settings.y),
        }
    }
}

impl Overlay for TextOverlay {
    fn name(&self) -> &'static str {
        "custom-text"
    }

    fn draw(&mut self, frame: &mut Frame, _transform: &PointTransform) {
        draw::blit(frame, &self.tile, self.x, self.y);
    }
}
