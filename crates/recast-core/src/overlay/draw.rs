use crate::{
    capture::{Frame, Point, Rect},
    overlay::{Anchor, Color},
};

use image::{Pixel, Rgba, imageops};

/// Distance kept between anchored decorations and the frame edge.
pub(crate) const EDGE_MARGIN: u32 = 12;

pub(crate) fn fill_rect(frame: &mut Frame, rect: Rect, color: Color) {
    let Some((x0, y0, x1, y1)) = rect.clip(frame.width(), frame.height()) else {
        return;
    };
    let paint = Rgba(color);

    for y in y0..y1 {
        for x in x0..x1 {
            frame.get_pixel_mut(x, y).blend(&paint);
        }
    }
}

pub(crate) fn fill_circle(frame: &mut Frame, center: Point, radius: u32, color: Color) {
    let r = i64::from(radius);
    let bounds = Rect::new(
        center.x.saturating_sub(radius as i32),
        center.y.saturating_sub(radius as i32),
        radius * 2 + 1,
        radius * 2 + 1,
    );
    let Some((x0, y0, x1, y1)) = bounds.clip(frame.width(), frame.height()) else {
        return;
    };
    let paint = Rgba(color);

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = i64::from(x) - i64::from(center.x);
            let dy = i64::from(y) - i64::from(center.y);
            if dx * dx + dy * dy <= r * r {
                frame.get_pixel_mut(x, y).blend(&paint);
            }
        }
    }
}

/// Alpha-blend `tile` onto `frame` with its top-left at `(x, y)`.
pub(crate) fn blit(frame: &mut Frame, tile: &Frame, x: i64, y: i64) {
    imageops::overlay(frame, tile, x, y);
}

/// Top-left position for a `tile_w` x `tile_h` tile pinned to `anchor`.
pub(crate) fn anchored(frame: &Frame, tile_w: u32, tile_h: u32, anchor: Anchor) -> (i64, i64) {
    let margin = i64::from(EDGE_MARGIN);
    let right = i64::from(frame.width()) - i64::from(tile_w) - margin;
    let bottom = i64::from(frame.height()) - i64::from(tile_h) - margin;

    match anchor {
        Anchor::TopLeft => (margin, margin),
        Anchor::TopRight => (right, margin),
        Anchor::BottomLeft => (margin, bottom),
        Anchor::BottomRight => (right, bottom),
    }
}
