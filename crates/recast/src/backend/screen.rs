//! Monitor, region and window capture through xcap.

use crate::backend::pointer::draw_cursor;

use recast_core::{
    CaptureError, CaptureResult,
    capture::{Frame, ImageProvider, OpenedSource, Point, Rect, SourceKind, VideoSource},
    overlay::PointerTracker,
};

use std::sync::Arc;

use image::imageops;
use tracing::{debug, info, instrument, warn};
use xcap::{Monitor, Window};

fn device_error(what: &str, e: impl std::fmt::Display) -> CaptureError {
    CaptureError::device(format!("{what}: {e}"))
}

// Screen-to-frame transform for a source whose top-left sits at `origin`.
fn offset_transform(origin: Point) -> recast_core::capture::PointTransform {
    Arc::new(move |p: Point| Point::new(p.x - origin.x, p.y - origin.y))
}

/// Scale `frame` to `width`x`height` unless it already has that size.
///
/// Writers need a fixed frame size; a monitor mode change or a resized
/// window is scaled back to the size the source was opened with.
pub(crate) fn fit_frame(frame: Frame, width: u32, height: u32) -> Frame {
    if frame.dimensions() == (width, height) {
        return frame;
    }
    imageops::resize(&frame, width, height, imageops::FilterType::Triangle)
}

/// Draws the pointer into frames whose top-left sits at `origin` on screen.
#[derive(Clone)]
struct CursorPainter {
    tracker: Arc<dyn PointerTracker>,
    origin: Point,
}

impl CursorPainter {
    fn paint(&self, frame: &mut Frame) {
        if let Some(at) = self.tracker.position() {
            draw_cursor(frame, Point::new(at.x - self.origin.x, at.y - self.origin.y));
        }
    }
}

fn cursor_painter(
    include_cursor: bool,
    tracker: &Option<Arc<dyn PointerTracker>>,
    origin: Point,
) -> Option<CursorPainter> {
    if !include_cursor {
        return None;
    }
    let painter = tracker.as_ref().map(|tracker| CursorPainter {
        tracker: Arc::clone(tracker),
        origin,
    });
    if painter.is_none() {
        debug!("No pointer tracker; cursor not drawn");
    }
    painter
}

#[instrument]
fn find_monitor(name: Option<&str>) -> CaptureResult<Monitor> {
    let monitors = Monitor::all().map_err(|e| device_error("Failed to list monitors", e))?;

    let found = match name {
        Some(wanted) => monitors
            .into_iter()
            .find(|m| m.name().is_ok_and(|n| n == wanted)),
        None => monitors
            .into_iter()
            .find(|m| m.is_primary().unwrap_or(false)),
    };

    found.ok_or_else(|| match name {
        Some(wanted) => CaptureError::device(format!("Monitor '{wanted}' not found")),
        None => CaptureError::device("No primary monitor found"),
    })
}

/// Frames of one monitor, optionally cropped to a region.
pub struct MonitorProvider {
    monitor: Monitor,
    crop: Option<Rect>,
    width: u32,
    height: u32,
    cursor: Option<CursorPainter>,
}

impl ImageProvider for MonitorProvider {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn capture(&mut self) -> CaptureResult<Frame> {
        let full = self
            .monitor
            .capture_image()
            .map_err(|e| device_error("Monitor capture failed", e))?;

        let captured = match self.crop {
            Some(rect) => {
                let x = rect.x.max(0) as u32;
                let y = rect.y.max(0) as u32;
                imageops::crop_imm(&full, x, y, self.width, self.height).to_image()
            }
            None => full,
        };

        let mut frame = fit_frame(captured, self.width, self.height);
        if let Some(cursor) = &self.cursor {
            cursor.paint(&mut frame);
        }
        Ok(frame)
    }
}

/// A whole monitor, or a region of it when `region` is set.
#[derive(Clone)]
pub struct MonitorSource {
    /// Monitor name; the primary monitor when absent.
    pub monitor: Option<String>,
    /// Region in monitor coordinates.
    pub region: Option<Rect>,
    /// Pointer position for `include_cursor`.
    pub pointer: Option<Arc<dyn PointerTracker>>,
}

impl VideoSource for MonitorSource {
    fn name(&self) -> &str {
        self.monitor.as_deref().unwrap_or("primary monitor")
    }

    fn kind(&self) -> SourceKind {
        if self.region.is_some() {
            SourceKind::Region
        } else {
            SourceKind::Screen
        }
    }

    #[instrument(skip(self), fields(source = self.name()))]
    fn open(&self, include_cursor: bool) -> CaptureResult<Option<OpenedSource>> {
        let monitor = find_monitor(self.monitor.as_deref())?;
        let x = monitor.x().map_err(|e| device_error("Monitor geometry", e))?;
        let y = monitor.y().map_err(|e| device_error("Monitor geometry", e))?;
        let width = monitor
            .width()
            .map_err(|e| device_error("Monitor geometry", e))?;
        let height = monitor
            .height()
            .map_err(|e| device_error("Monitor geometry", e))?;

        let (crop, origin, width, height) = match self.region {
            Some(region) => {
                let Some((x0, y0, x1, y1)) = region.clip(width, height) else {
                    return Err(CaptureError::device("Region lies outside the monitor"));
                };
                let crop = Rect::new(x0 as i32, y0 as i32, x1 - x0, y1 - y0);
                (
                    Some(crop),
                    Point::new(x + crop.x, y + crop.y),
                    crop.width,
                    crop.height,
                )
            }
            None => (None, Point::new(x, y), width, height),
        };

        info!(width, height, origin_x = origin.x, origin_y = origin.y, "Monitor opened");

        Ok(Some(OpenedSource {
            provider: Box::new(MonitorProvider {
                monitor,
                crop,
                width,
                height,
                cursor: cursor_painter(include_cursor, &self.pointer, origin),
            }),
            transform: offset_transform(origin),
        }))
    }
}

/// Frames of one top-level window.
pub struct WindowProvider {
    window: Window,
    width: u32,
    height: u32,
    cursor: Option<CursorPainter>,
}

impl ImageProvider for WindowProvider {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn capture(&mut self) -> CaptureResult<Frame> {
        let captured = self
            .window
            .capture_image()
            .map_err(|e| device_error("Window capture failed", e))?;

        let mut frame = fit_frame(captured, self.width, self.height);
        if let Some(cursor) = &self.cursor {
            cursor.paint(&mut frame);
        }
        Ok(frame)
    }
}

/// The first window whose title contains `title`.
#[derive(Clone)]
pub struct WindowSource {
    /// Case-insensitive title fragment.
    pub title: String,
    /// Pointer position for `include_cursor`.
    pub pointer: Option<Arc<dyn PointerTracker>>,
}

impl VideoSource for WindowSource {
    fn name(&self) -> &str {
        &self.title
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Window
    }

    #[instrument(skip(self), fields(source = self.name()))]
    fn open(&self, include_cursor: bool) -> CaptureResult<Option<OpenedSource>> {
        let wanted = self.title.to_lowercase();
        let windows = Window::all().map_err(|e| device_error("Failed to list windows", e))?;

        let Some(window) = windows.into_iter().find(|w| {
            w.title()
                .is_ok_and(|t| t.to_lowercase().contains(&wanted))
                && !w.is_minimized().unwrap_or(true)
        }) else {
            return Err(CaptureError::device(format!(
                "No visible window titled '{}'",
                self.title
            )));
        };

        let x = window.x().map_err(|e| device_error("Window geometry", e))?;
        let y = window.y().map_err(|e| device_error("Window geometry", e))?;
        let width = window
            .width()
            .map_err(|e| device_error("Window geometry", e))?;
        let height = window
            .height()
            .map_err(|e| device_error("Window geometry", e))?;

        info!(width, height, "Window opened");

        let origin = Point::new(x, y);
        Ok(Some(OpenedSource {
            provider: Box::new(WindowProvider {
                window,
                width,
                height,
                cursor: cursor_painter(include_cursor, &self.pointer, origin),
            }),
            transform: offset_transform(origin),
        }))
    }
}

/// Source kinds this host has no backend for. Opening always reports
/// `NotSupported`, which lets the orchestrator offer its fallback.
#[derive(Debug, Clone, Copy)]
pub struct UnsupportedSource(pub SourceKind);

impl VideoSource for UnsupportedSource {
    fn name(&self) -> &str {
        "unsupported"
    }

    fn kind(&self) -> SourceKind {
        self.0
    }

    fn open(&self, _include_cursor: bool) -> CaptureResult<Option<OpenedSource>> {
        warn!(kind = %self.0, "No capture backend for source kind");
        Err(CaptureError::not_supported(format!(
            "{} capture is not available on this system.",
            self.0
        )))
    }
}
