//! Frame decorations composited before frames reach the writer.
//!
//! The chain order is fixed: censor, source-specific overlay, mouse pointer,
//! click/keystroke indicators, elapsed time, custom text, custom images.
//! Construction of each fallible overlay is an explicit `Result`; failures
//! are logged and the overlay is left out.

mod censor;
mod draw;
mod elapsed;
mod image_overlay;
mod input;
mod pip;
mod settings;
mod text;

pub use censor::CensorOverlay;
pub use elapsed::{ElapsedClock, ElapsedOverlay, format_elapsed};
pub use image_overlay::CustomImageOverlay;
pub use input::{InputEvent, InputHook, MouseKeyHookOverlay, MousePointerOverlay, PointerTracker};
pub use pip::{OverlayFactory, PictureInPictureOverlay};
pub use settings::{
    Anchor, CensorRegion, ClickSettings, Color, ElapsedSettings, ImageOverlaySettings,
    KeystrokeSettings, OverlaySettings, PointerSettings, TextOverlaySettings,
};
pub use text::{DigitFont, TextOverlay, TextRenderer};

use crate::{
    CaptureResult,
    capture::{Frame, ImageProvider, PointTransform},
};

use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

/// A decoration drawn onto every captured frame.
pub trait Overlay: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Draw onto `frame`. `transform` maps screen points into the frame.
    fn draw(&mut self, frame: &mut Frame, transform: &PointTransform);
}

/// Optional host capabilities the overlays draw on.
#[derive(Clone, Default)]
pub struct OverlayDeps {
    /// Builds the source-specific overlay.
    pub source_overlay: Option<Arc<dyn OverlayFactory>>,
    /// Pointer position for the pointer highlight.
    pub pointer: Option<Arc<dyn PointerTracker>>,
    /// Global input hook; without it there is no click/keystroke overlay.
    pub input_hook: Option<Arc<dyn InputHook>>,
    /// Text renderer; [`DigitFont`] when absent.
    pub text: Option<Arc<dyn TextRenderer>>,
}

/// Build the overlay chain for one session.
pub fn build_overlays(
    settings: &OverlaySettings,
    deps: &OverlayDeps,
    clock: &ElapsedClock,
) -> Vec<Box<dyn Overlay>> {
    let text: Arc<dyn TextRenderer> = deps.text.clone().unwrap_or_else(|| Arc::new(DigitFont));
    let mut overlays: Vec<Box<dyn Overlay>> =
        vec![Box::new(CensorOverlay::new(&settings.censored))];

    if let Some(factory) = &deps.source_overlay {
        push_fallible(&mut overlays, "source", factory.create());
    }

    overlays.push(Box::new(MousePointerOverlay::new(
        settings.pointer.clone(),
        deps.pointer.clone(),
    )));

    if let Some(hook) = &deps.input_hook {
        overlays.push(Box::new(MouseKeyHookOverlay::new(
            Arc::clone(hook),
            Arc::clone(&text),
            settings.clicks.clone(),
            settings.keystrokes.clone(),
        )));
    }

    overlays.push(Box::new(ElapsedOverlay::new(
        settings.elapsed.clone(),
        clock.clone(),
        Arc::clone(&text),
    )));

    for custom in settings.custom_text.iter().filter(|t| t.display) {
        overlays.push(Box::new(TextOverlay::new(custom, &text)));
    }

    for custom in settings.custom_images.iter().filter(|i| i.display) {
        let built = CustomImageOverlay::new(custom).map(|o| Box::new(o) as Box<dyn Overlay>);
        push_fallible(&mut overlays, "custom-image", built);
    }

    debug!(
        overlays = ?overlays.iter().map(|o| o.name()).collect::<Vec<_>>(),
        "Overlay chain built"
    );
    overlays
}

fn push_fallible(
    overlays: &mut Vec<Box<dyn Overlay>>,
    what: &str,
    built: CaptureResult<Box<dyn Overlay>>,
) {
    match built {
        Ok(overlay) => overlays.push(overlay),
        Err(e) => warn!(overlay = what, error = %e, "Skipping overlay that failed to build"),
    }
}

/// Image provider that applies an overlay chain to every captured frame.
pub struct OverlayedImageProvider {
    inner: Box<dyn ImageProvider>,
    transform: PointTransform,
    overlays: Vec<Box<dyn Overlay>>,
}

impl OverlayedImageProvider {
    /// Decorate frames from `inner` with `overlays`, in order.
    pub fn new(
        inner: Box<dyn ImageProvider>,
        transform: PointTransform,
        overlays: Vec<Box<dyn Overlay>>,
    ) -> Self {
        Self {
            inner,
            transform,
            overlays,
        }
    }
}

impl ImageProvider for OverlayedImageProvider {
    fn width(&self) -> u32 {
        self.inner.width()
    }

    fn height(&self) -> u32 {
        self.inner.height()
    }

    fn capture(&mut self) -> CaptureResult<Frame> {
        let mut frame = self.inner.capture()?;
        for overlay in &mut self.overlays {
            overlay.draw(&mut frame, &self.transform);
        }
        Ok(frame)
    }

    fn set_timeout(&mut self, timeout: Duration) -> bool {
        self.inner.set_timeout(timeout)
    }
}
