use crate::{
    capture::{Frame, Point, PointTransform},
    overlay::{ClickSettings, KeystrokeSettings, Overlay, PointerSettings, TextRenderer, draw},
};

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// Reports where the pointer currently is.
pub trait PointerTracker: Send + Sync {
    /// Pointer position in screen coordinates, if known.
    fn position(&self) -> Option<Point>;
}

/// A mouse or keyboard event observed by an [`InputHook`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A mouse button went down at a screen position.
    Click {
        /// Screen position of the click.
        at: Point,
    },
    /// A key was pressed.
    Key {
        /// Human readable key name.
        label: String,
    },
}

/// Global mouse/keyboard hook. Optional; the click and keystroke overlay is
/// only built when one is available.
pub trait InputHook: Send + Sync {
    /// Events observed since the previous call.
    fn drain(&self) -> Vec<InputEvent>;
}

/// Highlight under the pointer.
pub struct MousePointerOverlay {
    settings: PointerSettings,
    tracker: Option<Arc<dyn PointerTracker>>,
}

impl MousePointerOverlay {
    /// Highlight positions reported by `tracker`; draws nothing without one.
    pub fn new(settings: PointerSettings, tracker: Option<Arc<dyn PointerTracker>>) -> Self {
        Self { settings, tracker }
    }
}

impl Overlay for MousePointerOverlay {
    fn name(&self) -> &'static str {
        "mouse-pointer"
    }

    fn draw(&mut self, frame: &mut Frame, transform: &PointTransform) {
        if !self.settings.display {
            return;
        }
        let Some(position) = self.tracker.as_ref().and_then(|t| t.position()) else {
            return;
        };
        draw::fill_circle(
            frame,
            transform(position),
            self.settings.radius,
            self.settings.color,
        );
    }
}

// Keys pressed within the linger window are joined into one caption.
const MAX_CAPTION_CHARS: usize = 24;

/// Click ripples and a caption of recent keystrokes.
pub struct MouseKeyHookOverlay {
    hook: Arc<dyn InputHook>,
    renderer: Arc<dyn TextRenderer>,
    clicks: ClickSettings,
    keystrokes: KeystrokeSettings,
    recent_clicks: Vec<(Point, Instant)>,
    caption: Option<(String, Instant)>,
}

impl MouseKeyHookOverlay {
    /// Draw events drained from `hook`.
    pub fn new(
        hook: Arc<dyn InputHook>,
        renderer: Arc<dyn TextRenderer>,
        clicks: ClickSettings,
        keystrokes: KeystrokeSettings,
    ) -> Self {
        Self {
            hook,
            renderer,
            clicks,
            keystrokes,
            recent_clicks: Vec::new(),
            caption: None,
        }
    }

    fn absorb(&mut self, now: Instant) {
        let key_linger = Duration::from_millis(self.keystrokes.linger_ms);

        for event in self.hook.drain() {
            match event {
                InputEvent::Click { at } if self.clicks.display => {
                    self.recent_clicks.push((at, now));
                }
                InputEvent::Key { label } if self.keystrokes.display => {
                    let text = match self.caption.take() {
                        Some((mut text, at)) if now.duration_since(at) < key_linger => {
                            text.push(' ');
                            text.push_str(&label);
                            text
                        }
                        _ => label,
                    };
                    let skip = text.chars().count().saturating_sub(MAX_CAPTION_CHARS);
                    self.caption = Some((text.chars().skip(skip).collect(), now));
                }
                _ => {}
            }
        }

        let click_linger = Duration::from_millis(self.clicks.linger_ms);
        self.recent_clicks
            .retain(|(_, at)| now.duration_since(*at) < click_linger);
        if self
            .caption
            .as_ref()
            .is_some_and(|(_, at)| now.duration_since(*at) >= key_linger)
        {
            self.caption = None;
        }
    }
}

impl Overlay for MouseKeyHookOverlay {
    fn name(&self) -> &'static str {
        "mouse-key-hook"
    }

    fn draw(&mut self, frame: &mut Frame, transform: &PointTransform) {
        self.absorb(Instant::now());

        for (at, _) in &self.recent_clicks {
            draw::fill_circle(frame, transform(*at), self.clicks.radius, self.clicks.color);
        }

        if let Some((text, _)) = &self.caption {
            let tile = self
                .renderer
                .render(text, self.keystrokes.scale, self.keystrokes.color);
            let (x, y) = draw::anchored(frame, tile.width(), tile.height(), self.keystrokes.anchor);
            draw::blit(frame, &tile, x, y);
        }
    }
}
