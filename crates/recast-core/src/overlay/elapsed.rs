use crate::{
    capture::{Frame, PointTransform},
    overlay::{ElapsedSettings, Overlay, TextRenderer, draw},
};

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Whole seconds of the current session, shared between the orchestrator
/// (writer) and the elapsed overlay on the pump thread (reader).
#[derive(Debug, Clone, Default)]
pub struct ElapsedClock(Arc<AtomicU64>);

impl ElapsedClock {
    /// Publish the current elapsed seconds.
    pub fn set(&self, seconds: u64) {
        self.0.store(seconds, Ordering::Relaxed);
    }

    /// Latest published elapsed seconds.
    pub fn seconds(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// `HH:MM:SS` rendering of a second count.
pub fn format_elapsed(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

/// Running time caption.
pub struct ElapsedOverlay {
    settings: ElapsedSettings,
    clock: ElapsedClock,
    renderer: Arc<dyn TextRenderer>,
    // re-rendered only when the second changes
    cached: Option<(u64, Frame)>,
}

impl ElapsedOverlay {
    /// Caption reading from `clock`.
    pub fn new(
        settings: ElapsedSettings,
        clock: ElapsedClock,
        renderer: Arc<dyn TextRenderer>,
    ) -> Self {
        Self {
            settings,
            clock,
            renderer,
            cached: None,
        }
    }
}

impl Overlay for ElapsedOverlay {
    fn name(&self) -> &'static str {
        "elapsed"
    }

    fn draw(&mut self, frame: &mut Frame, _transform: &PointTransform) {
        if !self.settings.display {
            return;
        }

        let seconds = self.clock.seconds();
        let stale = self.cached.as_ref().is_none_or(|(s, _)| *s != seconds);
        if stale {
            let tile = self.renderer.render(
                &format_elapsed(seconds),
                self.settings.scale,
                self.settings.color,
            );
            self.cached = Some((seconds, tile));
        }

        if let Some((_, tile)) = &self.cached {
            let (x, y) = draw::anchored(frame, tile.width(), tile.height(), self.settings.anchor);
            draw::blit(frame, tile, x, y);
        }
    }
}
