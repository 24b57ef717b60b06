//! User-facing surfaces for the tray host: notifications, clipboard,
//! launcher. The host has no main window, region selector or preview pane.

use recast_core::{
    capture::Frame,
    session::{ClickAction, MessageSurface, RegionLock, Shell},
    writer::PreviewSurface,
};

use std::{borrow::Cow, path::Path};

use arboard::{Clipboard, ImageData};
use notify_rust::{Notification, Timeout};
use tracing::{debug, error, info, instrument, trace, warn};

const APP_NAME: &str = "Recast";
const NOTIFICATION_TIMEOUT_MS: u32 = 6000;

fn notification(body: &str) -> Notification {
    let mut n = Notification::new();
    n.summary(APP_NAME)
        .body(body)
        .timeout(Timeout::Milliseconds(NOTIFICATION_TIMEOUT_MS));
    n
}

/// Errors and notifications as desktop notifications.
///
/// There are no modal dialogs in a tray app, so yes/no prompts resolve to
/// the configured default answer and the user is told which was taken.
///
/// Where the notification server allows closing, the last plain
/// notification is kept so `hide_notification` can take it down.
pub struct NotificationSurface {
    confirm_default: bool,
    #[cfg(all(unix, not(target_os = "macos")))]
    shown: std::sync::Mutex<Option<notify_rust::NotificationHandle>>,
}

impl NotificationSurface {
    /// Answer every prompt with `confirm_default`.
    pub fn new(confirm_default: bool) -> Self {
        Self {
            confirm_default,
            #[cfg(all(unix, not(target_os = "macos")))]
            shown: std::sync::Mutex::new(None),
        }
    }

    /// True while a notification is kept for closing.
    pub fn is_showing(&self) -> bool {
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            self.shown_slot().is_some()
        }
        #[cfg(not(all(unix, not(target_os = "macos"))))]
        {
            false
        }
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    fn shown_slot(
        &self,
    ) -> std::sync::MutexGuard<'_, Option<notify_rust::NotificationHandle>> {
        self.shown
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Show `n`, replacing the notification kept for closing.
    fn show_tracked(&self, n: Notification) {
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            let previous = self.shown_slot().take();
            if let Some(previous) = previous {
                previous.close();
            }
            match n.show() {
                Ok(handle) => *self.shown_slot() = Some(handle),
                Err(e) => warn!(error = %e, "Failed to show notification"),
            }
        }

        #[cfg(not(all(unix, not(target_os = "macos"))))]
        {
            if let Err(e) = n.show() {
                warn!(error = %e, "Failed to show notification");
            }
        }
    }
}

impl MessageSurface for NotificationSurface {
    #[instrument(skip(self))]
    fn show_error(&self, message: &str) {
        error!(message, "Showing error");
        if let Err(e) = notification(message).show() {
            warn!(error = %e, "Failed to show error notification");
        }
    }

    #[instrument(skip(self))]
    fn show_yes_no(&self, message: &str, title: &str) -> bool {
        let answer = self.confirm_default;
        info!(answer, "Prompt answered with configured default");

        let body = format!("{message}\n{}", if answer { "Yes" } else { "No" });
        let mut n = notification(&body);
        n.summary(title);
        if let Err(e) = n.show() {
            warn!(error = %e, "Failed to show prompt notification");
        }

        answer
    }

    #[instrument(skip(self, on_click))]
    fn notify(&self, text: &str, on_click: Option<ClickAction>) {
        let n = notification(text);

        let Some(on_click) = on_click else {
            self.show_tracked(n);
            return;
        };

        #[cfg(all(unix, not(target_os = "macos")))]
        {
            let mut n = n;
            n.action("default", "Open");
            // waiting for the click blocks, so it gets its own thread
            let spawned = std::thread::Builder::new()
                .name("recast-notification".to_string())
                .spawn(move || match n.show() {
                    Ok(handle) => handle.wait_for_action(|action| {
                        if action == "default" {
                            on_click();
                        }
                    }),
                    Err(e) => warn!(error = %e, "Failed to show notification"),
                });
            if let Err(e) = spawned {
                warn!(error = %e, "Failed to spawn notification thread");
            }
        }

        #[cfg(not(all(unix, not(target_os = "macos"))))]
        {
            debug!("Clickable notifications are not supported here");
            drop(on_click);
            if let Err(e) = n.show() {
                warn!(error = %e, "Failed to show notification");
            }
        }
    }

    fn hide_notification(&self) {
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            let shown = self.shown_slot().take();
            match shown {
                Some(handle) => {
                    handle.close();
                    debug!("Notification closed");
                }
                None => trace!("No notification to close"),
            }
        }

        #[cfg(not(all(unix, not(target_os = "macos"))))]
        debug!("Notifications expire on their own");
    }
}

/// Clipboard and default-application launcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopShell;

impl Shell for DesktopShell {
    fn set_minimized(&self, minimized: bool) {
        debug!(minimized, "No main window to minimize");
    }

    #[instrument(skip(self, text))]
    fn copy_text(&self, text: &str) {
        let copied = Clipboard::new().and_then(|mut c| c.set_text(text));
        match copied {
            Ok(()) => debug!(text_len = text.len(), "Copied to clipboard"),
            Err(e) => warn!(error = %e, "Failed to copy to clipboard"),
        }
    }

    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    fn copy_image(&self, image: &Frame) {
        let data = ImageData {
            width: image.width() as usize,
            height: image.height() as usize,
            bytes: Cow::Borrowed(image.as_raw()),
        };
        let copied = Clipboard::new().and_then(|mut c| c.set_image(data));
        match copied {
            Ok(()) => debug!("Copied image to clipboard"),
            Err(e) => warn!(error = %e, "Failed to copy image to clipboard"),
        }
    }

    #[instrument(skip(self))]
    fn launch(&self, path: &Path) {
        if let Err(e) = open::that(path) {
            warn!(error = %e, "Failed to open recording");
        }
    }
}

/// The region comes from config, so there is no selector to freeze.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfiguredRegion;

impl RegionLock for ConfiguredRegion {
    fn lock(&self) {
        debug!("Region locked for recording");
    }

    fn release(&self) {
        debug!("Region released");
    }
}

/// Logs preview activity; the tray has nowhere to draw frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessPreview;

impl PreviewSurface for HeadlessPreview {
    fn init(&self, width: u32, height: u32) {
        debug!(width, height, "Preview initialized");
    }

    fn show(&self, frame: &Frame) {
        trace!(width = frame.width(), height = frame.height(), "Frame recorded");
    }
}
