use crate::capture::Frame;

use std::path::Path;

/// Callback run when a notification is clicked.
pub type ClickAction = Box<dyn FnOnce() + Send>;

/// User-facing messages: dialogs and notifications.
pub trait MessageSurface: Send + Sync {
    /// Show an error message.
    fn show_error(&self, message: &str);

    /// Ask a yes/no question; true for yes.
    fn show_yes_no(&self, message: &str, title: &str) -> bool;

    /// Show a notification, optionally clickable.
    fn notify(&self, text: &str, on_click: Option<ClickAction>);

    /// Hide the current notification.
    fn hide_notification(&self);
}

/// Desktop shell integration.
pub trait Shell: Send + Sync {
    /// Minimize or restore the main window.
    fn set_minimized(&self, minimized: bool);

    /// Put text on the clipboard.
    fn copy_text(&self, text: &str);

    /// Put an image on the clipboard.
    fn copy_image(&self, image: &Frame);

    /// Open a file with its default application.
    fn launch(&self, path: &Path);
}

/// Region selector that must not move while a region is being recorded.
pub trait RegionLock: Send + Sync {
    /// Freeze the selector.
    fn lock(&self);

    /// Unfreeze the selector.
    fn release(&self);
}
