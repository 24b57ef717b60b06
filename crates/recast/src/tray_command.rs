use crate::TrayIconState;

/// Tray updates posted from the runtime thread to the tao event loop, which
/// owns the `!Send` tray icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    /// Switch icon, tooltip and menu labels.
    SetState(TrayIconState),
    /// Show the running time of the active session in the tooltip.
    SetElapsed(u64),
    /// Every recording is flushed; exit the event loop.
    Shutdown,
}
