/// Commands sent from the hotkey handler and tray menu to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Start a session when idle, stop the active one otherwise.
    ToggleRecording,
    /// Pause or resume the active session.
    TogglePause,
    /// Capture a still of the selected video source.
    Screenshot,
    /// Flush every recording and exit.
    Shutdown,
}
