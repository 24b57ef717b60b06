use recast_core::RecorderState;

/// Tray icon states corresponding to the recording workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIconState {
    /// Ready to start recording.
    Idle,
    /// Capturing, or waiting out the start delay.
    Recording,
    /// A session is paused.
    Paused,
    /// No session, but earlier recordings are still being written.
    Saving,
}

impl TrayIconState {
    /// Icon for the orchestrator's state and its number of unfinished saves.
    pub fn from_session(state: RecorderState, pending_stops: usize) -> Self {
        match state {
            RecorderState::Recording => TrayIconState::Recording,
            RecorderState::Paused => TrayIconState::Paused,
            RecorderState::NotRecording if pending_stops > 0 => TrayIconState::Saving,
            RecorderState::NotRecording => TrayIconState::Idle,
        }
    }

    /// Tooltip shown while in this state.
    pub fn tooltip(self) -> &'static str {
        match self {
            TrayIconState::Idle => "Recast - Ready",
            TrayIconState::Recording => "Recast - Recording",
            TrayIconState::Paused => "Recast - Paused",
            TrayIconState::Saving => "Recast - Saving",
        }
    }

    /// Fill color of the generated icon.
    pub(crate) fn color(self) -> [u8; 4] {
        match self {
            TrayIconState::Idle => [128, 128, 128, 255],
            TrayIconState::Recording => [220, 40, 40, 255],
            TrayIconState::Paused => [230, 170, 30, 255],
            TrayIconState::Saving => [50, 120, 220, 255],
        }
    }
}
