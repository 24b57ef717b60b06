use crate::{capture::SourceSelection, overlay::OverlaySettings};

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// Read-only settings snapshot a session is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Folder generated file names are placed in.
    pub output_dir: PathBuf,
    /// Frames per second.
    pub frame_rate: u32,
    /// Automatic stop after this much recording; 0 disables it.
    pub duration_ms: u64,
    /// Delay between `begin_session` and the capture actually starting.
    pub start_delay_ms: u64,
    /// Video quality, 1-100.
    pub video_quality: u8,
    /// Audio quality, 1-100.
    pub audio_quality: u8,
    /// Draw the OS cursor into frames.
    pub include_cursor: bool,
    /// Record audio.
    pub audio_enabled: bool,
    /// Minimize the main window while recording.
    pub minimize_on_start: bool,
    /// Copy the saved file's path to the clipboard.
    pub copy_path_to_clipboard: bool,
    /// Write frames only when the picture changes, if the writer allows it.
    pub variable_frame_rate: bool,
    /// Put screenshots on the clipboard instead of saving them.
    pub screenshot_to_clipboard: bool,
    /// Frame decorations.
    pub overlays: OverlaySettings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("recordings"),
            frame_rate: 10,
            duration_ms: 0,
            start_delay_ms: 0,
            video_quality: 70,
            audio_quality: 50,
            include_cursor: true,
            audio_enabled: false,
            minimize_on_start: false,
            copy_path_to_clipboard: false,
            variable_frame_rate: false,
            screenshot_to_clipboard: false,
            overlays: OverlaySettings::default(),
        }
    }
}

impl SessionSettings {
    /// Frame rate, never below 1.
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate.max(1)
    }

    /// Recording length limit, if any.
    pub fn duration(&self) -> Option<Duration> {
        (self.duration_ms > 0).then(|| Duration::from_millis(self.duration_ms))
    }

    /// Start delay.
    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }
}

/// Everything `begin_session` and `take_screenshot` need.
#[derive(Debug, Clone)]
pub struct SessionPlan {
    /// Settings snapshot.
    pub settings: SessionSettings,
    /// Selected source and output family.
    pub selection: SourceSelection,
    /// Explicit output path; generated from the timestamp when absent.
    pub file_name: Option<PathBuf>,
}
