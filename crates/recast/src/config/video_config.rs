use crate::config::{default_frame_rate, default_true, default_video_quality};

use recast_core::capture::{Rect, SourceKind};

use serde::{Deserialize, Serialize};

/// Video container and writer family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoFormat {
    /// Animated GIF, written in-process. No audio track.
    #[default]
    Gif,
    /// H.264 MP4 through an external `ffmpeg` process.
    Mp4,
}

/// Video source and encoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// What to record. `no_video` records audio only.
    #[serde(default = "default_source")]
    pub source: SourceKind,

    /// Monitor name; the primary monitor when absent.
    #[serde(default)]
    pub monitor: Option<String>,

    /// Window title to record (case-insensitive substring match).
    #[serde(default)]
    pub window_title: Option<String>,

    /// Region of the monitor to record, in monitor coordinates.
    #[serde(default)]
    pub region: Option<Rect>,

    /// Output format.
    #[serde(default)]
    pub format: VideoFormat,

    /// Frames per second.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Video quality, 1-100.
    #[serde(default = "default_video_quality")]
    pub quality: u8,

    /// Draw the OS cursor into frames, where the backend supports it.
    #[serde(default = "default_true")]
    pub include_cursor: bool,

    /// Only write frames when the picture changes (GIF only).
    #[serde(default)]
    pub variable_frame_rate: bool,
}

fn default_source() -> SourceKind {
    SourceKind::Screen
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            monitor: None,
            window_title: None,
            region: None,
            format: VideoFormat::default(),
            frame_rate: default_frame_rate(),
            quality: default_video_quality(),
            include_cursor: true,
            variable_frame_rate: false,
        }
    }
}
