use crate::{
    CaptureResult,
    capture::{ImageProvider, PointTransform},
    writer::{AudioTarget, ExternalEncoder, WriterKind},
};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Family of video source the user picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Audio-only recording.
    NoVideo,
    /// A whole monitor.
    Screen,
    /// A single window.
    Window,
    /// A user-drawn screen region.
    Region,
    /// Hardware desktop duplication of a monitor.
    DesktopDuplication,
    /// A camera device.
    Webcam,
}

impl SourceKind {
    /// Whether sessions of this kind produce video.
    pub fn is_video(self) -> bool {
        !matches!(self, SourceKind::NoVideo)
    }

    /// Whether the region selector must be locked while recording.
    pub fn locks_region(self) -> bool {
        matches!(self, SourceKind::Region)
    }

    /// Kind to offer when this backend is unsupported in the current context.
    pub fn fallback(self) -> Option<SourceKind> {
        match self {
            SourceKind::DesktopDuplication => Some(SourceKind::Screen),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::NoVideo => write!(f, "No Video"),
            SourceKind::Screen => write!(f, "Screen"),
            SourceKind::Window => write!(f, "Window"),
            SourceKind::Region => write!(f, "Region"),
            SourceKind::DesktopDuplication => write!(f, "Desktop Duplication"),
            SourceKind::Webcam => write!(f, "Webcam"),
        }
    }
}

/// An opened video source.
pub struct OpenedSource {
    /// Frame provider for the source.
    pub provider: Box<dyn ImageProvider>,
    /// Maps screen coordinates into this source's frames.
    pub transform: PointTransform,
}

/// A selected video item (a monitor, a window, a region...).
pub trait VideoSource: Send + Sync {
    /// Display name, used in logs.
    fn name(&self) -> &str;

    /// The source family.
    fn kind(&self) -> SourceKind;

    /// Open a provider for this item.
    ///
    /// Returns `Ok(None)` when an interactive picker was dismissed.
    fn open(&self, include_cursor: bool) -> CaptureResult<Option<OpenedSource>>;
}

/// What a session records and where it goes.
#[derive(Clone)]
pub enum SourceSelection {
    /// Video (with optional audio) through a video writer family.
    Video {
        /// Selected video item.
        source: Arc<dyn VideoSource>,
        /// Selected writer family.
        writer: Arc<dyn WriterKind>,
    },
    /// Audio only through an audio writer family.
    AudioOnly {
        /// Selected audio target.
        target: Arc<dyn AudioTarget>,
    },
}

impl SourceSelection {
    /// Kind of the selected source.
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceSelection::Video { source, .. } => source.kind(),
            SourceSelection::AudioOnly { .. } => SourceKind::NoVideo,
        }
    }

    /// Whether the session produces video.
    pub fn is_video(&self) -> bool {
        self.kind().is_video()
    }

    /// Output file extension including the dot; empty for non-file output.
    pub fn extension(&self) -> &str {
        match self {
            SourceSelection::Video { writer, .. } => writer.extension(),
            SourceSelection::AudioOnly { target } => target.extension(),
        }
    }

    /// External encoder the output depends on.
    pub fn required_encoder(&self) -> Option<ExternalEncoder> {
        match self {
            SourceSelection::Video { writer, .. } => writer.capabilities().required_encoder,
            SourceSelection::AudioOnly { target } => target.required_encoder(),
        }
    }

    /// Whether the output can carry an audio track.
    pub fn carries_audio(&self) -> bool {
        match self {
            SourceSelection::Video { writer, .. } => writer.capabilities().carries_audio,
            SourceSelection::AudioOnly { .. } => true,
        }
    }
}

impl std::fmt::Debug for SourceSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceSelection::Video { source, writer } => f
                .debug_struct("Video")
                .field("source", &source.name())
                .field("kind", &source.kind())
                .field("writer", &writer.name())
                .finish(),
            SourceSelection::AudioOnly { target } => f
                .debug_struct("AudioOnly")
                .field("target", &target.name())
                .finish(),
        }
    }
}
