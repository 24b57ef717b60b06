use crate::{capture::SourceKind, writer::ExternalEncoder};

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Failures raised by capture providers, overlays, writers and recorder pumps.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The backend cannot run in the current OS context.
    #[error("Capture not supported: {reason} {location}")]
    NotSupported {
        /// Why the backend refused to start.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Capture was cancelled by the user or the source went away.
    #[error("Capture cancelled {location}")]
    Cancelled {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A capture device or OS capture API failed.
    #[error("Device error: {reason} {location}")]
    Device {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A writer failed to encode or finalize its output.
    #[error("Encoding error: {reason} {location}")]
    Encode {
        /// Description of the encoder failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Filesystem error while preparing or writing output.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Image decoding or encoding error.
    #[error("Image error: {source} {location}")]
    Image {
        /// The underlying image error.
        #[source]
        source: image::ImageError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl CaptureError {
    /// Shorthand for a [`CaptureError::Device`] at the caller's location.
    #[track_caller]
    pub fn device(reason: impl Into<String>) -> Self {
        CaptureError::Device {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Shorthand for a [`CaptureError::Encode`] at the caller's location.
    #[track_caller]
    pub fn encode(reason: impl Into<String>) -> Self {
        CaptureError::Encode {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Shorthand for a [`CaptureError::NotSupported`] at the caller's location.
    #[track_caller]
    pub fn not_supported(reason: impl Into<String>) -> Self {
        CaptureError::NotSupported {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Shorthand for a [`CaptureError::Cancelled`] at the caller's location.
    #[track_caller]
    pub fn cancelled() -> Self {
        CaptureError::Cancelled {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// True for user-initiated cancellation, which ends a session silently.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, CaptureError::Cancelled { .. })
    }

    /// Description without the source location, for user-facing messages.
    pub fn summary(&self) -> String {
        match self {
            CaptureError::NotSupported { reason, .. }
            | CaptureError::Device { reason, .. }
            | CaptureError::Encode { reason, .. } => reason.clone(),
            CaptureError::Cancelled { .. } => "Capture was cancelled".to_string(),
            CaptureError::Io { source, .. } => source.to_string(),
            CaptureError::Image { source, .. } => source.to_string(),
        }
    }
}

// Manual From impls with location tracking.
// Cannot use #[from] because it does not support extra fields.
impl From<std::io::Error> for CaptureError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        CaptureError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<image::ImageError> for CaptureError {
    #[track_caller]
    fn from(source: image::ImageError) -> Self {
        CaptureError::Image {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Pipeline stage that failed while a session was being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    /// Opening the video source.
    ImageProvider,
    /// Opening the audio source.
    AudioProvider,
    /// Preparing the output directory.
    Output,
    /// Creating the file writer.
    Writer,
}

impl std::fmt::Display for BuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStage::ImageProvider => write!(f, "video source"),
            BuildStage::AudioProvider => write!(f, "audio source"),
            BuildStage::Output => write!(f, "output folder"),
            BuildStage::Writer => write!(f, "file writer"),
        }
    }
}

/// Session-level failures surfaced at the orchestrator boundary.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A required external encoder is missing; nothing was allocated.
    #[error("{encoder} is not available {location}")]
    EncoderUnavailable {
        /// The missing encoder.
        encoder: ExternalEncoder,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The video backend cannot run here; the user was offered a fallback.
    #[error("Unsupported capture capability: {reason} {location}")]
    UnsupportedCapability {
        /// Backend explanation.
        reason: String,
        /// Source kind the user agreed to switch to, if any.
        switched_to: Option<SourceKind>,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A confirmation prompt or picker was dismissed.
    #[error("Declined by user {location}")]
    UserDeclined {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A session is already active.
    #[error("A recording is already in progress {location}")]
    AlreadyRecording {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Building the capture pipeline failed; partial resources were released.
    #[error("Failed to build {stage}: {source} {location}")]
    PipelineBuildFailure {
        /// Stage that failed.
        stage: BuildStage,
        /// Underlying capture error.
        #[source]
        source: CaptureError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The recorder faulted while running; the session was force-ended.
    #[error("Recording failed: {source} {location}")]
    RuntimeCaptureFailure {
        /// Underlying capture error.
        #[source]
        source: CaptureError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A screenshot could not be captured or saved.
    #[error("Screenshot failed: {source} {location}")]
    ScreenshotFailure {
        /// Underlying capture error.
        #[source]
        source: CaptureError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Disposing the recorder failed after the session had already ended.
    #[error("Failed to finish recording: {source} {location}")]
    StopFailure {
        /// Underlying capture error.
        #[source]
        source: CaptureError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl SessionError {
    /// Variants that have dedicated prompts (or none) and must not reach a
    /// generic error message.
    pub fn is_silent(&self) -> bool {
        match self {
            SessionError::UnsupportedCapability { .. }
            | SessionError::UserDeclined { .. }
            | SessionError::AlreadyRecording { .. } => true,
            SessionError::RuntimeCaptureFailure { source, .. }
            | SessionError::ScreenshotFailure { source, .. } => source.is_cancellation(),
            _ => false,
        }
    }

    /// Text shown to the user through the message surface.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::EncoderUnavailable { encoder, .. } => {
                format!("{encoder} is not available.\nInstall it or pick another output format.")
            }
            SessionError::UnsupportedCapability { reason, .. } => reason.clone(),
            SessionError::UserDeclined { .. } => "Recording cancelled".to_string(),
            SessionError::AlreadyRecording { .. } => {
                "A recording is already in progress".to_string()
            }
            SessionError::PipelineBuildFailure { stage, source, .. } => {
                format!("Failed to open the {stage}.\n{}", source.summary())
            }
            SessionError::RuntimeCaptureFailure { source, .. } => {
                format!("An error occurred while recording.\n{}", source.summary())
            }
            SessionError::ScreenshotFailure { source, .. } => {
                format!("Screenshot not saved.\n{}", source.summary())
            }
            SessionError::StopFailure { .. } => STOP_FAILURE_MESSAGE.to_string(),
        }
    }
}

const STOP_FAILURE_MESSAGE: &str = "Error occurred when stopping recording.\nThis might sometimes occur if you stop recording just as soon as you start it.";

/// Result type alias using [`CaptureError`].
pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

/// Result type alias using [`SessionError`].
pub type SessionResult<T> = std::result::Result<T, SessionError>;
