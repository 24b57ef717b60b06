mod audio_config;
mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod output_config;
mod session_config;
mod video_config;

pub(crate) use {
    audio_config::AudioConfig, behaviour_config::BehaviourConfig, config::Config,
    output_config::OutputConfig, session_config::SessionConfig,
    video_config::{VideoConfig, VideoFormat},
};

pub(crate) const DEFAULT_FRAME_RATE: u32 = 10;
pub(crate) const DEFAULT_VIDEO_QUALITY: u8 = 70;
pub(crate) const DEFAULT_AUDIO_QUALITY: u8 = 50;

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_frame_rate() -> u32 {
    DEFAULT_FRAME_RATE
}

pub(crate) fn default_video_quality() -> u8 {
    DEFAULT_VIDEO_QUALITY
}

pub(crate) fn default_audio_quality() -> u8 {
    DEFAULT_AUDIO_QUALITY
}
