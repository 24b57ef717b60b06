use crate::config::default_audio_quality;

use serde::{Deserialize, Serialize};

/// Microphone configuration. The default input device is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Record the microphone.
    #[serde(default)]
    pub enabled: bool,

    /// Audio quality, 1-100.
    #[serde(default = "default_audio_quality")]
    pub quality: u8,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            quality: default_audio_quality(),
        }
    }
}
