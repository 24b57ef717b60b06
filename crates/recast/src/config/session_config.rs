use serde::{Deserialize, Serialize};

/// Session timing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Stop automatically after this many milliseconds; 0 records until stopped.
    #[serde(default)]
    pub duration_ms: u64,

    /// Wait this many milliseconds before capturing.
    #[serde(default)]
    pub start_delay_ms: u64,
}
