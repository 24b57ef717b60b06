use serde::{Deserialize, Serialize};

/// Application behavior configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Ask the host shell to minimize while recording.
    #[serde(default)]
    pub minimize_on_start: bool,

    /// Answer given to confirmation prompts. The tray host has no dialogs,
    /// so prompts such as "record without audio?" resolve to this.
    #[serde(default)]
    pub confirm_default: bool,
}
