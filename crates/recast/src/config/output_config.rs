use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where recordings go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Folder generated file names are placed in.
    pub directory: PathBuf,

    /// Copy the saved file's path to the clipboard.
    #[serde(default)]
    pub copy_path_to_clipboard: bool,

    /// Put screenshots on the clipboard instead of saving them.
    #[serde(default)]
    pub screenshot_to_clipboard: bool,
}
