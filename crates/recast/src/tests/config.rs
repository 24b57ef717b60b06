use crate::config::{Config, VideoFormat};

use recast_core::capture::{Rect, SourceKind};

use std::{fs, path::PathBuf};

/// WHAT: A saved config loads back unchanged
/// WHY: Persisted source fallbacks and settings must survive restarts
#[test]
#[allow(clippy::unwrap_used)]
fn given_modified_config_when_saved_and_loaded_then_round_trips() {
    // Given: A config with non-default settings
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut config = Config::with_output_dir(dir.path().join("videos"));
    config.video.source = SourceKind::Region;
    config.video.region = Some(Rect::new(10, 20, 300, 200));
    config.video.format = VideoFormat::Mp4;
    config.audio.enabled = true;
    config.session.start_delay_ms = 3000;

    // When: Saving and loading
    config.save_to(&path).unwrap();
    let loaded = Config::load_from(&path).unwrap();

    // Then: Everything survives and no temp file is left behind
    assert_eq!(loaded, config);
    assert!(!path.with_extension("toml.tmp").exists());
}

/// WHAT: Missing sections fall back to defaults
/// WHY: Hand-edited configs usually only name what they change
#[test]
#[allow(clippy::unwrap_used)]
fn given_minimal_toml_when_loaded_then_defaults_fill_in() {
    // Given: Only the output directory
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[output]\ndirectory = \"/tmp/recast\"\n").unwrap();

    // When: Loading
    let config = Config::load_from(&path).unwrap();

    // Then: Defaults apply
    assert_eq!(config.output.directory, PathBuf::from("/tmp/recast"));
    assert_eq!(config.video.source, SourceKind::Screen);
    assert_eq!(config.video.format, VideoFormat::Gif);
    assert_eq!(config.video.frame_rate, 10);
    assert!(config.video.include_cursor);
    assert!(!config.audio.enabled);
    assert!(!config.behaviour.confirm_default);
}

/// WHAT: Source kinds and formats are written in snake_case
/// WHY: Keeps the file readable and stable across renames of Rust variants
#[test]
#[allow(clippy::unwrap_used)]
fn given_audio_only_toml_when_loaded_then_no_video_source_parsed() {
    // Given: An audio-only, MP4 config
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[output]\ndirectory = \"out\"\n\n[video]\nsource = \"no_video\"\nformat = \"mp4\"\n",
    )
    .unwrap();

    // When: Loading
    let config = Config::load_from(&path).unwrap();

    // Then: The snake_case names are understood
    assert_eq!(config.video.source, SourceKind::NoVideo);
    assert_eq!(config.video.format, VideoFormat::Mp4);
}

/// WHAT: Malformed TOML is a ConfigError, not a panic
/// WHY: Startup reports the problem and exits cleanly
#[test]
#[allow(clippy::unwrap_used)]
fn given_malformed_toml_when_loaded_then_config_error() {
    // Given: Garbage
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[output\ndirectory = ").unwrap();

    // When: Loading
    let result = Config::load_from(&path);

    // Then: A config error
    assert!(matches!(result, Err(crate::AppError::ConfigError { .. })));
}

/// WHAT: A filesystem failure converts into the io variant
/// WHY: Creating the config directory propagates io errors with `?`
#[test]
fn given_io_failure_when_converted_then_io_error_keeps_source() {
    // Given: A permission failure
    let source = std::io::Error::from(std::io::ErrorKind::PermissionDenied);

    // When: Converting
    let error = crate::AppError::from(source);

    // Then: The io variant carries the original kind
    assert!(matches!(
        error,
        crate::AppError::IoError { ref source, .. }
            if source.kind() == std::io::ErrorKind::PermissionDenied
    ));
}

/// WHAT: Session settings carry the config values with qualities clamped
/// WHY: Writers assume qualities within 1-100
#[test]
fn given_out_of_range_qualities_when_building_settings_then_clamped() {
    // Given: Qualities outside 1-100
    let mut config = Config::with_output_dir(PathBuf::from("out"));
    config.video.quality = 0;
    config.audio.quality = 200;
    config.session.duration_ms = 5000;
    config.output.copy_path_to_clipboard = true;
    config.output.screenshot_to_clipboard = true;

    // When: Building the snapshot
    let settings = config.session_settings();

    // Then: Values map across and qualities are clamped
    assert_eq!(settings.video_quality, 1);
    assert_eq!(settings.audio_quality, 100);
    assert_eq!(settings.output_dir, PathBuf::from("out"));
    assert_eq!(settings.duration_ms, 5000);
    assert!(settings.copy_path_to_clipboard);
    assert!(settings.screenshot_to_clipboard);
    assert_eq!(settings.frame_rate, 10);
}
