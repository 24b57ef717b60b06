use crate::{TrayIconState, tray_manager::icon_image};

use recast_core::RecorderState;

/// WHAT: Tray state follows the orchestrator and pending saves
/// WHY: Users must see that a recording is still being written after stop
#[test]
fn given_session_states_when_mapping_then_tray_state_matches() {
    // Given/When/Then: Each combination maps to its icon
    assert_eq!(
        TrayIconState::from_session(RecorderState::NotRecording, 0),
        TrayIconState::Idle
    );
    assert_eq!(
        TrayIconState::from_session(RecorderState::NotRecording, 2),
        TrayIconState::Saving
    );
    assert_eq!(
        TrayIconState::from_session(RecorderState::Recording, 1),
        TrayIconState::Recording
    );
    assert_eq!(
        TrayIconState::from_session(RecorderState::Paused, 0),
        TrayIconState::Paused
    );
}

/// WHAT: Generated icons are a colored disc on a transparent background
/// WHY: Icons are drawn at runtime instead of shipped as resources
#[test]
fn given_recording_state_when_drawing_icon_then_center_is_red_and_corner_clear() {
    // Given/When: The recording icon
    let icon = icon_image(TrayIconState::Recording);

    // Then: Center carries the state color, corners are transparent
    assert_eq!(icon.get_pixel(16, 16).0, TrayIconState::Recording.color());
    assert_eq!(icon.get_pixel(0, 0).0[3], 0);
    assert_ne!(
        icon_image(TrayIconState::Idle).get_pixel(16, 16),
        icon.get_pixel(16, 16)
    );
}
