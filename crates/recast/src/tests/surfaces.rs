use crate::surfaces::NotificationSurface;

use recast_core::session::MessageSurface;

/// WHAT: Hiding with nothing on screen leaves the surface empty
/// WHY: Resume and start hide unconditionally, even after no notification
#[test]
fn given_no_notification_when_hiding_then_nothing_kept() {
    // Given: A fresh surface
    let surface = NotificationSurface::new(true);
    assert!(!surface.is_showing());

    // When: Hiding twice
    surface.hide_notification();
    surface.hide_notification();

    // Then: Still nothing kept for closing
    assert!(!surface.is_showing());
}

