use crate::{
    CaptureError, CaptureResult,
    capture::{Frame, ImageProvider, Point, Rect, identity_transform},
    overlay::{
        Anchor, CensorRegion, DigitFont, ElapsedClock, ImageOverlaySettings, InputEvent,
        InputHook, Overlay, OverlayDeps, OverlayFactory, OverlaySettings, OverlayedImageProvider,
        PictureInPictureOverlay, TextOverlaySettings, TextRenderer, build_overlays,
        format_elapsed,
    },
    tests::fakes::{CaptureFault, Counters, FakeImages, solid},
};

use std::sync::Arc;

use image::Rgba;

struct NoInput;

impl InputHook for NoInput {
    fn drain(&self) -> Vec<InputEvent> {
        Vec::new()
    }
}

struct CameraFactory {
    counters: Arc<Counters>,
}

impl OverlayFactory for CameraFactory {
    fn create(&self) -> CaptureResult<Box<dyn Overlay>> {
        let camera = FakeImages::new(Arc::clone(&self.counters), Vec::new(), CaptureFault::None);
        Ok(Box::new(PictureInPictureOverlay::new(
            Box::new(camera),
            25,
            Anchor::BottomRight,
        )))
    }
}

struct BrokenFactory;

impl OverlayFactory for BrokenFactory {
    fn create(&self) -> CaptureResult<Box<dyn Overlay>> {
        Err(CaptureError::device("camera unplugged"))
    }
}

fn text(text: &str) -> TextOverlaySettings {
    TextOverlaySettings {
        display: true,
        text: text.to_string(),
        x: 0,
        y: 0,
        scale: 1,
        color: [255, 255, 255, 255],
    }
}

fn image_at(path: std::path::PathBuf) -> ImageOverlaySettings {
    ImageOverlaySettings {
        display: true,
        path,
        x: 0,
        y: 0,
        size: None,
        opacity: 100,
    }
}

/// WHAT: The overlay chain has a fixed order and skips a broken image
/// WHY: Later overlays must draw above earlier ones, and one bad file must
/// not cost the whole session
#[test]
#[allow(clippy::unwrap_used)]
fn given_every_overlay_configured_when_building_chain_then_fixed_order_and_broken_image_skipped() {
    // Given: One good and one missing image, a camera and an input hook
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("logo.png");
    solid([255, 0, 0, 255]).save(&good).unwrap();
    let settings = OverlaySettings {
        censored: vec![CensorRegion {
            display: true,
            rect: Rect::new(0, 0, 1, 1),
        }],
        custom_text: vec![text("1")],
        custom_images: vec![image_at(dir.path().join("missing.png")), image_at(good)],
        ..OverlaySettings::default()
    };
    let deps = OverlayDeps {
        source_overlay: Some(Arc::new(CameraFactory {
            counters: Arc::new(Counters::default()),
        })),
        input_hook: Some(Arc::new(NoInput)),
        ..OverlayDeps::default()
    };

    // When: Building the chain
    let overlays = build_overlays(&settings, &deps, &ElapsedClock::default());

    // Then: Fixed order, only one custom image
    let names: Vec<_> = overlays.iter().map(|o| o.name()).collect();
    assert_eq!(
        names,
        vec![
            "censor",
            "picture-in-picture",
            "mouse-pointer",
            "mouse-key-hook",
            "elapsed",
            "custom-text",
            "custom-image",
        ]
    );
}

/// WHAT: Optional overlays are left out when their capability is missing
/// WHY: Hosts without an input hook or camera still record
#[test]
fn given_no_input_hook_and_broken_source_overlay_when_building_chain_then_both_absent() {
    // Given: A failing source overlay and no input hook
    let deps = OverlayDeps {
        source_overlay: Some(Arc::new(BrokenFactory)),
        ..OverlayDeps::default()
    };

    // When: Building the chain with default settings
    let overlays = build_overlays(
        &OverlaySettings::default(),
        &deps,
        &ElapsedClock::default(),
    );

    // Then: Only the always-present overlays
    let names: Vec<_> = overlays.iter().map(|o| o.name()).collect();
    assert_eq!(names, vec!["censor", "mouse-pointer", "elapsed"]);
}

/// WHAT: Censored regions are painted black in captured frames
/// WHY: Redaction is the point of the censor overlay
#[test]
#[allow(clippy::unwrap_used)]
fn given_censor_region_when_capturing_then_region_black_and_rest_untouched() {
    // Given: A white source with the top-left 2x2 censored
    let counters = Arc::new(Counters::default());
    let source = FakeImages::new(counters, Vec::new(), CaptureFault::None);
    let settings = OverlaySettings {
        censored: vec![CensorRegion {
            display: true,
            rect: Rect::new(0, 0, 2, 2),
        }],
        ..OverlaySettings::default()
    };
    let overlays = build_overlays(&settings, &OverlayDeps::default(), &ElapsedClock::default());
    let mut provider =
        OverlayedImageProvider::new(Box::new(source), identity_transform(), overlays);

    // When: Capturing a frame
    let frame = provider.capture().unwrap();

    // Then: Censored pixels black, others white
    assert_eq!(*frame.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
    assert_eq!(*frame.get_pixel(3, 3), Rgba([255, 255, 255, 255]));
}

/// WHAT: Rect clipping handles partially and fully outside rectangles
/// WHY: Overlays positioned off-frame must not index out of bounds
#[test]
fn given_rects_outside_frame_when_clipping_then_bounds_limited_or_none() {
    // Given: A 10x10 frame
    // When: Clipping rects that cross or miss it
    let crossing = Rect::new(-5, 8, 10, 10).clip(10, 10);
    let missing = Rect::new(20, 20, 5, 5).clip(10, 10);

    // Then: Crossing is clipped, missing is None
    assert_eq!(crossing, Some((0, 8, 5, 10)));
    assert_eq!(missing, None);
}

/// WHAT: Elapsed text is rendered as HH:MM:SS
/// WHY: Matches the status display users read
#[test]
fn given_seconds_when_formatting_elapsed_then_hours_minutes_seconds() {
    // Given/When: Formatting 1h 2m 5s
    let text = format_elapsed(3725);

    // Then: Zero padded
    assert_eq!(text, "01:02:05");
}

/// WHAT: The built-in font sizes tiles from glyph count and scale
/// WHY: Anchoring relies on the tile dimensions
#[test]
fn given_digit_font_when_rendering_then_tile_sized_by_glyphs_and_scale() {
    // Given: The built-in font
    let font = DigitFont;

    // When: Rendering five glyphs at scale 2
    let tile = font.render("12:34", 2, [255, 255, 255, 255]);

    // Then: (5 * 4 + 1) * 2 wide, (5 + 2) * 2 tall
    assert_eq!(tile.dimensions(), (42, 14));
}

/// WHAT: Pointer coordinates go through the source transform
/// WHY: Window and region sources are offset from the screen origin
#[test]
#[allow(clippy::unwrap_used)]
fn given_offset_transform_when_pointer_drawn_then_highlight_lands_in_frame_coordinates() {
    use crate::overlay::{MousePointerOverlay, PointerSettings, PointerTracker};

    struct At(Point);
    impl PointerTracker for At {
        fn position(&self) -> Option<Point> {
            Some(self.0)
        }
    }

    // Given: Pointer at screen (102, 102) and a source offset by (100, 100)
    let mut overlay = MousePointerOverlay::new(
        PointerSettings {
            display: true,
            radius: 0,
            color: [255, 0, 0, 255],
        },
        Some(Arc::new(At(Point::new(102, 102)))),
    );
    let transform: crate::capture::PointTransform =
        Arc::new(|p: Point| Point::new(p.x - 100, p.y - 100));
    let mut frame: Frame = solid([0, 0, 0, 255]);

    // When: Drawing
    overlay.draw(&mut frame, &transform);

    // Then: Pixel (2, 2) is highlighted
    assert_eq!(*frame.get_pixel(2, 2), Rgba([255, 0, 0, 255]));
    assert_eq!(*frame.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
}
