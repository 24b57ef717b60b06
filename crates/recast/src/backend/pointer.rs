//! Pointer position through enigo, plus the arrow drawn into frames when
//! `include_cursor` is set, since xcap captures carry no cursor.

use recast_core::{
    capture::{Frame, Point},
    overlay::PointerTracker,
};

use std::{
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread,
    time::Duration,
};

use enigo::{Enigo, Mouse, Settings};
use image::Rgba;
use tracing::{debug, trace, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(15);

const OUTLINE: Rgba<u8> = Rgba([0, 0, 0, 255]);
const FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);

// Tip at (0, 0). 'X' is outline, '.' is fill.
const ARROW: [&str; 14] = [
    "X",
    "XX",
    "X.X",
    "X..X",
    "X...X",
    "X....X",
    "X.....X",
    "X......X",
    "X.......X",
    "X....XXXXX",
    "X..X..X",
    "X.X X..X",
    "XX  X..X",
    "     XX",
];

pub(crate) fn pack(at: Point) -> u64 {
    (u64::from(at.x as u32) << 32) | u64::from(at.y as u32)
}

pub(crate) fn unpack(packed: u64) -> Point {
    Point::new((packed >> 32) as u32 as i32, packed as u32 as i32)
}

/// Last known pointer position.
///
/// A polling thread owns the `Enigo` connection and refreshes the position
/// until the last handle is dropped.
#[derive(Debug, Default)]
pub struct EnigoPointer {
    position: AtomicU64,
    known: AtomicBool,
}

impl EnigoPointer {
    /// Start tracking the pointer.
    pub fn spawn() -> Arc<Self> {
        let pointer = Arc::new(Self::default());
        let weak = Arc::downgrade(&pointer);

        let spawned = thread::Builder::new()
            .name("recast-pointer".to_string())
            .spawn(move || poll(weak));
        if let Err(e) = spawned {
            warn!(error = %e, "Failed to spawn pointer thread; pointer will not be drawn");
        }

        pointer
    }

    pub(crate) fn store(&self, at: Point) {
        self.position.store(pack(at), Ordering::Relaxed);
        self.known.store(true, Ordering::Release);
    }
}

impl PointerTracker for EnigoPointer {
    fn position(&self) -> Option<Point> {
        self.known
            .load(Ordering::Acquire)
            .then(|| unpack(self.position.load(Ordering::Relaxed)))
    }
}

fn poll(pointer: Weak<EnigoPointer>) {
    // Enigo is not Send, so it is created on and never leaves this thread.
    let enigo = match Enigo::new(&Settings::default()) {
        Ok(enigo) => enigo,
        Err(e) => {
            warn!(error = %e, "Pointer tracking unavailable");
            return;
        }
    };
    debug!("Pointer tracking started");

    while let Some(pointer) = pointer.upgrade() {
        match enigo.location() {
            Ok((x, y)) => pointer.store(Point::new(x, y)),
            Err(e) => trace!(error = %e, "Pointer location unavailable"),
        }
        drop(pointer);
        thread::sleep(POLL_INTERVAL);
    }

    debug!("Pointer tracking stopped");
}

/// Draw an arrow cursor with its tip at `tip`, in frame coordinates.
/// Parts outside the frame are clipped.
pub(crate) fn draw_cursor(frame: &mut Frame, tip: Point) {
    let (width, height) = frame.dimensions();

    for (dy, row) in ARROW.iter().enumerate() {
        for (dx, cell) in row.bytes().enumerate() {
            let color = match cell {
                b'X' => OUTLINE,
                b'.' => FILL,
                _ => continue,
            };
            let x = tip.x + dx as i32;
            let y = tip.y + dy as i32;
            if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                frame.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}
