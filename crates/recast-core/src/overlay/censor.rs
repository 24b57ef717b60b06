use crate::{
    capture::{Frame, PointTransform},
    overlay::{CensorRegion, Overlay, draw},
};

const BLACK: [u8; 4] = [0, 0, 0, 255];

/// Blacks out the configured regions. Always first in the chain so nothing
/// drawn later can leak what it hides.
pub struct CensorOverlay {
    regions: Vec<CensorRegion>,
}

impl CensorOverlay {
    /// Keep only the regions marked for display.
    pub fn new(regions: &[CensorRegion]) -> Self {
        Self {
            regions: regions.iter().filter(|r| r.display).cloned().collect(),
        }
    }
}

impl Overlay for CensorOverlay {
    fn name(&self) -> &'static str {
        "censor"
    }

    fn draw(&mut self, frame: &mut Frame, _transform: &PointTransform) {
        for region in &self.regions {
            draw::fill_rect(frame, region.rect, BLACK);
        }
    }
}
