use crate::error::Result;
use crate::model::SurfaceStats;

pub mod skyline;

pub use skyline::SkylineSurface;

/// Outcome of a single `Surface::try_place` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The rectangle was committed at `(x, y)`.
    ///
    /// `deficit` is the smallest extra height that would have made one of the
    /// other candidate positions fit, `None` if no position was rejected for height.
    Placed { x: u32, y: u32, deficit: Option<u32> },
    /// No position fits. `deficit` is the extra height the best position needs;
    /// `None` when no amount of height helps (rectangle wider than the surface).
    Rejected { deficit: Option<u32> },
}

impl Placement {
    pub fn is_placed(&self) -> bool {
        matches!(self, Placement::Placed { .. })
    }
    pub fn position(&self) -> Option<(u32, u32)> {
        match *self {
            Placement::Placed { x, y, .. } => Some((x, y)),
            Placement::Rejected { .. } => None,
        }
    }
    pub fn deficit(&self) -> Option<u32> {
        match *self {
            Placement::Placed { deficit, .. } | Placement::Rejected { deficit } => deficit,
        }
    }
}

/// A fixed-size surface that places rectangles one at a time.
///
/// Implementations must never overlap committed rectangles or exceed the configured
/// bounds, and must prefer the lowest position, then the leftmost one.
/// Zero-sized rectangles are a caller error (`MapperError::ZeroSized`).
pub trait Surface {
    /// Empties the surface, sets its bounds and clears its statistics.
    fn configure(&mut self, width: u32, height: u32);
    fn try_place(&mut self, width: u32, height: u32) -> Result<Placement>;
    /// Snapshot of the statistics since the last `configure`.
    fn statistics(&self) -> SurfaceStats;
}
