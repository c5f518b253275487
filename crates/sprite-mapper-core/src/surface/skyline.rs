use super::{Placement, Surface};
use crate::error::{MapperError, Result};
use crate::model::{Rect, SurfaceStats};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Segment {
    x: u32,
    y: u32,
    w: u32,
}

impl Segment {
    #[inline]
    fn right(&self) -> u32 {
        self.x + self.w
    }
}

/// Result of scanning every candidate position for one rectangle.
struct Scan {
    /// Lowest (then leftmost) fitting position: (segment index, y).
    fit: Option<(usize, u32)>,
    /// Smallest height overflow among positions that only failed on height.
    lowest_deficit: Option<u32>,
}

/// Placement surface backed by a skyline: a run-length list of column tops.
///
/// Segments are sorted by `x`, contiguous, and together cover `[0, width)`.
/// Rectangles are placed bottom-left: lowest top first, leftmost on ties.
#[derive(Debug, Clone, Default)]
pub struct SkylineSurface {
    width: u32,
    height: u32,
    skyline: Vec<Segment>,
    stats: SurfaceStats,
}

impl SkylineSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a surface already configured to `width` x `height`.
    pub fn with_size(width: u32, height: u32) -> Self {
        let mut surface = Self::new();
        surface.configure(width, height);
        surface
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Skyline height at column `x`, `None` outside the surface.
    pub fn top_at(&self, x: u32) -> Option<u32> {
        self.skyline
            .iter()
            .find(|seg| seg.x <= x && x < seg.right())
            .map(|seg| seg.y)
    }

    /// Number of skyline segments currently alive.
    pub fn segment_count(&self) -> usize {
        self.skyline.len()
    }

    /// Highest point of the rectangle's base if its left edge sits on segment `i`.
    /// `None` when the span runs past the right edge.
    fn span_top(&self, i: usize, w: u32) -> Option<u32> {
        let left = self.skyline[i].x;
        let right = left.checked_add(w).filter(|&r| r <= self.width)?;
        let top = self.skyline[i..]
            .iter()
            .take_while(|seg| seg.x < right)
            .map(|seg| seg.y)
            .max()
            .unwrap_or(0);
        Some(top)
    }

    fn scan(&self, w: u32, h: u32) -> Scan {
        let mut fit: Option<(usize, u32)> = None;
        let mut lowest_deficit: Option<u32> = None;
        for i in 0..self.skyline.len() {
            // Later segments start further right, so once one overflows all do.
            let Some(top) = self.span_top(i, w) else {
                break;
            };
            let bottom = u64::from(top) + u64::from(h);
            if bottom <= u64::from(self.height) {
                if fit.is_none_or(|(_, best)| top < best) {
                    fit = Some((i, top));
                }
            } else {
                let deficit = u32::try_from(bottom - u64::from(self.height)).unwrap_or(u32::MAX);
                lowest_deficit = Some(lowest_deficit.map_or(deficit, |d| d.min(deficit)));
            }
        }
        Scan {
            fit,
            lowest_deficit,
        }
    }

    fn commit(&mut self, index: usize, rect: Rect) {
        debug_assert_eq!(self.skyline[index].x, rect.x);
        debug_assert!(rect.bottom() <= self.height);

        let right = rect.right();
        self.skyline.insert(
            index,
            Segment {
                x: rect.x,
                y: rect.bottom(),
                w: rect.w,
            },
        );
        self.stats.cells_generated += 1;

        // Drop or shorten the segments now hidden under the new one.
        let i = index + 1;
        while i < self.skyline.len() {
            let seg = self.skyline[i];
            if seg.x >= right {
                break;
            }
            if seg.right() <= right {
                self.skyline.remove(i);
            } else {
                let shrink = right - seg.x;
                self.skyline[i].x += shrink;
                self.skyline[i].w -= shrink;
                break;
            }
        }
        self.merge();
    }

    fn merge(&mut self) {
        let mut i = 1;
        while i < self.skyline.len() {
            if self.skyline[i - 1].y == self.skyline[i].y {
                let w = self.skyline[i].w;
                self.skyline[i - 1].w += w;
                self.skyline.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

impl Surface for SkylineSurface {
    fn configure(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.skyline.clear();
        self.stats = SurfaceStats::default();
        if width > 0 {
            self.skyline.push(Segment { x: 0, y: 0, w: width });
            self.stats.cells_generated = 1;
        }
    }

    fn try_place(&mut self, width: u32, height: u32) -> Result<Placement> {
        if width == 0 || height == 0 {
            return Err(MapperError::ZeroSized { width, height });
        }
        self.stats.placement_attempts += 1;

        if width > self.width {
            self.stats.lowest_free_height_deficit = None;
            return Ok(Placement::Rejected { deficit: None });
        }

        let scan = self.scan(width, height);
        match scan.fit {
            Some((index, y)) => {
                let x = self.skyline[index].x;
                self.commit(index, Rect::new(x, y, width, height));
                Ok(Placement::Placed {
                    x,
                    y,
                    deficit: scan.lowest_deficit,
                })
            }
            None => {
                self.stats.lowest_free_height_deficit = scan.lowest_deficit;
                Ok(Placement::Rejected {
                    deficit: scan.lowest_deficit,
                })
            }
        }
    }

    fn statistics(&self) -> SurfaceStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(s: &SkylineSurface) {
        let mut x = 0;
        for pair in s.skyline.windows(2) {
            assert_ne!(pair[0].y, pair[1].y, "adjacent segments must be merged");
        }
        for seg in &s.skyline {
            assert_eq!(seg.x, x, "segments must be contiguous");
            assert!(seg.w > 0);
            assert!(seg.y <= s.height);
            x = seg.right();
        }
        assert_eq!(x, s.width);
    }

    #[test]
    fn skyline_stays_contiguous_and_merged() {
        let mut s = SkylineSurface::with_size(32, 32);
        for (w, h) in [(8, 8), (8, 4), (16, 8), (4, 4), (4, 2), (12, 3), (32, 1)] {
            let p = s.try_place(w, h).unwrap();
            assert!(p.is_placed(), "{w}x{h} should fit");
            assert_well_formed(&s);
        }
    }

    #[test]
    fn covering_rect_collapses_segments() {
        let mut s = SkylineSurface::with_size(12, 20);
        s.try_place(4, 6).unwrap();
        s.try_place(4, 3).unwrap();
        s.try_place(4, 6).unwrap();
        assert_eq!(s.segment_count(), 3);
        // 4x3 lands in the dip, then a full-width rect flattens everything.
        assert_eq!(s.try_place(4, 3).unwrap().position(), Some((4, 3)));
        assert_eq!(s.try_place(12, 2).unwrap().position(), Some((0, 6)));
        assert_eq!(s.segment_count(), 1);
        assert_well_formed(&s);
    }
}
