use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }
    /// True if the interiors of `self` and `other` share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
    /// Returns true if `r` is fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
}

/// One rectangle to place, with an opaque caller key (file name, asset handle, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRequest<K = String> {
    pub key: K,
    pub width: u32,
    pub height: u32,
}

impl<K> ImageRequest<K> {
    pub fn new(key: K, width: u32, height: u32) -> Self {
        Self { key, width, height }
    }
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Placement of one request inside an atlas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacedImage<K = String> {
    pub key: K,
    /// Position of the originating request in the caller's input slice.
    pub index: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl<K> PlacedImage<K> {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// A successful mapping: canvas size plus one placement per request, in input order.
///
/// `width`/`height` are the bounding box of the placements, not the size of the
/// surface the trial ran on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Atlas<K = String> {
    pub width: u32,
    pub height: u32,
    pub images: Vec<PlacedImage<K>>,
}

impl<K> Default for Atlas<K> {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            images: Vec::new(),
        }
    }
}

impl<K> Atlas<K> {
    /// Adds a placement and grows the canvas to cover it.
    pub fn push(&mut self, image: PlacedImage<K>) {
        self.width = self.width.max(image.x + image.width);
        self.height = self.height.max(image.y + image.height);
        self.images.push(image);
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Sum of the placed image areas.
    pub fn used_area(&self) -> u64 {
        self.images.iter().map(|p| p.rect().area()).sum()
    }

    /// `used_area / area`, 0.0 for an empty atlas.
    pub fn efficiency(&self) -> f64 {
        let area = self.area();
        if area == 0 {
            0.0
        } else {
            self.used_area() as f64 / area as f64
        }
    }

    /// Computes packing statistics for this atlas.
    pub fn stats(&self) -> PackStats {
        let canvas_area = self.area();
        let used_area = self.used_area();
        PackStats {
            num_images: self.images.len(),
            width: self.width,
            height: self.height,
            canvas_area,
            used_area,
            occupancy: self.efficiency(),
        }
    }

    /// Converts keys, keeping geometry and order.
    pub fn map_keys<T>(self, mut f: impl FnMut(K) -> T) -> Atlas<T> {
        Atlas {
            width: self.width,
            height: self.height,
            images: self
                .images
                .into_iter()
                .map(|p| PlacedImage {
                    key: f(p.key),
                    index: p.index,
                    x: p.x,
                    y: p.y,
                    width: p.width,
                    height: p.height,
                })
                .collect(),
        }
    }
}

/// Diagnostics of a single placement surface trial.
///
/// Reset whenever the surface is configured.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SurfaceStats {
    /// Calls to `try_place` since the last `configure`.
    pub placement_attempts: u64,
    /// Skyline segments created since the last `configure`.
    pub cells_generated: u64,
    /// Extra height the most recent failed placement needed. `None` means no
    /// placement failed, or the failure could not be fixed by height alone.
    pub lowest_free_height_deficit: Option<u32>,
}

/// One successful candidate produced during a search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateRecord {
    /// Surface width the trial ran with.
    pub canvas_width: u32,
    /// Surface height the trial ran with.
    pub canvas_height: u32,
    /// Bounding box of the resulting placements.
    pub width: u32,
    pub height: u32,
    /// Whether the candidate replaced the best atlas so far.
    pub retained: bool,
}

impl CandidateRecord {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Aggregated diagnostics of one `AtlasMapper::map` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchStats {
    /// Surface trials run (successful and failed).
    pub trials: u64,
    pub failed_trials: u64,
    /// Trials that placed every request.
    pub candidates_generated: u64,
    /// Width/height adjustments made by the pruning step.
    pub prune_steps: u64,
    pub placement_attempts: u64,
    pub cells_generated: u64,
    /// Successful candidates in the order they were produced.
    pub history: Vec<CandidateRecord>,
}

impl SearchStats {
    pub(crate) fn absorb(&mut self, surface: &SurfaceStats) {
        self.trials += 1;
        self.placement_attempts += surface.placement_attempts;
        self.cells_generated += surface.cells_generated;
    }
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    pub num_images: usize,
    pub width: u32,
    pub height: u32,
    /// `width * height`.
    pub canvas_area: u64,
    /// Sum of image areas.
    pub used_area: u64,
    /// Occupancy ratio: used_area / canvas_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Images: {}, Canvas: {}x{}, Occupancy: {:.2}%, Canvas Area: {} px², Used Area: {} px²",
            self.num_images,
            self.width,
            self.height,
            self.occupancy * 100.0,
            self.canvas_area,
            self.used_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.canvas_area.saturating_sub(self.used_area)
    }

    /// Returns wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.canvas_area > 0 {
            (self.wasted_area() as f64 / self.canvas_area as f64) * 100.0
        } else {
            0.0
        }
    }
}
