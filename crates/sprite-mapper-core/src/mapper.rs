use std::cmp::Reverse;

use tracing::{debug, instrument, trace};

use crate::config::MapperConfig;
use crate::error::{MapperError, Result};
use crate::model::{Atlas, CandidateRecord, ImageRequest, PlacedImage, SearchStats, SurfaceStats};
use crate::surface::{Placement, SkylineSurface, Surface};

/// Atlas plus the diagnostics of the search that produced it.
#[derive(Debug, Clone)]
pub struct MappingOutcome<K = String> {
    pub atlas: Atlas<K>,
    pub stats: SearchStats,
}

/// Positions of one successful trial, indexed like the caller's requests.
struct Layout {
    width: u32,
    height: u32,
    positions: Vec<(u32, u32)>,
}

impl Layout {
    fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

enum Trial {
    Mapped {
        layout: Layout,
        /// Deficit reported for the tallest of the rectangles reaching furthest right.
        right_flushed_deficit: Option<u32>,
    },
    Failed {
        deficit: Option<u32>,
    },
}

/// Searches for the smallest-area atlas holding a set of images.
///
/// The search starts with a wide, flat canvas and keeps narrowing it: every
/// successful trial sets the next width to one less than the best atlas so far and
/// raises the height by the amount the right-most image will need once it has to
/// move. Failed trials raise the height by the deficit the surface reports.
/// Candidates that cannot beat the best atlas, or cannot hold the total image
/// area, are skipped without running a trial.
///
/// A mapper owns its surface, so one mapper serves one search at a time.
pub struct AtlasMapper<S = SkylineSurface> {
    surface: S,
    config: MapperConfig,
}

impl AtlasMapper<SkylineSurface> {
    pub fn new(config: MapperConfig) -> Self {
        Self::with_surface(SkylineSurface::new(), config)
    }
}

impl Default for AtlasMapper<SkylineSurface> {
    fn default() -> Self {
        Self::new(MapperConfig::default())
    }
}

impl<S: Surface> AtlasMapper<S> {
    pub fn with_surface(surface: S, config: MapperConfig) -> Self {
        Self { surface, config }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Maps `requests` into an atlas. See [`AtlasMapper::map_with_stats`].
    pub fn map<K: Clone>(&mut self, requests: &[ImageRequest<K>]) -> Result<Atlas<K>> {
        self.map_with_stats(requests).map(|outcome| outcome.atlas)
    }

    /// Maps `requests` into the smallest atlas found within the configured limits.
    ///
    /// Errors:
    /// - `Empty` for no requests, `InvalidRequest` for a zero width or height
    /// - `InvalidConfig` when the configuration does not validate
    /// - `Ungroupable` when the widest request exceeds `max_canvas_width`
    #[instrument(skip_all, fields(requests = requests.len()))]
    pub fn map_with_stats<K: Clone>(
        &mut self,
        requests: &[ImageRequest<K>],
    ) -> Result<MappingOutcome<K>> {
        self.config.validate()?;
        if requests.is_empty() {
            return Err(MapperError::Empty);
        }
        if let Some((index, r)) = requests
            .iter()
            .enumerate()
            .find(|(_, r)| r.width == 0 || r.height == 0)
        {
            return Err(MapperError::InvalidRequest {
                index,
                width: r.width,
                height: r.height,
            });
        }

        // Tallest first; the sort is stable so equal heights keep input order.
        let mut order: Vec<usize> = (0..requests.len()).collect();
        order.sort_by_key(|&i| Reverse(requests[i].height));

        let total_area: u64 = requests.iter().map(ImageRequest::area).sum();
        let widest = requests.iter().map(|r| r.width).max().unwrap_or(0);
        let tallest = requests[order[0]].height;

        let max_width = self.config.max_canvas_width;
        if widest > max_width {
            return Err(MapperError::Ungroupable { widest, max_width });
        }

        let cutoff = self.config.cutoff_efficiency;
        let max_candidates = self.config.max_candidate_atlases.unwrap_or(usize::MAX) as u64;

        let mut width = max_width;
        let min_height = u32::try_from(total_area.div_ceil(u64::from(width))).map_err(|_| {
            MapperError::TooLarge(format!(
                "total image area {total_area} does not fit a {width}px wide canvas"
            ))
        })?;
        let mut height = tallest.max(min_height);

        let mut stats = SearchStats::default();
        let mut best: Option<Layout> = None;

        while width >= widest {
            let (trial, surface_stats) = self.run_trial(requests, &order, width, height)?;
            stats.absorb(&surface_stats);

            let grow_by = match trial {
                Trial::Failed { deficit } => {
                    stats.failed_trials += 1;
                    trace!(width, height, ?deficit, "trial failed");
                    deficit
                }
                Trial::Mapped {
                    layout,
                    right_flushed_deficit,
                } => {
                    stats.candidates_generated += 1;
                    let retained = best.as_ref().is_none_or(|b| layout.area() < b.area());
                    stats.history.push(CandidateRecord {
                        canvas_width: width,
                        canvas_height: height,
                        width: layout.width,
                        height: layout.height,
                        retained,
                    });
                    debug!(
                        width = layout.width,
                        height = layout.height,
                        area = layout.area(),
                        retained,
                        "candidate atlas"
                    );

                    if retained {
                        let efficiency = total_area as f64 / layout.area() as f64;
                        best = Some(layout);
                        if efficiency >= cutoff {
                            debug!(efficiency, "cutoff efficiency reached");
                            break;
                        }
                    }
                    if stats.candidates_generated >= max_candidates {
                        debug!(candidates = stats.candidates_generated, "candidate budget spent");
                        break;
                    }
                    // Width never grows again, so later atlases are never wider.
                    if let Some(b) = &best {
                        width = width.min(b.width.saturating_sub(1));
                    }
                    right_flushed_deficit
                }
            };

            let Some(grown) = height.checked_add(grow_by.unwrap_or(1).max(1)) else {
                debug!(height, "canvas height exhausted");
                break;
            };
            height = grown;

            if let Some(b) = &best {
                if !prune(&mut width, &mut height, widest, b.area(), total_area, &mut stats) {
                    break;
                }
            }
        }

        let layout = best.ok_or(MapperError::NoAtlas)?;
        let mut atlas = Atlas::default();
        for (index, (request, &(x, y))) in requests.iter().zip(&layout.positions).enumerate() {
            atlas.push(PlacedImage {
                key: request.key.clone(),
                index,
                x,
                y,
                width: request.width,
                height: request.height,
            });
        }
        debug_assert_eq!((atlas.width, atlas.height), (layout.width, layout.height));
        debug!(
            width = atlas.width,
            height = atlas.height,
            trials = stats.trials,
            candidates = stats.candidates_generated,
            "mapping finished"
        );
        Ok(MappingOutcome { atlas, stats })
    }

    /// Places every request, tallest first, on a `width` x `height` surface.
    fn run_trial<K>(
        &mut self,
        requests: &[ImageRequest<K>],
        order: &[usize],
        width: u32,
        height: u32,
    ) -> Result<(Trial, SurfaceStats)> {
        self.surface.configure(width, height);

        let mut layout = Layout {
            width: 0,
            height: 0,
            positions: vec![(0, 0); requests.len()],
        };
        let mut furthest_right = 0;
        let mut flushed_height = 0;
        let mut right_flushed_deficit = None;

        for &i in order {
            let r = &requests[i];
            match self.surface.try_place(r.width, r.height)? {
                Placement::Placed { x, y, deficit } => {
                    layout.positions[i] = (x, y);
                    let right = x + r.width;
                    layout.width = layout.width.max(right);
                    layout.height = layout.height.max(y + r.height);
                    if right > furthest_right
                        || (right == furthest_right && r.height > flushed_height)
                    {
                        furthest_right = right;
                        flushed_height = r.height;
                        right_flushed_deficit = deficit;
                    }
                }
                Placement::Rejected { deficit } => {
                    return Ok((Trial::Failed { deficit }, self.surface.statistics()));
                }
            }
        }

        let trial = Trial::Mapped {
            layout,
            right_flushed_deficit,
        };
        Ok((trial, self.surface.statistics()))
    }
}

/// Moves `(width, height)` past candidates that are either larger than the best
/// atlas or smaller than the total image area.
/// Returns false when the height cannot grow any further.
fn prune(
    width: &mut u32,
    height: &mut u32,
    widest: u32,
    best_area: u64,
    total_area: u64,
    stats: &mut SearchStats,
) -> bool {
    while *width >= widest {
        let area = u64::from(*width) * u64::from(*height);
        let bigger_than_best = area > best_area;
        let smaller_than_images = area < total_area;
        if !bigger_than_best && !smaller_than_images {
            break;
        }
        if bigger_than_best {
            *width -= 1;
        }
        if smaller_than_images {
            let Some(grown) = height.checked_add(1) else {
                return false;
            };
            *height = grown;
        }
        stats.prune_steps += 1;
    }
    true
}

/// Maps `requests` with a fresh skyline-backed mapper.
pub fn map_atlas<K: Clone>(requests: &[ImageRequest<K>], config: MapperConfig) -> Result<Atlas<K>> {
    AtlasMapper::new(config).map(requests)
}
