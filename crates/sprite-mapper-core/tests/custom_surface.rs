use sprite_mapper_core::error::Result;
use sprite_mapper_core::prelude::*;

/// Wraps the skyline surface and records every configuration it receives.
#[derive(Default)]
struct RecordingSurface {
    inner: SkylineSurface,
    configured: Vec<(u32, u32)>,
    attempts: u64,
}

impl Surface for RecordingSurface {
    fn configure(&mut self, width: u32, height: u32) {
        self.configured.push((width, height));
        self.inner.configure(width, height);
    }

    fn try_place(&mut self, width: u32, height: u32) -> Result<Placement> {
        self.attempts += 1;
        self.inner.try_place(width, height)
    }

    fn statistics(&self) -> SurfaceStats {
        self.inner.statistics()
    }
}

#[test]
fn one_configure_per_trial() {
    let reqs: Vec<ImageRequest<u8>> = [(30, 20), (10, 40), (25, 25), (5, 5), (40, 10)]
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| ImageRequest::new(i as u8, w, h))
        .collect();
    let mut mapper = AtlasMapper::with_surface(RecordingSurface::default(), MapperConfig::default());
    let outcome = mapper.map_with_stats(&reqs).expect("map");

    let surface = mapper.surface();
    assert_eq!(surface.configured.len() as u64, outcome.stats.trials);
    assert_eq!(surface.attempts, outcome.stats.placement_attempts);
    // The first trial starts at the width ceiling with the tallest image's height.
    assert_eq!(surface.configured[0], (4096, 40));
    // Canvas widths never grow between trials.
    assert!(surface.configured.windows(2).all(|w| w[1].0 <= w[0].0));
}

/// A surface that only ever accepts a single image per trial.
#[derive(Default)]
struct OneShotSurface {
    width: u32,
    height: u32,
    used: bool,
}

impl Surface for OneShotSurface {
    fn configure(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.used = false;
    }

    fn try_place(&mut self, width: u32, height: u32) -> Result<Placement> {
        if self.used || width > self.width || height > self.height {
            return Ok(Placement::Rejected { deficit: None });
        }
        self.used = true;
        Ok(Placement::Placed {
            x: 0,
            y: 0,
            deficit: None,
        })
    }

    fn statistics(&self) -> SurfaceStats {
        SurfaceStats::default()
    }
}

#[test]
fn surface_without_deficits_still_terminates() {
    let reqs = vec![ImageRequest::new("solo", 7, 3)];
    let cfg = MapperConfig::builder().max_canvas_width(32).build();
    let atlas = AtlasMapper::with_surface(OneShotSurface::default(), cfg)
        .map(&reqs)
        .expect("map");
    assert_eq!((atlas.width, atlas.height), (7, 3));
}
