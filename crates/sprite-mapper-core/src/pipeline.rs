use crate::config::MapperConfig;
use crate::error::Result;
use crate::mapper::AtlasMapper;
use crate::model::{Atlas, ImageRequest};
use tracing::instrument;

#[cfg(feature = "image")]
use crate::{error::MapperError, model::SearchStats};
#[cfg(feature = "image")]
use image::{DynamicImage, RgbaImage};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// In-memory image to pack (key + decoded image).
#[cfg(feature = "image")]
pub struct InputImage {
    pub key: String,
    pub image: DynamicImage,
}

/// Output of `pack_images`: the layout, the search diagnostics and the composed canvas.
#[cfg(feature = "image")]
pub struct PackOutput {
    pub atlas: Atlas,
    pub search: SearchStats,
    pub rgba: RgbaImage,
}

#[cfg(feature = "image")]
impl PackOutput {
    /// Computes packing statistics for this output.
    /// This is a convenience method that delegates to `atlas.stats()`.
    pub fn stats(&self) -> crate::model::PackStats {
        self.atlas.stats()
    }
}

#[cfg(feature = "image")]
#[instrument(skip_all, fields(inputs = inputs.len()))]
/// Maps `inputs` into one atlas and composes the RGBA canvas.
///
/// Placements keep input order; `atlas.images[i].index == i`.
pub fn pack_images(inputs: Vec<InputImage>, cfg: MapperConfig) -> Result<PackOutput> {
    pack_images_with(inputs, cfg, false)
}

/// Same as `pack_images`, optionally drawing red outlines around every image.
#[cfg(feature = "image")]
pub fn pack_images_with(
    inputs: Vec<InputImage>,
    cfg: MapperConfig,
    outlines: bool,
) -> Result<PackOutput> {
    if inputs.is_empty() {
        return Err(MapperError::Empty);
    }
    let sources: Vec<RgbaImage> = inputs.iter().map(|inp| inp.image.to_rgba8()).collect();
    let requests: Vec<ImageRequest> = inputs
        .into_iter()
        .zip(&sources)
        .map(|(inp, rgba)| ImageRequest::new(inp.key, rgba.width(), rgba.height()))
        .collect();

    let outcome = AtlasMapper::new(cfg).map_with_stats(&requests)?;
    let rgba = crate::compositing::compose_atlas(&outcome.atlas, &sources, outlines);
    Ok(PackOutput {
        atlas: outcome.atlas,
        search: outcome.stats,
        rgba,
    })
}

// ---------------- Layout-only API ----------------

/// Maps sizes without touching pixel data.
/// Inputs are (key, width, height); the returned atlas keeps that order.
#[instrument(skip_all, fields(inputs = inputs.len()))]
pub fn pack_layout<K: Into<String>>(
    inputs: Vec<(K, u32, u32)>,
    cfg: MapperConfig,
) -> Result<Atlas<String>> {
    let requests: Vec<ImageRequest> = inputs
        .into_iter()
        .map(|(k, w, h)| ImageRequest::new(k.into(), w, h))
        .collect();
    AtlasMapper::new(cfg).map(&requests)
}

/// Maps several independent request sets, one mapper per set.
///
/// With feature `parallel` the jobs run on the rayon pool; results keep job order
/// either way.
pub fn map_batch<K>(jobs: &[Vec<ImageRequest<K>>], cfg: &MapperConfig) -> Vec<Result<Atlas<K>>>
where
    K: Clone + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        jobs.par_iter()
            .map(|job| AtlasMapper::new(cfg.clone()).map(job))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        let mut mapper = AtlasMapper::new(cfg.clone());
        jobs.iter().map(|job| mapper.map(job)).collect()
    }
}
