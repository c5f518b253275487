//! Core library for mapping images into a single smallest-area texture atlas.
//!
//! - Surface: `SkylineSurface` places rectangles bottom-left on a fixed canvas (pluggable via `Surface`)
//! - Search: `AtlasMapper` runs surface trials over shrinking widths and growing heights and keeps the smallest atlas
//! - Pipeline: `pack_layout` maps sizes only; `pack_images` (feature `image`) also composes the RGBA canvas
//! - Data model is serde-serializable; JSON exporters are provided in `export`.
//!
//! Quick example:
//! ```
//! use sprite_mapper_core::prelude::*;
//! # fn main() -> sprite_mapper_core::Result<()> {
//! let requests = vec![
//!     ImageRequest::new("a", 10, 10),
//!     ImageRequest::new("b", 10, 10),
//! ];
//! let cfg = MapperConfig::builder().cutoff_efficiency(0.95).build();
//! let atlas = AtlasMapper::new(cfg).map(&requests)?;
//! assert_eq!(atlas.area(), 200);
//! # Ok(()) }
//! ```

#[cfg(feature = "image")]
pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod mapper;
pub mod model;
pub mod pipeline;
pub mod surface;

pub use config::*;
pub use error::*;
pub use export::*;
pub use mapper::*;
pub use model::*;
pub use pipeline::*;
pub use surface::*;

/// Convenience prelude for common types and functions.
/// Importing `sprite_mapper_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{MapperConfig, MapperConfigBuilder};
    pub use crate::mapper::{AtlasMapper, MappingOutcome, map_atlas};
    pub use crate::model::{
        Atlas, ImageRequest, PackStats, PlacedImage, Rect, SearchStats, SurfaceStats,
    };
    pub use crate::pipeline::{map_batch, pack_layout};
    #[cfg(feature = "image")]
    pub use crate::pipeline::{InputImage, PackOutput, pack_images};
    pub use crate::surface::{Placement, SkylineSurface, Surface};
}
