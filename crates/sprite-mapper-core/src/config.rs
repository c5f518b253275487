use serde::{Deserialize, Serialize};

/// Largest canvas width the search starts from unless configured otherwise.
pub const MAX_CANVAS_DIMENSION: u32 = 4096;

/// Search effort limits.
/// Key notes:
///   - `cutoff_efficiency` stops the search once the best atlas reaches this image-area / canvas-area ratio
///   - `max_candidate_atlases` stops the search after this many successful candidates (None = unbounded)
///   - `max_canvas_width` is the width the search starts from; wider images are rejected as ungroupable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapperConfig {
    /// Stop early once the best atlas has at least this efficiency.
    /// 1.0 (or higher) keeps searching until a perfect packing or the width floor.
    #[serde(default = "default_cutoff_efficiency")]
    pub cutoff_efficiency: f64,
    /// Maximum number of candidate atlases to generate. Set to `Some(1)` to take the
    /// very first atlas that fits.
    #[serde(default)]
    pub max_candidate_atlases: Option<usize>,
    /// Upper bound (and starting point) for the canvas width search.
    #[serde(default = "default_max_canvas_width")]
    pub max_canvas_width: u32,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            cutoff_efficiency: default_cutoff_efficiency(),
            max_candidate_atlases: None,
            max_canvas_width: default_max_canvas_width(),
        }
    }
}

impl MapperConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - `cutoff_efficiency` is NaN, infinite, or not positive
    /// - `max_candidate_atlases` is `Some(0)`
    /// - `max_canvas_width` is zero
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::MapperError;

        if !self.cutoff_efficiency.is_finite() || self.cutoff_efficiency <= 0.0 {
            return Err(MapperError::InvalidConfig(format!(
                "cutoff_efficiency must be a positive finite number, got {}",
                self.cutoff_efficiency
            )));
        }
        if self.max_candidate_atlases == Some(0) {
            return Err(MapperError::InvalidConfig(
                "max_candidate_atlases must be at least 1".into(),
            ));
        }
        if self.max_canvas_width == 0 {
            return Err(MapperError::InvalidConfig(
                "max_canvas_width must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Create a fluent builder for `MapperConfig`.
    pub fn builder() -> MapperConfigBuilder {
        MapperConfigBuilder::new()
    }
}

fn default_cutoff_efficiency() -> f64 {
    1.0
}
fn default_max_canvas_width() -> u32 {
    MAX_CANVAS_DIMENSION
}

/// Builder for `MapperConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct MapperConfigBuilder {
    cfg: MapperConfig,
}

impl MapperConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: MapperConfig::default(),
        }
    }
    pub fn cutoff_efficiency(mut self, v: f64) -> Self {
        self.cfg.cutoff_efficiency = v;
        self
    }
    pub fn max_candidate_atlases(mut self, v: Option<usize>) -> Self {
        self.cfg.max_candidate_atlases = v;
        self
    }
    pub fn max_canvas_width(mut self, v: u32) -> Self {
        self.cfg.max_canvas_width = v;
        self
    }
    pub fn build(self) -> MapperConfig {
        self.cfg
    }
}
