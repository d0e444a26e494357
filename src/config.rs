//! Clustering configuration.
//!
//! [`ClusterConfig`] is cloned into every clustering pass, so changing it
//! never affects a pass that is already running. Everything except the
//! closure-valued policies is serializable and can be loaded from JSON.

use crate::error::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Deepest zoom level the engine distinguishes.
pub const MAX_ZOOM_LEVEL: f64 = 20.0;

/// Where a cluster marker is placed relative to its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClusterPosition {
    /// Geometric center of the grid cell
    Center,
    /// The member closest to the center of the grid cell
    #[default]
    NearCenter,
    /// Arithmetic mean of member latitudes and longitudes
    Average,
    /// The first member in iteration order
    First,
}

/// Width and height of a grid cell, in screen points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    pub width: f64,
    pub height: f64,
}

impl CellSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A square cell.
    pub const fn square(side: f64) -> Self {
        Self::new(side, side)
    }

    /// Both dimensions are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A caller-supplied mapping from zoom scale to cell size.
#[derive(Clone)]
pub struct CellSizeFn(pub Arc<dyn Fn(f64) -> CellSize + Send + Sync>);

impl CellSizeFn {
    pub fn new(f: impl Fn(f64) -> CellSize + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for CellSizeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CellSizeFn(..)")
    }
}

/// A caller-supplied mapping from zoom scale to zoom level.
#[derive(Clone)]
pub struct ZoomLevelFn(pub Arc<dyn Fn(f64) -> f64 + Send + Sync>);

impl ZoomLevelFn {
    pub fn new(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for ZoomLevelFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ZoomLevelFn(..)")
    }
}

/// How grid cells are sized for a zoom scale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellSizePolicy {
    /// Smaller cells as the map zooms in (see [`adaptive_cell_size`])
    #[default]
    Adaptive,
    /// The same cell size at every zoom scale
    Fixed(CellSize),
    /// Computed by a closure; not serializable
    #[serde(skip)]
    Custom(CellSizeFn),
}

/// Zoom level for a zoom scale on the Web Mercator world plane.
///
/// `zoom_scale` is screen points per world unit, so a scale of 1.0 is the
/// deepest level. Non-finite or non-positive scales map to level 0.
///
/// ```
/// use geocluster::config::default_zoom_level;
///
/// assert_eq!(default_zoom_level(1.0), 20.0);
/// assert_eq!(default_zoom_level(1.0 / 1024.0), 10.0);
/// assert_eq!(default_zoom_level(1e-12), 0.0);
/// ```
pub fn default_zoom_level(zoom_scale: f64) -> f64 {
    if !zoom_scale.is_finite() || zoom_scale <= 0.0 {
        return 0.0;
    }
    (MAX_ZOOM_LEVEL + (zoom_scale.log2() + 0.5).floor()).clamp(0.0, MAX_ZOOM_LEVEL)
}

/// Default cell size for a zoom level: coarse cells far out, fine cells close in.
pub fn adaptive_cell_size(zoom_level: f64) -> CellSize {
    match zoom_level {
        z if z >= 19.0 => CellSize::square(16.0),
        z if z >= 16.0 => CellSize::square(32.0),
        z if z >= 13.0 => CellSize::square(64.0),
        _ => CellSize::square(88.0),
    }
}

/// Policy bundle read by every clustering pass.
///
/// # Example
///
/// ```rust
/// use geocluster::{ClusterConfig, ClusterPosition};
///
/// let config = ClusterConfig::default()
///     .with_min_count_for_clustering(3)
///     .with_cluster_position(ClusterPosition::Average);
/// assert!(config.validate().is_ok());
///
/// let json = r#"{
///     "max_zoom_level": 16,
///     "cluster_position": "center",
///     "cell_size": { "fixed": { "width": 64, "height": 64 } }
/// }"#;
/// let config = ClusterConfig::from_json(json).unwrap();
/// assert_eq!(config.cluster_position, ClusterPosition::Center);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Clustering is disabled above this zoom level (0-20)
    #[serde(default = "ClusterConfig::default_max_zoom_level")]
    pub max_zoom_level: f64,

    /// Minimum number of annotations in a cell for it to become a cluster
    #[serde(default = "ClusterConfig::default_min_count_for_clustering")]
    pub min_count_for_clustering: usize,

    /// Remove annotations that left the viewport, instead of keeping them displayed
    #[serde(default = "ClusterConfig::default_true")]
    pub should_remove_invisible_annotations: bool,

    /// Spread annotations sharing a coordinate onto a small circle
    #[serde(default = "ClusterConfig::default_true")]
    pub should_distribute_annotations_on_same_coordinate: bool,

    #[serde(default)]
    pub cluster_position: ClusterPosition,

    #[serde(default)]
    pub cell_size: CellSizePolicy,

    /// Base spacing in meters for distributed annotations; a group of `n`
    /// is spread on a circle of radius `distance * n / 2`
    #[serde(default = "ClusterConfig::default_distance_from_contested_location")]
    pub distance_from_contested_location: f64,

    /// Overrides [`default_zoom_level`]
    #[serde(skip)]
    pub zoom_level_fn: Option<ZoomLevelFn>,
}

impl ClusterConfig {
    const fn default_max_zoom_level() -> f64 {
        MAX_ZOOM_LEVEL
    }

    const fn default_min_count_for_clustering() -> usize {
        2
    }

    const fn default_true() -> bool {
        true
    }

    const fn default_distance_from_contested_location() -> f64 {
        3.0
    }

    /// Parse a JSON document and validate the result.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_zoom_level(mut self, level: f64) -> Self {
        self.max_zoom_level = level;
        self
    }

    pub fn with_min_count_for_clustering(mut self, count: usize) -> Self {
        self.min_count_for_clustering = count;
        self
    }

    pub fn with_remove_invisible_annotations(mut self, remove: bool) -> Self {
        self.should_remove_invisible_annotations = remove;
        self
    }

    pub fn with_distribute_on_same_coordinate(mut self, distribute: bool) -> Self {
        self.should_distribute_annotations_on_same_coordinate = distribute;
        self
    }

    pub fn with_cluster_position(mut self, position: ClusterPosition) -> Self {
        self.cluster_position = position;
        self
    }

    pub fn with_cell_size(mut self, policy: CellSizePolicy) -> Self {
        self.cell_size = policy;
        self
    }

    /// Compute cell sizes with a closure of the zoom scale.
    pub fn with_cell_size_fn(self, f: impl Fn(f64) -> CellSize + Send + Sync + 'static) -> Self {
        self.with_cell_size(CellSizePolicy::Custom(CellSizeFn::new(f)))
    }

    pub fn with_distance_from_contested_location(mut self, meters: f64) -> Self {
        self.distance_from_contested_location = meters;
        self
    }

    /// Replace the zoom scale to zoom level mapping.
    pub fn with_zoom_level_fn(mut self, f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        self.zoom_level_fn = Some(ZoomLevelFn::new(f));
        self
    }

    /// Zoom level for a zoom scale, clamped to `[0, 20]`.
    pub fn zoom_level(&self, zoom_scale: f64) -> f64 {
        let level = match &self.zoom_level_fn {
            Some(f) => (f.0)(zoom_scale),
            None => default_zoom_level(zoom_scale),
        };
        if level.is_nan() {
            return 0.0;
        }
        level.clamp(0.0, MAX_ZOOM_LEVEL)
    }

    /// Cell size the configured policy yields for a zoom scale.
    ///
    /// A custom policy returning an unusable size falls back to the adaptive one.
    pub fn cell_size_for(&self, zoom_scale: f64) -> CellSize {
        let size = match &self.cell_size {
            CellSizePolicy::Adaptive => return adaptive_cell_size(self.zoom_level(zoom_scale)),
            CellSizePolicy::Fixed(size) => *size,
            CellSizePolicy::Custom(f) => (f.0)(zoom_scale),
        };
        if size.is_valid() {
            size
        } else {
            log::warn!(
                "Ignoring invalid cell size {}x{} for zoom scale {}",
                size.width,
                size.height,
                zoom_scale
            );
            adaptive_cell_size(self.zoom_level(zoom_scale))
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let zoom = self.max_zoom_level;
        if !zoom.is_finite() || !(0.0..=MAX_ZOOM_LEVEL).contains(&zoom) {
            return Err(ClusterError::InvalidConfig(format!(
                "max_zoom_level must be between 0 and {}, got: {}",
                MAX_ZOOM_LEVEL, self.max_zoom_level
            )));
        }

        if self.min_count_for_clustering == 0 {
            return Err(ClusterError::InvalidConfig(
                "min_count_for_clustering must be greater than zero".to_string(),
            ));
        }

        let distance = self.distance_from_contested_location;
        if !distance.is_finite() || distance <= 0.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "distance_from_contested_location must be positive and finite, got: {}",
                distance
            )));
        }

        if let CellSizePolicy::Fixed(size) = &self.cell_size
            && !size.is_valid()
        {
            return Err(ClusterError::InvalidConfig(format!(
                "Fixed cell size must be positive and finite, got: {}x{}",
                size.width, size.height
            )));
        }

        Ok(())
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_zoom_level: Self::default_max_zoom_level(),
            min_count_for_clustering: Self::default_min_count_for_clustering(),
            should_remove_invisible_annotations: true,
            should_distribute_annotations_on_same_coordinate: true,
            cluster_position: ClusterPosition::default(),
            cell_size: CellSizePolicy::default(),
            distance_from_contested_location: Self::default_distance_from_contested_location(),
            zoom_level_fn: None,
        }
    }
}
