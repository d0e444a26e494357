//! Grid-based clustering of geographic map annotations.
//!
//! Annotations live in a quad-tree over the Web Mercator world plane. A
//! reload cuts the viewport into screen-sized cells, merges crowded cells
//! into clusters and reconciles the result against what is displayed, so
//! the [`Presenter`] only ever sees the markers that changed.
//!
//! ```rust
//! use geocluster::prelude::*;
//! use std::sync::Arc;
//!
//! struct Immediate;
//!
//! impl Presenter for Immediate {
//!     fn dispatch(&self, task: Box<dyn FnOnce() + Send>) {
//!         task();
//!     }
//!     fn is_presentation_context(&self) -> bool {
//!         true
//!     }
//!     fn remove_markers(&self, _markers: &[Marker]) {}
//!     fn add_markers(&self, _markers: &[Marker]) {}
//! }
//!
//! let manager = ClusterManagerBuilder::new()
//!     .presenter(Arc::new(Immediate))
//!     .build()?;
//! manager.add_all((0..10).map(|i| {
//!     Arc::new(Annotation::new(Coordinate::new(2.35 + i as f64 * 1e-5, 48.85)))
//! }))?;
//!
//! let paris = MapRect::from_coordinates(&Coordinate::new(2.0, 48.5), &Coordinate::new(2.7, 49.2));
//! let outcome = manager.compute_pass(1.0 / 1024.0, &paris, &CancellationToken::new());
//! let delta = outcome.into_delta().unwrap();
//! assert_eq!(delta.to_add.len(), 1);
//! manager.apply_delta(&delta);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

pub mod annotation;
pub mod builder;
pub mod cancel;
pub mod compute;
pub mod config;
pub mod error;
pub mod manager;
pub mod presentation;
pub mod reconcile;
pub mod spatial_index;

pub use annotation::{Annotation, AnnotationId, Cluster, ClusterKey, Marker, MarkerKey};
pub use builder::ClusterManagerBuilder;
pub use cancel::CancellationToken;
pub use config::{CellSize, CellSizePolicy, ClusterConfig, ClusterPosition};
pub use error::{ClusterError, Result};
pub use manager::{ClusterManager, Completion};
pub use presentation::{ClusterDelegate, Presenter};
pub use reconcile::{Delta, PassOutcome};
pub use spatial_index::QuadTree;

pub use geocluster_types::{Coordinate, MapPoint, MapRect, WORLD_SIZE};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{ClusterError, ClusterManager, ClusterManagerBuilder, Result};

    pub use crate::{Annotation, Cluster, Marker};

    pub use crate::{CellSize, CellSizePolicy, ClusterConfig, ClusterPosition};

    pub use crate::{CancellationToken, ClusterDelegate, Delta, PassOutcome, Presenter};

    pub use crate::{Coordinate, MapRect};
}
