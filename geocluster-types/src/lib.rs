//! # geocluster-types
//!
//! Geometric value types shared by the geocluster engine:
//!
//! - [`Coordinate`]: longitude/latitude with haversine distance and
//!   destination-point helpers
//! - [`MapPoint`] and [`MapRect`]: points and rectangles in the projected
//!   Web Mercator world plane used for indexing and clustering
//!
//! All types are serializable with Serde and built on top of the `geo`
//! crate's primitives.
//!
//! ## Examples
//!
//! ```rust
//! use geocluster_types::{Coordinate, MapPoint, MapRect};
//!
//! let nyc = Coordinate::new(-74.0060, 40.7128);
//! let manhattan = MapRect::from_coordinates(
//!     &Coordinate::new(-74.0479, 40.8820),
//!     &Coordinate::new(-73.9067, 40.6829),
//! );
//! assert!(manhattan.contains(&MapPoint::from_coordinate(&nyc)));
//! ```

pub mod coordinate;
pub mod map;

pub use coordinate::Coordinate;
pub use map::{MAX_MERCATOR_LATITUDE, MapPoint, MapRect, WORLD_SIZE};
