//! The projected world plane that annotations are indexed and clustered in.
//!
//! Coordinates are projected with spherical Web Mercator onto a square plane
//! of [`WORLD_SIZE`] units per side. `x` grows east from longitude -180 and
//! `y` grows south from the northern Mercator limit, so a map viewport is a
//! plain axis-aligned rectangle in this plane.

use crate::coordinate::Coordinate;
use geo::Rect;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Width and height of the world plane, in world units.
pub const WORLD_SIZE: f64 = 268_435_456.0;

/// Latitude limit of the square Web Mercator projection.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// A point in the projected world plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Project a geographic coordinate into the world plane.
    ///
    /// Latitudes beyond the Mercator limit are clamped onto the plane's edge.
    ///
    /// ```
    /// use geocluster_types::{Coordinate, MapPoint, WORLD_SIZE};
    ///
    /// let origin = MapPoint::from_coordinate(&Coordinate::new(0.0, 0.0));
    /// assert_eq!(origin, MapPoint::new(WORLD_SIZE / 2.0, WORLD_SIZE / 2.0));
    /// ```
    pub fn from_coordinate(coordinate: &Coordinate) -> Self {
        let lat = coordinate
            .lat()
            .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
            .to_radians();
        let x = (coordinate.lon() + 180.0) / 360.0 * WORLD_SIZE;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * WORLD_SIZE;
        Self {
            x,
            y: y.clamp(0.0, WORLD_SIZE),
        }
    }

    /// Inverse of [`MapPoint::from_coordinate`].
    pub fn to_coordinate(&self) -> Coordinate {
        let lon = self.x / WORLD_SIZE * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * self.y / WORLD_SIZE))
            .sinh()
            .atan()
            .to_degrees();
        Coordinate::new(lon, lat)
    }
}

/// An axis-aligned rectangle in the world plane.
///
/// Wraps `geo::Rect`. Containment is inclusive of every edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRect {
    pub rect: Rect<f64>,
}

impl MapRect {
    /// Create a rectangle from its top-left origin and size.
    ///
    /// # Examples
    ///
    /// ```
    /// use geocluster_types::{MapPoint, MapRect};
    ///
    /// let rect = MapRect::new(10.0, 20.0, 5.0, 5.0);
    /// assert!(rect.contains(&MapPoint::new(15.0, 25.0)));
    /// assert!(!rect.contains(&MapPoint::new(15.1, 25.0)));
    /// ```
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            rect: Rect::new(
                geo::coord! { x: x, y: y },
                geo::coord! { x: x + width, y: y + height },
            ),
        }
    }

    /// Create a rectangle spanning two corner points.
    pub fn from_corners(a: MapPoint, b: MapPoint) -> Self {
        Self {
            rect: Rect::new(geo::coord! { x: a.x, y: a.y }, geo::coord! { x: b.x, y: b.y }),
        }
    }

    /// Create the smallest rectangle covering two geographic corners.
    pub fn from_coordinates(a: &Coordinate, b: &Coordinate) -> Self {
        Self::from_corners(MapPoint::from_coordinate(a), MapPoint::from_coordinate(b))
    }

    /// The rectangle covering the whole world plane.
    pub fn world() -> Self {
        Self::new(0.0, 0.0, WORLD_SIZE, WORLD_SIZE)
    }

    pub fn min_x(&self) -> f64 {
        self.rect.min().x
    }

    pub fn min_y(&self) -> f64 {
        self.rect.min().y
    }

    pub fn max_x(&self) -> f64 {
        self.rect.max().x
    }

    pub fn max_y(&self) -> f64 {
        self.rect.max().y
    }

    pub fn width(&self) -> f64 {
        self.max_x() - self.min_x()
    }

    pub fn height(&self) -> f64 {
        self.max_y() - self.min_y()
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> MapPoint {
        MapPoint::new(
            (self.min_x() + self.max_x()) / 2.0,
            (self.min_y() + self.max_y()) / 2.0,
        )
    }

    /// Whether every edge is a finite number.
    pub fn is_finite(&self) -> bool {
        [self.min_x(), self.min_y(), self.max_x(), self.max_y()]
            .iter()
            .all(|v| v.is_finite())
    }

    /// A rectangle without positive area (or with non-finite edges) is empty.
    pub fn is_empty(&self) -> bool {
        !(self.is_finite() && self.width() > 0.0 && self.height() > 0.0)
    }

    /// Check if a point lies within this rectangle, edges included.
    pub fn contains(&self, point: &MapPoint) -> bool {
        point.x >= self.min_x()
            && point.x <= self.max_x()
            && point.y >= self.min_y()
            && point.y <= self.max_y()
    }

    /// Check if a geographic coordinate projects into this rectangle.
    pub fn contains_coordinate(&self, coordinate: &Coordinate) -> bool {
        self.contains(&MapPoint::from_coordinate(coordinate))
    }

    /// Check if this rectangle intersects another, touching edges included.
    pub fn intersects(&self, other: &MapRect) -> bool {
        !(self.max_x() < other.min_x()
            || self.min_x() > other.max_x()
            || self.max_y() < other.min_y()
            || self.min_y() > other.max_y())
    }

    /// The same rectangle with its origin moved horizontally to `x`.
    pub fn with_origin_x(&self, x: f64) -> Self {
        Self::new(x, self.min_y(), self.width(), self.height())
    }

    /// Split into four equal quadrants, ordered NW, NE, SW, SE.
    pub fn quadrants(&self) -> [MapRect; 4] {
        let half_w = self.width() / 2.0;
        let half_h = self.height() / 2.0;
        let (x, y) = (self.min_x(), self.min_y());
        [
            Self::new(x, y, half_w, half_h),
            Self::new(x + half_w, y, half_w, half_h),
            Self::new(x, y + half_h, half_w, half_h),
            Self::new(x + half_w, y + half_h, half_w, half_h),
        ]
    }
}
