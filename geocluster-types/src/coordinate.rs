//! Geographic coordinates with great-circle measurements.

use serde::{Deserialize, Serialize};

/// A geographic coordinate with longitude/latitude in degrees.
///
/// This wraps `geo::Point` (x = longitude, y = latitude). Equality is exact
/// numeric equality, which is what coincident-point detection relies on.
///
/// # Examples
///
/// ```
/// use geocluster_types::Coordinate;
///
/// let nyc = Coordinate::new(-74.0060, 40.7128);
/// assert_eq!(nyc.lon(), -74.0060);
/// assert_eq!(nyc.lat(), 40.7128);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    inner: geo::Point<f64>,
}

impl Coordinate {
    /// Create a coordinate from longitude and latitude in degrees.
    #[inline]
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            inner: geo::Point::new(lon, lat),
        }
    }

    /// Longitude in degrees.
    #[inline]
    pub fn lon(&self) -> f64 {
        self.inner.x()
    }

    /// Latitude in degrees.
    #[inline]
    pub fn lat(&self) -> f64 {
        self.inner.y()
    }

    /// Access the inner `geo::Point`.
    #[inline]
    pub fn inner(&self) -> &geo::Point<f64> {
        &self.inner
    }

    /// Whether both components are finite numbers.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.lon().is_finite() && self.lat().is_finite()
    }

    /// The first component that is non-finite or outside geographic bounds
    /// (longitude within ±180, latitude within ±90), with its value.
    pub fn invalid_axis(&self) -> Option<(&'static str, f64)> {
        [("longitude", self.lon(), 180.0), ("latitude", self.lat(), 90.0)]
            .into_iter()
            .find(|&(_, value, limit)| !(value.is_finite() && value.abs() <= limit))
            .map(|(axis, value, _)| (axis, value))
    }

    /// Bit pattern of the coordinate, usable as an exact-match hash key.
    ///
    /// `-0.0` and `0.0` are folded together so the key agrees with `==`.
    #[inline]
    pub fn bits(&self) -> (u64, u64) {
        ((self.lon() + 0.0).to_bits(), (self.lat() + 0.0).to_bits())
    }

    /// Haversine distance to another coordinate in meters.
    ///
    /// ```
    /// use geocluster_types::Coordinate;
    ///
    /// let nyc = Coordinate::new(-74.0060, 40.7128);
    /// let la = Coordinate::new(-118.2437, 34.0522);
    /// assert!(nyc.haversine_distance(&la) > 3_900_000.0);
    /// ```
    #[inline]
    pub fn haversine_distance(&self, other: &Coordinate) -> f64 {
        use geo::Distance;
        geo::Haversine.distance(self.inner, other.inner)
    }

    /// The coordinate reached by travelling `distance` meters from here along
    /// `bearing` radians (clockwise from north) on a great circle.
    ///
    /// ```
    /// use geocluster_types::Coordinate;
    ///
    /// let origin = Coordinate::new(0.0, 0.0);
    /// let north = origin.destination(0.0, 1_000.0);
    /// assert!(north.lat() > 0.0);
    /// assert!((origin.haversine_distance(&north) - 1_000.0).abs() < 1e-4);
    /// ```
    #[inline]
    pub fn destination(&self, bearing: f64, distance: f64) -> Coordinate {
        use geo::Destination;
        Self {
            inner: geo::Haversine.destination(self.inner, bearing.to_degrees(), distance),
        }
    }
}

impl From<geo::Point<f64>> for Coordinate {
    fn from(inner: geo::Point<f64>) -> Self {
        Self { inner }
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(coordinate: Coordinate) -> Self {
        coordinate.inner
    }
}
