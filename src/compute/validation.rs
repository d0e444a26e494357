//! Input checks applied before annotations reach the index.

use crate::error::{ClusterError, Result};
use geocluster_types::Coordinate;

/// Reject coordinates the world plane cannot represent.
///
/// ```
/// use geocluster::compute::validation::validate_coordinate;
/// use geocluster::Coordinate;
///
/// assert!(validate_coordinate(&Coordinate::new(-74.0060, 40.7128)).is_ok());
/// assert!(validate_coordinate(&Coordinate::new(200.0, 40.0)).is_err());
/// assert!(validate_coordinate(&Coordinate::new(-74.0, 95.0)).is_err());
/// ```
pub fn validate_coordinate(coordinate: &Coordinate) -> Result<()> {
    match coordinate.invalid_axis() {
        Some((axis, value)) => Err(ClusterError::InvalidCoordinate(format!(
            "{} {} is not a position on the map",
            axis, value
        ))),
        None => Ok(()),
    }
}

/// Check a whole batch, naming the position of the first rejected entry.
pub fn validate_coordinates<'a>(
    coordinates: impl IntoIterator<Item = &'a Coordinate>,
) -> Result<()> {
    coordinates
        .into_iter()
        .enumerate()
        .try_for_each(|(i, coordinate)| match coordinate.invalid_axis() {
            Some((axis, value)) => Err(ClusterError::InvalidCoordinate(format!(
                "annotation #{}: {} {} is not a position on the map",
                i, axis, value
            ))),
            None => Ok(()),
        })
}
