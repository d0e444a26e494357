//! Spreading of annotations that share an exact coordinate.
//!
//! Coincident annotations would render as one marker and could never be
//! told apart by zooming. Each group of `n` is laid out on a circle around
//! the shared coordinate: member `i` goes to bearing `2π·i/n` at
//! `distance·n/2` meters. Members are ordered by id, so the layout is
//! reproducible. Positions are display output only; the index keeps every
//! annotation at its own coordinate.

use crate::annotation::{Annotation, AnnotationId};
use geocluster_types::Coordinate;
use rustc_hash::FxHashMap;
use std::f64::consts::TAU;
use std::sync::Arc;

/// Positions for a group of `n` annotations sharing `center`.
///
/// ```
/// use geocluster::compute::distribute::circle_positions;
/// use geocluster::Coordinate;
///
/// let center = Coordinate::new(0.0, 0.0);
/// let spots = circle_positions(&center, 3, 3.0);
/// assert_eq!(spots.len(), 3);
/// for spot in &spots {
///     assert!((center.haversine_distance(spot) - 4.5).abs() < 1e-4);
/// }
/// ```
pub fn circle_positions(center: &Coordinate, n: usize, distance: f64) -> Vec<Coordinate> {
    let radius = distance * n as f64 / 2.0;
    let step = TAU / n as f64;
    (0..n)
        .map(|i| center.destination(step * i as f64, radius))
        .collect()
}

/// Group annotations by exact coordinate, keeping only contested groups.
///
/// Each group is sorted by id; groups come back ordered by their first id.
pub fn coincident_groups(annotations: &[Arc<Annotation>]) -> Vec<Vec<Arc<Annotation>>> {
    let mut groups: FxHashMap<(u64, u64), Vec<Arc<Annotation>>> = FxHashMap::default();
    for annotation in annotations {
        groups
            .entry(annotation.coordinate().bits())
            .or_default()
            .push(annotation.clone());
    }
    let mut contested: Vec<_> = groups
        .into_values()
        .filter(|group| group.len() > 1)
        .map(|mut group| {
            group.sort_by_key(|a| a.id());
            group
        })
        .collect();
    contested.sort_by_key(|group| group[0].id());
    contested
}

/// Display positions for every coincident annotation in `annotations`.
///
/// Annotations that do not share their coordinate get no entry.
pub fn spread(annotations: &[Arc<Annotation>], distance: f64) -> Vec<(AnnotationId, Coordinate)> {
    let mut positions = Vec::new();
    for group in coincident_groups(annotations) {
        let center = group[0].coordinate();
        let spots = circle_positions(&center, group.len(), distance);
        log::trace!(
            "Spreading {} annotations around ({}, {})",
            group.len(),
            center.lon(),
            center.lat()
        );
        positions.extend(group.iter().map(|a| a.id()).zip(spots));
    }
    positions
}
