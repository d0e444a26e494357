//! Reconciliation of a freshly clustered marker set against what is shown.

use crate::annotation::{Annotation, Marker, MarkerKey};
use geocluster_types::MapRect;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Markers to take off and put on the display.
#[derive(Debug, Clone, Default)]
pub struct Delta {
    pub to_add: Vec<Marker>,
    pub to_remove: Vec<Marker>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Result of a clustering pass run to its end, or abandoned.
///
/// `Completed` with an empty delta means nothing changed; `Cancelled` means
/// the pass had no effect at all.
#[derive(Debug, Clone)]
pub enum PassOutcome {
    Completed(Delta),
    Cancelled,
}

impl PassOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, PassOutcome::Completed(_))
    }

    /// The delta of a completed pass.
    pub fn delta(&self) -> Option<&Delta> {
        match self {
            PassOutcome::Completed(delta) => Some(delta),
            PassOutcome::Cancelled => None,
        }
    }

    pub fn into_delta(self) -> Option<Delta> {
        match self {
            PassOutcome::Completed(delta) => Some(delta),
            PassOutcome::Cancelled => None,
        }
    }
}

/// The authoritative record of displayed markers, keyed by identity.
#[derive(Debug, Default)]
pub struct VisibleSet {
    markers: FxHashMap<MarkerKey, Marker>,
}

impl VisibleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn contains(&self, key: &MarkerKey) -> bool {
        self.markers.contains_key(key)
    }

    /// Displayed markers, ordered by their smallest member id.
    pub fn markers(&self) -> Vec<Marker> {
        let mut markers: Vec<_> = self.markers.values().cloned().collect();
        markers.sort_by_key(Marker::sort_id);
        markers
    }

    /// Displayed annotations, with clusters flattened into their members.
    pub fn nested_annotations(&self) -> Vec<Arc<Annotation>> {
        let mut annotations: Vec<_> = self
            .markers
            .values()
            .flat_map(|m| m.annotations().iter().cloned())
            .collect();
        annotations.sort_by_key(|a| a.id());
        annotations
    }
}

/// Diff `after` against `before` and make `before` match it.
///
/// `to_remove` holds markers in `before` but not in `after`, and `to_add`
/// holds markers in `after` but not in `before`. With
/// `should_remove_invisible` off, removal candidates outside `visible_rect`
/// stay displayed.
pub fn reconcile(
    before: &mut VisibleSet,
    after: Vec<Marker>,
    visible_rect: &MapRect,
    should_remove_invisible: bool,
) -> Delta {
    let mut after_keys = FxHashSet::default();
    let mut to_add = Vec::new();
    for marker in after {
        let key = marker.key();
        if !after_keys.insert(key.clone()) {
            continue;
        }
        if !before.markers.contains_key(&key) {
            to_add.push(marker);
        }
    }

    let mut to_remove: Vec<_> = before
        .markers
        .iter()
        .filter(|(key, _)| !after_keys.contains(*key))
        .filter(|(_, marker)| {
            should_remove_invisible || visible_rect.contains_coordinate(&marker.coordinate())
        })
        .map(|(_, marker)| marker.clone())
        .collect();
    to_remove.sort_by_key(Marker::sort_id);

    for marker in &to_remove {
        before.markers.remove(&marker.key());
    }
    for marker in &to_add {
        before.markers.insert(marker.key(), marker.clone());
    }

    Delta { to_add, to_remove }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Cluster;
    use geocluster_types::{Coordinate, MapPoint};

    fn single(lon: f64, lat: f64) -> Marker {
        Marker::Annotation(Arc::new(Annotation::new(Coordinate::new(lon, lat))))
    }

    fn keys(markers: &[Marker]) -> FxHashSet<MarkerKey> {
        markers.iter().map(Marker::key).collect()
    }

    fn around_origin() -> MapRect {
        let p = MapPoint::from_coordinate(&Coordinate::new(0.0, 0.0));
        MapRect::new(p.x - 1.0e6, p.y - 1.0e6, 2.0e6, 2.0e6)
    }

    #[test]
    fn test_initial_pass_adds_everything() {
        let mut visible = VisibleSet::new();
        let after = vec![single(0.0, 0.0), single(0.01, 0.0)];
        let delta = reconcile(&mut visible, after.clone(), &around_origin(), true);
        assert_eq!(keys(&delta.to_add), keys(&after));
        assert!(delta.to_remove.is_empty());
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_diff_properties() {
        let a = single(0.0, 0.0);
        let b = single(0.01, 0.0);
        let c = single(0.02, 0.0);
        let mut visible = VisibleSet::new();
        reconcile(&mut visible, vec![a.clone(), b.clone()], &around_origin(), true);
        let before = keys(&visible.markers());

        let after = vec![b.clone(), c.clone()];
        let delta = reconcile(&mut visible, after.clone(), &around_origin(), true);

        assert!(keys(&delta.to_add).is_disjoint(&before));
        assert!(keys(&delta.to_remove).is_subset(&before));
        assert_eq!(keys(&delta.to_add), keys(&[c]));
        assert_eq!(keys(&delta.to_remove), keys(&[a]));
        assert_eq!(keys(&visible.markers()), keys(&after));
    }

    #[test]
    fn test_unchanged_input_is_idempotent() {
        let shared = Arc::new(Annotation::new(Coordinate::new(0.0, 0.0)));
        let other = Arc::new(Annotation::new(Coordinate::new(0.0, 0.0)));
        let build = || {
            vec![Marker::Cluster(Arc::new(Cluster::new(
                Coordinate::new(0.0, 0.0),
                vec![shared.clone(), other.clone()],
            )))]
        };
        let mut visible = VisibleSet::new();
        reconcile(&mut visible, build(), &around_origin(), true);
        let delta = reconcile(&mut visible, build(), &around_origin(), true);
        assert!(delta.is_empty());
        assert_eq!(visible.nested_annotations().len(), 2);
    }

    #[test]
    fn test_invisible_markers_retained() {
        let near = single(0.0, 0.0);
        let far = single(120.0, 45.0);
        let mut visible = VisibleSet::new();
        reconcile(&mut visible, vec![near.clone(), far.clone()], &MapRect::world(), false);

        let delta = reconcile(&mut visible, vec![near.clone()], &around_origin(), false);
        assert!(delta.to_remove.is_empty());
        assert!(visible.contains(&far.key()));

        let delta = reconcile(&mut visible, vec![], &around_origin(), false);
        assert_eq!(keys(&delta.to_remove), keys(&[near]));
        assert!(visible.contains(&far.key()));
    }

    #[test]
    fn test_invisible_markers_removed_by_default() {
        let far = single(120.0, 45.0);
        let mut visible = VisibleSet::new();
        reconcile(&mut visible, vec![far.clone()], &MapRect::world(), true);
        let delta = reconcile(&mut visible, vec![], &around_origin(), true);
        assert_eq!(keys(&delta.to_remove), keys(&[far]));
        assert!(visible.is_empty());
    }

    #[test]
    fn test_duplicate_after_entries_added_once() {
        let a = single(0.0, 0.0);
        let mut visible = VisibleSet::new();
        let delta = reconcile(&mut visible, vec![a.clone(), a], &around_origin(), true);
        assert_eq!(delta.to_add.len(), 1);
    }
}
