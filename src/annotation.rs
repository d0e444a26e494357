//! Annotations, clusters and the markers the display layer shows.

use geocluster_types::Coordinate;
use parking_lot::RwLock;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ANNOTATION_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an annotation.
///
/// Ids are handed out in creation order, which gives coincident annotations
/// a reproducible ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationId(u64);

impl AnnotationId {
    fn next() -> Self {
        Self(NEXT_ANNOTATION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// A point annotation on the map.
///
/// Identity is by [`AnnotationId`], never by coordinate: two annotations at
/// the same place are distinct. The index always files an annotation under
/// its own coordinate. Coincident annotations are drawn at a separate
/// display coordinate, assigned when a pass is committed.
#[derive(Debug)]
pub struct Annotation {
    id: AnnotationId,
    coordinate: RwLock<Coordinate>,
    display: RwLock<Option<Coordinate>>,
    style: Option<String>,
}

impl Annotation {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            id: AnnotationId::next(),
            coordinate: RwLock::new(coordinate),
            display: RwLock::new(None),
            style: None,
        }
    }

    /// Attach an opaque style tag; clusters inherit it from their first member.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    /// Where the annotation is, and where the index files it.
    pub fn coordinate(&self) -> Coordinate {
        *self.coordinate.read()
    }

    /// Where the annotation is drawn: its spread position when it shares a
    /// coordinate with others, its own coordinate otherwise.
    pub fn display_coordinate(&self) -> Coordinate {
        self.display.read().unwrap_or_else(|| self.coordinate())
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    pub(crate) fn set_coordinate(&self, coordinate: Coordinate) {
        *self.coordinate.write() = coordinate;
        *self.display.write() = None;
    }

    pub(crate) fn set_display_coordinate(&self, display: Option<Coordinate>) {
        *self.display.write() = display;
    }
}

impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Annotation {}

impl Hash for Annotation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Identity of a cluster: its sorted member ids and its exact position.
///
/// Rebuilding a cluster from unchanged input yields the same key, so a
/// repeated pass does not churn the display.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterKey {
    members: Vec<AnnotationId>,
    position: (u64, u64),
}

/// A synthesized marker standing in for several annotations.
///
/// Built fresh by every pass and never mutated afterwards.
#[derive(Debug)]
pub struct Cluster {
    coordinate: Coordinate,
    annotations: Vec<Arc<Annotation>>,
    style: Option<String>,
    key: ClusterKey,
}

impl Cluster {
    pub(crate) fn new(coordinate: Coordinate, annotations: Vec<Arc<Annotation>>) -> Self {
        let style = annotations
            .first()
            .and_then(|a| a.style().map(str::to_owned));
        let mut members: Vec<_> = annotations.iter().map(|a| a.id()).collect();
        members.sort_unstable();
        let key = ClusterKey {
            members,
            position: coordinate.bits(),
        };
        Self {
            coordinate,
            annotations,
            style,
            key,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Members in the order the pass collected them.
    pub fn annotations(&self) -> &[Arc<Annotation>] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    pub fn key(&self) -> &ClusterKey {
        &self.key
    }
}

/// Set-membership key of a [`Marker`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerKey {
    Annotation(AnnotationId),
    Cluster(ClusterKey),
}

/// One entry of the displayed set: a standalone annotation or a cluster.
#[derive(Debug, Clone)]
pub enum Marker {
    Annotation(Arc<Annotation>),
    Cluster(Arc<Cluster>),
}

impl Marker {
    pub fn key(&self) -> MarkerKey {
        match self {
            Marker::Annotation(a) => MarkerKey::Annotation(a.id()),
            Marker::Cluster(c) => MarkerKey::Cluster(c.key().clone()),
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        match self {
            Marker::Annotation(a) => a.display_coordinate(),
            Marker::Cluster(c) => c.coordinate(),
        }
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, Marker::Cluster(_))
    }

    pub fn as_annotation(&self) -> Option<&Arc<Annotation>> {
        match self {
            Marker::Annotation(a) => Some(a),
            Marker::Cluster(_) => None,
        }
    }

    pub fn as_cluster(&self) -> Option<&Arc<Cluster>> {
        match self {
            Marker::Cluster(c) => Some(c),
            Marker::Annotation(_) => None,
        }
    }

    /// The annotations this marker stands for: itself, or the cluster members.
    pub fn annotations(&self) -> &[Arc<Annotation>] {
        match self {
            Marker::Annotation(a) => std::slice::from_ref(a),
            Marker::Cluster(c) => c.annotations(),
        }
    }

    /// Smallest member id; used to order markers deterministically.
    pub(crate) fn sort_id(&self) -> Option<AnnotationId> {
        self.annotations().iter().map(|a| a.id()).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_not_coordinate() {
        let a = Annotation::new(Coordinate::new(1.0, 1.0));
        let b = Annotation::new(Coordinate::new(1.0, 1.0));
        assert_ne!(a, b);
        assert!(a.id() < b.id());
    }

    #[test]
    fn test_cluster_inherits_first_style() {
        let first = Arc::new(Annotation::new(Coordinate::new(0.0, 0.0)).with_style("red"));
        let second = Arc::new(Annotation::new(Coordinate::new(0.0, 0.0)).with_style("blue"));
        let cluster = Cluster::new(Coordinate::new(0.0, 0.0), vec![first, second]);
        assert_eq!(cluster.style(), Some("red"));
        assert_eq!(cluster.len(), 2);
    }

    #[test]
    fn test_cluster_key_is_structural() {
        let a = Arc::new(Annotation::new(Coordinate::new(0.0, 0.0)));
        let b = Arc::new(Annotation::new(Coordinate::new(0.0, 0.0)));
        let c1 = Cluster::new(Coordinate::new(0.0, 0.0), vec![a.clone(), b.clone()]);
        let c2 = Cluster::new(Coordinate::new(0.0, 0.0), vec![a.clone(), b.clone()]);
        let moved = Cluster::new(Coordinate::new(0.5, 0.0), vec![a, b]);
        assert_eq!(c1.key(), c2.key());
        assert_ne!(c1.key(), moved.key());
    }

    #[test]
    fn test_marker_annotations() {
        let a = Arc::new(Annotation::new(Coordinate::new(2.0, 3.0)));
        let marker = Marker::Annotation(a.clone());
        assert_eq!(marker.annotations().len(), 1);
        assert_eq!(marker.coordinate(), a.coordinate());
        assert!(!marker.is_cluster());
        assert_eq!(marker.key(), MarkerKey::Annotation(a.id()));
    }

    #[test]
    fn test_display_coordinate_falls_back() {
        let a = Annotation::new(Coordinate::new(2.0, 3.0));
        assert_eq!(a.display_coordinate(), a.coordinate());

        a.set_display_coordinate(Some(Coordinate::new(2.0001, 3.0)));
        assert_eq!(a.coordinate(), Coordinate::new(2.0, 3.0));
        assert_eq!(a.display_coordinate(), Coordinate::new(2.0001, 3.0));

        a.set_coordinate(Coordinate::new(5.0, 5.0));
        assert_eq!(a.display_coordinate(), Coordinate::new(5.0, 5.0));
    }
}
