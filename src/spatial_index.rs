//! Quad-tree spatial index over annotations in the projected world plane.
//!
//! The root always covers [`MapRect::world`]. Leaves hold up to
//! [`NODE_CAPACITY`] entries and split into four quadrants when they
//! overflow; nodes never merge back. Each annotation lives in exactly one
//! leaf, found by descending to the first quadrant that contains its point.

use crate::annotation::{Annotation, AnnotationId};
use geocluster_types::{MapPoint, MapRect};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::sync::Arc;

/// Entries a leaf holds before it splits.
pub const NODE_CAPACITY: usize = 8;

/// Leaves at this depth never split, so coincident points cannot recurse forever.
pub const MAX_DEPTH: u32 = 24;

#[derive(Debug, Clone)]
struct Entry {
    point: MapPoint,
    annotation: Arc<Annotation>,
}

#[derive(Debug)]
enum NodeKind {
    Leaf(SmallVec<[Entry; NODE_CAPACITY]>),
    Internal(Box<[QuadNode; 4]>),
}

#[derive(Debug)]
struct QuadNode {
    rect: MapRect,
    depth: u32,
    kind: NodeKind,
}

impl QuadNode {
    fn leaf(rect: MapRect, depth: u32) -> Self {
        Self {
            rect,
            depth,
            kind: NodeKind::Leaf(SmallVec::new()),
        }
    }

    fn insert(&mut self, entry: Entry) {
        match &mut self.kind {
            NodeKind::Leaf(entries) => {
                entries.push(entry);
                if entries.len() > NODE_CAPACITY && self.depth < MAX_DEPTH {
                    self.subdivide();
                }
            }
            NodeKind::Internal(children) => {
                let child = children
                    .iter_mut()
                    .position(|c| c.rect.contains(&entry.point))
                    .unwrap_or(0);
                children[child].insert(entry);
            }
        }
    }

    fn subdivide(&mut self) {
        let [nw, ne, sw, se] = self.rect.quadrants();
        let depth = self.depth + 1;
        let children = Box::new([
            QuadNode::leaf(nw, depth),
            QuadNode::leaf(ne, depth),
            QuadNode::leaf(sw, depth),
            QuadNode::leaf(se, depth),
        ]);
        let previous = std::mem::replace(&mut self.kind, NodeKind::Internal(children));
        let NodeKind::Leaf(entries) = previous else {
            return;
        };
        for entry in entries {
            self.insert(entry);
        }
    }

    fn remove(&mut self, point: &MapPoint, id: AnnotationId) -> bool {
        match &mut self.kind {
            NodeKind::Leaf(entries) => match entries.iter().position(|e| e.annotation.id() == id) {
                Some(i) => {
                    entries.remove(i);
                    true
                }
                None => false,
            },
            NodeKind::Internal(children) => children
                .iter_mut()
                .find(|c| c.rect.contains(point))
                .is_some_and(|c| c.remove(point, id)),
        }
    }

    fn remove_anywhere(&mut self, id: AnnotationId) -> bool {
        match &mut self.kind {
            NodeKind::Leaf(entries) => match entries.iter().position(|e| e.annotation.id() == id) {
                Some(i) => {
                    entries.remove(i);
                    true
                }
                None => false,
            },
            NodeKind::Internal(children) => children.iter_mut().any(|c| c.remove_anywhere(id)),
        }
    }

    fn query(&self, rect: &MapRect, out: &mut Vec<Arc<Annotation>>) {
        if !self.rect.intersects(rect) {
            return;
        }
        match &self.kind {
            NodeKind::Leaf(entries) => out.extend(
                entries
                    .iter()
                    .filter(|e| rect.contains(&e.point))
                    .map(|e| e.annotation.clone()),
            ),
            NodeKind::Internal(children) => {
                for child in children.iter() {
                    child.query(rect, out);
                }
            }
        }
    }

    fn node_count(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf(_) => 1,
            NodeKind::Internal(children) => {
                1 + children.iter().map(QuadNode::node_count).sum::<usize>()
            }
        }
    }
}

/// Quad-tree of annotations keyed by identity.
///
/// # Examples
///
/// ```
/// use geocluster::{Annotation, Coordinate, MapRect, QuadTree};
/// use std::sync::Arc;
///
/// let mut tree = QuadTree::new();
/// let nyc = Arc::new(Annotation::new(Coordinate::new(-74.0060, 40.7128)));
/// assert!(tree.insert(nyc.clone()));
/// assert_eq!(tree.query(&MapRect::world()).len(), 1);
/// assert!(tree.remove(&nyc));
/// assert!(tree.is_empty());
/// ```
#[derive(Debug)]
pub struct QuadTree {
    root: QuadNode,
    ids: FxHashSet<AnnotationId>,
}

impl QuadTree {
    pub fn new() -> Self {
        Self {
            root: QuadNode::leaf(MapRect::world(), 0),
            ids: FxHashSet::default(),
        }
    }

    /// Index an annotation at its current coordinate.
    ///
    /// Returns `false` if the annotation is already indexed.
    pub fn insert(&mut self, annotation: Arc<Annotation>) -> bool {
        if !self.ids.insert(annotation.id()) {
            return false;
        }
        let point = MapPoint::from_coordinate(&annotation.coordinate());
        self.root.insert(Entry { point, annotation });
        true
    }

    /// Remove an annotation by identity.
    ///
    /// The search descends by the annotation's current coordinate.
    pub fn remove(&mut self, annotation: &Annotation) -> bool {
        let id = annotation.id();
        if !self.ids.remove(&id) {
            return false;
        }
        let point = MapPoint::from_coordinate(&annotation.coordinate());
        if !self.root.remove(&point, id) {
            // Coordinate changed behind the index's back; fall back to a full sweep.
            log::warn!("Annotation {:?} not found at its coordinate", id);
            self.root.remove_anywhere(id);
        }
        true
    }

    /// Annotations whose projected coordinate lies within `rect`, edges included.
    ///
    /// Results come back in quadrant order (NW, NE, SW, SE) and insertion
    /// order within a leaf.
    pub fn query(&self, rect: &MapRect) -> Vec<Arc<Annotation>> {
        if !rect.is_finite() {
            log::warn!("Rejecting map rect query with non-finite coordinates");
            return Vec::new();
        }
        if rect.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        self.root.query(rect, &mut out);
        out
    }

    /// Every indexed annotation.
    pub fn all(&self) -> Vec<Arc<Annotation>> {
        self.query(&MapRect::world())
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Drop every annotation and collapse the tree back to a single leaf.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Number of nodes, leaves included.
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }
}

impl Default for QuadTree {
    fn default() -> Self {
        Self::new()
    }
}
