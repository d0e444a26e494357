//! Grid clustering over a viewport.
//!
//! The viewport is cut into cells whose on-screen size comes from the cell
//! size policy. Every cell is queried from the index and either collapses
//! into one [`Cluster`] or passes its annotations through.

use super::distribute;
use crate::annotation::{Annotation, AnnotationId, Cluster, Marker};
use crate::cancel::CancellationToken;
use crate::config::{CellSize, ClusterConfig, ClusterPosition};
use crate::presentation::ClusterDelegate;
use crate::spatial_index::QuadTree;
use geo::{Centroid, MultiPoint};
use geocluster_types::{Coordinate, MapRect, WORLD_SIZE};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Markers produced by one completed pass.
#[derive(Debug, Clone, Default)]
pub struct ClusterPass {
    /// Clusters and pass-through annotations, in cell order
    pub markers: Vec<Marker>,
    /// Zoom level the pass ran at
    pub zoom_level: f64,
    /// Number of grid cells visited
    pub cells: usize,
    /// Display positions of coincident annotations, applied on commit
    pub spread: FxHashMap<AnnotationId, Coordinate>,
}

impl ClusterPass {
    fn empty(zoom_level: f64) -> Self {
        Self {
            zoom_level,
            ..Self::default()
        }
    }

    pub fn cluster_count(&self) -> usize {
        self.markers.iter().filter(|m| m.is_cluster()).count()
    }

    /// Where this pass places an annotation.
    pub fn position(&self, annotation: &Annotation) -> Coordinate {
        position_in(&self.spread, annotation)
    }
}

fn position_in(
    spread: &FxHashMap<AnnotationId, Coordinate>,
    annotation: &Annotation,
) -> Coordinate {
    spread
        .get(&annotation.id())
        .copied()
        .unwrap_or_else(|| annotation.coordinate())
}

/// Whether a pass over this viewport can produce anything.
pub fn is_usable_viewport(zoom_scale: f64, visible_rect: &MapRect) -> bool {
    !visible_rect.is_empty() && zoom_scale.is_finite() && zoom_scale > 0.0
}

/// Integer cell bounds covering a rect at the given scale factors.
fn cell_bounds(rect: &MapRect, scale_x: f64, scale_y: f64) -> ((i64, i64), (i64, i64)) {
    (
        (
            (rect.min_x() * scale_x).floor() as i64,
            (rect.max_x() * scale_x).floor() as i64,
        ),
        (
            (rect.min_y() * scale_y).floor() as i64,
            (rect.max_y() * scale_y).floor() as i64,
        ),
    )
}

/// Runs one clustering pass with a fixed configuration snapshot.
pub struct GridClusterer<'a> {
    config: &'a ClusterConfig,
    delegate: Option<&'a dyn ClusterDelegate>,
}

impl<'a> GridClusterer<'a> {
    pub fn new(config: &'a ClusterConfig) -> Self {
        Self {
            config,
            delegate: None,
        }
    }

    pub fn with_delegate(mut self, delegate: Option<&'a dyn ClusterDelegate>) -> Self {
        self.delegate = delegate;
        self
    }

    /// Cell size for a zoom scale: the delegate's answer if it has one, else the policy.
    pub fn cell_size(&self, zoom_scale: f64) -> CellSize {
        if let Some(size) = self.delegate.and_then(|d| d.cell_size(zoom_scale)) {
            if size.is_valid() {
                return size;
            }
            log::warn!(
                "Delegate returned invalid cell size {}x{}, using configured policy",
                size.width,
                size.height
            );
        }
        self.config.cell_size_for(zoom_scale)
    }

    /// Cluster every annotation visible in `visible_rect`.
    ///
    /// Returns `None` if `token` was cancelled at any checkpoint (before each
    /// cell and before returning). An empty viewport or an unusable zoom
    /// scale yields an empty pass.
    pub fn run(
        &self,
        index: &RwLock<QuadTree>,
        zoom_scale: f64,
        visible_rect: &MapRect,
        token: &CancellationToken,
    ) -> Option<ClusterPass> {
        let zoom_level = self.config.zoom_level(zoom_scale);
        if !is_usable_viewport(zoom_scale, visible_rect) {
            return Some(ClusterPass::empty(zoom_level));
        }

        let cell = self.cell_size(zoom_scale);
        let scale_x = zoom_scale / cell.width;
        let scale_y = zoom_scale / cell.height;
        let ((min_x, max_x), (min_y, max_y)) = cell_bounds(visible_rect, scale_x, scale_y);

        let mut pass = ClusterPass::empty(zoom_level);
        let mut seen = FxHashSet::default();
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                if token.is_cancelled() {
                    log::debug!("Pass cancelled after {} cells", pass.cells);
                    return None;
                }

                let mut rect = MapRect::new(
                    x as f64 / scale_x,
                    y as f64 / scale_y,
                    1.0 / scale_x,
                    1.0 / scale_y,
                );
                if rect.min_x() > WORLD_SIZE {
                    rect = rect.with_origin_x(rect.min_x() - WORLD_SIZE);
                }

                let annotations = index.read().query(&rect);
                let fresh: Vec<_> = annotations
                    .into_iter()
                    .filter(|a| seen.insert(a.id()))
                    .collect();
                if self.config.should_distribute_annotations_on_same_coordinate {
                    let distance = self.config.distance_from_contested_location;
                    pass.spread.extend(distribute::spread(&fresh, distance));
                }
                self.cluster_cell(&rect, fresh, zoom_level, &pass.spread, &mut pass.markers);
                pass.cells += 1;
            }
        }

        if token.is_cancelled() {
            log::debug!("Pass cancelled before delivery");
            return None;
        }

        log::debug!(
            "Clustered {} cells at zoom level {}: {} markers, {} clusters",
            pass.cells,
            zoom_level,
            pass.markers.len(),
            pass.cluster_count()
        );
        Some(pass)
    }

    fn cluster_cell(
        &self,
        rect: &MapRect,
        annotations: Vec<Arc<Annotation>>,
        zoom_level: f64,
        spread: &FxHashMap<AnnotationId, Coordinate>,
        out: &mut Vec<Marker>,
    ) {
        let (clusterable, solo): (Vec<_>, Vec<_>) = match self.delegate {
            Some(delegate) => annotations
                .into_iter()
                .partition(|a| delegate.should_cluster(a)),
            None => (annotations, Vec::new()),
        };

        if !clusterable.is_empty()
            && clusterable.len() >= self.config.min_count_for_clustering
            && zoom_level <= self.config.max_zoom_level
        {
            let coordinate = self.cluster_coordinate(rect, &clusterable, spread);
            out.push(Marker::Cluster(Arc::new(Cluster::new(coordinate, clusterable))));
        } else {
            out.extend(clusterable.into_iter().map(Marker::Annotation));
        }
        out.extend(solo.into_iter().map(Marker::Annotation));
    }

    fn cluster_coordinate(
        &self,
        rect: &MapRect,
        members: &[Arc<Annotation>],
        spread: &FxHashMap<AnnotationId, Coordinate>,
    ) -> Coordinate {
        let position = |a: &Annotation| position_in(spread, a);
        match self.config.cluster_position {
            ClusterPosition::Center => rect.center().to_coordinate(),
            ClusterPosition::NearCenter => {
                let center = rect.center().to_coordinate();
                let mut best = position(members[0].as_ref());
                let mut best_distance = center.haversine_distance(&best);
                for member in &members[1..] {
                    let coordinate = position(member.as_ref());
                    let distance = center.haversine_distance(&coordinate);
                    if distance < best_distance {
                        best = coordinate;
                        best_distance = distance;
                    }
                }
                best
            }
            ClusterPosition::Average => {
                let points: MultiPoint<f64> =
                    members.iter().map(|m| *position(m.as_ref()).inner()).collect();
                points
                    .centroid()
                    .map(Coordinate::from)
                    .unwrap_or_else(|| position(members[0].as_ref()))
            }
            ClusterPosition::First => position(members[0].as_ref()),
        }
    }
}
