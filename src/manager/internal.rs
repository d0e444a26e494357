//! State shared between the manager handle and the reload worker.

use crate::cancel::CancellationToken;
use crate::compute::grid::{ClusterPass, GridClusterer, is_usable_viewport};
use crate::config::ClusterConfig;
use crate::presentation::{ClusterDelegate, Presenter};
use crate::reconcile::{Delta, PassOutcome, VisibleSet, reconcile};
use crate::spatial_index::QuadTree;
use geocluster_types::MapRect;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};

pub(crate) struct ManagerState {
    pub(crate) index: RwLock<QuadTree>,
    pub(crate) visible: Mutex<VisibleSet>,
    pub(crate) config: RwLock<ClusterConfig>,
    pub(crate) delegate: RwLock<Option<Weak<dyn ClusterDelegate>>>,
    pub(crate) zoom_level: RwLock<f64>,
    pub(crate) presenter: Arc<dyn Presenter>,
}

impl ManagerState {
    pub(crate) fn new(
        config: ClusterConfig,
        presenter: Arc<dyn Presenter>,
        delegate: Option<Weak<dyn ClusterDelegate>>,
    ) -> Self {
        Self {
            index: RwLock::new(QuadTree::new()),
            visible: Mutex::new(VisibleSet::new()),
            config: RwLock::new(config),
            delegate: RwLock::new(delegate),
            zoom_level: RwLock::new(0.0),
            presenter,
        }
    }

    /// Run the grid pass on a snapshot of the configuration.
    ///
    /// The delegate is upgraded only for the duration of the pass.
    pub(crate) fn cluster(
        &self,
        zoom_scale: f64,
        visible_rect: &MapRect,
        token: &CancellationToken,
    ) -> Option<(ClusterPass, ClusterConfig)> {
        let config = self.config.read().clone();
        let delegate = self.delegate.read().as_ref().and_then(Weak::upgrade);
        let pass = GridClusterer::new(&config)
            .with_delegate(delegate.as_deref())
            .run(&self.index, zoom_scale, visible_rect, token)?;
        Some((pass, config))
    }

    /// Fold a completed pass into the visible set.
    ///
    /// The token is checked while the visible set is locked, so a pass
    /// superseded up to this point leaves no trace. Display coordinates of
    /// the pass's annotations are only written after that check.
    pub(crate) fn commit(
        &self,
        pass: ClusterPass,
        config: &ClusterConfig,
        zoom_scale: f64,
        visible_rect: &MapRect,
        token: &CancellationToken,
    ) -> PassOutcome {
        let mut visible = self.visible.lock();
        if token.is_cancelled() {
            return PassOutcome::Cancelled;
        }
        if !is_usable_viewport(zoom_scale, visible_rect) {
            return PassOutcome::Completed(Delta::default());
        }
        for marker in &pass.markers {
            for annotation in marker.annotations() {
                annotation.set_display_coordinate(pass.spread.get(&annotation.id()).copied());
            }
        }
        let delta = reconcile(
            &mut visible,
            pass.markers,
            visible_rect,
            config.should_remove_invisible_annotations,
        );
        *self.zoom_level.write() = pass.zoom_level;
        PassOutcome::Completed(delta)
    }

    /// Hand a delta to the display: removals first, then additions.
    ///
    /// # Panics
    ///
    /// Panics when called off the presentation context.
    pub(crate) fn apply_delta(&self, delta: &Delta) {
        assert!(
            self.presenter.is_presentation_context(),
            "display delta applied outside the presentation context"
        );
        if !delta.to_remove.is_empty() {
            self.presenter.remove_markers(&delta.to_remove);
        }
        if !delta.to_add.is_empty() {
            self.presenter.add_markers(&delta.to_add);
        }
    }
}
