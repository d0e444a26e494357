//! The clustering manager: annotation store, reload scheduling and display
//! reconciliation behind one handle.

mod coordinator;
mod internal;

pub use coordinator::Completion;

pub(crate) use coordinator::DEFAULT_THREAD_NAME;

use crate::annotation::{Annotation, Marker};
use crate::cancel::CancellationToken;
use crate::compute::validation::{validate_coordinate, validate_coordinates};
use crate::config::ClusterConfig;
use crate::error::{ClusterError, Result};
use crate::presentation::{ClusterDelegate, Presenter};
use crate::reconcile::{Delta, PassOutcome};
use coordinator::{Coordinator, ReloadJob};
use geocluster_types::{Coordinate, MapRect};
use internal::ManagerState;
use std::sync::Arc;

/// Clusters a set of map annotations for the current viewport.
///
/// Mutations of the annotation set are safe from any thread. Reloads run on
/// a background worker; only the newest requested reload is ever applied to
/// the [`Presenter`].
pub struct ClusterManager {
    state: Arc<ManagerState>,
    coordinator: Coordinator,
}

impl std::fmt::Debug for ClusterManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterManager")
            .field("annotations", &self.state.index.read().len())
            .field("visible", &self.state.visible.lock().len())
            .field("zoom_level", &*self.state.zoom_level.read())
            .finish()
    }
}

impl ClusterManager {
    pub(crate) fn new(
        config: ClusterConfig,
        presenter: Arc<dyn Presenter>,
        delegate: Option<Arc<dyn ClusterDelegate>>,
        thread_name: &str,
    ) -> Result<Self> {
        config.validate()?;
        let delegate = delegate.as_ref().map(Arc::downgrade);
        let state = Arc::new(ManagerState::new(config, presenter, delegate));
        let coordinator = Coordinator::spawn(Arc::clone(&state), thread_name)?;
        Ok(Self { state, coordinator })
    }

    /// Index one annotation. Returns `false` if it is already indexed.
    pub fn add(&self, annotation: Arc<Annotation>) -> Result<bool> {
        validate_coordinate(&annotation.coordinate())?;
        Ok(self.state.index.write().insert(annotation))
    }

    /// Index many annotations, validating all of them before inserting any.
    ///
    /// Returns how many were newly indexed.
    pub fn add_all(&self, annotations: impl IntoIterator<Item = Arc<Annotation>>) -> Result<usize> {
        let annotations: Vec<_> = annotations.into_iter().collect();
        let coordinates: Vec<_> = annotations.iter().map(|a| a.coordinate()).collect();
        validate_coordinates(&coordinates)?;

        let mut index = self.state.index.write();
        let added = annotations
            .into_iter()
            .filter(|a| index.insert(Arc::clone(a)))
            .count();
        log::debug!("Indexed {} annotations ({} total)", added, index.len());
        Ok(added)
    }

    /// Drop one annotation from the index.
    pub fn remove(&self, annotation: &Annotation) -> bool {
        self.state.index.write().remove(annotation)
    }

    pub fn remove_all_of<'a>(
        &self,
        annotations: impl IntoIterator<Item = &'a Annotation>,
    ) -> usize {
        let mut index = self.state.index.write();
        annotations.into_iter().filter(|a| index.remove(a)).count()
    }

    /// Empty the index. Displayed markers go away on the next reload.
    pub fn remove_all(&self) {
        self.state.index.write().clear();
    }

    /// Every indexed annotation.
    pub fn annotations(&self) -> Vec<Arc<Annotation>> {
        self.state.index.read().query(&MapRect::world())
    }

    /// Markers currently on display.
    pub fn visible_annotations(&self) -> Vec<Marker> {
        self.state.visible.lock().markers()
    }

    /// Annotations currently on display, clusters flattened.
    pub fn visible_nested_annotations(&self) -> Vec<Arc<Annotation>> {
        self.state.visible.lock().nested_annotations()
    }

    /// Zoom level of the last completed pass.
    pub fn zoom_level(&self) -> f64 {
        *self.state.zoom_level.read()
    }

    /// Relocate an indexed annotation, keeping the index consistent.
    pub fn move_annotation(&self, annotation: &Arc<Annotation>, to: Coordinate) -> Result<()> {
        validate_coordinate(&to)?;
        let mut index = self.state.index.write();
        if !index.remove(annotation) {
            return Err(ClusterError::NotIndexed);
        }
        annotation.set_coordinate(to);
        index.insert(Arc::clone(annotation));
        Ok(())
    }

    /// Recluster `visible_rect` in the background.
    ///
    /// Any reload still pending is cancelled. `completion` runs on the
    /// presentation context with `true` once the delta has been applied,
    /// or `false` if this reload was superseded first.
    pub fn request_reload(
        &self,
        visible_rect: MapRect,
        zoom_scale: f64,
        completion: impl FnOnce(bool) + Send + 'static,
    ) {
        self.coordinator.schedule(ReloadJob {
            visible_rect,
            zoom_scale,
            token: CancellationToken::new(),
            completion: Box::new(completion),
        });
    }

    /// Run one pass synchronously and reconcile it into the visible set.
    ///
    /// Must be called on the presentation context, since it updates the
    /// visible set; this is checked in debug builds. The caller then hands
    /// the delta to [`apply_delta`](Self::apply_delta).
    pub fn compute_pass(
        &self,
        zoom_scale: f64,
        visible_rect: &MapRect,
        token: &CancellationToken,
    ) -> PassOutcome {
        debug_assert!(
            self.state.presenter.is_presentation_context(),
            "visible set reconciled outside the presentation context"
        );
        match self.state.cluster(zoom_scale, visible_rect, token) {
            Some((pass, config)) => {
                self.state.commit(pass, &config, zoom_scale, visible_rect, token)
            }
            None => PassOutcome::Cancelled,
        }
    }

    /// Push a delta to the presenter: removals, then additions.
    ///
    /// # Panics
    ///
    /// Panics when not called on the presentation context.
    pub fn apply_delta(&self, delta: &Delta) {
        self.state.apply_delta(delta);
    }

    pub fn config(&self) -> ClusterConfig {
        self.state.config.read().clone()
    }

    /// Replace the configuration used by subsequent passes.
    pub fn set_config(&self, config: ClusterConfig) -> Result<()> {
        config.validate()?;
        *self.state.config.write() = config;
        Ok(())
    }

    /// Attach a delegate. Only a weak reference is kept.
    pub fn set_delegate(&self, delegate: &Arc<dyn ClusterDelegate>) {
        *self.state.delegate.write() = Some(Arc::downgrade(delegate));
    }

    pub fn clear_delegate(&self) {
        *self.state.delegate.write() = None;
    }
}
