//! Seams between the engine and the map display layer.

use crate::annotation::{Annotation, Marker};
use crate::config::CellSize;

/// The display boundary that shows markers.
///
/// Display mutations and completion callbacks must run on one execution
/// context (typically the UI thread). The engine reaches that context
/// through [`Presenter::dispatch`] and checks it with
/// [`Presenter::is_presentation_context`] before every mutation.
pub trait Presenter: Send + Sync + 'static {
    /// Run `task` on the presentation context, in submission order.
    fn dispatch(&self, task: Box<dyn FnOnce() + Send>);

    /// Whether the calling thread is the presentation context.
    fn is_presentation_context(&self) -> bool;

    /// Take markers off the display.
    fn remove_markers(&self, markers: &[Marker]);

    /// Put markers on the display.
    fn add_markers(&self, markers: &[Marker]);
}

/// Optional per-pass overrides supplied by the host.
///
/// The manager keeps only a weak reference and upgrades it for the duration
/// of a single pass.
pub trait ClusterDelegate: Send + Sync {
    /// Cell size for a zoom scale; `None` defers to the configured policy.
    fn cell_size(&self, _zoom_scale: f64) -> Option<CellSize> {
        None
    }

    /// Whether an annotation may be merged into a cluster at all.
    fn should_cluster(&self, _annotation: &Annotation) -> bool {
        true
    }
}
