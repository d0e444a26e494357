//! Builder for cluster managers.

use crate::config::ClusterConfig;
use crate::error::{ClusterError, Result};
use crate::manager::{ClusterManager, DEFAULT_THREAD_NAME};
use crate::presentation::{ClusterDelegate, Presenter};
use std::sync::Arc;

/// Builder for [`ClusterManager`] with a presenter, configuration and
/// optional delegate.
pub struct ClusterManagerBuilder {
    config: ClusterConfig,
    presenter: Option<Arc<dyn Presenter>>,
    delegate: Option<Arc<dyn ClusterDelegate>>,
    thread_name: String,
}

impl ClusterManagerBuilder {
    pub fn new() -> Self {
        Self {
            config: ClusterConfig::default(),
            presenter: None,
            delegate: None,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }

    pub fn config(mut self, config: ClusterConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the display boundary. Required.
    pub fn presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Set a delegate. The manager keeps only a weak reference, so the
    /// caller must hold on to it.
    pub fn delegate(mut self, delegate: &Arc<dyn ClusterDelegate>) -> Self {
        self.delegate = Some(Arc::clone(delegate));
        self
    }

    /// Name of the background reload thread.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Build the manager and start its reload worker.
    ///
    /// # Errors
    ///
    /// Returns an error if no presenter was set, the configuration is
    /// invalid, or the worker thread cannot be spawned.
    pub fn build(self) -> Result<ClusterManager> {
        let presenter = self.presenter.ok_or(ClusterError::MissingPresenter)?;
        ClusterManager::new(self.config, presenter, self.delegate, &self.thread_name)
    }
}

impl Default for ClusterManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClusterManagerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterManagerBuilder")
            .field("config", &self.config)
            .field("presenter", &self.presenter.is_some())
            .field("delegate", &self.delegate.is_some())
            .field("thread_name", &self.thread_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Marker;
    use crate::config::ClusterPosition;

    struct NullPresenter;

    impl Presenter for NullPresenter {
        fn dispatch(&self, task: Box<dyn FnOnce() + Send>) {
            task();
        }

        fn is_presentation_context(&self) -> bool {
            true
        }

        fn remove_markers(&self, _markers: &[Marker]) {}

        fn add_markers(&self, _markers: &[Marker]) {}
    }

    struct NoClusters;

    impl ClusterDelegate for NoClusters {}

    #[test]
    fn test_builder_requires_presenter() {
        let result = ClusterManagerBuilder::new().build();
        assert!(matches!(result, Err(ClusterError::MissingPresenter)));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = ClusterManagerBuilder::new()
            .presenter(Arc::new(NullPresenter))
            .config(ClusterConfig::default().with_distance_from_contested_location(f64::NAN))
            .build();
        assert!(matches!(result, Err(ClusterError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_with_options() {
        let delegate: Arc<dyn ClusterDelegate> = Arc::new(NoClusters);
        let manager = ClusterManagerBuilder::new()
            .presenter(Arc::new(NullPresenter))
            .config(ClusterConfig::default().with_cluster_position(ClusterPosition::Average))
            .delegate(&delegate)
            .thread_name("test-reload")
            .build()
            .unwrap();
        assert_eq!(manager.config().cluster_position, ClusterPosition::Average);
        assert!(manager.annotations().is_empty());
    }
}
