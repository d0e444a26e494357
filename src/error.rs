//! Error types for the clustering engine.
//!
//! Cancellation and empty viewports are not errors: they surface as
//! [`PassOutcome::Cancelled`](crate::reconcile::PassOutcome) and empty
//! deltas respectively.

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClusterError>;

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// Annotation coordinate is non-finite or outside longitude/latitude bounds
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// A manager cannot be built without a presentation boundary
    #[error("No presenter configured")]
    MissingPresenter,
    /// The annotation is not part of the spatial index
    #[error("Annotation is not indexed")]
    NotIndexed,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The background reload worker could not be started
    #[error("Worker error: {0}")]
    Worker(#[from] std::io::Error),
}
