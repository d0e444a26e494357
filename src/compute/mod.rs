//! Clustering algorithms.
//!
//! These operate on the spatial index and configuration snapshots only; the
//! manager owns scheduling and display state.

pub mod distribute;
pub mod grid;
pub mod validation;
