//! Per-user achievement metrics.

pub mod model;

pub use model::UserMetric;
