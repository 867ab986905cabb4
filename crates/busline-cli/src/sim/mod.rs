//! Simulated bus routes.

pub mod paths;

pub use paths::{CircularRoute, LinearRoute, RoutePath};
