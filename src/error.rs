//! Construction-time validation errors
//!
//! Pathfinding failures are not errors; they are [`PathResult`]
//! variants. This enum only covers eagerly rejected invalid inputs.
//!
//! [`PathResult`]: crate::path::PathResult

use thiserror::Error;

/// Invalid navigation input rejected at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavError {
    /// A polygon needs at least 3 vertices.
    #[error("polygon requires at least 3 vertices, got {got}")]
    DegeneratePolygon { got: usize },

    /// Traversal cost multipliers must be positive.
    #[error("traversal cost must be > 0, got {0}")]
    NonPositiveCost(f32),

    /// Avoidance agents must have a positive radius.
    #[error("agent radius must be > 0, got {0}")]
    NonPositiveRadius(f32),

    /// Avoidance agents must have a positive max speed.
    #[error("agent max speed must be > 0, got {0}")]
    NonPositiveMaxSpeed(f32),
}
