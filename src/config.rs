//! Navigation tuning parameters

use serde::{Deserialize, Serialize};

/// Navigation system configuration
///
/// All tunables are explicit values. There is no config file; the host
/// decides where these come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavConfig {
    /// Hard node-expansion cap per path request (shared across the
    /// macro search and all micro segments)
    pub max_nodes: usize,
    /// Avoidance lookahead window in seconds (the ORCA time horizon)
    pub tau: f32,
    /// Distance at which the leading waypoint is considered reached
    pub waypoint_radius: f32,
    /// Remaining path cost below which an agent counts as arrived
    pub arrival_radius: f32,
    /// Timestep handed to the avoidance solver each steer call
    pub solver_dt: f32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            max_nodes: 512,
            tau: 2.5,
            waypoint_radius: 0.8,
            arrival_radius: 0.5,
            solver_dt: 0.05,
        }
    }
}

impl NavConfig {
    /// Set the node-expansion budget
    #[must_use]
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Set the avoidance lookahead window
    #[must_use]
    pub fn with_tau(mut self, tau: f32) -> Self {
        self.tau = tau;
        self
    }

    /// Set the waypoint arrival radius
    #[must_use]
    pub fn with_waypoint_radius(mut self, radius: f32) -> Self {
        self.waypoint_radius = radius;
        self
    }

    /// Set the goal arrival radius
    #[must_use]
    pub fn with_arrival_radius(mut self, radius: f32) -> Self {
        self.arrival_radius = radius;
        self
    }
}
