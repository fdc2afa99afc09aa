//! Path values: waypoint sequences, requests, and results

use glam::Vec3;

use crate::agent::AgentId;

/// An ordered waypoint sequence from start to goal.
///
/// Produced by the pathfinder, cached per agent by the navigation
/// system, and trimmed in place as steering consumes waypoints.
#[derive(Debug, Clone)]
pub struct NavPath {
    waypoints: Vec<Vec3>,
    total_cost: f32,
    complete: bool,
}

impl NavPath {
    /// Create a path from explicit parts
    #[must_use]
    pub fn new(waypoints: Vec<Vec3>, total_cost: f32, complete: bool) -> Self {
        Self {
            waypoints,
            total_cost,
            complete,
        }
    }

    /// A path with no waypoints and infinite cost
    #[must_use]
    pub fn empty() -> Self {
        Self {
            waypoints: Vec::new(),
            total_cost: f32::MAX,
            complete: false,
        }
    }

    /// Waypoints in travel order
    #[must_use]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    /// Sum of consecutive waypoint distances at creation time, minus
    /// any distance already consumed by steering
    #[must_use]
    pub fn total_cost(&self) -> f32 {
        self.total_cost
    }

    /// False if the search was truncated before reaching the goal
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// True if the path holds at least one waypoint
    #[must_use]
    pub fn has_waypoints(&self) -> bool {
        !self.waypoints.is_empty()
    }

    /// Next waypoint after the start, the immediate steering target.
    ///
    /// Falls back to the sole waypoint when fewer than two remain.
    #[must_use]
    pub fn next_waypoint(&self) -> Option<Vec3> {
        if self.waypoints.len() >= 2 {
            Some(self.waypoints[1])
        } else {
            self.waypoints.first().copied()
        }
    }

    /// True if one waypoint or fewer remains, so nothing is left to follow
    #[must_use]
    pub fn is_at_goal(&self) -> bool {
        self.waypoints.len() <= 1
    }

    /// Drop the leading waypoint and deduct the consumed distance.
    ///
    /// A path with no waypoints left has nothing to drop and is
    /// returned unchanged.
    #[must_use]
    pub fn advanced(&self, consumed: f32) -> Self {
        if self.waypoints.is_empty() {
            return self.clone();
        }
        Self {
            waypoints: self.waypoints[1..].to_vec(),
            total_cost: self.total_cost - consumed,
            complete: self.complete,
        }
    }
}

/// Async pathfinding request submitted to the navigation system.
///
/// Priority is carried as data for the host's scheduler; this crate
/// does not reorder requests by it.
#[derive(Debug, Clone, Copy)]
pub struct PathRequest {
    pub requester: AgentId,
    pub from: Vec3,
    pub to: Vec3,
    pub priority: u8,
}

impl PathRequest {
    /// Create a request with the default priority (5)
    #[must_use]
    pub fn new(requester: AgentId, from: Vec3, to: Vec3) -> Self {
        Self {
            requester,
            from,
            to,
            priority: 5,
        }
    }
}

/// Result of a pathfinding request.
///
/// Callers must handle all three variants; there is no error channel
/// for pathfinding besides this enum.
#[derive(Debug, Clone)]
pub enum PathResult {
    /// Full path found to the goal
    Found { requester: AgentId, path: NavPath },
    /// No connected route exists
    Unreachable { requester: AgentId, reason: String },
    /// Node budget exhausted before the goal; the valid prefix is retained
    Partial {
        requester: AgentId,
        path: NavPath,
        reason: String,
    },
}

impl PathResult {
    /// The agent this result belongs to
    #[must_use]
    pub fn requester(&self) -> AgentId {
        match self {
            Self::Found { requester, .. }
            | Self::Unreachable { requester, .. }
            | Self::Partial { requester, .. } => *requester,
        }
    }
}
