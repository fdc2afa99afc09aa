//! Crowd navigation for many simultaneous agents
//!
//! This crate provides:
//! - Polygon navigation mesh with cluster abstraction (`mesh`, `graph`)
//! - Two-level hierarchical A* pathfinding (`pathfinder`)
//! - ORCA-style local collision avoidance (`avoidance`)
//! - A per-tick steering orchestrator with async path requests (`system`)
//!
//! Pathfinding runs on worker threads and publishes results into a
//! per-agent path cache; `steer` is synchronous and is expected to be
//! called once per agent per tick by the host simulation.

pub mod agent;
pub mod avoidance;
pub mod config;
pub mod error;
pub mod graph;
pub mod mesh;
pub mod path;
pub mod pathfinder;
pub mod system;

// Re-exports for convenience
pub use glam;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::agent::AgentId;
    pub use crate::avoidance::{AvoidanceAgent, RvoSolver};
    pub use crate::config::NavConfig;
    pub use crate::error::NavError;
    pub use crate::graph::{Cluster, ClusterGraph};
    pub use crate::mesh::{NavMesh, NavMeshBuilder, Polygon};
    pub use crate::path::{NavPath, PathRequest, PathResult};
    pub use crate::pathfinder::find_path;
    pub use crate::system::{NavigationSystem, SteeringOutput};
    pub use glam::{Vec2, Vec3};
}
