//! Navigation orchestrator
//!
//! Wires the hierarchical pathfinder and the avoidance solver together:
//! path searches run on worker threads and publish into a per-agent
//! path cache; [`NavigationSystem::steer`] is synchronous, reads the
//! cache, and turns the cached path plus the avoidance solve into a
//! per-tick [`SteeringOutput`].

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, bounded};
use glam::{Vec3, Vec3Swizzles};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::agent::AgentId;
use crate::avoidance::{AvoidanceAgent, RvoSolver};
use crate::config::NavConfig;
use crate::graph::ClusterGraph;
use crate::mesh::NavMesh;
use crate::path::{NavPath, PathRequest, PathResult};
use crate::pathfinder::find_path;

/// Steering output for one agent, produced fresh every tick.
///
/// Consumed by the host's locomotion layer; nothing here is cached.
#[derive(Debug, Clone, Copy)]
pub struct SteeringOutput {
    pub agent: AgentId,
    /// Velocity to apply this tick
    pub desired_velocity: Vec3,
    /// Unit facing direction (+Z when nearly stationary)
    pub look_direction: Vec3,
    /// Magnitude of the desired velocity in the XZ plane
    pub speed: f32,
    /// Immediate steering target
    pub next_waypoint: Vec3,
    /// Remaining cost of the cached path, not straight-line distance
    pub distance_to_goal: f32,
    pub arrived: bool,
}

impl SteeringOutput {
    /// Stationary output for an agent with nothing to follow
    #[must_use]
    pub fn idle(agent: AgentId, position: Vec3) -> Self {
        Self {
            agent,
            desired_velocity: Vec3::ZERO,
            look_direction: Vec3::Z,
            speed: 0.0,
            next_waypoint: position,
            distance_to_goal: 0.0,
            arrived: true,
        }
    }
}

/// Orchestrator owning the per-agent navigation state.
///
/// Two execution contexts touch it: worker threads resolving path
/// requests (writers of the path cache) and the host's per-tick steer
/// calls (reader/trimmer of the path cache, owner of the avoidance
/// cache). Both caches tolerate that concurrency without external
/// locking by the caller.
pub struct NavigationSystem {
    mesh: Arc<NavMesh>,
    graph: Arc<ClusterGraph>,
    solver: RvoSolver,
    config: NavConfig,
    paths: Arc<RwLock<FxHashMap<AgentId, NavPath>>>,
    agents: RwLock<FxHashMap<AgentId, AvoidanceAgent>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl NavigationSystem {
    /// Create a system over a mesh, building the cluster graph once.
    #[must_use]
    pub fn new(mesh: NavMesh, config: NavConfig) -> Self {
        let graph = ClusterGraph::build(&mesh);
        log::info!(
            "navigation ready: {} polys, {} clusters",
            mesh.poly_count(),
            mesh.cluster_count()
        );
        Self {
            mesh: Arc::new(mesh),
            graph: Arc::new(graph),
            solver: RvoSolver::new(config.tau),
            config,
            paths: Arc::new(RwLock::new(FxHashMap::default())),
            agents: RwLock::new(FxHashMap::default()),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Request a path asynchronously. Never blocks the caller.
    ///
    /// The result arrives on the returned channel; a `Found` result is
    /// also published into the agent's path cache, so dropping the
    /// receiver loses nothing. When requests for one agent overlap, the
    /// last to *complete* wins the cache slot.
    pub fn request_path(&self, request: PathRequest) -> Receiver<PathResult> {
        let (tx, rx) = bounded(1);
        let mesh = Arc::clone(&self.mesh);
        let graph = Arc::clone(&self.graph);
        let paths = Arc::clone(&self.paths);
        let max_nodes = self.config.max_nodes;

        let handle = thread::spawn(move || {
            let result = find_path(
                &mesh,
                &graph,
                request.from,
                request.to,
                max_nodes,
                request.requester,
            );
            match &result {
                PathResult::Found { path, .. } => {
                    log::debug!(
                        "path found for {}: {} waypoints, cost={}",
                        request.requester,
                        path.waypoints().len(),
                        path.total_cost()
                    );
                    paths.write().insert(request.requester, path.clone());
                }
                PathResult::Unreachable { reason, .. } | PathResult::Partial { reason, .. } => {
                    log::debug!("path for {} not found: {reason}", request.requester);
                }
            }
            // the requester may have stopped listening; the cache write
            // above already happened
            let _ = tx.send(result);
        });

        let mut workers = self.workers.lock();
        workers.retain(|h| !h.is_finished());
        workers.push(handle);
        rx
    }

    /// Compute steering for one agent. Synchronous, once per tick.
    ///
    /// Follows the cached path, trimming consumed waypoints in place,
    /// and runs the avoidance solver over all registered agents when
    /// this agent has opted in via [`NavigationSystem::update_agent_state`].
    #[must_use]
    pub fn steer(&self, agent: AgentId, position: Vec3, speed: f32) -> SteeringOutput {
        let cached = self.paths.read().get(&agent).cloned();
        let Some(mut path) = cached else {
            return SteeringOutput::idle(agent, position);
        };
        if !path.has_waypoints() {
            self.paths.write().remove(&agent);
            return SteeringOutput::idle(agent, position);
        }

        let Some(mut target) = path.next_waypoint() else {
            return SteeringOutput::idle(agent, position);
        };

        let dist_to_target = position.distance(target);
        if dist_to_target < self.config.waypoint_radius && path.waypoints().len() > 2 {
            path = path.advanced(dist_to_target);
            // this write may overwrite a fresher path that resolved
            // between our read and here; the cache contract only
            // guarantees a complete previously-valid value per slot
            self.paths.write().insert(agent, path.clone());
            if let Some(next) = path.next_waypoint() {
                target = next;
            }
        }

        let distance_to_goal = path.total_cost();
        let direction = (target - position).normalize_or_zero();
        let preferred = Vec3::new(direction.x * speed, 0.0, direction.z * speed);

        let registered = self.agents.read().get(&agent).copied();
        let velocity = if let Some(record) = registered {
            let updated = record
                .with_position(position)
                .with_preferred_velocity(preferred);
            self.agents.write().insert(agent, updated);

            // full snapshot of every registered agent; callers needing
            // scale pre-filter the neighborhood before registering
            let snapshot: Vec<AvoidanceAgent> = self.agents.read().values().copied().collect();
            let solved = self.solver.solve(&snapshot, self.config.solver_dt);
            match solved.into_iter().find(|a| a.id() == agent) {
                Some(mine) => {
                    let velocity = mine.velocity();
                    self.agents.write().insert(agent, mine);
                    velocity
                }
                None => preferred,
            }
        } else {
            preferred
        };

        let actual_speed = velocity.xz().length();
        let look_direction = if actual_speed > 0.01 {
            Vec3::new(velocity.x / actual_speed, 0.0, velocity.z / actual_speed)
        } else {
            Vec3::Z
        };

        SteeringOutput {
            agent,
            desired_velocity: velocity,
            look_direction,
            speed: actual_speed,
            next_waypoint: target,
            distance_to_goal,
            arrived: distance_to_goal < self.config.arrival_radius,
        }
    }

    /// Register or refresh an agent's avoidance record.
    ///
    /// Only registered agents participate in avoidance solves; others
    /// steer with their naive desired velocity.
    pub fn update_agent_state(&self, agent: AvoidanceAgent) {
        self.agents.write().insert(agent.id(), agent);
    }

    /// Clear all navigation state for an agent. Mandatory on despawn:
    /// a stale avoidance record keeps influencing other agents' solves.
    pub fn remove_agent(&self, agent: AgentId) {
        self.paths.write().remove(&agent);
        self.agents.write().remove(&agent);
    }

    /// True once a mesh with at least one polygon is loaded
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.mesh.poly_count() > 0
    }

    /// The mesh this system navigates over
    #[must_use]
    pub fn mesh(&self) -> &NavMesh {
        &self.mesh
    }

    /// Join all outstanding path workers.
    ///
    /// Abandoned searches have no side effect beyond their cache write.
    pub fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            let _ = handle.join();
        }
    }
}
