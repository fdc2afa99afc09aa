//! ORCA-style local collision avoidance
//!
//! Simplified RVO2: each agent pair contributes one half-plane
//! constraint in velocity space; the solver returns, per agent, the
//! velocity closest to its preferred velocity that respects the
//! constraints, clamped into the max-speed disk.
//!
//! All computations are in the XZ plane; the Y component of the
//! preferred velocity passes through untouched.
//!
//! Reference: van den Berg et al., "Reciprocal n-Body Collision
//! Avoidance" (2011).

use glam::{Vec2, Vec3, Vec3Swizzles};

use crate::agent::AgentId;
use crate::error::NavError;

/// Epsilon for geometric degeneracy tests
const EPS: f32 = 1e-5;

/// Agent state for the avoidance solver.
///
/// Immutable: the `with_*` methods produce updated copies, which makes
/// snapshots safe to hand across threads without locks.
#[derive(Debug, Clone, Copy)]
pub struct AvoidanceAgent {
    id: AgentId,
    position: Vec3,
    velocity: Vec3,
    preferred_velocity: Vec3,
    radius: f32,
    max_speed: f32,
}

impl AvoidanceAgent {
    /// Create an agent at rest, validating radius and max speed.
    pub fn new(id: AgentId, position: Vec3, radius: f32, max_speed: f32) -> Result<Self, NavError> {
        if radius <= 0.0 {
            return Err(NavError::NonPositiveRadius(radius));
        }
        if max_speed <= 0.0 {
            return Err(NavError::NonPositiveMaxSpeed(max_speed));
        }
        Ok(Self {
            id,
            position,
            velocity: Vec3::ZERO,
            preferred_velocity: Vec3::ZERO,
            radius,
            max_speed,
        })
    }

    /// Owning agent id
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Current world position
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current velocity
    #[must_use]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Velocity the agent would take with no neighbors
    #[must_use]
    pub fn preferred_velocity(&self) -> Vec3 {
        self.preferred_velocity
    }

    /// Collision radius (> 0)
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Speed cap for solved velocities (> 0)
    #[must_use]
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Copy with a new position
    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Copy with a new velocity
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Copy with a new preferred velocity
    #[must_use]
    pub fn with_preferred_velocity(mut self, preferred: Vec3) -> Self {
        self.preferred_velocity = preferred;
        self
    }
}

/// One ORCA half-plane constraint in velocity space.
///
/// Feasible velocities v satisfy `(v - point) · normal >= 0` where
/// `normal` is `dir` rotated 90° clockwise.
#[derive(Debug, Clone, Copy)]
struct OrcaLine {
    point: Vec2,
    dir: Vec2,
}

/// Pure, stateless ORCA velocity solver.
#[derive(Debug, Clone, Copy)]
pub struct RvoSolver {
    tau: f32,
}

impl Default for RvoSolver {
    fn default() -> Self {
        Self { tau: 2.5 }
    }
}

impl RvoSolver {
    /// Create a solver with an explicit lookahead window in seconds
    #[must_use]
    pub fn new(tau: f32) -> Self {
        Self { tau }
    }

    /// Compute collision-aware velocities for a snapshot of agents.
    ///
    /// Returns one updated agent per input agent, in input order,
    /// identity preserved. The timestep parameter mirrors the steering
    /// call contract but is unused by this simplified solver; the
    /// truncated-cone horizon is the solver's fixed τ.
    #[must_use]
    pub fn solve(&self, agents: &[AvoidanceAgent], _dt: f32) -> Vec<AvoidanceAgent> {
        agents
            .iter()
            .map(|agent| {
                let velocity = self.new_velocity(agent, agents);
                agent.with_velocity(velocity)
            })
            .collect()
    }

    fn new_velocity(&self, agent: &AvoidanceAgent, others: &[AvoidanceAgent]) -> Vec3 {
        let mut lines = Vec::new();
        for other in others {
            if other.id == agent.id {
                continue;
            }
            let rel_pos = other.position.xz() - agent.position.xz();
            let rel_vel = agent.velocity.xz() - other.velocity.xz();
            let combined_radius = agent.radius + other.radius;
            if let Some(line) = self.orca_line(rel_pos, rel_vel, combined_radius) {
                lines.push(line);
            }
        }

        let solved = resolve(&lines, agent.preferred_velocity.xz(), agent.max_speed);
        Vec3::new(solved.x, agent.preferred_velocity.y, solved.y)
    }

    /// Half-plane constraint for one agent pair, or `None` for
    /// degenerate geometry.
    fn orca_line(&self, rel_pos: Vec2, rel_vel: Vec2, combined_radius: f32) -> Option<OrcaLine> {
        let dist = rel_pos.length();
        if dist < EPS {
            return None;
        }

        let inv_tau = 1.0 / self.tau;
        let apex = rel_vel - rel_pos * inv_tau;
        let r_tau = combined_radius * inv_tau;

        let apex_dist = apex.length();
        let (normal, u) = if apex_dist < r_tau {
            // Colliding trajectory within the lookahead window: push
            // straight out of the truncated cone.
            let normal = if apex_dist < EPS {
                Vec2::new(-rel_pos.y, rel_pos.x) / dist
            } else {
                apex / apex_dist
            };
            (normal, r_tau - apex_dist)
        } else {
            // Outside the disc: project onto the tangent line from the
            // origin through the truncated cone.
            let proj = rel_pos.dot(apex) / (dist * dist);
            let closest = proj * rel_pos - apex;
            let closest_dist = closest.length();
            if closest_dist < EPS {
                return None;
            }
            (closest / closest_dist, r_tau - closest_dist)
        };

        Some(OrcaLine {
            point: 0.5 * u * normal,
            dir: Vec2::new(-normal.y, normal.x),
        })
    }
}

/// Find the velocity in the max-speed disk closest to `preferred` that
/// satisfies all half-plane constraints.
///
/// Iterative projection, an intentional approximation of the full
/// incremental 2D linear program. Under many conflicting constraints
/// the result can depend on constraint order; sufficient for small
/// neighborhoods.
fn resolve(lines: &[OrcaLine], preferred: Vec2, max_speed: f32) -> Vec2 {
    let mut v = clamp_speed(preferred, max_speed);
    for line in lines {
        // outward normal: tangent dir rotated 90° clockwise
        let normal = Vec2::new(line.dir.y, -line.dir.x);
        if (v - line.point).dot(normal) < 0.0 {
            let t = (v - line.point).dot(line.dir);
            v = clamp_speed(line.point + t * line.dir, max_speed);
        }
    }
    v
}

fn clamp_speed(v: Vec2, max_speed: f32) -> Vec2 {
    let speed = v.length();
    if speed > max_speed { v * (max_speed / speed) } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: u64, pos: Vec3, vel: Vec3, pref: Vec3) -> AvoidanceAgent {
        AvoidanceAgent::new(AgentId(id), pos, 0.5, 3.0)
            .unwrap()
            .with_velocity(vel)
            .with_preferred_velocity(pref)
    }

    #[test]
    fn test_one_result_per_agent_in_order() {
        let solver = RvoSolver::default();
        let agents = vec![
            agent(1, Vec3::ZERO, Vec3::X, Vec3::X),
            agent(2, Vec3::new(2.0, 0.0, 0.0), -Vec3::X, -Vec3::X),
            agent(3, Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::ZERO),
        ];
        let result = solver.solve(&agents, 0.05);
        assert_eq!(result.len(), 3);
        for (input, output) in agents.iter().zip(&result) {
            assert_eq!(input.id(), output.id());
        }
    }

    #[test]
    fn test_head_on_speeds_stay_clamped() {
        let solver = RvoSolver::default();
        let agents = vec![
            agent(1, Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0)),
            agent(
                2,
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(-2.0, 0.0, 0.0),
                Vec3::new(-5.0, 0.0, 0.0),
            ),
        ];
        for out in solver.solve(&agents, 0.05) {
            let speed = out.velocity().xz().length();
            assert!(
                speed <= out.max_speed() + 0.01,
                "speed {speed} exceeds max {}",
                out.max_speed()
            );
        }
    }

    #[test]
    fn test_near_head_on_diverts_off_axis() {
        let solver = RvoSolver::default();
        // slight lateral offset: an exactly collinear pair degenerates
        // to no constraint, matching the tangent-projection math
        let agents = vec![
            agent(1, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
            agent(
                2,
                Vec3::new(2.0, 0.0, 0.1),
                Vec3::new(-1.0, 0.0, 0.0),
                Vec3::new(-1.0, 0.0, 0.0),
            ),
        ];
        let result = solver.solve(&agents, 0.05);
        // at least one agent picks up a lateral component
        let lateral: f32 = result.iter().map(|a| a.velocity().z.abs()).sum();
        assert!(lateral > 0.01);
    }

    #[test]
    fn test_lone_agent_keeps_preferred_velocity() {
        let solver = RvoSolver::default();
        let agents = vec![agent(1, Vec3::ZERO, Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0))];
        let result = solver.solve(&agents, 0.05);
        assert!(result[0].velocity().distance(Vec3::new(1.0, 0.0, 1.0)) < 1e-5);
    }

    #[test]
    fn test_coincident_pair_contributes_no_constraint() {
        let solver = RvoSolver::default();
        let agents = vec![
            agent(1, Vec3::ZERO, Vec3::ZERO, Vec3::X),
            agent(2, Vec3::ZERO, Vec3::ZERO, -Vec3::X),
        ];
        // degenerate geometry must not panic or produce NaN
        for out in solver.solve(&agents, 0.05) {
            assert!(out.velocity().is_finite());
        }
    }

    #[test]
    fn test_preferred_y_component_passes_through() {
        let solver = RvoSolver::default();
        let agents = vec![agent(1, Vec3::ZERO, Vec3::ZERO, Vec3::new(1.0, 0.5, 0.0))];
        let result = solver.solve(&agents, 0.05);
        assert!((result[0].velocity().y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_non_positive_radius() {
        let err = AvoidanceAgent::new(AgentId(1), Vec3::ZERO, -1.0, 5.0).unwrap_err();
        assert_eq!(err, NavError::NonPositiveRadius(-1.0));
    }

    #[test]
    fn test_rejects_non_positive_max_speed() {
        let err = AvoidanceAgent::new(AgentId(1), Vec3::ZERO, 0.5, 0.0).unwrap_err();
        assert_eq!(err, NavError::NonPositiveMaxSpeed(0.0));
    }

    #[test]
    fn test_with_updates_produce_copies() {
        let base = AvoidanceAgent::new(AgentId(1), Vec3::ZERO, 0.5, 3.0).unwrap();
        let moved = base.with_position(Vec3::X);
        assert_eq!(base.position(), Vec3::ZERO);
        assert_eq!(moved.position(), Vec3::X);
        assert_eq!(moved.radius(), 0.5);
    }
}
