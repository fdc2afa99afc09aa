//! Two-level hierarchical A* pathfinding
//!
//! Phase 1: A* over the cluster graph to find a cluster sequence.
//! Phase 2: A* over mesh polygons to refine waypoints within each
//! cluster segment, with one expansion budget shared by every segment.
//!
//! [`find_path`] is a pure function of its inputs, safe to run
//! concurrently for independent requests.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec3;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::agent::AgentId;
use crate::graph::ClusterGraph;
use crate::mesh::{NavMesh, Polygon};
use crate::path::{NavPath, PathResult};

/// Distance under which the literal goal is considered already present
/// at the end of the waypoint list.
const GOAL_EPS: f32 = 1e-2;

/// A* node for the priority queue
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    id: u32,
    f_cost: f32,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a path between two world points.
///
/// The macro search is capped at `max_nodes` expansions; the micro
/// refinements share a second `max_nodes` budget across all segments.
/// Exhausting the shared budget returns [`PathResult::Partial`] with the
/// waypoints assembled so far; a disconnected topology returns
/// [`PathResult::Unreachable`].
#[must_use]
pub fn find_path(
    mesh: &NavMesh,
    graph: &ClusterGraph,
    start: Vec3,
    goal: Vec3,
    max_nodes: usize,
    requester: AgentId,
) -> PathResult {
    let (Some(start_poly), Some(goal_poly)) = (mesh.nearest_poly(start), mesh.nearest_poly(goal))
    else {
        return PathResult::Unreachable {
            requester,
            reason: String::from("start or goal not on the mesh"),
        };
    };

    let start_cluster = start_poly.cluster();
    let goal_cluster = goal_poly.cluster();

    let cluster_sequence = if start_cluster == goal_cluster {
        vec![start_cluster]
    } else {
        match cluster_astar(graph, start_cluster, goal_cluster, max_nodes) {
            Some(seq) => seq,
            None => {
                return PathResult::Unreachable {
                    requester,
                    reason: format!(
                        "no cluster route from {start_cluster} to {goal_cluster}"
                    ),
                };
            }
        }
    };

    let mut waypoints = vec![start];
    let mut expended = 0usize;
    let mut truncated = false;

    for (i, &cid) in cluster_sequence.iter().enumerate() {
        let seg_start = waypoints[waypoints.len() - 1];
        let seg_goal = if i + 1 == cluster_sequence.len() {
            goal
        } else {
            graph
                .cluster(cluster_sequence[i + 1])
                .map_or(goal, |c| c.centroid())
        };

        match local_astar(mesh, cid, seg_start, seg_goal, max_nodes, &mut expended) {
            Some(segment) => waypoints.extend_from_slice(&segment[1..]),
            None => {
                truncated = true;
                break;
            }
        }
    }

    if !truncated
        && waypoints
            .last()
            .is_some_and(|last| last.distance(goal) > GOAL_EPS)
    {
        waypoints.push(goal);
    }

    let total_cost = path_cost(&waypoints);
    let path = NavPath::new(waypoints, total_cost, !truncated);

    if truncated {
        log::debug!("path for {requester} truncated at node cap {max_nodes}");
        return PathResult::Partial {
            requester,
            path,
            reason: String::from("node budget exhausted"),
        };
    }
    PathResult::Found { requester, path }
}

/// Macro A* over the abstract cluster graph.
///
/// Heuristic: straight-line distance between cluster centroids.
/// Returns the ordered cluster sequence, or `None` if no route was
/// found within `max_nodes` expansions.
fn cluster_astar(
    graph: &ClusterGraph,
    start: u32,
    goal: u32,
    max_nodes: usize,
) -> Option<Vec<u32>> {
    let goal_centroid = graph.cluster(goal)?.centroid();
    let heuristic = |id: u32| -> f32 {
        graph
            .cluster(id)
            .map_or(0.0, |c| c.centroid().distance(goal_centroid))
    };

    let mut g_score: FxHashMap<u32, f32> = FxHashMap::default();
    let mut came_from: FxHashMap<u32, u32> = FxHashMap::default();
    let mut closed: FxHashSet<u32> = FxHashSet::default();
    let mut open = BinaryHeap::new();

    g_score.insert(start, 0.0);
    open.push(OpenNode {
        id: start,
        f_cost: heuristic(start),
    });

    let mut expanded = 0usize;
    while let Some(current) = open.pop() {
        if current.id == goal {
            return Some(reconstruct_ids(&came_from, current.id));
        }
        if !closed.insert(current.id) {
            continue;
        }
        expanded += 1;
        if expanded >= max_nodes {
            return None;
        }

        let Some(cluster) = graph.cluster(current.id) else {
            continue;
        };
        for (&neighbor, &edge_cost) in cluster.neighbor_costs() {
            if closed.contains(&neighbor) {
                continue;
            }
            let tentative = g_score.get(&current.id).copied().unwrap_or(f32::MAX) + edge_cost;
            if tentative < g_score.get(&neighbor).copied().unwrap_or(f32::MAX) {
                came_from.insert(neighbor, current.id);
                g_score.insert(neighbor, tentative);
                open.push(OpenNode {
                    id: neighbor,
                    f_cost: tentative + heuristic(neighbor),
                });
            }
        }
    }
    None
}

/// Micro A* restricted to one cluster's polygons.
///
/// `expended` is the expansion counter shared by every segment of the
/// request; hitting `max_nodes` returns `None` (truncation). An
/// exhausted open set without reaching the local goal falls back to the
/// straight `[seg_start, seg_goal]` segment instead; the cluster
/// sequence already vouches for connectivity at the macro level.
fn local_astar(
    mesh: &NavMesh,
    cluster: u32,
    seg_start: Vec3,
    seg_goal: Vec3,
    max_nodes: usize,
    expended: &mut usize,
) -> Option<Vec<Vec3>> {
    let start_id = match nearest_in_cluster(mesh, cluster, seg_start) {
        Some(p) => p.id(),
        None => return Some(vec![seg_start, seg_goal]),
    };
    let goal_id = match nearest_in_cluster(mesh, cluster, seg_goal) {
        Some(p) => p.id(),
        None => return Some(vec![seg_start, seg_goal]),
    };
    if start_id == goal_id {
        return Some(vec![seg_start, seg_goal]);
    }

    let mut g_score: FxHashMap<u32, f32> = FxHashMap::default();
    let mut came_from: FxHashMap<u32, u32> = FxHashMap::default();
    let mut closed: FxHashSet<u32> = FxHashSet::default();
    let mut open = BinaryHeap::new();

    g_score.insert(start_id, 0.0);
    open.push(OpenNode {
        id: start_id,
        f_cost: seg_start.distance(seg_goal),
    });

    while let Some(current) = open.pop() {
        if *expended >= max_nodes {
            return None;
        }
        if current.id == goal_id {
            return Some(reconstruct_waypoints(
                mesh, &came_from, current.id, seg_start, seg_goal,
            ));
        }
        if !closed.insert(current.id) {
            continue;
        }
        *expended += 1;

        let Some(current_poly) = mesh.poly(current.id) else {
            continue;
        };
        for &neighbor_id in current_poly.neighbors() {
            if closed.contains(&neighbor_id) {
                continue;
            }
            let Some(neighbor) = mesh.poly(neighbor_id) else {
                continue;
            };
            // Micro search stays inside the current cluster; segment
            // endpoints are snapped into it above.
            if neighbor.cluster() != cluster {
                continue;
            }

            let tentative = g_score.get(&current.id).copied().unwrap_or(f32::MAX)
                + current_poly.cost_to(neighbor);
            if tentative < g_score.get(&neighbor_id).copied().unwrap_or(f32::MAX) {
                came_from.insert(neighbor_id, current.id);
                g_score.insert(neighbor_id, tentative);
                open.push(OpenNode {
                    id: neighbor_id,
                    f_cost: tentative + neighbor.centroid().distance(seg_goal),
                });
            }
        }
    }
    Some(vec![seg_start, seg_goal])
}

fn nearest_in_cluster(mesh: &NavMesh, cluster: u32, point: Vec3) -> Option<&Polygon> {
    mesh.polys_in_cluster(cluster).min_by(|a, b| {
        a.centroid()
            .distance_squared(point)
            .total_cmp(&b.centroid().distance_squared(point))
    })
}

fn reconstruct_ids(came_from: &FxHashMap<u32, u32>, mut current: u32) -> Vec<u32> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        current = prev;
        path.push(current);
    }
    path.reverse();
    path
}

/// Waypoints for one refined segment: the literal segment endpoints
/// bracketing the centroids of the traversed polygons (start polygon
/// excluded, since the segment start already stands in for it).
fn reconstruct_waypoints(
    mesh: &NavMesh,
    came_from: &FxHashMap<u32, u32>,
    mut current: u32,
    seg_start: Vec3,
    seg_goal: Vec3,
) -> Vec<Vec3> {
    let mut path = vec![seg_goal];
    while let Some(&prev) = came_from.get(&current) {
        if let Some(poly) = mesh.poly(current) {
            path.push(poly.centroid());
        }
        current = prev;
    }
    path.push(seg_start);
    path.reverse();
    path
}

fn path_cost(waypoints: &[Vec3]) -> f32 {
    waypoints
        .windows(2)
        .map(|pair| pair[0].distance(pair[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::NavMeshBuilder;

    fn grid_world() -> (NavMesh, ClusterGraph) {
        let mesh = NavMeshBuilder::grid(8, 8, 2.0, 4);
        let graph = ClusterGraph::build(&mesh);
        (mesh, graph)
    }

    #[test]
    fn test_path_found_across_grid() {
        let (mesh, graph) = grid_world();
        let result = find_path(
            &mesh,
            &graph,
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(13.0, 0.0, 13.0),
            512,
            AgentId(1),
        );
        let PathResult::Found { path, .. } = result else {
            panic!("expected Found, got {result:?}");
        };
        assert!(path.has_waypoints());
        assert!(path.is_complete());
        assert!(path.total_cost() > 0.0);
        // the caller's literal endpoints are preserved
        assert_eq!(path.waypoints()[0], Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(
            *path.waypoints().last().unwrap(),
            Vec3::new(13.0, 0.0, 13.0)
        );
    }

    #[test]
    fn test_same_poly_path_is_trivial() {
        let (mesh, graph) = grid_world();
        let start = Vec3::new(1.0, 0.0, 1.0);
        let goal = Vec3::new(1.5, 0.0, 1.2);
        let result = find_path(&mesh, &graph, start, goal, 512, AgentId(1));
        let PathResult::Found { path, .. } = result else {
            panic!("expected Found, got {result:?}");
        };
        assert!(path.waypoints().len() <= 2);
        assert!((path.total_cost() - start.distance(goal)).abs() < 1e-4);
    }

    #[test]
    fn test_empty_mesh_is_unreachable() {
        let mesh = NavMeshBuilder::new().build(0);
        let graph = ClusterGraph::build(&mesh);
        let result = find_path(&mesh, &graph, Vec3::ZERO, Vec3::X, 512, AgentId(1));
        assert!(matches!(result, PathResult::Unreachable { .. }));
    }

    #[test]
    fn test_disconnected_clusters_are_unreachable() {
        let mesh = NavMeshBuilder::new()
            .with_poly(vec![Vec3::ZERO, Vec3::X, Vec3::Z], &[], 1.0, 0)
            .unwrap()
            .with_poly(
                vec![
                    Vec3::new(50.0, 0.0, 50.0),
                    Vec3::new(51.0, 0.0, 50.0),
                    Vec3::new(50.0, 0.0, 51.0),
                ],
                &[],
                1.0,
                1,
            )
            .unwrap()
            .build(2);
        let graph = ClusterGraph::build(&mesh);
        let result = find_path(
            &mesh,
            &graph,
            Vec3::ZERO,
            Vec3::new(50.0, 0.0, 50.0),
            512,
            AgentId(1),
        );
        assert!(matches!(result, PathResult::Unreachable { .. }));
    }

    #[test]
    fn test_tiny_budget_yields_partial() {
        let (mesh, graph) = grid_world();
        let result = find_path(
            &mesh,
            &graph,
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(13.0, 0.0, 13.0),
            4,
            AgentId(1),
        );
        let PathResult::Partial { path, .. } = result else {
            panic!("expected Partial, got {result:?}");
        };
        assert!(!path.is_complete());
        // the literal start survives truncation
        assert_eq!(path.waypoints()[0], Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_result_match_is_exhaustive() {
        let (mesh, graph) = grid_world();
        let result = find_path(
            &mesh,
            &graph,
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(13.0, 0.0, 13.0),
            512,
            AgentId(1),
        );
        // compiler enforces exhaustiveness over the three variants
        let label = match result {
            PathResult::Found { .. } => "found",
            PathResult::Unreachable { .. } => "unreachable",
            PathResult::Partial { .. } => "partial",
        };
        assert_eq!(label, "found");
    }

    #[test]
    fn test_cost_is_waypoint_distance_sum() {
        let (mesh, graph) = grid_world();
        let result = find_path(
            &mesh,
            &graph,
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(13.0, 0.0, 13.0),
            512,
            AgentId(1),
        );
        let PathResult::Found { path, .. } = result else {
            panic!("expected Found");
        };
        let summed: f32 = path
            .waypoints()
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum();
        assert!((path.total_cost() - summed).abs() < 1e-4);
    }
}
