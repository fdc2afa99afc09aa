//! Abstract cluster graph for hierarchical pathfinding
//!
//! One node per mesh cluster; built once from a [`NavMesh`] and immutable
//! afterwards. Only the macro level of the hierarchical search touches
//! this graph.

use glam::Vec3;
use rustc_hash::FxHashMap;

use crate::mesh::NavMesh;

/// A group of polygons treated as a single node at the cluster level.
#[derive(Debug, Clone)]
pub struct Cluster {
    id: u32,
    centroid: Vec3,
    poly_ids: Vec<u32>,
    neighbor_costs: FxHashMap<u32, f32>,
}

impl Cluster {
    /// Cluster id (matches the member polygons' cluster field)
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Mean of the member polygon centroids
    #[must_use]
    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    /// Ids of the member polygons
    #[must_use]
    pub fn poly_ids(&self) -> &[u32] {
        &self.poly_ids
    }

    /// Neighbor cluster id -> cheapest crossing edge cost
    #[must_use]
    pub fn neighbor_costs(&self) -> &FxHashMap<u32, f32> {
        &self.neighbor_costs
    }
}

/// Abstract graph with one node per mesh cluster.
#[derive(Debug, Clone)]
pub struct ClusterGraph {
    clusters: FxHashMap<u32, Cluster>,
}

impl ClusterGraph {
    /// Build the abstract graph from a mesh.
    ///
    /// An abstract edge exists between two clusters if any polygon of
    /// one has a mesh neighbor in the other; its cost is the cheapest
    /// such concrete crossing.
    #[must_use]
    pub fn build(mesh: &NavMesh) -> Self {
        let mut by_cluster: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
        for poly in mesh.polys() {
            by_cluster.entry(poly.cluster()).or_default().push(poly.id());
        }

        let mut clusters = FxHashMap::default();
        for (cid, poly_ids) in by_cluster {
            let mut centroid = Vec3::ZERO;
            let mut neighbor_costs: FxHashMap<u32, f32> = FxHashMap::default();

            for &pid in &poly_ids {
                let Some(poly) = mesh.poly(pid) else { continue };
                centroid += poly.centroid();

                for &nid in poly.neighbors() {
                    let Some(neighbor) = mesh.poly(nid) else {
                        continue;
                    };
                    if neighbor.cluster() == cid {
                        continue;
                    }
                    let cost = poly.cost_to(neighbor);
                    neighbor_costs
                        .entry(neighbor.cluster())
                        .and_modify(|c| *c = c.min(cost))
                        .or_insert(cost);
                }
            }
            centroid /= poly_ids.len() as f32;

            clusters.insert(
                cid,
                Cluster {
                    id: cid,
                    centroid,
                    poly_ids,
                    neighbor_costs,
                },
            );
        }
        Self { clusters }
    }

    /// Look up a cluster by id
    #[must_use]
    pub fn cluster(&self, id: u32) -> Option<&Cluster> {
        self.clusters.get(&id)
    }

    /// Iterate over all clusters (unspecified order)
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }

    /// Number of clusters
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::NavMeshBuilder;

    #[test]
    fn test_cluster_count_matches_mesh() {
        let mesh = NavMeshBuilder::grid(8, 8, 2.0, 4);
        let graph = ClusterGraph::build(&mesh);
        assert_eq!(graph.cluster_count(), mesh.cluster_count());
    }

    #[test]
    fn test_every_cluster_has_neighbors() {
        // 2x2 cluster grid: each cluster touches at least one other
        let mesh = NavMeshBuilder::grid(8, 8, 2.0, 4);
        let graph = ClusterGraph::build(&mesh);
        for cluster in graph.clusters() {
            assert!(
                !cluster.neighbor_costs().is_empty(),
                "cluster {} has no neighbors",
                cluster.id()
            );
        }
    }

    #[test]
    fn test_cluster_centroid_is_member_mean() {
        let mesh = NavMeshBuilder::grid(4, 4, 1.0, 2);
        let graph = ClusterGraph::build(&mesh);
        let cluster = graph.cluster(0).expect("cluster 0 exists");
        // cluster 0 spans cells (0..2, 0..2) of 1-unit cells
        assert!(cluster.centroid().distance(Vec3::new(1.0, 0.0, 1.0)) < 1e-5);
        assert_eq!(cluster.poly_ids().len(), 4);
    }

    #[test]
    fn test_edge_cost_is_minimum_crossing() {
        let mesh = NavMeshBuilder::grid(4, 4, 2.0, 2);
        let graph = ClusterGraph::build(&mesh);
        let cluster = graph.cluster(0).expect("cluster 0 exists");
        // all crossings between unit-cost 2.0-cell polys cost 2.0
        let cost = cluster.neighbor_costs()[&1];
        assert!((cost - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_isolated_cluster_has_no_neighbors() {
        let mesh = NavMeshBuilder::new()
            .with_poly(
                vec![Vec3::ZERO, Vec3::X, Vec3::Z],
                &[],
                1.0,
                0,
            )
            .unwrap()
            .with_poly(
                vec![
                    Vec3::new(10.0, 0.0, 10.0),
                    Vec3::new(11.0, 0.0, 10.0),
                    Vec3::new(10.0, 0.0, 11.0),
                ],
                &[],
                1.0,
                1,
            )
            .unwrap()
            .build(2);
        let graph = ClusterGraph::build(&mesh);
        assert_eq!(graph.cluster_count(), 2);
        assert!(graph.cluster(0).unwrap().neighbor_costs().is_empty());
    }
}
