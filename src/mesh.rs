//! Polygon navigation mesh
//!
//! Immutable after construction, built via [`NavMeshBuilder`]. Spatial
//! lookup is a flat scan over polygon centroids, which is sufficient for
//! meshes below a few thousand polygons. Replace with a spatial hash or
//! BVH for production-scale worlds.

use glam::Vec3;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::NavError;

/// A convex polygon in the navigation mesh.
///
/// Vertices are stored in counter-clockwise order. Neighbor ids
/// reference connected polygons in the same mesh.
#[derive(Debug, Clone)]
pub struct Polygon {
    id: u32,
    vertices: Vec<Vec3>,
    centroid: Vec3,
    neighbors: SmallVec<[u32; 4]>,
    traversal_cost: f32,
    cluster: u32,
}

impl Polygon {
    /// Create a polygon, validating its shape and cost.
    ///
    /// The centroid is precomputed from the vertex list.
    pub fn new(
        id: u32,
        vertices: Vec<Vec3>,
        neighbors: SmallVec<[u32; 4]>,
        traversal_cost: f32,
        cluster: u32,
    ) -> Result<Self, NavError> {
        if vertices.len() < 3 {
            return Err(NavError::DegeneratePolygon {
                got: vertices.len(),
            });
        }
        if traversal_cost <= 0.0 {
            return Err(NavError::NonPositiveCost(traversal_cost));
        }
        let centroid = compute_centroid(&vertices);
        Ok(Self {
            id,
            vertices,
            centroid,
            neighbors,
            traversal_cost,
            cluster,
        })
    }

    /// Polygon id within its mesh
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Vertex list (counter-clockwise)
    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Precomputed centroid
    #[must_use]
    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    /// Ids of connected polygons
    #[must_use]
    pub fn neighbors(&self) -> &[u32] {
        &self.neighbors
    }

    /// Traversal cost multiplier (> 0)
    #[must_use]
    pub fn traversal_cost(&self) -> f32 {
        self.traversal_cost
    }

    /// Owning cluster id
    #[must_use]
    pub fn cluster(&self) -> u32 {
        self.cluster
    }

    /// Edge cost to a neighbor: centroid distance scaled by this
    /// polygon's traversal cost.
    #[must_use]
    pub fn cost_to(&self, other: &Polygon) -> f32 {
        self.centroid.distance(other.centroid) * self.traversal_cost
    }
}

/// Centroid of a vertex list (arithmetic mean)
#[must_use]
pub fn compute_centroid(vertices: &[Vec3]) -> Vec3 {
    let sum: Vec3 = vertices.iter().copied().sum();
    sum / vertices.len() as f32
}

/// Polygon-based navigation mesh, immutable after construction.
#[derive(Debug, Clone)]
pub struct NavMesh {
    polys: FxHashMap<u32, Polygon>,
    cluster_count: usize,
}

impl NavMesh {
    fn new(polys: FxHashMap<u32, Polygon>, cluster_count: usize) -> Self {
        Self {
            polys,
            cluster_count,
        }
    }

    /// Look up a polygon by id
    #[must_use]
    pub fn poly(&self, id: u32) -> Option<&Polygon> {
        self.polys.get(&id)
    }

    /// Iterate over all polygons (unspecified order)
    pub fn polys(&self) -> impl Iterator<Item = &Polygon> {
        self.polys.values()
    }

    /// Number of polygons
    #[must_use]
    pub fn poly_count(&self) -> usize {
        self.polys.len()
    }

    /// Declared number of clusters
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    /// Find the polygon whose centroid is nearest to a world position.
    ///
    /// Linear scan, O(polys). Returns `None` on an empty mesh.
    #[must_use]
    pub fn nearest_poly(&self, point: Vec3) -> Option<&Polygon> {
        self.polys.values().min_by(|a, b| {
            a.centroid
                .distance_squared(point)
                .total_cmp(&b.centroid.distance_squared(point))
        })
    }

    /// All polygons belonging to a cluster
    pub fn polys_in_cluster(&self, cluster: u32) -> impl Iterator<Item = &Polygon> {
        self.polys.values().filter(move |p| p.cluster == cluster)
    }
}

/// Navigation mesh builder.
///
/// [`NavMeshBuilder::grid`] produces a regular grid mesh with automatic
/// neighbor wiring and cluster assignment. [`NavMeshBuilder::with_poly`]
/// supports hand-crafted meshes for unit tests and tools.
#[derive(Debug, Default)]
pub struct NavMeshBuilder {
    polys: FxHashMap<u32, Polygon>,
    next_id: u32,
}

impl NavMeshBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a flat regular grid mesh on the XZ plane.
    ///
    /// Cell `(row, col)` becomes one convex quad; cardinal neighbors are
    /// wired where in bounds; cluster id is the cluster-block index
    /// `(row / cluster_size) * cluster_cols + (col / cluster_size)`.
    ///
    /// * `cols`: number of columns (X axis)
    /// * `rows`: number of rows (Z axis)
    /// * `cell_size`: world-unit size of each cell
    /// * `cluster_size`: polys per cluster edge (e.g. 4 = 4x4 clusters)
    #[must_use]
    pub fn grid(cols: usize, rows: usize, cell_size: f32, cluster_size: usize) -> NavMesh {
        let cluster_cols = cols.div_ceil(cluster_size);
        let cluster_rows = rows.div_ceil(cluster_size);

        let mut polys = FxHashMap::default();
        let id_at = |row: usize, col: usize| (row * cols + col) as u32;

        for row in 0..rows {
            for col in 0..cols {
                let x0 = col as f32 * cell_size;
                let z0 = row as f32 * cell_size;
                let x1 = x0 + cell_size;
                let z1 = z0 + cell_size;
                let vertices = vec![
                    Vec3::new(x0, 0.0, z0),
                    Vec3::new(x1, 0.0, z0),
                    Vec3::new(x1, 0.0, z1),
                    Vec3::new(x0, 0.0, z1),
                ];

                let mut neighbors = SmallVec::new();
                if row > 0 {
                    neighbors.push(id_at(row - 1, col));
                }
                if row + 1 < rows {
                    neighbors.push(id_at(row + 1, col));
                }
                if col > 0 {
                    neighbors.push(id_at(row, col - 1));
                }
                if col + 1 < cols {
                    neighbors.push(id_at(row, col + 1));
                }

                let cluster = ((row / cluster_size) * cluster_cols + col / cluster_size) as u32;
                let id = id_at(row, col);
                // Grid quads always have 4 vertices and unit cost
                let poly = Polygon::new(id, vertices, neighbors, 1.0, cluster)
                    .unwrap_or_else(|e| unreachable!("grid poly invalid: {e}"));
                polys.insert(id, poly);
            }
        }

        NavMesh::new(polys, cluster_cols * cluster_rows)
    }

    /// Add a custom polygon for hand-crafted test meshes.
    ///
    /// Ids are assigned sequentially from zero in insertion order.
    pub fn with_poly(
        mut self,
        vertices: Vec<Vec3>,
        neighbors: &[u32],
        traversal_cost: f32,
        cluster: u32,
    ) -> Result<Self, NavError> {
        let id = self.next_id;
        let poly = Polygon::new(
            id,
            vertices,
            SmallVec::from_slice(neighbors),
            traversal_cost,
            cluster,
        )?;
        self.polys.insert(id, poly);
        self.next_id += 1;
        Ok(self)
    }

    /// Finish building with an explicit cluster count
    #[must_use]
    pub fn build(self, cluster_count: usize) -> NavMesh {
        NavMesh::new(self.polys, cluster_count)
    }
}
