use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use glam::{UVec2, Vec2};
use tracing::{debug, trace};

use crate::{
    builder::{self, BuildError, BuildSettings},
    layer::{TileLayer, TileMap},
    math::{self, Aabb2d},
    path::{NavMeshPath, PathHandle},
    point::NavMeshPoint,
    poly::{NavEdge, NavPoly, TileEdge},
};

/// A navigation mesh over a tile grid.
///
/// Built once per level from a tile layer, then queried for paths from any
/// number of call sites. Polygons, edges and points are read-only after
/// construction; the only post-build topology edit is [`NavMesh::apply_cut`],
/// which takes `&mut self` and therefore cannot race an in-flight query.
#[derive(Debug, Default)]
pub struct NavMesh {
    polygons: Vec<NavPoly>,
    edges: Vec<NavEdge>,
    points: HashMap<String, NavMeshPoint>,
    path_log: Mutex<PathLog>,
    bounds: Option<Aabb2d>,
    tile_size: Vec2,
    offset: Vec2,
    grid_size: UVec2,
}

/// Bookkeeping shared by all generate calls: every path ever handed out
/// (until [`NavMesh::clear_paths`]) and the id counter.
#[derive(Debug, Default)]
struct PathLog {
    history: Vec<PathHandle>,
    next_id: u64,
}

impl NavMesh {
    /// Creates an empty mesh. Build it with [`NavMesh::build_from_layer`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the mesh from a tile layer, replacing any previous build.
    ///
    /// An empty or fully blocked layer builds successfully into an empty
    /// mesh. On error the mesh is left cleared.
    pub fn build_from_layer(
        &mut self,
        layer: &dyn TileLayer,
        settings: &BuildSettings,
    ) -> Result<(), BuildError> {
        self.clear();
        let output = builder::build(layer, settings)?;
        self.polygons = output.polygons;
        self.edges = output.edges;
        self.bounds = output.bounds;
        self.tile_size = Vec2::new(settings.tile_width, settings.tile_height);
        self.offset = settings.offset;
        self.grid_size = output.grid_size;
        Ok(())
    }

    /// Builds the mesh from a named layer of a tile map.
    ///
    /// Fails with [`BuildError::LayerNotFound`] if the name does not
    /// resolve, leaving the mesh cleared.
    pub fn build_from_map(
        &mut self,
        map: &impl TileMap,
        layer_name: &str,
        settings: &BuildSettings,
    ) -> Result<(), BuildError> {
        match map.layer(layer_name) {
            Some(layer) => self.build_from_layer(layer, settings),
            None => {
                self.clear();
                Err(BuildError::LayerNotFound {
                    name: layer_name.to_owned(),
                })
            }
        }
    }

    /// Empties polygons, edges, points, the path history and all metadata.
    ///
    /// The path-id counter keeps counting across clears so ids stay unique
    /// for the lifetime of the mesh.
    pub fn clear(&mut self) {
        self.polygons.clear();
        self.edges.clear();
        self.points.clear();
        self.bounds = None;
        self.tile_size = Vec2::ZERO;
        self.offset = Vec2::ZERO;
        self.grid_size = UVec2::ZERO;
        self.lock_paths().history.clear();
    }

    /// The polygon list.
    #[inline]
    pub fn polygons(&self) -> &[NavPoly] {
        &self.polygons
    }

    /// The polygon at `index`, or `None` if out of range.
    #[inline]
    pub fn polygon(&self, index: usize) -> Option<&NavPoly> {
        self.polygons.get(index)
    }

    /// Number of polygons in the mesh.
    #[inline]
    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    /// The edge list, shared borders and boundary edges alike.
    #[inline]
    pub fn edges(&self) -> &[NavEdge] {
        &self.edges
    }

    /// The edge at `index`, or `None` if out of range.
    #[inline]
    pub fn edge(&self, index: usize) -> Option<&NavEdge> {
        self.edges.get(index)
    }

    /// Number of edges in the mesh.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The bounding box of the built mesh. `None` while the mesh is empty.
    #[inline]
    pub fn bounds(&self) -> Option<Aabb2d> {
        self.bounds
    }

    /// World size of one tile of the source grid.
    #[inline]
    pub fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    /// World position of the source grid's top-left corner.
    #[inline]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Dimensions of the source grid, in tiles.
    #[inline]
    pub fn grid_size(&self) -> UVec2 {
        self.grid_size
    }

    /// Index of the first polygon containing `position`, borders
    /// inclusive. `None` if the position is off-mesh.
    pub fn find_polygon_at(&self, position: Vec2) -> Option<usize> {
        self.polygons
            .iter()
            .position(|polygon| polygon.contains(position))
    }

    /// Whether `position` lies on any polygon.
    #[inline]
    pub fn is_walkable_at(&self, position: Vec2) -> bool {
        self.find_polygon_at(position).is_some()
    }

    /// The closest point on the mesh to `position` (`position` itself if
    /// it is already on-mesh). `None` while the mesh is empty.
    pub fn nearest_point(&self, position: Vec2) -> Option<Vec2> {
        if self.find_polygon_at(position).is_some() {
            return Some(position);
        }
        let mut best = None;
        let mut best_distance = f32::INFINITY;
        for polygon in &self.polygons {
            let candidate = math::closest_point_on_convex_polygon(position, polygon.vertices());
            let distance = candidate.distance_squared(position);
            if distance < best_distance {
                best = Some(candidate);
                best_distance = distance;
            }
        }
        best
    }

    /// Registers a named point, binding it to the polygon containing it.
    /// Off-mesh positions are stored too, just with no polygon. Returns
    /// `false` if the name is already taken.
    pub fn add_point(&mut self, name: &str, position: Vec2) -> bool {
        if self.points.contains_key(name) {
            return false;
        }
        let polygon = self.find_polygon_at(position);
        if polygon.is_none() {
            trace!(name, ?position, "registering off-mesh point");
        }
        self.points.insert(
            name.to_owned(),
            NavMeshPoint {
                name: name.to_owned(),
                position,
                polygon,
            },
        );
        true
    }

    /// Removes a named point. Returns `false` if it was not registered.
    pub fn remove_point(&mut self, name: &str) -> bool {
        self.points.remove(name).is_some()
    }

    /// Looks up a named point.
    pub fn point(&self, name: &str) -> Option<&NavMeshPoint> {
        self.points.get(name)
    }

    /// Iterates over all registered points, in no particular order.
    pub fn points(&self) -> impl Iterator<Item = &NavMeshPoint> {
        self.points.values()
    }

    /// Empties the point registry. Polygons and edges are unaffected.
    pub fn clear_points(&mut self) {
        self.points.clear();
    }

    /// Generates a path between two world positions.
    ///
    /// The returned handle is always minted (and logged); check
    /// [`NavMeshPath::is_valid`] before walking it. The path log's lock is
    /// held for the whole call, search included.
    pub fn generate_path(&self, start: Vec2, end: Vec2) -> PathHandle {
        let mut log = self.lock_paths();
        let id = log.next_id;
        log.next_id += 1;
        let path = Arc::new(self.build_path(id, start, end));
        log.history.push(Arc::clone(&path));
        path
    }

    /// Generates a path from `start` to the named point, delegating to
    /// [`NavMesh::generate_path`]. An unregistered name yields an invalid
    /// path.
    pub fn generate_path_to_point(&self, start: Vec2, name: &str) -> PathHandle {
        match self.points.get(name) {
            Some(point) => {
                let end = point.position();
                self.generate_path(start, end)
            }
            None => {
                trace!(name, "path target point is not registered");
                let mut log = self.lock_paths();
                let id = log.next_id;
                log.next_id += 1;
                let path = Arc::new(NavMeshPath::invalid(id));
                log.history.push(Arc::clone(&path));
                path
            }
        }
    }

    /// Number of paths currently held in the path log.
    pub fn path_count(&self) -> usize {
        self.lock_paths().history.len()
    }

    /// Drops the path log's references. Handles held by agents stay
    /// alive; the log simply forgets them.
    pub fn clear_paths(&self) {
        self.lock_paths().history.clear();
    }

    /// Marks one side of one tile as non-traversable.
    ///
    /// Every mesh edge whose segment contains that tile side loses its
    /// crossing: the far polygon index is dropped from the edge and the
    /// two polygons forget each other as neighbors, so subsequent paths
    /// route around the cut (or fail). Returns `true` if any edge changed.
    ///
    /// Cuts are permanent until the next build or [`NavMesh::clear`].
    pub fn apply_cut(&mut self, tile_x: u32, tile_y: u32, edge: TileEdge) -> bool {
        if tile_x >= self.grid_size.x || tile_y >= self.grid_size.y {
            trace!(tile_x, tile_y, "cut outside the grid");
            return false;
        }
        let cut = self.tile_edge_segment(tile_x, tile_y, edge);
        let eps = self.tile_size.min_element() * 1.0e-3;
        let mut changed = false;
        for index in 0..self.edges.len() {
            let segment = (self.edges[index].start(), self.edges[index].end());
            if !math::axis_aligned_contains(segment, cut, eps) {
                continue;
            }
            let Some(far) = self.edges[index].poly_b() else {
                continue;
            };
            let near = self.edges[index].poly_a();
            self.polygons[near].remove_neighbor(far);
            self.polygons[far].remove_neighbor(near);
            self.edges[index].poly_b = None;
            changed = true;
            debug!(tile_x, tile_y, ?edge, near, far, "cut disabled an edge crossing");
        }
        changed
    }

    fn tile_edge_segment(&self, tile_x: u32, tile_y: u32, edge: TileEdge) -> (Vec2, Vec2) {
        let min = self.offset
            + Vec2::new(
                tile_x as f32 * self.tile_size.x,
                tile_y as f32 * self.tile_size.y,
            );
        let max = min + self.tile_size;
        match edge {
            TileEdge::Top => (Vec2::new(min.x, min.y), Vec2::new(max.x, min.y)),
            TileEdge::Right => (Vec2::new(max.x, min.y), Vec2::new(max.x, max.y)),
            TileEdge::Bottom => (Vec2::new(min.x, max.y), Vec2::new(max.x, max.y)),
            TileEdge::Left => (Vec2::new(min.x, min.y), Vec2::new(min.x, max.y)),
        }
    }

    fn lock_paths(&self) -> MutexGuard<'_, PathLog> {
        self.path_log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn build_path(&self, id: u64, start: Vec2, end: Vec2) -> NavMeshPath {
        let Some(start_poly) = self.find_polygon_at(start) else {
            trace!(?start, "path start is off-mesh");
            return NavMeshPath::invalid(id);
        };
        let Some(end_poly) = self.find_polygon_at(end) else {
            trace!(?end, "path end is off-mesh");
            return NavMeshPath::invalid(id);
        };

        if start_poly == end_poly {
            return NavMeshPath::from_waypoints(id, vec![start, end]);
        }

        match self.polygon_chain(start_poly, end_poly, end) {
            Some(chain) => {
                let mut waypoints = Vec::with_capacity(chain.len());
                waypoints.push(start);
                for &index in &chain[1..chain.len() - 1] {
                    waypoints.push(self.polygons[index].centroid());
                }
                waypoints.push(end);
                NavMeshPath::from_waypoints(id, waypoints)
            }
            None => {
                trace!(start_poly, end_poly, "no polygon chain between endpoints");
                NavMeshPath::invalid(id)
            }
        }
    }

    /// A* over the polygon adjacency graph.
    ///
    /// Cost `g` accumulates centroid-to-centroid distances; the heuristic
    /// is the centroid's distance to the literal end position (admissible:
    /// it never exceeds the remaining centroid travel). Ties on `f` pop in
    /// insertion order, so repeated queries explore identically.
    fn polygon_chain(&self, start_poly: usize, end_poly: usize, end: Vec2) -> Option<Vec<usize>> {
        let polygon_count = self.polygons.len();
        let mut best_cost = vec![f32::INFINITY; polygon_count];
        let mut parent: Vec<Option<usize>> = vec![None; polygon_count];
        let mut closed = vec![false; polygon_count];
        let mut open = BinaryHeap::new();
        let mut sequence = 0_u64;

        best_cost[start_poly] = 0.0;
        open.push(OpenNode {
            f: self.polygons[start_poly].centroid().distance(end),
            sequence,
            polygon: start_poly,
        });

        while let Some(node) = open.pop() {
            let current = node.polygon;
            if closed[current] {
                continue;
            }
            closed[current] = true;

            if current == end_poly {
                let mut chain = Vec::new();
                let mut walk = Some(current);
                while let Some(index) = walk {
                    chain.push(index);
                    walk = parent[index];
                }
                chain.reverse();
                return Some(chain);
            }

            let current_centroid = self.polygons[current].centroid();
            for &neighbor in self.polygons[current].neighbors() {
                if closed[neighbor] {
                    continue;
                }
                let tentative = best_cost[current]
                    + current_centroid.distance(self.polygons[neighbor].centroid());
                if tentative < best_cost[neighbor] {
                    best_cost[neighbor] = tentative;
                    parent[neighbor] = Some(current);
                    sequence += 1;
                    open.push(OpenNode {
                        f: tentative + self.polygons[neighbor].centroid().distance(end),
                        sequence,
                        polygon: neighbor,
                    });
                }
            }
        }
        None
    }
}

/// Open-set entry. Ordered so that [`BinaryHeap`] (a max-heap) pops the
/// smallest `f` first, FIFO among equal costs.
struct OpenNode {
    f: f32,
    sequence: u64,
    polygon: usize,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}
