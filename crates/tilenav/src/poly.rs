use glam::Vec2;

use crate::math::{self, Aabb2d};

/// A convex polygon of the navigable surface, used as a pathfinding graph
/// node.
///
/// Vertices wind counter-clockwise (in a y-up coordinate system) and the
/// centroid is kept in sync with them: the only way to change the vertex
/// list is to build a new polygon.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NavPoly {
    pub(crate) vertices: Vec<Vec2>,
    pub(crate) centroid: Vec2,
    pub(crate) neighbors: Vec<usize>,
}

impl NavPoly {
    /// Builds a polygon from its vertices, computing the centroid.
    /// Neighbor indices are filled in by the adjacency pass.
    pub(crate) fn new(vertices: Vec<Vec2>) -> Self {
        let centroid = math::polygon_centroid(&vertices);
        Self {
            vertices,
            centroid,
            neighbors: Vec::new(),
        }
    }

    /// The polygon's vertices, in counter-clockwise order.
    #[inline]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// The area-weighted center of the polygon.
    #[inline]
    pub fn centroid(&self) -> Vec2 {
        self.centroid
    }

    /// Indices of the polygons sharing a traversable edge with this one.
    ///
    /// Only sides that have a neighbor are listed; a side without an entry
    /// has none.
    #[inline]
    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors
    }

    /// Whether the point lies inside the polygon. Borders are inclusive.
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        math::point_in_convex_polygon(point, &self.vertices)
    }

    /// The polygon's bounding box.
    pub fn aabb(&self) -> Aabb2d {
        Aabb2d::from_verts(&self.vertices)
            .unwrap_or_else(|| Aabb2d::from_point(self.centroid))
    }

    pub(crate) fn remove_neighbor(&mut self, index: usize) {
        self.neighbors.retain(|&neighbor| neighbor != index);
    }
}

/// One edge segment of the mesh, bordering at most two polygons.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NavEdge {
    pub(crate) start: Vec2,
    pub(crate) end: Vec2,
    pub(crate) poly_a: usize,
    pub(crate) poly_b: Option<usize>,
}

impl NavEdge {
    /// The edge segment's start point.
    #[inline]
    pub fn start(&self) -> Vec2 {
        self.start
    }

    /// The edge segment's end point.
    #[inline]
    pub fn end(&self) -> Vec2 {
        self.end
    }

    /// The polygon this edge belongs to.
    #[inline]
    pub fn poly_a(&self) -> usize {
        self.poly_a
    }

    /// The polygon on the far side, or `None` for a boundary or cut edge.
    #[inline]
    pub fn poly_b(&self) -> Option<usize> {
        self.poly_b
    }

    /// Whether an agent may cross this edge.
    #[inline]
    pub fn is_crossable(&self) -> bool {
        self.poly_b.is_some()
    }

    /// The edge segment's bounding box.
    #[inline]
    pub fn aabb(&self) -> Aabb2d {
        Aabb2d::from_point(self.start).merge(&Aabb2d::from_point(self.end))
    }
}

/// Selects one side of a tile for [`NavMesh::apply_cut`].
///
/// Sides are named in grid space, where `y` grows toward higher row
/// indices: `Top` is the side shared with tile `(x, y - 1)`, `Bottom` the
/// side shared with `(x, y + 1)`.
///
/// [`NavMesh::apply_cut`]: crate::NavMesh::apply_cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum TileEdge {
    /// The side toward `(x, y - 1)`.
    Top,
    /// The side toward `(x + 1, y)`.
    Right,
    /// The side toward `(x, y + 1)`.
    Bottom,
    /// The side toward `(x - 1, y)`.
    Left,
}
