use glam::Vec2;

/// Tolerance for geometric predicates, in world units.
///
/// Polygon coordinates are derived from integer tile indices, so matching
/// computations produce bit-identical floats and any small positive value
/// works here.
pub(crate) const GEOM_EPS: f32 = 1.0e-4;

/// An axis-aligned 2D bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb2d {
    /// The corner with the smallest coordinates.
    pub min: Vec2,
    /// The corner with the largest coordinates.
    pub max: Vec2,
}

impl Aabb2d {
    /// Creates an AABB from its extreme corners.
    #[inline]
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// The AABB of a set of vertices.
    /// Returns `None` if the slice is empty.
    pub fn from_verts(verts: &[Vec2]) -> Option<Self> {
        let (first, rest) = verts.split_first()?;
        let mut aabb = Self::new(*first, *first);
        for vert in rest {
            aabb.min = aabb.min.min(*vert);
            aabb.max = aabb.max.max(*vert);
        }
        Some(aabb)
    }

    /// A degenerate AABB containing a single point.
    #[inline]
    pub fn from_point(point: Vec2) -> Self {
        Self::new(point, point)
    }

    /// The smallest AABB containing both `self` and `other`.
    #[inline]
    pub fn merge(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Whether the point lies inside the AABB. Borders are inclusive.
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Whether two AABBs overlap. Touching borders count as overlapping.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// Whether a point lies inside a convex polygon. Borders are inclusive.
///
/// Works for either winding: the point is inside iff the cross products
/// against all edges share a sign (zero counts as either).
pub(crate) fn point_in_convex_polygon(point: Vec2, verts: &[Vec2]) -> bool {
    if verts.len() < 3 {
        return false;
    }
    let mut has_positive = false;
    let mut has_negative = false;
    for (i, a) in verts.iter().enumerate() {
        let b = verts[(i + 1) % verts.len()];
        let cross = (b - *a).perp_dot(point - *a);
        if cross > GEOM_EPS {
            has_positive = true;
        } else if cross < -GEOM_EPS {
            has_negative = true;
        }
        if has_positive && has_negative {
            return false;
        }
    }
    true
}

/// The area-weighted centroid of a simple polygon.
///
/// Falls back to the vertex mean when the polygon is degenerate (near-zero
/// area).
pub(crate) fn polygon_centroid(verts: &[Vec2]) -> Vec2 {
    let mut doubled_area = 0.0;
    let mut weighted = Vec2::ZERO;
    for (i, a) in verts.iter().enumerate() {
        let b = verts[(i + 1) % verts.len()];
        let cross = a.perp_dot(b);
        doubled_area += cross;
        weighted += (*a + b) * cross;
    }
    if doubled_area.abs() <= GEOM_EPS {
        let sum: Vec2 = verts.iter().copied().sum();
        sum / verts.len().max(1) as f32
    } else {
        weighted / (3.0 * doubled_area)
    }
}

/// The point on segment `[a, b]` closest to `point`.
pub(crate) fn closest_point_on_segment(point: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let length_squared = ab.length_squared();
    if length_squared <= GEOM_EPS * GEOM_EPS {
        return a;
    }
    let t = ((point - a).dot(ab) / length_squared).clamp(0.0, 1.0);
    a + ab * t
}

/// The point on a convex polygon (interior included) closest to `point`.
pub(crate) fn closest_point_on_convex_polygon(point: Vec2, verts: &[Vec2]) -> Vec2 {
    if point_in_convex_polygon(point, verts) {
        return point;
    }
    let mut best = verts[0];
    let mut best_distance = f32::INFINITY;
    for (i, a) in verts.iter().enumerate() {
        let b = verts[(i + 1) % verts.len()];
        let candidate = closest_point_on_segment(point, *a, b);
        let distance = candidate.distance_squared(point);
        if distance < best_distance {
            best = candidate;
            best_distance = distance;
        }
    }
    best
}

/// Whether the axis-aligned segment `inner` lies on the axis-aligned
/// segment `outer` (collinear and contained within its extent).
///
/// Segments that are not axis-aligned, or not aligned with each other,
/// never match.
pub(crate) fn axis_aligned_contains(
    outer: (Vec2, Vec2),
    inner: (Vec2, Vec2),
    eps: f32,
) -> bool {
    let (oa, ob) = outer;
    let (ia, ib) = inner;
    let outer_vertical = (oa.x - ob.x).abs() <= eps;
    let inner_vertical = (ia.x - ib.x).abs() <= eps;
    if outer_vertical && inner_vertical {
        if (oa.x - ia.x).abs() > eps {
            return false;
        }
        let (outer_lo, outer_hi) = ordered(oa.y, ob.y);
        let (inner_lo, inner_hi) = ordered(ia.y, ib.y);
        return outer_lo <= inner_lo + eps && inner_hi <= outer_hi + eps;
    }
    let outer_horizontal = (oa.y - ob.y).abs() <= eps;
    let inner_horizontal = (ia.y - ib.y).abs() <= eps;
    if outer_horizontal && inner_horizontal {
        if (oa.y - ia.y).abs() > eps {
            return false;
        }
        let (outer_lo, outer_hi) = ordered(oa.x, ob.x);
        let (inner_lo, inner_hi) = ordered(ia.x, ib.x);
        return outer_lo <= inner_lo + eps && inner_hi <= outer_hi + eps;
    }
    false
}

#[inline]
fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}
