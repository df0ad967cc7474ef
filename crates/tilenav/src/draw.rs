//! Debug visualization hook.
//!
//! The mesh knows nothing about rendering; the host engine implements
//! [`DebugDraw`] over whatever immediate-mode drawing it has (gizmos,
//! shape batches, ...) and decides visibility from its camera.

use bitflags::bitflags;
use glam::Vec2;

use crate::{math::Aabb2d, mesh::NavMesh};

bitflags! {
    /// Selects which mesh elements [`NavMesh::debug_draw`] emits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DrawOptions: u8 {
        /// Polygon outlines.
        const POLYGONS = 1 << 0;
        /// Edge segments (shared borders and boundary edges).
        const EDGES = 1 << 1;
        /// Named point markers.
        const POINTS = 1 << 2;
    }
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// Receiver for debug-draw output, supplied by the host engine.
pub trait DebugDraw {
    /// Whether anything inside `bounds` is visible to the current camera.
    /// Elements failing this test are culled before any draw call.
    fn is_visible(&self, bounds: Aabb2d) -> bool;

    /// Draws one line segment.
    fn line(&mut self, start: Vec2, end: Vec2);

    /// Draws a closed polygon outline.
    fn polygon(&mut self, vertices: &[Vec2]);

    /// Draws a labeled point marker.
    fn marker(&mut self, position: Vec2, name: &str);
}

impl NavMesh {
    /// Emits the visible parts of the mesh to a [`DebugDraw`] receiver.
    pub fn debug_draw(&self, draw: &mut dyn DebugDraw, options: DrawOptions) {
        if options.contains(DrawOptions::POLYGONS) {
            for polygon in self.polygons() {
                if draw.is_visible(polygon.aabb()) {
                    draw.polygon(polygon.vertices());
                }
            }
        }
        if options.contains(DrawOptions::EDGES) {
            for edge in self.edges() {
                if draw.is_visible(edge.aabb()) {
                    draw.line(edge.start(), edge.end());
                }
            }
        }
        if options.contains(DrawOptions::POINTS) {
            for point in self.points() {
                if draw.is_visible(Aabb2d::from_point(point.position())) {
                    draw.marker(point.position(), point.name());
                }
            }
        }
    }
}
