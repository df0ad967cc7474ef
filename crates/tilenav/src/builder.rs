//! Grid-to-polygon construction.
//!
//! The builder derives a boolean walkability grid from a tile layer,
//! merges adjacent walkable tiles into maximal axis-aligned rectangles
//! (the grid-native convex decomposition: non-rectangular regions come out
//! as several convex quads), and then computes polygon adjacency from the
//! rectangle borders. Everything is iterated in row-major order, so
//! identical input always yields an identical mesh.

use glam::{UVec2, Vec2};
use thiserror::Error;
use tracing::debug;

use crate::{
    layer::TileLayer,
    math::Aabb2d,
    poly::{NavEdge, NavPoly},
};

/// Parameters for [`NavMesh::build_from_layer`].
///
/// [`NavMesh::build_from_layer`]: crate::NavMesh::build_from_layer
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildSettings {
    /// World width of one tile. Must be positive.
    pub tile_width: f32,
    /// World height of one tile. Must be positive.
    pub tile_height: f32,
    /// World position of the grid's top-left corner.
    pub offset: Vec2,
    /// When `false`, non-zero tiles are walkable (the layer marks floors).
    /// When `true`, zero tiles are walkable (the layer marks obstacles).
    pub invert: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            tile_width: 1.0,
            tile_height: 1.0,
            offset: Vec2::ZERO,
            invert: false,
        }
    }
}

/// Why a mesh build failed. The mesh is left cleared in every case.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    /// The requested layer name does not exist in the tile map.
    #[error("tile layer `{name}` not found in the tile map")]
    LayerNotFound {
        /// The name that failed to resolve.
        name: String,
    },
    /// A non-positive tile dimension was passed.
    #[error("tile dimensions must be positive, got {width}x{height}")]
    BadTileSize {
        /// The rejected tile width.
        width: f32,
        /// The rejected tile height.
        height: f32,
    },
}

#[derive(Debug)]
pub(crate) struct BuildOutput {
    pub(crate) polygons: Vec<NavPoly>,
    pub(crate) edges: Vec<NavEdge>,
    pub(crate) bounds: Option<Aabb2d>,
    pub(crate) grid_size: UVec2,
}

pub(crate) fn build(
    layer: &dyn TileLayer,
    settings: &BuildSettings,
) -> Result<BuildOutput, BuildError> {
    if settings.tile_width <= 0.0 || settings.tile_height <= 0.0 {
        return Err(BuildError::BadTileSize {
            width: settings.tile_width,
            height: settings.tile_height,
        });
    }

    let grid = WalkGrid::from_layer(layer, settings.invert);
    let rects = merge_walkable_tiles(&grid);

    let to_world = |x: u32, y: u32| {
        settings.offset
            + Vec2::new(
                x as f32 * settings.tile_width,
                y as f32 * settings.tile_height,
            )
    };

    let mut polygons: Vec<NavPoly> = rects
        .iter()
        .map(|rect| {
            let min = to_world(rect.x, rect.y);
            let max = to_world(rect.right(), rect.bottom());
            NavPoly::new(vec![
                Vec2::new(min.x, min.y),
                Vec2::new(max.x, min.y),
                Vec2::new(max.x, max.y),
                Vec2::new(min.x, max.y),
            ])
        })
        .collect();

    let edges = connect_polygons(&rects, &mut polygons, &to_world);

    let bounds = polygons
        .iter()
        .map(NavPoly::aabb)
        .reduce(|merged, aabb| merged.merge(&aabb));

    debug!(
        polygons = polygons.len(),
        edges = edges.len(),
        "built navigation mesh"
    );

    Ok(BuildOutput {
        polygons,
        edges,
        bounds,
        grid_size: UVec2::new(grid.width, grid.height),
    })
}

struct WalkGrid {
    width: u32,
    height: u32,
    walkable: Vec<bool>,
}

impl WalkGrid {
    fn from_layer(layer: &dyn TileLayer, invert: bool) -> Self {
        let width = layer.width();
        let height = layer.height();
        let mut walkable = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let filled = layer.tile(x, y) != 0;
                walkable.push(filled != invert);
            }
        }
        Self {
            width,
            height,
            walkable,
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }
}

/// One merged run of walkable tiles, in tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TileRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

impl TileRect {
    #[inline]
    fn right(&self) -> u32 {
        self.x + self.w
    }

    #[inline]
    fn bottom(&self) -> u32 {
        self.y + self.h
    }
}

/// Greedy row-major merge: each unconsumed walkable tile seeds a rectangle
/// that is first widened along the row, then deepened while every tile of
/// the next row slice is walkable and unconsumed.
fn merge_walkable_tiles(grid: &WalkGrid) -> Vec<TileRect> {
    let mut consumed = vec![false; grid.walkable.len()];
    let mut rects = Vec::new();
    for y in 0..grid.height {
        for x in 0..grid.width {
            let seed = grid.index(x, y);
            if !grid.walkable[seed] || consumed[seed] {
                continue;
            }

            let mut w = 1;
            while x + w < grid.width {
                let index = grid.index(x + w, y);
                if !grid.walkable[index] || consumed[index] {
                    break;
                }
                w += 1;
            }

            let mut h = 1;
            'rows: while y + h < grid.height {
                for dx in 0..w {
                    let index = grid.index(x + dx, y + h);
                    if !grid.walkable[index] || consumed[index] {
                        break 'rows;
                    }
                }
                h += 1;
            }

            for dy in 0..h {
                for dx in 0..w {
                    consumed[grid.index(x + dx, y + dy)] = true;
                }
            }
            rects.push(TileRect { x, y, w, h });
        }
    }
    rects
}

const SIDE_LEFT: usize = 0;
const SIDE_RIGHT: usize = 1;
const SIDE_TOP: usize = 2;
const SIDE_BOTTOM: usize = 3;

struct SharedBorder {
    vertical: bool,
    /// Tile coordinate of the border line (x for vertical, y for horizontal).
    coord: u32,
    lo: u32,
    hi: u32,
    side_a: usize,
    side_b: usize,
}

fn shared_border(a: TileRect, b: TileRect) -> Option<SharedBorder> {
    if a.right() == b.x || b.right() == a.x {
        let lo = a.y.max(b.y);
        let hi = a.bottom().min(b.bottom());
        if lo < hi {
            let (coord, side_a, side_b) = if a.right() == b.x {
                (b.x, SIDE_RIGHT, SIDE_LEFT)
            } else {
                (a.x, SIDE_LEFT, SIDE_RIGHT)
            };
            return Some(SharedBorder {
                vertical: true,
                coord,
                lo,
                hi,
                side_a,
                side_b,
            });
        }
    }
    if a.bottom() == b.y || b.bottom() == a.y {
        let lo = a.x.max(b.x);
        let hi = a.right().min(b.right());
        if lo < hi {
            let (coord, side_a, side_b) = if a.bottom() == b.y {
                (b.y, SIDE_BOTTOM, SIDE_TOP)
            } else {
                (a.y, SIDE_TOP, SIDE_BOTTOM)
            };
            return Some(SharedBorder {
                vertical: false,
                coord,
                lo,
                hi,
                side_a,
                side_b,
            });
        }
    }
    None
}

/// Pairwise neighbor discovery plus boundary-edge emission.
///
/// Shared borders come first, in ascending `(a, b)` polygon order; the
/// leftover side intervals follow per polygon and side. Corner contact
/// (a zero-length border) does not connect polygons.
fn connect_polygons(
    rects: &[TileRect],
    polygons: &mut [NavPoly],
    to_world: &impl Fn(u32, u32) -> Vec2,
) -> Vec<NavEdge> {
    let mut edges = Vec::new();
    let mut covered: Vec<[Vec<(u32, u32)>; 4]> =
        vec![[const { Vec::new() }; 4]; rects.len()];

    for a in 0..rects.len() {
        for b in a + 1..rects.len() {
            let Some(border) = shared_border(rects[a], rects[b]) else {
                continue;
            };
            let (start, end) = if border.vertical {
                (to_world(border.coord, border.lo), to_world(border.coord, border.hi))
            } else {
                (to_world(border.lo, border.coord), to_world(border.hi, border.coord))
            };
            polygons[a].neighbors.push(b);
            polygons[b].neighbors.push(a);
            covered[a][border.side_a].push((border.lo, border.hi));
            covered[b][border.side_b].push((border.lo, border.hi));
            edges.push(NavEdge {
                start,
                end,
                poly_a: a,
                poly_b: Some(b),
            });
        }
    }

    for (index, rect) in rects.iter().enumerate() {
        for side in [SIDE_LEFT, SIDE_RIGHT, SIDE_TOP, SIDE_BOTTOM] {
            let vertical = side == SIDE_LEFT || side == SIDE_RIGHT;
            let (full_lo, full_hi) = if vertical {
                (rect.y, rect.bottom())
            } else {
                (rect.x, rect.right())
            };
            let coord = match side {
                SIDE_LEFT => rect.x,
                SIDE_RIGHT => rect.right(),
                SIDE_TOP => rect.y,
                _ => rect.bottom(),
            };

            let mut shared = covered[index][side].clone();
            shared.sort_unstable();
            let mut cursor = full_lo;
            for (lo, hi) in shared {
                if lo > cursor {
                    edges.push(boundary_edge(index, vertical, coord, cursor, lo, to_world));
                }
                cursor = cursor.max(hi);
            }
            if cursor < full_hi {
                edges.push(boundary_edge(index, vertical, coord, cursor, full_hi, to_world));
            }
        }
    }

    edges
}

fn boundary_edge(
    polygon: usize,
    vertical: bool,
    coord: u32,
    lo: u32,
    hi: u32,
    to_world: &impl Fn(u32, u32) -> Vec2,
) -> NavEdge {
    let (start, end) = if vertical {
        (to_world(coord, lo), to_world(coord, hi))
    } else {
        (to_world(lo, coord), to_world(hi, coord))
    };
    NavEdge {
        start,
        end,
        poly_a: polygon,
        poly_b: None,
    }
}
