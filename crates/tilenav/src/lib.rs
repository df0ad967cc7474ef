#![doc = include_str!("../../../readme.md")]

mod builder;
mod draw;
mod layer;
pub(crate) mod math;
mod mesh;
mod path;
mod point;
mod poly;

pub use builder::{BuildError, BuildSettings};
pub use draw::{DebugDraw, DrawOptions};
pub use layer::{GridLayer, TileLayer, TileMap};
pub use math::Aabb2d;
pub use mesh::NavMesh;
pub use path::{NavMeshPath, PathHandle};
pub use point::NavMeshPoint;
pub use poly::{NavEdge, NavPoly, TileEdge};
