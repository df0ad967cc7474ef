use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use glam::Vec2;

/// Shared handle to a generated path.
///
/// The mesh's path log and the agent walking the path each hold one, so
/// neither can dangle the other. The path data is immutable; only the
/// cursor moves.
pub type PathHandle = Arc<NavMeshPath>;

/// A generated route through the mesh.
///
/// Populated exactly once at generation time; asking the mesh for a new
/// route produces a fresh object, so stale state can never leak into a
/// regenerated path. The waypoint cursor is the one mutable part and is
/// advanced through shared references as the agent moves.
#[derive(Debug)]
pub struct NavMeshPath {
    id: u64,
    waypoints: Vec<Vec2>,
    valid: bool,
    length: f32,
    cursor: AtomicUsize,
}

impl NavMeshPath {
    /// A failed generation: invalid, no waypoints.
    pub(crate) fn invalid(id: u64) -> Self {
        Self {
            id,
            waypoints: Vec::new(),
            valid: false,
            length: 0.0,
            cursor: AtomicUsize::new(0),
        }
    }

    /// A successful generation. The length is computed here, once.
    pub(crate) fn from_waypoints(id: u64, waypoints: Vec<Vec2>) -> Self {
        let valid = waypoints.len() >= 2;
        let length = waypoints
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum();
        Self {
            id,
            waypoints,
            valid,
            length,
            cursor: AtomicUsize::new(0),
        }
    }

    /// The mesh-unique id assigned at generation time.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether generation succeeded. Invalid paths have no waypoints.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Total Euclidean length over all waypoint segments, cached at
    /// generation time.
    #[inline]
    pub fn length(&self) -> f32 {
        self.length
    }

    /// The full waypoint sequence, start and end included.
    #[inline]
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Current cursor index into the waypoint list.
    #[inline]
    pub fn waypoint_cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// The waypoint at the cursor, or `None` once fewer than two waypoints
    /// remain from the cursor on (there is no segment left to walk).
    pub fn current_waypoint(&self) -> Option<Vec2> {
        if !self.valid {
            return None;
        }
        let cursor = self.cursor.load(Ordering::Acquire);
        (cursor + 1 < self.waypoints.len()).then(|| self.waypoints[cursor])
    }

    /// Moves the cursor forward by one and returns the new current
    /// waypoint. Advancing past the last usable index is a no-op that
    /// returns `None`.
    pub fn advance_waypoint(&self) -> Option<Vec2> {
        if !self.valid {
            return None;
        }
        let last_usable = self.waypoints.len().checked_sub(2)?;
        let previous = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cursor| {
                (cursor < last_usable).then_some(cursor + 1)
            })
            .ok()?;
        Some(self.waypoints[previous + 1])
    }

    /// Whether `location` is within `tolerance` of the waypoint at the
    /// cursor. `false` if the path is invalid or the cursor is out of
    /// range.
    pub fn is_at_current_waypoint(&self, location: Vec2, tolerance: f32) -> bool {
        if !self.valid {
            return false;
        }
        let cursor = self.cursor.load(Ordering::Acquire);
        match self.waypoints.get(cursor) {
            Some(waypoint) => waypoint.distance(location) <= tolerance,
            None => false,
        }
    }
}
