use glam::Vec2;

/// A named point of interest on the mesh (spawn point, waypoint).
///
/// Owned exclusively by the mesh's point registry; created through
/// [`NavMesh::add_point`] and destroyed by [`NavMesh::remove_point`] or a
/// mesh clear.
///
/// [`NavMesh::add_point`]: crate::NavMesh::add_point
/// [`NavMesh::remove_point`]: crate::NavMesh::remove_point
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NavMeshPoint {
    pub(crate) name: String,
    pub(crate) position: Vec2,
    pub(crate) polygon: Option<usize>,
}

impl NavMeshPoint {
    /// The point's unique registry key.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The point's world position.
    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Index of the polygon containing the point, or `None` if the point
    /// was registered off-mesh.
    #[inline]
    pub fn polygon(&self) -> Option<usize> {
        self.polygon
    }
}
