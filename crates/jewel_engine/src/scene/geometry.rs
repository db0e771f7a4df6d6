//! Geometry buffers

use crate::foundation::collections::GeometryId;
use crate::foundation::math::{Aabb, Vec3};

/// Indexed triangle geometry
///
/// Not `Clone`: copies go through [`Geometry::duplicate`] so each copy owns a
/// distinct GPU buffer identity and can be disposed independently.
#[derive(Debug)]
pub struct Geometry {
    id: GeometryId,
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    bounds: Option<Aabb>,
}

impl Geometry {
    /// Create geometry from vertex positions and triangle indices
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_points(&positions);
        Self {
            id: GeometryId::fresh(),
            positions,
            indices,
            bounds,
        }
    }

    /// Buffer identity
    pub fn id(&self) -> GeometryId {
        self.id
    }

    /// Vertex positions in local space
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Triangle indices
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Local-space bounding box, `None` for empty geometry
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Independent copy of the buffers with a fresh identity
    pub fn duplicate(&self) -> Self {
        Self {
            id: GeometryId::fresh(),
            positions: self.positions.clone(),
            indices: self.indices.clone(),
            bounds: self.bounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_is_independent() {
        let g = Geometry::new(vec![Vec3::zeros(), Vec3::new(1.0, 2.0, 0.0), Vec3::new(0.0, 1.0, 1.0)], vec![0, 1, 2]);
        let copy = g.duplicate();

        assert_ne!(copy.id(), g.id());
        assert_eq!(copy.positions(), g.positions());
        assert_eq!(copy.bounding_box(), g.bounding_box());
        assert_eq!(g.bounding_box().unwrap().max.y, 2.0);
    }
}
