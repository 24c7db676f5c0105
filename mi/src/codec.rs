//! Flat-buffer codec contract
//!
//! A codec moves mesh and solution files in and out of flat numeric buffers.
//! It knows nothing about element structure beyond the fixed per-element
//! widths below; reshaping into structured arrays happens in [`crate::mesh`].

use std::path::Path;

use crate::DataError;

/// Values per vertex in [`RawMesh::vertices`] (x, y, z; z is zero in 2-D)
pub const VERTEX_WIDTH: usize = 3;

/// Values per triangle (3 vertex indices + 1 reference)
pub const TRIANGLE_WIDTH: usize = 4;

/// Values per tetrahedron (4 vertex indices + 1 reference)
pub const TETRAHEDRON_WIDTH: usize = 5;

/// Values per edge (2 vertex indices + 1 reference)
pub const EDGE_WIDTH: usize = 3;

/// Flat buffers exchanged with a codec
///
/// `markers[0]` is reserved: it holds the spatial dimension ("2" or "3").
/// Any further entries are boundary marker names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMesh {
    pub vertices: Vec<f64>,
    pub triangles: Vec<i64>,
    pub tetrahedra: Vec<i64>,
    pub edges: Vec<i64>,
    /// Row-major, one row per vertex
    pub solution: Vec<f64>,
    pub solution_tags: Vec<String>,
    pub markers: Vec<String>,
}

impl RawMesh {
    /// Number of vertices implied by the vertex buffer (truncating)
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_WIDTH
    }

    /// Dimension stored in the reserved marker slot, if it parses
    pub fn dimension(&self) -> Option<usize> {
        self.markers.first().and_then(|m| m.trim().parse().ok())
    }
}

/// Read/write contract for a mesh + solution file format
pub trait MeshCodec {
    /// Read a mesh and, optionally, a solution defined on its vertices
    fn read(&self, mesh: &Path, solution: Option<&Path>) -> Result<RawMesh, DataError>;

    /// Write a mesh; the solution file is written only when `raw.solution` is non-empty
    fn write(&self, mesh: &Path, solution: Option<&Path>, raw: &RawMesh) -> Result<(), DataError>;

    /// Write only the solution part of `raw`
    fn write_solution(&self, solution: &Path, raw: &RawMesh) -> Result<(), DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_from_marker_slot() {
        let raw = RawMesh {
            markers: vec!["3".to_string(), "wall".to_string()],
            ..Default::default()
        };
        assert_eq!(raw.dimension(), Some(3));

        let raw = RawMesh::default();
        assert_eq!(raw.dimension(), None);
    }

    #[test]
    fn test_vertex_count() {
        let raw = RawMesh {
            vertices: vec![0.0; 9],
            ..Default::default()
        };
        assert_eq!(raw.vertex_count(), 3);
    }
}
