//! Structured mesh and field types
//!
//! [`MeshData`] is the structured view of a [`RawMesh`]: fixed-width element
//! arrays instead of flat buffers, an explicit dimension, and a [`FieldData`]
//! matrix whose columns can be looked up by tag name.

use std::collections::HashMap;
use std::path::Path;

use log::debug;

use crate::DataError;
use crate::codec::{EDGE_WIDTH, MeshCodec, RawMesh, TETRAHEDRON_WIDTH, TRIANGLE_WIDTH, VERTEX_WIDTH};

/// Spatial dimension of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Two,
    Three,
}

impl Dimension {
    pub fn as_usize(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    /// Parse the reserved marker slot
    pub fn from_marker(marker: Option<&str>) -> Result<Self, DataError> {
        match marker.map(str::trim) {
            Some("2") => Ok(Self::Two),
            Some("3") => Ok(Self::Three),
            other => Err(DataError::InvalidDimension(other.map(str::to_string))),
        }
    }
}

/// Vertex-centred solution values with named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldData {
    tags: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<f64>>,
}

impl FieldData {
    /// Build a field, checking that every row has the same width
    ///
    /// Column names are optional, but when given there must be exactly one
    /// per value in a row.
    pub fn new(tags: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, DataError> {
        if let Some(first) = rows.first() {
            let expected = first.len();
            if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
                return Err(DataError::RaggedRow {
                    row,
                    found: r.len(),
                    expected,
                });
            }
            if !tags.is_empty() && tags.len() != expected {
                return Err(DataError::TagCountMismatch {
                    tags: tags.len(),
                    width: expected,
                });
            }
        }

        let index = tags.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
        Ok(Self { tags, index, rows })
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of rows (one per vertex)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(self.tags.len())
    }

    /// Column index of a tag
    pub fn column_index(&self, tag: &str) -> Option<usize> {
        self.index.get(tag).copied()
    }

    /// Copy one column out of the matrix; `None` past the last column
    pub fn column(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.width() {
            return None;
        }
        self.rows.iter().map(|r| r.get(index).copied()).collect()
    }
}

/// Structured mesh with an attached field
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub dimension: Dimension,
    pub vertices: Vec<[f64; VERTEX_WIDTH]>,
    pub triangles: Vec<[i64; TRIANGLE_WIDTH]>,
    pub tetrahedra: Vec<[i64; TETRAHEDRON_WIDTH]>,
    pub edges: Vec<[i64; EDGE_WIDTH]>,
    /// Boundary marker names (the dimension slot is not included)
    pub markers: Vec<String>,
    pub field: FieldData,
}

impl MeshData {
    /// Reshape flat codec buffers into structured arrays
    pub fn from_raw(raw: RawMesh) -> Result<Self, DataError> {
        debug!(
            "MeshData::from_raw: vertices={} triangles={} tetrahedra={} edges={} solution={}",
            raw.vertices.len(),
            raw.triangles.len(),
            raw.tetrahedra.len(),
            raw.edges.len(),
            raw.solution.len()
        );
        let dimension = Dimension::from_marker(raw.markers.first().map(String::as_str))?;

        let mut vertices = reshape::<f64, VERTEX_WIDTH>("vertex", &raw.vertices)?;
        if dimension == Dimension::Two {
            vertices.iter_mut().for_each(|v| v[2] = 0.0);
        }

        let triangles = reshape::<i64, TRIANGLE_WIDTH>("triangle", &raw.triangles)?;
        let tetrahedra = reshape::<i64, TETRAHEDRON_WIDTH>("tetrahedron", &raw.tetrahedra)?;
        let edges = reshape::<i64, EDGE_WIDTH>("edge", &raw.edges)?;

        let rows = if raw.solution.is_empty() {
            Vec::new()
        } else {
            let count = vertices.len();
            if count == 0 || raw.solution.len() % count != 0 {
                return Err(DataError::RaggedField {
                    len: raw.solution.len(),
                    vertices: count,
                });
            }
            let width = raw.solution.len() / count;
            raw.solution.chunks_exact(width).map(<[f64]>::to_vec).collect()
        };
        let field = FieldData::new(raw.solution_tags, rows)?;

        Ok(Self {
            dimension,
            vertices,
            triangles,
            tetrahedra,
            edges,
            markers: raw.markers.into_iter().skip(1).collect(),
            field,
        })
    }

    /// Flatten back into codec buffers
    ///
    /// A field with fewer than 2 rows counts as no solution and is dropped.
    pub fn to_raw(&self) -> RawMesh {
        let mut markers = Vec::with_capacity(self.markers.len() + 1);
        markers.push(self.dimension.as_usize().to_string());
        markers.extend(self.markers.iter().cloned());

        let solution = if self.field.len() > 1 {
            self.field.rows().iter().flatten().copied().collect()
        } else {
            Vec::new()
        };

        RawMesh {
            vertices: self.flat_vertices(),
            triangles: self.triangles.iter().flatten().copied().collect(),
            tetrahedra: self.tetrahedra.iter().flatten().copied().collect(),
            edges: self.edges.iter().flatten().copied().collect(),
            solution,
            solution_tags: self.field.tags().to_vec(),
            markers,
        }
    }

    fn flat_vertices(&self) -> Vec<f64> {
        match self.dimension {
            Dimension::Three => self.vertices.iter().flatten().copied().collect(),
            Dimension::Two => self.vertices.iter().flat_map(|v| [v[0], v[1], 0.0]).collect(),
        }
    }
}

fn reshape<T: Copy + Default, const N: usize>(kind: &'static str, buffer: &[T]) -> Result<Vec<[T; N]>, DataError> {
    if buffer.len() % N != 0 {
        return Err(DataError::RaggedBuffer {
            kind,
            len: buffer.len(),
            width: N,
        });
    }
    Ok(buffer
        .chunks_exact(N)
        .map(|chunk| {
            let mut item = [T::default(); N];
            item.copy_from_slice(chunk);
            item
        })
        .collect())
}

/// Read a mesh (and optional field) through a codec
pub fn read_mesh<C: MeshCodec + ?Sized>(codec: &C, mesh: &Path, field: Option<&Path>) -> Result<MeshData, DataError> {
    debug!("read_mesh: mesh={} field={:?}", mesh.display(), field);
    MeshData::from_raw(codec.read(mesh, field)?)
}

/// Write a mesh (and its field, when it has one) through a codec
pub fn write_mesh<C: MeshCodec + ?Sized>(
    codec: &C,
    mesh_path: &Path,
    field_path: Option<&Path>,
    mesh: &MeshData,
) -> Result<(), DataError> {
    debug!("write_mesh: mesh={} field={:?}", mesh_path.display(), field_path);
    codec.write(mesh_path, field_path, &mesh.to_raw())
}

/// Write only the field of `mesh`; fails when the field has fewer than 2 rows
pub fn write_solution<C: MeshCodec + ?Sized>(codec: &C, path: &Path, mesh: &MeshData) -> Result<(), DataError> {
    debug!("write_solution: path={} rows={}", path.display(), mesh.field.len());
    if mesh.field.len() < 2 {
        return Err(DataError::NoSolution {
            rows: mesh.field.len(),
        });
    }
    codec.write_solution(path, &mesh.to_raw())
}
