//! Mesh diagnostics for the geometry builder.
//!
//! Diagnostics are returned alongside every mesh and describe its topology:
//! how many edges are open (guide meshes are open tubes, so their rims are
//! always open), whether any edge is shared by more than two faces, and how
//! many faces collapsed to a line or a point.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::mesh::OffMesh;

/// Topology and quality counters for one generated mesh.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct MeshDiagnostics {
    /// Total number of vertices in the mesh.
    pub vertex_count: usize,

    /// Total number of polygon faces in the mesh.
    pub face_count: usize,

    /// Number of edges with only one adjacent face.
    pub open_edge_count: usize,

    /// Number of edges with more than two adjacent faces.
    pub non_manifold_edge_count: usize,

    /// Number of faces with two or more coincident vertices.
    pub degenerate_face_count: usize,

    /// Number of sampling rings whose width and height are both zero.
    pub collapsed_ring_count: usize,

    /// Human-readable warnings about the mesh.
    pub warnings: Vec<String>,
}

impl MeshDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts vertices, faces and edge usage of `mesh`.
    #[must_use]
    pub fn analyze(mesh: &OffMesh) -> Self {
        let mut edge_use: BTreeMap<(u32, u32), usize> = BTreeMap::new();
        let mut degenerate = 0usize;

        for face in &mesh.faces {
            for (k, &a) in face.iter().enumerate() {
                let b = face[(k + 1) % face.len()];
                let key = if a < b { (a, b) } else { (b, a) };
                *edge_use.entry(key).or_insert(0) += 1;
            }

            let coincident = face.iter().enumerate().any(|(k, &a)| {
                face[k + 1..]
                    .iter()
                    .any(|&b| mesh.vertices.get(a as usize) == mesh.vertices.get(b as usize))
            });
            if coincident {
                degenerate += 1;
            }
        }

        let mut diagnostics = Self {
            vertex_count: mesh.vertex_count(),
            face_count: mesh.face_count(),
            open_edge_count: edge_use.values().filter(|&&count| count == 1).count(),
            non_manifold_edge_count: edge_use.values().filter(|&&count| count > 2).count(),
            degenerate_face_count: degenerate,
            ..Self::default()
        };
        if degenerate > 0 {
            diagnostics.add_warning(format!("{degenerate} degenerate face(s)"));
        }
        if let Err(reason) = mesh.validate() {
            diagnostics.add_warning(reason);
        }
        diagnostics
    }

    /// Returns `true` if no edge is shared by more than two faces.
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count == 0
    }

    /// Returns `true` if nothing degenerate was found and no warnings were recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.non_manifold_edge_count == 0
            && self.degenerate_face_count == 0
            && self.collapsed_ring_count == 0
            && self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Short summary string suitable for logging.
    ///
    /// Format: `"V:{vertices} F:{faces} [issues...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("V:{} F:{}", self.vertex_count, self.face_count)];
        if self.open_edge_count > 0 {
            parts.push(format!("open:{}", self.open_edge_count));
        }
        if self.non_manifold_edge_count > 0 {
            parts.push(format!("non-manifold:{}", self.non_manifold_edge_count));
        }
        if self.degenerate_face_count > 0 {
            parts.push(format!("degenerate:{}", self.degenerate_face_count));
        }
        if self.collapsed_ring_count > 0 {
            parts.push(format!("collapsed:{}", self.collapsed_ring_count));
        }
        parts.join(" ")
    }
}

impl fmt::Display for MeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Diagnostics:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Faces: {}", self.face_count)?;
        writeln!(f, "  Open edges: {}", self.open_edge_count)?;
        if self.non_manifold_edge_count > 0 {
            writeln!(f, "  Non-manifold edges: {}", self.non_manifold_edge_count)?;
        }
        if self.degenerate_face_count > 0 {
            writeln!(f, "  Degenerate faces: {}", self.degenerate_face_count)?;
        }
        if self.collapsed_ring_count > 0 {
            writeln!(f, "  Collapsed rings: {}", self.collapsed_ring_count)?;
        }
        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }
        Ok(())
    }
}
