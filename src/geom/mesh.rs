//! Polygon meshes for guide-shaped components.
//!
//! Meshes are open tubes: side quads only, no end caps. They are exported as
//! `NXoff_geometry` groups, which store polygons as one flat `winding_order`
//! list plus the start offset of every face.

use super::diagnostics::MeshDiagnostics;
use crate::graph::{Field, TargetNode, Value};

/// Number of segments along the axis of an elliptic guide.
pub const ELLIPTIC_SEGMENTS: usize = 10;

/// Polygon mesh in object-file-format layout.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OffMesh {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<Vec<u32>>,
}

impl OffMesh {
    #[must_use]
    pub fn new(vertices: Vec<[f64; 3]>, faces: Vec<Vec<u32>>) -> Self {
        Self { vertices, faces }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// All face indices, concatenated in face order.
    #[must_use]
    pub fn winding_order(&self) -> Vec<u32> {
        self.faces.iter().flatten().copied().collect()
    }

    /// Start offset of each face inside [`OffMesh::winding_order`].
    #[must_use]
    pub fn face_offsets(&self) -> Vec<u32> {
        let mut offsets = Vec::with_capacity(self.faces.len());
        let mut cursor = 0u32;
        for face in &self.faces {
            offsets.push(cursor);
            cursor += u32::try_from(face.len()).unwrap_or(u32::MAX);
        }
        offsets
    }

    /// Returns true if all face indices point at an existing vertex.
    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.vertices.len();
        self.faces
            .iter()
            .flatten()
            .all(|&index| (index as usize) < n)
    }

    /// Returns true if any vertex contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.vertices
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        Ok(())
    }

    /// Builds the `NXoff_geometry` group for this mesh.
    #[must_use]
    pub fn to_nexus(&self) -> TargetNode {
        let mut node = TargetNode::new("NXoff_geometry");
        node.insert_field(
            "vertices",
            Field::new(Value::Points(self.vertices.clone())).with_attribute("units", "m"),
        );
        node.insert_field("winding_order", Field::new(Value::Indices(self.winding_order())));
        node.insert_field("faces", Field::new(Value::Indices(self.face_offsets())));
        node
    }
}

/// Entry and exit apertures of a straight tapered guide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WedgeDimensions {
    pub length: f64,
    pub entry_width: f64,
    pub entry_height: f64,
    /// Zero means "same as the entry width".
    pub exit_width: f64,
    /// Zero means "same as the entry height".
    pub exit_height: f64,
}

impl WedgeDimensions {
    /// A wedge with identical entry and exit apertures.
    #[must_use]
    pub fn straight(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            entry_width: width,
            entry_height: height,
            exit_width: width,
            exit_height: height,
        }
    }
}

/// Eight-vertex open box, entry at z=0 and exit at z=length.
#[must_use]
pub fn wedge(dimensions: WedgeDimensions) -> (OffMesh, MeshDiagnostics) {
    let WedgeDimensions {
        length,
        entry_width,
        entry_height,
        exit_width,
        exit_height,
    } = dimensions;
    let exit_width = if exit_width == 0.0 { entry_width } else { exit_width };
    let exit_height = if exit_height == 0.0 { entry_height } else { exit_height };

    let mut vertices = rectangle(entry_width / 2.0, entry_height / 2.0, 0.0);
    vertices.extend(rectangle(exit_width / 2.0, exit_height / 2.0, length));

    let mesh = OffMesh::new(vertices, side_quads(1));
    let diagnostics = MeshDiagnostics::analyze(&mesh);
    (mesh, diagnostics)
}

/// Parameters of a guide whose width and height follow ellipses with foci
/// outside the guide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipticDimensions {
    pub length: f64,
    pub xwidth: f64,
    pub yheight: f64,
    /// Distance from the entrance to the first horizontal focus.
    pub linxw: f64,
    /// Distance from the exit to the second horizontal focus.
    pub loutxw: f64,
    pub linyh: f64,
    pub loutyh: f64,
}

/// Half-width of an ellipse with semi-minor axis `minor` and foci `distance`
/// apart, at signed position `at` from its center. Zero outside the ellipse
/// and for a degenerate ellipse.
#[must_use]
pub fn ellipse_half_width(minor: f64, distance: f64, at: f64) -> f64 {
    let major = ((distance / 2.0).powi(2) + minor.powi(2)).sqrt();
    if major <= 0.0 || at.abs() > major {
        0.0
    } else {
        minor * (1.0 - (at / major).powi(2)).sqrt()
    }
}

/// Ring-sampled elliptic guide: `ELLIPTIC_SEGMENTS + 1` rectangular rings
/// from z=0 to z=length, joined by side quads.
#[must_use]
pub fn elliptic_revolve(dimensions: EllipticDimensions) -> (OffMesh, MeshDiagnostics) {
    let EllipticDimensions {
        length,
        xwidth,
        yheight,
        linxw,
        loutxw,
        linyh,
        loutyh,
    } = dimensions;

    let mut vertices = Vec::with_capacity(4 * (ELLIPTIC_SEGMENTS + 1));
    let mut collapsed = 0usize;
    for ring in 0..=ELLIPTIC_SEGMENTS {
        #[allow(clippy::cast_precision_loss)]
        let t = ring as f64 / ELLIPTIC_SEGMENTS as f64;
        let w = ellipse_half_width(
            xwidth / 2.0,
            linxw + length + loutxw,
            linxw / 2.0 + (t - 0.5) * length - loutxw / 2.0,
        );
        let h = ellipse_half_width(
            yheight / 2.0,
            linyh + length + loutyh,
            linyh / 2.0 + (t - 0.5) * length - loutyh / 2.0,
        );
        if w == 0.0 && h == 0.0 {
            collapsed += 1;
        }
        vertices.extend(rectangle(w, h, t * length));
    }

    let mesh = OffMesh::new(vertices, side_quads(ELLIPTIC_SEGMENTS));
    let mut diagnostics = MeshDiagnostics::analyze(&mesh);
    diagnostics.collapsed_ring_count = collapsed;
    if collapsed > 0 {
        diagnostics.add_warning(format!("{collapsed} ring(s) collapsed onto the guide axis"));
    }
    (mesh, diagnostics)
}

fn rectangle(half_width: f64, half_height: f64, z: f64) -> Vec<[f64; 3]> {
    vec![
        [-half_width, -half_height, z],
        [-half_width, half_height, z],
        [half_width, half_height, z],
        [half_width, -half_height, z],
    ]
}

/// Four quads per segment connecting ring `i` (vertices `4i..4i+4`) to ring
/// `i + 1`.
fn side_quads(segments: usize) -> Vec<Vec<u32>> {
    let mut faces = Vec::with_capacity(4 * segments);
    for segment in 0..segments {
        let base = u32::try_from(4 * segment).unwrap_or(u32::MAX);
        let j: Vec<u32> = (0..8).map(|k| base + k).collect();
        faces.push(vec![j[0], j[1], j[5], j[4]]);
        faces.push(vec![j[1], j[2], j[6], j[5]]);
        faces.push(vec![j[2], j[3], j[7], j[6]]);
        faces.push(vec![j[3], j[0], j[4], j[7]]);
    }
    faces
}
