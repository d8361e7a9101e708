//! Guide-familie: rechte, eventueel taps toelopende neutronengeleider.

use crate::geom::{MeshDiagnostics, OffMesh, WedgeDimensions, wedge};
use crate::graph::TargetNode;

use super::{BuildContext, Component, GEOMETRY};

/// Markerstruct voor de guide-bouwer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentImpl;

impl Component for ComponentImpl {
    fn build(&self, context: &mut BuildContext<'_>) -> TargetNode {
        let mut node = TargetNode::new("NXguide");
        if let Some(field) = context.field("m", None) {
            node.insert_field("m_value", field);
        }
        if let Some(dimensions) = dimensions(context) {
            insert_geometry(context, &mut node, wedge(dimensions));
        }
        node
    }
}

fn dimensions(context: &mut BuildContext<'_>) -> Option<WedgeDimensions> {
    let length = context.number("l");
    let entry_width = context.number("w1");
    let entry_height = context.number("h1");
    let exit_width = context.number_or("w2", 0.0);
    let exit_height = context.number_or("h2", 0.0);
    Some(WedgeDimensions {
        length: length?,
        entry_width: entry_width?,
        entry_height: entry_height?,
        exit_width: exit_width?,
        exit_height: exit_height?,
    })
}

/// Hangt een mesh als `geometry` aan de node en geeft de meetwaarden door.
pub(super) fn insert_geometry(
    context: &mut BuildContext<'_>,
    node: &mut TargetNode,
    (mesh, diagnostics): (OffMesh, MeshDiagnostics),
) {
    context.report_mesh(&diagnostics);
    node.insert_group(GEOMETRY, mesh.to_nexus());
}

#[cfg(test)]
mod tests {
    use crate::components::GEOMETRY;
    use crate::components::tests::{build, evaluator, instance};
    use crate::diagnostics::DiagnosticKind;
    use crate::expr::Expr;
    use crate::graph::Value;

    #[test]
    fn zero_exit_keeps_entry_aperture() {
        let guide = instance(
            "Guide_gravity",
            &[
                ("l", Expr::one()),
                ("w1", Expr::number(2.0)),
                ("h1", Expr::number(2.0)),
                ("w2", Expr::zero()),
                ("h2", Expr::zero()),
                ("m", Expr::number(3.0)),
            ],
        );
        let (node, diagnostics) = build(&guide, &evaluator(&[]));
        assert!(diagnostics.is_empty());
        assert_eq!(node.class(), "NXguide");
        assert_eq!(node.field("m_value").unwrap().value, Value::Number(3.0));

        let geometry = node.group(GEOMETRY).unwrap();
        assert_eq!(geometry.class(), "NXoff_geometry");
        let vertices = geometry.field("vertices").unwrap().value.expect_points().unwrap();
        assert_eq!(vertices.len(), 8);
        for (entry, exit) in vertices[..4].iter().zip(&vertices[4..]) {
            assert_eq!([entry[0], entry[1], entry[2] + 1.0], *exit);
        }
        let faces = geometry.field("faces").unwrap().value.expect_indices().unwrap();
        assert_eq!(faces, &[0, 4, 8, 12]);
    }

    #[test]
    fn runtime_dimension_skips_geometry() {
        let guide = instance(
            "Guide",
            &[
                ("l", Expr::ident("L")),
                ("w1", Expr::number(0.05)),
                ("h1", Expr::number(0.05)),
                ("m", Expr::number(2.0)),
            ],
        );
        let (node, diagnostics) = build(&guide, &evaluator(&["L"]));
        assert!(node.group(GEOMETRY).is_none());
        assert!(node.field("m_value").is_some());
        assert!(diagnostics.has(DiagnosticKind::UnsupportedParametrization));
    }

    #[test]
    fn closed_aperture_reports_degenerate_geometry() {
        let guide = instance(
            "Guide",
            &[
                ("l", Expr::one()),
                ("w1", Expr::zero()),
                ("h1", Expr::zero()),
                ("m", Expr::number(2.0)),
            ],
        );
        let (node, diagnostics) = build(&guide, &evaluator(&[]));
        assert!(node.group(GEOMETRY).is_some());
        assert!(diagnostics.has(DiagnosticKind::DegenerateGeometry));
        assert!(!diagnostics.has(DiagnosticKind::UnsupportedParametrization));
    }
}
