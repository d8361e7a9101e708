//! Lineaire collimator: divergenties plus een rechte doos als geometrie.

use crate::geom::{WedgeDimensions, wedge};
use crate::graph::TargetNode;

use super::guide::insert_geometry;
use super::schema::fields_for;
use super::{BuildContext, Component};

const CLASS: &str = "NXcollimator";

/// Markerstruct voor de collimator-bouwer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentImpl;

impl Component for ComponentImpl {
    fn build(&self, context: &mut BuildContext<'_>) -> TargetNode {
        let mut node = TargetNode::new(CLASS);
        for (target, parameter) in fields_for(CLASS) {
            if let Some(field) = context.field(parameter, Some("degrees")) {
                node.insert_field(*target, field);
            }
        }

        let length = context.number("length");
        let width = context.number("xwidth");
        let height = context.number("yheight");
        if let (Some(length), Some(width), Some(height)) = (length, width, height) {
            insert_geometry(context, &mut node, wedge(WedgeDimensions::straight(length, width, height)));
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use crate::components::GEOMETRY;
    use crate::components::tests::{build, evaluator, instance};
    use crate::expr::Expr;
    use crate::graph::Value;

    #[test]
    fn divergences_and_straight_box() {
        let collimator = instance(
            "Collimator_linear",
            &[
                ("divergence", Expr::number(40.0)),
                ("divergenceV", Expr::number(60.0)),
                ("length", Expr::number(0.3)),
                ("xwidth", Expr::number(0.1)),
                ("yheight", Expr::number(0.2)),
            ],
        );
        let (node, diagnostics) = build(&collimator, &evaluator(&[]));
        assert!(diagnostics.is_empty());
        assert_eq!(node.class(), "NXcollimator");
        assert_eq!(node.field("divergence_x").unwrap().value, Value::Number(40.0));
        assert_eq!(node.field("divergence_y").unwrap().value, Value::Number(60.0));

        let geometry = node.group(GEOMETRY).unwrap();
        let vertices = geometry.field("vertices").unwrap().value.expect_points().unwrap();
        assert_eq!(vertices[0], [-0.05, -0.1, 0.0]);
        assert_eq!(vertices[4], [-0.05, -0.1, 0.3]);
    }
}
