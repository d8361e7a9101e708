//! Elliptische guide met zwaartekracht; alleen maten gemeten in het midden
//! worden ondersteund.

use crate::diagnostics::DiagnosticKind;
use crate::expr::Expr;
use crate::geom::{EllipticDimensions, elliptic_revolve};
use crate::graph::TargetNode;

use super::guide::insert_geometry;
use super::{BuildContext, Component};

/// Markerstruct voor de elliptische-guide-bouwer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentImpl;

impl Component for ComponentImpl {
    fn build(&self, context: &mut BuildContext<'_>) -> TargetNode {
        let mut node = TargetNode::new("NXguide");
        check_placement(context);

        if context.defines("m") {
            if let Some(field) = context.field("m", None) {
                node.insert_field("m_value", field);
            }
        }
        if let Some(dimensions) = dimensions(context) {
            insert_geometry(context, &mut node, elliptic_revolve(dimensions));
        }
        node
    }
}

fn check_placement(context: &mut BuildContext<'_>) {
    let placement = context
        .instance()
        .parameter("dimensionsAt")
        .map(|expr| context.evaluate(expr));
    // een ongequote waarde komt als naam binnen
    let midpoint = placement.as_ref().is_some_and(|expr| match expr {
        Expr::Ident(name) => name.contains("mid"),
        other => other.as_text().is_some_and(|text| text.contains("mid")),
    });
    if !midpoint {
        let found = placement.map_or_else(|| "unset".to_owned(), |expr| expr.to_string());
        context.report(
            DiagnosticKind::UnsupportedParametrization,
            format!("only midpoint dimensions are supported (dimensionsAt = {found}); using midpoint"),
        );
    }
}

fn dimensions(context: &mut BuildContext<'_>) -> Option<EllipticDimensions> {
    let length = context.number("l");
    let xwidth = context.number("xwidth");
    let yheight = context.number("yheight");
    let linxw = context.number("linxw");
    let loutxw = context.number("loutxw");
    let linyh = context.number("linyh");
    let loutyh = context.number("loutyh");
    Some(EllipticDimensions {
        length: length?,
        xwidth: xwidth?,
        yheight: yheight?,
        linxw: linxw?,
        loutxw: loutxw?,
        linyh: linyh?,
        loutyh: loutyh?,
    })
}
