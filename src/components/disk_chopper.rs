//! Schijfchopper met gelijk verdeelde slits.

use crate::diagnostics::DiagnosticKind;
use crate::graph::{Field, TargetNode, Value};

use super::{BuildContext, Component, with_units};

/// Meer slits dan dit levert geen `slit_edges` op.
pub const MAX_SLITS: f64 = 360.0;

/// Markerstruct voor de chopper-bouwer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentImpl;

impl Component for ComponentImpl {
    fn build(&self, context: &mut BuildContext<'_>) -> TargetNode {
        let mut node = TargetNode::new("NXdisk_chopper");
        let fields = [
            ("slits", "nslit", None),
            ("rotation_speed", "nu", Some("Hz")),
            ("radius", "radius", Some("m")),
            ("slit_angle", "theta_0", Some("degrees")),
            ("phase", "phase", Some("degrees")),
        ];
        for (target, parameter, units) in fields {
            if let Some(field) = context.field(parameter, units) {
                node.insert_field(target, field);
            }
        }

        let height = slit_height(context);
        if let Some(value) = height {
            node.insert_field("slit_height", with_units(Field::new(value), Some("m")));
        }

        if let Some(edges) = edges(context) {
            node.insert_field(
                "slit_edges",
                Field::new(Value::Numbers(edges)).with_attribute("units", "degrees"),
            );
        }
        node
    }
}

/// `yheight` als die gezet en niet nul is, anders de straal.
fn slit_height(context: &mut BuildContext<'_>) -> Option<Value> {
    if context.defines("yheight") {
        let height = context.expression("yheight")?;
        if !context.evaluate(&height).is_zero() {
            return context.value_of("slit_height", &height);
        }
    }
    let radius = context.expression("radius")?;
    context.value_of("slit_height", &radius)
}

fn edges(context: &mut BuildContext<'_>) -> Option<Vec<f64>> {
    let count = context.number("nslit")?;
    let angle = context.number("theta_0")?;
    if count < 1.0 || count.fract() != 0.0 {
        context.report(
            DiagnosticKind::UnsupportedParametrization,
            format!("nslit = {count} is not a positive whole number; no slit edges"),
        );
        return None;
    }
    if count > MAX_SLITS {
        context.report(
            DiagnosticKind::UnsupportedParametrization,
            format!("nslit = {count} exceeds {MAX_SLITS}; no slit edges"),
        );
        return None;
    }
    Some(slit_edges(count, angle))
}

/// Randen van `count` slits van `angle` graden, gelijk verdeeld over de
/// schijf: per slit het begin en het einde.
#[must_use]
fn slit_edges(count: f64, angle: f64) -> Vec<f64> {
    let half = angle / 2.0;
    let step = 360.0 / count;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let slits = count as usize;
    (0..slits)
        .flat_map(|slit| {
            #[allow(clippy::cast_precision_loss)]
            let center = slit as f64 * step;
            [center - half, center + half]
        })
        .collect()
}
