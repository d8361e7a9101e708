//! Slit: opening uit `xwidth`/`yheight` of uit de grenzen `xmin..xmax`,
//! `ymin..ymax`.

use crate::diagnostics::DiagnosticKind;
use crate::expr::Expr;
use crate::graph::{Field, TargetNode};

use super::{BuildContext, Component, with_units};

/// Markerstruct voor de slit-bouwer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentImpl;

impl Component for ComponentImpl {
    fn build(&self, context: &mut BuildContext<'_>) -> TargetNode {
        let mut node = TargetNode::new("NXslit");
        let x = gap(context, "xwidth", "xmin", "xmax");
        let y = gap(context, "yheight", "ymin", "ymax");

        for (target, gap) in [("x_gap", &x), ("y_gap", &y)] {
            if let Some(expr) = &gap.width {
                if let Some(value) = context.value_of(target, expr) {
                    node.insert_field(target, with_units(Field::new(value), Some("m")));
                }
            }
        }

        let off_center = !(x.center.is_zero() && y.center.is_zero());
        if off_center && !context.has_fragments() {
            context.report(
                DiagnosticKind::ExternalTranslation,
                format!(
                    "bounds are not centered; translate by [{}, {}, 0] via metadata",
                    x.center, y.center
                ),
            );
        }
        node
    }
}

/// Opening langs één as en het midden van de grenzen.
struct Gap {
    width: Option<Expr>,
    center: Expr,
}

fn gap(context: &mut BuildContext<'_>, width: &str, min: &str, max: &str) -> Gap {
    if context.defines(width) || !(context.defines(min) || context.defines(max)) {
        return Gap {
            width: context.expression(width),
            center: Expr::zero(),
        };
    }
    match (context.expression(min), context.expression(max)) {
        (Some(min), Some(max)) => Gap {
            width: Some(max.clone() - min.clone()),
            center: context.evaluate(&((min + max) / Expr::number(2.0))),
        },
        _ => Gap {
            width: None,
            center: Expr::zero(),
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::components::tests::{build, evaluator, instance};
    use crate::diagnostics::DiagnosticKind;
    use crate::expr::Expr;
    use crate::graph::Value;

    #[test]
    fn widths_are_preferred() {
        let slit = instance(
            "Slit",
            &[
                ("xwidth", Expr::number(0.02)),
                ("yheight", Expr::number(0.04)),
                ("xmin", Expr::number(-5.0)),
            ],
        );
        let (node, diagnostics) = build(&slit, &evaluator(&[]));
        assert_eq!(node.class(), "NXslit");
        assert_eq!(node.field("x_gap").unwrap().value, Value::Number(0.02));
        assert_eq!(node.field("y_gap").unwrap().value, Value::Number(0.04));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn asymmetric_bounds_request_external_translation() {
        let slit = instance(
            "Slit",
            &[
                ("xmin", Expr::zero()),
                ("xmax", Expr::number(0.04)),
                ("ymin", Expr::number(-0.02)),
                ("ymax", Expr::number(0.02)),
            ],
        );
        let (node, diagnostics) = build(&slit, &evaluator(&[]));
        assert_eq!(node.field("x_gap").unwrap().value, Value::Number(0.04));
        assert_eq!(node.field("y_gap").unwrap().value, Value::Number(0.04));
        let messages: Vec<&str> = diagnostics
            .of_kind(DiagnosticKind::ExternalTranslation)
            .map(|diagnostic| diagnostic.message.as_str())
            .collect();
        assert_eq!(
            messages,
            vec!["bounds are not centered; translate by [0.02, 0, 0] via metadata"]
        );
    }

    #[test]
    fn symmetric_bounds_need_no_translation() {
        let slit = instance(
            "Slit",
            &[
                ("xmin", Expr::number(-0.01)),
                ("xmax", Expr::number(0.01)),
                ("yheight", Expr::number(0.1)),
            ],
        );
        let (_, diagnostics) = build(&slit, &evaluator(&[]));
        assert!(!diagnostics.has(DiagnosticKind::ExternalTranslation));
    }

    #[test]
    fn runtime_width_is_deferred() {
        let slit = instance("Slit", &[("xwidth", Expr::ident("gap")), ("yheight", Expr::one())]);
        let (node, diagnostics) = build(&slit, &evaluator(&["gap"]));
        assert!(node.field("x_gap").unwrap().value.expect_deferred().is_ok());
        assert!(diagnostics.has(DiagnosticKind::DeferredBinding));
    }
}
