use crate::expr::Expr;
use crate::graph::ABSOLUTE;

use super::OrientationError;
use super::chain::OrientationChain;
use super::part::{OrientationPart, Vector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformationKind {
    Translation,
    Rotation,
}

impl TransformationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Translation => "translation",
            Self::Rotation => "rotation",
        }
    }

    #[must_use]
    pub fn units(self) -> &'static str {
        match self {
            Self::Translation => "m",
            Self::Rotation => "degrees",
        }
    }
}

/// One named step of an exported transformation chain.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformationNode {
    pub name: String,
    pub value: Expr,
    /// Unit direction, or the zero vector when `value` is zero.
    pub direction: Vector,
    pub depends_on: String,
    pub kind: TransformationKind,
    pub units: &'static str,
}

/// Length of a translation vector. A vector along a single axis keeps the
/// plain absolute value of that component.
#[must_use]
pub fn vector_length(vector: &Vector) -> Expr {
    let nonzero: Vec<&Expr> = vector.iter().filter(|component| !component.is_zero()).collect();
    match nonzero.as_slice() {
        [] => Expr::zero(),
        [single] => (*single).clone().abs(),
        _ => vector
            .iter()
            .map(|component| component.clone() * component.clone())
            .fold(Expr::zero(), |sum, square| sum + square)
            .sqrt(),
    }
}

fn translation_node(part: &OrientationPart, name: String, depends_on: String) -> Result<TransformationNode, OrientationError> {
    let position = part.position()?;
    let norm = vector_length(position);
    let direction = if norm.is_zero() {
        position.clone()
    } else {
        position.clone().map(|component| component / norm.clone())
    };
    let kind = TransformationKind::Translation;
    Ok(TransformationNode {
        name,
        value: norm,
        direction,
        depends_on,
        kind,
        units: kind.units(),
    })
}

fn rotation_node(part: &OrientationPart, name: String, depends_on: String) -> Result<TransformationNode, OrientationError> {
    let (axis, angle, units) = part.rotation_axis_angle()?;
    Ok(TransformationNode {
        name,
        value: angle.clone(),
        direction: axis.clone(),
        depends_on,
        kind: TransformationKind::Rotation,
        units,
    })
}

/// Names and links the parts of a reduced chain.
///
/// Part `i` of component `name` becomes `name_i`, or `name_i_t` and
/// `name_i_r` for a combined part. The first node depends on `.`.
pub fn chain_nodes(name: &str, chain: &OrientationChain) -> Result<Vec<TransformationNode>, OrientationError> {
    let mut nodes: Vec<TransformationNode> = Vec::with_capacity(chain.len() + 1);
    let mut depends_on = ABSOLUTE.to_owned();
    for (index, part) in chain.parts().iter().enumerate() {
        let base = format!("{name}_{index}");
        match part {
            OrientationPart::Both(..) => {
                let translation = format!("{base}_t");
                nodes.push(translation_node(part, translation.clone(), depends_on)?);
                nodes.push(rotation_node(part, format!("{base}_r"), translation)?);
            }
            OrientationPart::Translation(_) => {
                nodes.push(translation_node(part, base, depends_on)?);
            }
            OrientationPart::Rotation(_) => {
                nodes.push(rotation_node(part, base, depends_on)?);
            }
        }
        depends_on = nodes
            .last()
            .map_or_else(|| ABSOLUTE.to_owned(), |node| node.name.clone());
    }
    Ok(nodes)
}
