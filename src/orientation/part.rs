use std::fmt;

use crate::expr::{Bindings, Expr};
#[cfg(test)]
use crate::geom::{Transform, Vec3};

use super::OrientationError;

pub type Vector = [Expr; 3];

#[must_use]
pub fn zero_vector() -> Vector {
    [Expr::zero(), Expr::zero(), Expr::zero()]
}

#[must_use]
pub fn axis(index: usize) -> Vector {
    let mut axis = zero_vector();
    axis[index] = Expr::one();
    axis
}

fn is_zero_vector(vector: &Vector) -> bool {
    vector.iter().all(Expr::is_zero)
}

fn negate(vector: &Vector) -> Vector {
    vector.clone().map(|component| -component)
}

fn evaluate_vector(vector: &Vector, bindings: &Bindings) -> Vector {
    [
        vector[0].evaluate(bindings),
        vector[1].evaluate(bindings),
        vector[2].evaluate(bindings),
    ]
}

#[cfg(test)]
fn constant_vector(vector: &Vector) -> Option<Vec3> {
    Some(Vec3::new(vector[0].value()?, vector[1].value()?, vector[2].value()?))
}

/// Right-handed rotation by `angle` degrees about `axis`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotation {
    pub axis: Vector,
    pub angle: Expr,
}

impl Rotation {
    pub const UNITS: &'static str = "degrees";

    #[must_use]
    pub fn new(axis: Vector, angle: Expr) -> Self {
        Self { axis, angle }
    }

    /// Elementary rotation about x (0), y (1) or z (2).
    #[must_use]
    pub fn about(index: usize, angle: Expr) -> Self {
        Self::new(axis(index), angle)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.angle.is_zero() || is_zero_vector(&self.axis)
    }

    #[must_use]
    pub fn inverse(&self) -> Self {
        Self::new(self.axis.clone(), -self.angle.clone())
    }

    /// Combines two rotations about the same or the opposite axis.
    #[must_use]
    pub fn merge(&self, other: &Rotation) -> Option<Rotation> {
        if self.axis == other.axis {
            return Some(Self::new(self.axis.clone(), self.angle.clone() + other.angle.clone()));
        }
        if self.axis == negate(&other.axis) {
            return Some(Self::new(self.axis.clone(), self.angle.clone() - other.angle.clone()));
        }
        None
    }

    #[must_use]
    pub fn evaluate(&self, bindings: &Bindings) -> Self {
        Self::new(evaluate_vector(&self.axis, bindings), self.angle.evaluate(bindings))
    }

    #[cfg(test)]
    fn transform(&self) -> Option<Transform> {
        let axis = constant_vector(&self.axis)?;
        let angle = self.angle.value()?;
        Transform::rotate_axis(axis, angle.to_radians())
    }
}

/// One atomic spatial operation relative to the parent frame.
#[derive(Debug, Clone, PartialEq)]
pub enum OrientationPart {
    Translation(Vector),
    Rotation(Rotation),
    /// A translation followed by a rotation.
    Both(Vector, Rotation),
}

impl OrientationPart {
    #[must_use]
    pub fn translation(x: Expr, y: Expr, z: Expr) -> Self {
        Self::Translation([x, y, z])
    }

    #[must_use]
    pub fn is_translation(&self) -> bool {
        matches!(self, Self::Translation(_) | Self::Both(..))
    }

    #[must_use]
    pub fn is_rotation(&self) -> bool {
        matches!(self, Self::Rotation(_) | Self::Both(..))
    }

    /// The translation vector of a translation or combined part.
    pub fn position(&self) -> Result<&Vector, OrientationError> {
        match self {
            Self::Translation(vector) | Self::Both(vector, _) => Ok(vector),
            Self::Rotation(_) => Err(OrientationError::NotATranslation { part: self.to_string() }),
        }
    }

    /// Axis, angle and angle unit of a rotation or combined part.
    pub fn rotation_axis_angle(&self) -> Result<(&Vector, &Expr, &'static str), OrientationError> {
        match self {
            Self::Rotation(rotation) | Self::Both(_, rotation) => {
                Ok((&rotation.axis, &rotation.angle, Rotation::UNITS))
            }
            Self::Translation(_) => Err(OrientationError::NotARotation { part: self.to_string() }),
        }
    }

    /// An operation of identically-zero magnitude.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Translation(vector) => is_zero_vector(vector),
            Self::Rotation(rotation) => rotation.is_zero(),
            Self::Both(vector, rotation) => is_zero_vector(vector) && rotation.is_zero(),
        }
    }

    /// Splits a combined part into its translation and rotation.
    #[must_use]
    pub fn decompose(&self) -> Vec<OrientationPart> {
        match self {
            Self::Both(vector, rotation) => vec![
                Self::Translation(vector.clone()),
                Self::Rotation(rotation.clone()),
            ],
            other => vec![other.clone()],
        }
    }

    /// Inverse as a list of elementary parts, in application order.
    #[must_use]
    pub fn inverse(&self) -> Vec<OrientationPart> {
        match self {
            Self::Translation(vector) => vec![Self::Translation(negate(vector))],
            Self::Rotation(rotation) => vec![Self::Rotation(rotation.inverse())],
            Self::Both(vector, rotation) => vec![
                Self::Rotation(rotation.inverse()),
                Self::Translation(negate(vector)),
            ],
        }
    }

    /// Merges two consecutive elementary parts if they commute into one.
    #[must_use]
    pub fn merge(&self, next: &OrientationPart) -> Option<OrientationPart> {
        match (self, next) {
            (Self::Translation(a), Self::Translation(b)) => Some(Self::Translation([
                a[0].clone() + b[0].clone(),
                a[1].clone() + b[1].clone(),
                a[2].clone() + b[2].clone(),
            ])),
            (Self::Rotation(a), Self::Rotation(b)) => a.merge(b).map(Self::Rotation),
            _ => None,
        }
    }

    #[must_use]
    pub fn evaluate(&self, bindings: &Bindings) -> Self {
        match self {
            Self::Translation(vector) => Self::Translation(evaluate_vector(vector, bindings)),
            Self::Rotation(rotation) => Self::Rotation(rotation.evaluate(bindings)),
            Self::Both(vector, rotation) => {
                Self::Both(evaluate_vector(vector, bindings), rotation.evaluate(bindings))
            }
        }
    }

    /// Numeric transform, if every expression is a literal.
    #[cfg(test)]
    #[must_use]
    pub fn transform(&self) -> Option<Transform> {
        match self {
            Self::Translation(vector) => Some(Transform::translate(constant_vector(vector)?)),
            Self::Rotation(rotation) => rotation.transform(),
            Self::Both(vector, rotation) => {
                Some(Transform::translate(constant_vector(vector)?) * rotation.transform()?)
            }
        }
    }
}

fn write_vector(f: &mut fmt::Formatter<'_>, vector: &Vector) -> fmt::Result {
    write!(f, "[{}, {}, {}]", vector[0], vector[1], vector[2])
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rotate({} deg about ", self.angle)?;
        write_vector(f, &self.axis)?;
        f.write_str(")")
    }
}

impl fmt::Display for OrientationPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Translation(vector) => {
                f.write_str("translate")?;
                write_vector(f, vector)
            }
            Self::Rotation(rotation) => write!(f, "{rotation}"),
            Self::Both(vector, rotation) => {
                f.write_str("translate")?;
                write_vector(f, vector)?;
                write!(f, " then {rotation}")
            }
        }
    }
}
