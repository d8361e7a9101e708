use std::ops::Add;
use std::sync::Arc;

use crate::expr::Expr;

use super::chain::OrientationChain;
use super::part::{OrientationPart, Rotation, Vector, zero_vector};

/// The frame an `AT` or `ROTATED` clause is expressed in.
#[derive(Debug, Clone, Default)]
pub enum Reference {
    #[default]
    Absolute,
    Relative(Arc<ComponentOrientation>),
}

impl Reference {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Absolute => None,
            Self::Relative(parent) => Some(parent.name()),
        }
    }

    fn placement(&self) -> OrientationChain {
        match self {
            Self::Absolute => OrientationChain::empty(),
            Self::Relative(parent) => parent.placement(),
        }
    }

    fn same_frame(&self, other: &Reference) -> bool {
        match (self, other) {
            (Self::Absolute, Self::Absolute) => true,
            (Self::Relative(a), Self::Relative(b)) => Arc::ptr_eq(a, b) || a.name() == b.name(),
            _ => false,
        }
    }
}

/// Un-reduced placement of one component instance.
///
/// `at` is a position in the frame of `at_reference`; `angles` are the
/// `(rx, ry, rz)` rotations in degrees, applied intrinsically about x, then y,
/// then z, relative to `rotated_reference`.
#[derive(Debug, Clone)]
pub struct ComponentOrientation {
    name: String,
    at: Vector,
    at_reference: Reference,
    angles: Vector,
    rotated_reference: Reference,
    offset: OrientationChain,
}

impl ComponentOrientation {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        at: Vector,
        at_reference: Reference,
        angles: Vector,
        rotated_reference: Reference,
    ) -> Self {
        Self {
            name: name.into(),
            at,
            at_reference,
            angles,
            rotated_reference,
            offset: OrientationChain::empty(),
        }
    }

    /// Placement at the absolute origin with no rotation.
    #[must_use]
    pub fn origin(name: impl Into<String>) -> Self {
        Self::new(
            name,
            zero_vector(),
            Reference::Absolute,
            zero_vector(),
            Reference::Absolute,
        )
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn at(&self) -> &Vector {
        &self.at
    }

    #[must_use]
    pub fn angles(&self) -> &Vector {
        &self.angles
    }

    #[must_use]
    pub fn at_reference(&self) -> &Reference {
        &self.at_reference
    }

    #[must_use]
    pub fn rotated_reference(&self) -> &Reference {
        &self.rotated_reference
    }

    #[must_use]
    pub fn offset(&self) -> &OrientationChain {
        &self.offset
    }

    /// Absolute chain of this component, ignoring any offset.
    #[must_use]
    pub fn placement(&self) -> OrientationChain {
        let mut chain = self.at_reference.placement();
        chain.push(OrientationPart::Translation(self.at.clone()));

        if !self.at_reference.same_frame(&self.rotated_reference) {
            let inherited = self.at_reference.placement().rotations().inverse();
            let rotated = self.rotated_reference.placement().rotations();
            chain = chain + inherited + rotated;
        }

        for (index, angle) in self.angles.iter().enumerate() {
            chain.push(OrientationPart::Rotation(Rotation::about(index, angle.clone())));
        }
        chain
    }

    /// The offset followed by the absolute placement.
    #[must_use]
    pub fn combine(&self) -> OrientationChain {
        self.offset.clone() + self.placement()
    }

    #[must_use]
    pub fn reduce(&self) -> OrientationChain {
        self.combine().reduce()
    }

    /// The chain that maps this component's frame back onto the origin.
    #[must_use]
    pub fn inverse(&self) -> OrientationChain {
        self.combine().inverse()
    }
}

/// Prepends a re-centering offset: `offset + orientation`.
impl Add<ComponentOrientation> for OrientationChain {
    type Output = ComponentOrientation;
    fn add(self, mut rhs: ComponentOrientation) -> Self::Output {
        rhs.offset = self + rhs.offset;
        rhs
    }
}

/// Convenience for numeric vectors in tests and loaders.
#[must_use]
pub fn vector(x: f64, y: f64, z: f64) -> Vector {
    [Expr::number(x), Expr::number(y), Expr::number(z)]
}
