use std::fmt;
use std::ops::Add;

use crate::expr::Bindings;
#[cfg(test)]
use crate::geom::Transform;

use super::part::OrientationPart;

/// Ordered spatial operations, oldest (nearest the absolute origin) first.
///
/// The net transform of a chain `[p0, p1, .., pn]` is `p0 · p1 · .. · pn`:
/// `pn` acts first on a point expressed in the component frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrientationChain {
    parts: Vec<OrientationPart>,
}

impl OrientationChain {
    #[must_use]
    pub fn new(parts: Vec<OrientationPart>) -> Self {
        Self { parts }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn parts(&self) -> &[OrientationPart] {
        &self.parts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn push(&mut self, part: OrientationPart) {
        self.parts.push(part);
    }

    /// The chain that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self::new(self.parts.iter().rev().flat_map(OrientationPart::inverse).collect())
    }

    /// Only the rotational content, in order. Its product is the net rotation.
    #[must_use]
    pub fn rotations(&self) -> Self {
        Self::new(
            self.parts
                .iter()
                .filter_map(|part| match part {
                    OrientationPart::Rotation(rotation) | OrientationPart::Both(_, rotation) => {
                        Some(OrientationPart::Rotation(rotation.clone()))
                    }
                    OrientationPart::Translation(_) => None,
                })
                .collect(),
        )
    }

    #[must_use]
    pub fn evaluate(&self, bindings: &Bindings) -> Self {
        Self::new(self.parts.iter().map(|part| part.evaluate(bindings)).collect())
    }

    /// Collapses the chain into its minimal form without changing the net
    /// transform.
    ///
    /// Consecutive translations sum, consecutive rotations about the same or
    /// opposite axis add, zero operations vanish (so their neighbours may
    /// merge in turn), and a translation directly followed by a rotation is
    /// fused into a single [`OrientationPart::Both`].
    #[must_use]
    pub fn reduce(&self) -> Self {
        let mut stack: Vec<OrientationPart> = Vec::with_capacity(self.parts.len());
        for part in self.parts.iter().flat_map(OrientationPart::decompose) {
            if part.is_zero() {
                continue;
            }
            let merged = stack.last().and_then(|top| top.merge(&part));
            match merged {
                Some(merged) => {
                    stack.pop();
                    if !merged.is_zero() {
                        stack.push(merged);
                    }
                }
                None => stack.push(part),
            }
        }

        let mut parts = Vec::with_capacity(stack.len());
        let mut pending = stack.into_iter().peekable();
        while let Some(part) = pending.next() {
            let fuses = matches!(part, OrientationPart::Translation(_))
                && matches!(pending.peek(), Some(OrientationPart::Rotation(_)));
            match (part, fuses) {
                (OrientationPart::Translation(vector), true) => {
                    if let Some(OrientationPart::Rotation(rotation)) = pending.next() {
                        parts.push(OrientationPart::Both(vector, rotation));
                    }
                }
                (part, _) => parts.push(part),
            }
        }
        Self::new(parts)
    }

    /// Numeric net transform, if every part is constant.
    #[cfg(test)]
    #[must_use]
    pub fn transform(&self) -> Option<Transform> {
        self.parts
            .iter()
            .try_fold(Transform::identity(), |acc, part| Some(acc * part.transform()?))
    }
}

impl From<Vec<OrientationPart>> for OrientationChain {
    fn from(parts: Vec<OrientationPart>) -> Self {
        Self::new(parts)
    }
}

impl Add for OrientationChain {
    type Output = OrientationChain;
    fn add(mut self, rhs: Self) -> Self::Output {
        self.parts.extend(rhs.parts);
        self
    }
}

impl fmt::Display for OrientationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parts.is_empty() {
            return f.write_str("identity");
        }
        for (index, part) in self.parts.iter().enumerate() {
            if index > 0 {
                f.write_str(" · ")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}
