//! Orientation model: component placements, their composition into one
//! absolute chain, algebraic reduction, and export as named transformation
//! nodes.

use thiserror::Error;

mod chain;
mod dependent;
mod export;
mod part;

pub use chain::OrientationChain;
pub use dependent::{ComponentOrientation, Reference, vector};
pub use export::{TransformationKind, TransformationNode, chain_nodes, vector_length};
pub use part::{OrientationPart, Rotation, Vector, axis, zero_vector};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrientationError {
    #[error("`{part}` is a rotation and has no position")]
    NotATranslation { part: String },
    #[error("`{part}` is a translation and has no rotation axis")]
    NotARotation { part: String },
}
