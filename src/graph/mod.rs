//! Kern datastructuren voor de NeXus-doelboom.

pub mod node;
pub mod topo;
pub mod value;

pub use node::{Child, DEPENDS_ON, Field, TargetNode};
pub use topo::{ABSOLUTE, ChainError, outer_dependency, outer_transformation};
pub use value::{Value, ValueError, ValueKind};
