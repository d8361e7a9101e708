use thiserror::Error;

use crate::graph::ChainError;
use crate::orientation::OrientationError;

/// Failure that makes a single component untranslatable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Orientation(#[from] OrientationError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("component `{component}` could not be translated: {source}")]
    Structural {
        component: String,
        #[source]
        source: StructuralError,
    },
    #[error("reference component `{0}` does not exist")]
    UnknownReference(String),
}
