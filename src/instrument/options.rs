//! Export options.

use serde::Deserialize;

/// Category whose first member becomes the scene origin by default.
pub const REFERENCE_CATEGORY: &str = "samples";
/// Namespace in which run-time parameter values are logged.
pub const RUNTIME_NAMESPACE: &str = "/entry/instrument/parameters";

/// Which component, if any, positions are re-centered on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSelection {
    /// First component of this category.
    Category(String),
    /// The component with this name.
    Named(String),
    /// No re-centering.
    Absolute,
}

impl Default for ReferenceSelection {
    fn default() -> Self {
        Self::Category(REFERENCE_CATEGORY.to_owned())
    }
}

/// What to do with a component whose transformation chain is broken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralPolicy {
    #[default]
    Abort,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Reject fragments that are not NeXus classes.
    pub only_nx: bool,
    pub reference: ReferenceSelection,
    pub runtime_namespace: String,
    pub structural_policy: StructuralPolicy,
    /// Attach a `mcstas` field describing the source of every component.
    pub provenance: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            only_nx: true,
            reference: ReferenceSelection::default(),
            runtime_namespace: RUNTIME_NAMESPACE.to_owned(),
            structural_policy: StructuralPolicy::default(),
            provenance: true,
        }
    }
}
