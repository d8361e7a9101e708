//! Instrument model: declared parameters, static bindings and the ordered
//! component instances with their placements.

use std::collections::BTreeSet;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use serde::Serialize;

use crate::expr::{Bindings, Expr};
use crate::orientation::{ComponentOrientation, Reference, Vector};

pub mod assembler;
pub mod options;

pub use assembler::{ComponentPlacement, Export, export};
pub use options::{ExportOptions, ReferenceSelection, StructuralPolicy};

/// Type of a component instance, e.g. `Guide_gravity` in category `optics`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentType {
    pub name: String,
    pub category: Option<String>,
}

impl ComponentType {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ComponentInstance {
    pub name: String,
    pub component_type: ComponentType,
    parameters: Vec<(String, Expr)>,
    pub orientation: Arc<ComponentOrientation>,
    /// Decoded auxiliary metadata, converted to fragments on export.
    pub metadata: Option<serde_json::Value>,
}

impl ComponentInstance {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        component_type: ComponentType,
        orientation: Arc<ComponentOrientation>,
    ) -> Self {
        Self {
            name: name.into(),
            component_type,
            parameters: Vec::new(),
            orientation,
            metadata: None,
        }
    }

    /// Sets a parameter; a repeated name replaces the earlier value in place.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: Expr) -> Self {
        self.set_parameter(name, value);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: Expr) {
        let name = name.into();
        match self.parameters.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.parameters.push((name, value)),
        }
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Expr> {
        self.parameters
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn defines(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }

    /// Parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[(String, Expr)] {
        &self.parameters
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.component_type.category.as_deref()
    }
}

fn write_vector(out: &mut String, vector: &Vector) -> fmt::Result {
    write!(out, "({}, {}, {})", vector[0], vector[1], vector[2])
}

fn write_reference(out: &mut String, reference: &Reference) -> fmt::Result {
    match reference.name() {
        Some(name) => write!(out, " RELATIVE {name}"),
        None => out.write_str(" ABSOLUTE"),
    }
}

impl fmt::Display for ComponentInstance {
    /// Source-like one-line description, used for provenance.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write!(out, "COMPONENT {} = {}(", self.name, self.component_type.name)?;
        for (index, (name, value)) in self.parameters.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            write!(out, "{name}={value}")?;
        }
        out.push_str(") AT ");
        write_vector(&mut out, self.orientation.at())?;
        write_reference(&mut out, self.orientation.at_reference())?;
        if self.orientation.angles().iter().any(|angle| !angle.is_zero()) {
            out.push_str(" ROTATED ");
            write_vector(&mut out, self.orientation.angles())?;
            write_reference(&mut out, self.orientation.rotated_reference())?;
        }
        f.write_str(&out)
    }
}

/// A run-time instrument parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentParameter {
    pub name: String,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, Default)]
pub struct Instrument {
    pub name: String,
    pub parameters: Vec<InstrumentParameter>,
    /// Statically resolvable declared variables.
    pub bindings: Bindings,
    pub components: Vec<ComponentInstance>,
}

#[derive(Serialize)]
struct ParameterSummary<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<String>,
}

#[derive(Serialize)]
struct InstrumentSummary<'a> {
    name: &'a str,
    parameters: Vec<ParameterSummary<'a>>,
}

impl Instrument {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_parameter(&mut self, name: impl Into<String>, default: Option<Expr>) {
        self.parameters.push(InstrumentParameter {
            name: name.into(),
            default,
        });
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Expr) {
        self.bindings.insert(name.into(), value);
    }

    pub fn add_component(&mut self, component: ComponentInstance) {
        self.components.push(component);
    }

    #[must_use]
    pub fn component(&self, name: &str) -> Option<&ComponentInstance> {
        self.components.iter().find(|component| component.name == name)
    }

    /// Names of the parameters only known when the instrument runs.
    #[must_use]
    pub fn runtime_names(&self) -> BTreeSet<String> {
        self.parameters.iter().map(|parameter| parameter.name.clone()).collect()
    }

    /// JSON summary of name and parameters for the instrument-level
    /// `mcstas` field.
    #[must_use]
    pub fn summary(&self) -> String {
        let summary = InstrumentSummary {
            name: &self.name,
            parameters: self
                .parameters
                .iter()
                .map(|parameter| ParameterSummary {
                    name: &parameter.name,
                    default: parameter.default.as_ref().map(ToString::to_string),
                })
                .collect(),
        };
        serde_json::to_string(&summary).unwrap_or_default()
    }
}
