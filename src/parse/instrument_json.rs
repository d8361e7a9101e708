//! Inlezen van een instrumentbeschrijving in JSON.
//!
//! ```json
//! {
//!   "name": "demo",
//!   "parameters": [{"name": "E", "default": 5}],
//!   "declare": {"half": 1.5, "L": "2*half"},
//!   "components": [
//!     {"name": "origin", "type": "Arm"},
//!     {"name": "slit", "type": "Slit", "parameters": {"xwidth": 0.02},
//!      "at": {"vector": [0, 0, "L"], "relative": "origin"}}
//!   ]
//! }
//! ```
//!
//! Zonder `rotated` volgt de rotatie het frame van `at`. `relative` mag een
//! eerder gedeclareerde component zijn, `PREVIOUS` of `ABSOLUTE`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value as Json};
use thiserror::Error;

use crate::expr::{Expr, ParseError, parse_expr};
use crate::instrument::{ComponentInstance, ComponentType, Instrument};
use crate::orientation::{ComponentOrientation, Reference, Vector, zero_vector};

const ABSOLUTE: &str = "ABSOLUTE";
const PREVIOUS: &str = "PREVIOUS";

/// Fouttype voor het inlezen van een instrumentbeschrijving.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Het document is geen geldige beschrijving.
    #[error("ongeldige instrumentbeschrijving: {0}")]
    Json(#[from] serde_json::Error),
    /// Een expressie kon niet geparsed worden.
    #[error("ongeldige expressie in {context}: {source}")]
    Expression {
        context: String,
        #[source]
        source: ParseError,
    },
    /// Een `relative` verwijst naar een onbekende of latere component.
    #[error("component `{component}` verwijst naar onbekende component `{reference}`")]
    UnknownReference { component: String, reference: String },
    /// Twee componenten met dezelfde naam.
    #[error("componentnaam `{0}` komt meer dan eens voor")]
    DuplicateComponent(String),
}

pub type LoadResult<T> = Result<T, LoadError>;

/// Een getal of expressietekst.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ExprText {
    Number(f64),
    Text(String),
}

impl ExprText {
    fn into_expr(self, context: impl FnOnce() -> String) -> LoadResult<Expr> {
        match self {
            Self::Number(value) => Ok(Expr::number(value)),
            Self::Text(text) => parse_expr(&text).map_err(|source| LoadError::Expression {
                context: context(),
                source,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ParameterDescription {
    name: String,
    #[serde(default)]
    default: Option<ExprText>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlacementDescription {
    Bare([ExprText; 3]),
    Full {
        vector: [ExprText; 3],
        #[serde(default)]
        relative: Option<String>,
    },
}

impl PlacementDescription {
    fn parts(&self) -> ([ExprText; 3], Option<String>) {
        match self {
            Self::Bare(vector) => (vector.clone(), None),
            Self::Full { vector, relative } => (vector.clone(), relative.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ComponentDescription {
    name: String,
    #[serde(rename = "type")]
    component_type: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    parameters: Map<String, Json>,
    #[serde(default)]
    at: Option<PlacementDescription>,
    #[serde(default)]
    rotated: Option<PlacementDescription>,
    #[serde(default)]
    metadata: Option<Json>,
}

#[derive(Debug, Deserialize)]
struct InstrumentDescription {
    name: String,
    #[serde(default)]
    parameters: Vec<ParameterDescription>,
    #[serde(default)]
    declare: BTreeMap<String, ExprText>,
    #[serde(default)]
    components: Vec<ComponentDescription>,
}

/// Leest een instrument uit JSON-tekst.
pub fn load_instrument(text: &str) -> LoadResult<Instrument> {
    let description: InstrumentDescription = serde_json::from_str(text)?;
    build_instrument(description)
}

/// Leest een instrument uit een reeds gedecodeerde JSON-waarde.
pub fn instrument_from_value(value: Json) -> LoadResult<Instrument> {
    let description: InstrumentDescription = serde_json::from_value(value)?;
    build_instrument(description)
}

fn build_instrument(description: InstrumentDescription) -> LoadResult<Instrument> {
    let mut instrument = Instrument::new(description.name);

    for parameter in description.parameters {
        let name = parameter.name;
        let default = parameter
            .default
            .map(|default| default.into_expr(|| format!("default of parameter `{name}`")))
            .transpose()?;
        instrument.add_parameter(name, default);
    }

    for (name, value) in description.declare {
        let expr = value.into_expr(|| format!("declared variable `{name}`"))?;
        instrument.bind(name, expr);
    }

    let mut placed: HashMap<String, Arc<ComponentOrientation>> = HashMap::new();
    let mut previous: Option<Arc<ComponentOrientation>> = None;
    for component in description.components {
        if placed.contains_key(&component.name) {
            return Err(LoadError::DuplicateComponent(component.name));
        }
        let orientation = Arc::new(orientation(&component, &placed, previous.as_ref())?);
        placed.insert(component.name.clone(), orientation.clone());
        previous = Some(orientation.clone());

        let mut component_type = ComponentType::new(component.component_type);
        component_type.category = component.category;
        let mut instance = ComponentInstance::new(component.name.clone(), component_type, orientation);
        for (parameter, value) in component.parameters {
            let text: ExprText = serde_json::from_value(value)?;
            let expr = text.into_expr(|| format!("component `{}` parameter `{parameter}`", component.name))?;
            instance.set_parameter(parameter, expr);
        }
        instance.metadata = component.metadata;
        instrument.add_component(instance);
    }
    Ok(instrument)
}

fn orientation(
    component: &ComponentDescription,
    placed: &HashMap<String, Arc<ComponentOrientation>>,
    previous: Option<&Arc<ComponentOrientation>>,
) -> LoadResult<ComponentOrientation> {
    let name = &component.name;
    let (at, at_reference) = match &component.at {
        Some(placement) => {
            let (vector, relative) = placement.parts();
            (
                to_vector(vector, name, "at")?,
                reference(relative.as_deref(), name, placed, previous)?,
            )
        }
        None => (zero_vector(), Reference::Absolute),
    };
    let (angles, rotated_reference) = match &component.rotated {
        Some(placement) => {
            let (vector, relative) = placement.parts();
            (
                to_vector(vector, name, "rotated")?,
                reference(relative.as_deref(), name, placed, previous)?,
            )
        }
        None => (zero_vector(), at_reference.clone()),
    };
    Ok(ComponentOrientation::new(
        name.clone(),
        at,
        at_reference,
        angles,
        rotated_reference,
    ))
}

fn to_vector(vector: [ExprText; 3], component: &str, clause: &str) -> LoadResult<Vector> {
    let [x, y, z] = vector;
    let context = |axis: &str| format!("component `{component}` {clause} {axis}");
    Ok([
        x.into_expr(|| context("x"))?,
        y.into_expr(|| context("y"))?,
        z.into_expr(|| context("z"))?,
    ])
}

fn reference(
    relative: Option<&str>,
    component: &str,
    placed: &HashMap<String, Arc<ComponentOrientation>>,
    previous: Option<&Arc<ComponentOrientation>>,
) -> LoadResult<Reference> {
    let unknown = |reference: &str| LoadError::UnknownReference {
        component: component.to_owned(),
        reference: reference.to_owned(),
    };
    match relative.map(str::trim) {
        None => Ok(Reference::Absolute),
        Some(name) if name.eq_ignore_ascii_case(ABSOLUTE) => Ok(Reference::Absolute),
        Some(name) if name.eq_ignore_ascii_case(PREVIOUS) => previous
            .map(|parent| Reference::Relative(parent.clone()))
            .ok_or_else(|| unknown(name)),
        Some(name) => placed
            .get(name)
            .map(|parent| Reference::Relative(parent.clone()))
            .ok_or_else(|| unknown(name)),
    }
}
