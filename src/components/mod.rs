//! Component registry en vertaling van componentinstanties naar NeXus-nodes.

use std::collections::HashMap;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::StructuralError;
use crate::expr::{Expr, ParameterEvaluator, Resolution};
use crate::geom::MeshDiagnostics;
use crate::graph::{DEPENDS_ON, Field, TargetNode, Value, outer_transformation};
use crate::instrument::ComponentInstance;
use crate::orientation::{TransformationNode, Vector};
use crate::parse::fragments::{Fragment, Fragments};

pub mod collimator;
pub mod default;
pub mod disk_chopper;
pub mod elliptic_guide;
pub mod guide;
pub mod schema;
pub mod slit;

/// Naam van de transformatiegroep binnen elke component.
pub const TRANSFORMATIONS: &str = "transformations";
/// Naam van de groep met OFF-geometrie.
pub const GEOMETRY: &str = "geometry";
/// Naam van het herkomstveld.
pub const PROVENANCE: &str = "mcstas";

/// Maximale editafstand voor een "bedoelde je"-suggestie.
const SUGGESTION_DISTANCE: usize = 2;

/// Trait die alle componentbouwers implementeren.
pub trait Component {
    fn build(&self, context: &mut BuildContext<'_>) -> TargetNode;
}

/// Beschikbare bouwers binnen de registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Slit,
    Guide,
    Collimator,
    DiskChopper,
    EllipticGuide,
    Default,
}

impl ComponentKind {
    #[must_use]
    pub fn build(&self, context: &mut BuildContext<'_>) -> TargetNode {
        match self {
            Self::Slit => slit::ComponentImpl.build(context),
            Self::Guide => guide::ComponentImpl.build(context),
            Self::Collimator => collimator::ComponentImpl.build(context),
            Self::DiskChopper => disk_chopper::ComponentImpl.build(context),
            Self::EllipticGuide => elliptic_guide::ComponentImpl.build(context),
            Self::Default => default::ComponentImpl.build(context),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Slit => "Slit",
            Self::Guide => "Guide",
            Self::Collimator => "Collimator",
            Self::DiskChopper => "DiskChopper",
            Self::EllipticGuide => "EllipticGuide",
            Self::Default => "Default",
        }
    }
}

/// Registratie van een bouwer onder een of meer typenamen.
#[derive(Debug, Clone, Copy)]
pub struct Registration {
    pub names: &'static [&'static str],
    pub kind: ComponentKind,
}

/// Volledige lijst van gespecialiseerde bouwers.
pub const REGISTRATIONS: &[Registration] = &[
    Registration {
        names: &["Slit"],
        kind: ComponentKind::Slit,
    },
    Registration {
        names: &[
            "Guide",
            "Guide_channeled",
            "Guide_gravity",
            "Guide_simple",
            "Guide_wavy",
        ],
        kind: ComponentKind::Guide,
    },
    Registration {
        names: &["Collimator_linear"],
        kind: ComponentKind::Collimator,
    },
    Registration {
        names: &["DiskChopper"],
        kind: ComponentKind::DiskChopper,
    },
    Registration {
        names: &["Elliptic_guide_gravity"],
        kind: ComponentKind::EllipticGuide,
    },
];

/// Registry die bouwers opzoekt op typenaam.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    by_name: HashMap<String, ComponentKind>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        for registration in REGISTRATIONS {
            registry.register_names(registration.names, registration.kind);
        }
        registry
    }
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    pub fn register_names(&mut self, names: &[&str], kind: ComponentKind) {
        for name in names {
            self.by_name.insert(normalize_name(name), kind);
        }
    }

    /// Onbekende types vallen terug op [`ComponentKind::Default`].
    #[must_use]
    pub fn resolve(&self, type_name: &str) -> ComponentKind {
        self.by_name
            .get(&normalize_name(type_name))
            .copied()
            .unwrap_or(ComponentKind::Default)
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Alles wat een bouwer nodig heeft: de instantie, de evaluator en de
/// meldingen.
pub struct BuildContext<'a> {
    instance: &'a ComponentInstance,
    evaluator: &'a ParameterEvaluator,
    diagnostics: &'a mut Diagnostics,
    has_fragments: bool,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        instance: &'a ComponentInstance,
        evaluator: &'a ParameterEvaluator,
        diagnostics: &'a mut Diagnostics,
        has_fragments: bool,
    ) -> Self {
        Self {
            instance,
            evaluator,
            diagnostics,
            has_fragments,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.instance.name
    }

    #[must_use]
    pub fn instance(&self) -> &ComponentInstance {
        self.instance
    }

    /// Of de instantie hulpfragmenten meedraagt.
    #[must_use]
    pub fn has_fragments(&self) -> bool {
        self.has_fragments
    }

    #[must_use]
    pub fn defines(&self, parameter: &str) -> bool {
        self.instance.defines(parameter)
    }

    pub fn report(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.diagnostics.component(kind, &self.instance.name, message);
    }

    /// Statische substitutie van een expressie.
    #[must_use]
    pub fn evaluate(&self, expr: &Expr) -> Expr {
        self.evaluator.evaluate(expr)
    }

    /// De expressie van een verplichte parameter. Een ontbrekende parameter
    /// levert een melding op, met een suggestie als er een naam dichtbij ligt.
    pub fn expression(&mut self, parameter: &str) -> Option<Expr> {
        if let Some(expr) = self.instance.parameter(parameter) {
            return Some(expr.clone());
        }
        let message = match self.suggestion(parameter) {
            Some(candidate) => format!("parameter `{parameter}` is not set (did you mean `{candidate}`?)"),
            None => format!("parameter `{parameter}` is not set"),
        };
        self.report(DiagnosticKind::UnresolvedParameter, message);
        None
    }

    fn suggestion(&self, parameter: &str) -> Option<&'a str> {
        self.instance
            .parameters()
            .iter()
            .map(|(name, _)| (levenshtein::levenshtein(name, parameter), name.as_str()))
            .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name)
    }

    /// Veldwaarde van een verplichte parameter.
    pub fn value(&mut self, parameter: &str) -> Option<Value> {
        let expr = self.expression(parameter)?;
        self.value_of(parameter, &expr)
    }

    /// Zet een expressie om naar een veldwaarde: een getal, tekst of een
    /// uitgestelde koppeling. Onopgeloste expressies worden weggelaten.
    pub fn value_of(&mut self, label: &str, expr: &Expr) -> Option<Value> {
        match self.evaluator.resolve(expr) {
            Resolution::Constant(value) => Some(Value::Number(value)),
            Resolution::Text(text) => Some(Value::Text(text)),
            Resolution::Deferred(deferred) => {
                let parameters: Vec<&str> =
                    deferred.links.iter().map(|link| link.parameter.as_str()).collect();
                self.report(
                    DiagnosticKind::DeferredBinding,
                    format!(
                        "`{label}` = {} depends on run-time parameters {}",
                        deferred.expression,
                        parameters.join(", ")
                    ),
                );
                Some(Value::Deferred(deferred))
            }
            Resolution::Unresolved { expression, unbound } => {
                self.report(
                    DiagnosticKind::UnresolvedParameter,
                    format!("`{label}` = {expression} has unknown names {}", unbound.join(", ")),
                );
                None
            }
        }
    }

    /// Veld voor een verplichte parameter, met optionele eenheid.
    pub fn field(&mut self, parameter: &str, units: Option<&str>) -> Option<Field> {
        let value = self.value(parameter)?;
        Some(with_units(Field::new(value), units))
    }

    /// Statisch getal voor geometrie. Alles wat niet constant is levert een
    /// melding en `None`.
    pub fn number(&mut self, parameter: &str) -> Option<f64> {
        let expr = self.expression(parameter)?;
        self.number_of(parameter, &expr)
    }

    /// Als [`BuildContext::number`], maar `default` voor een ontbrekende
    /// parameter.
    pub fn number_or(&mut self, parameter: &str, default: f64) -> Option<f64> {
        if self.defines(parameter) {
            self.number(parameter)
        } else {
            Some(default)
        }
    }

    pub fn number_of(&mut self, label: &str, expr: &Expr) -> Option<f64> {
        match self.evaluator.resolve(expr) {
            Resolution::Constant(value) => Some(value),
            Resolution::Deferred(deferred) => {
                self.report(
                    DiagnosticKind::UnsupportedParametrization,
                    format!(
                        "`{label}` = {} is only known at run time; a static value is needed",
                        deferred.expression
                    ),
                );
                None
            }
            Resolution::Text(text) => {
                self.report(
                    DiagnosticKind::UnsupportedParametrization,
                    format!("`{label}` is text (\"{text}\") where a number is needed"),
                );
                None
            }
            Resolution::Unresolved { expression, unbound } => {
                self.report(
                    DiagnosticKind::UnresolvedParameter,
                    format!("`{label}` = {expression} has unknown names {}", unbound.join(", ")),
                );
                None
            }
        }
    }

    /// Neemt de meetwaarden van een mesh over als meldingen.
    pub fn report_mesh(&mut self, diagnostics: &MeshDiagnostics) {
        log::debug!("{}: mesh {}", self.instance.name, diagnostics.summary());
        for warning in &diagnostics.warnings {
            self.report(DiagnosticKind::DegenerateGeometry, warning.clone());
        }
    }
}

/// Voegt een `units`-attribuut toe als er een eenheid is.
#[must_use]
pub fn with_units(field: Field, units: Option<&str>) -> Field {
    match units {
        Some(units) => field.with_attribute("units", units),
        None => field,
    }
}

/// Resultaat van een vertaalde component.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedComponent {
    pub node: TargetNode,
    /// Laatste transformatie van de keten, relatief aan `transformations`.
    pub outer: Option<String>,
    /// Of een fragment de transformatieketen heeft uitgebreid.
    pub chain_overridden: bool,
}

/// Vertaalt een instantie met haar geëxporteerde transformatieketen.
///
/// Volgorde: bouwer, transformatiegroep, fragmenten, `depends_on`.
pub fn translate(
    registry: &ComponentRegistry,
    instance: &ComponentInstance,
    nodes: &[TransformationNode],
    fragments: Fragments,
    evaluator: &ParameterEvaluator,
    diagnostics: &mut Diagnostics,
) -> Result<TranslatedComponent, StructuralError> {
    for rejected in &fragments.rejected {
        diagnostics.component(DiagnosticKind::InvalidFragment, &instance.name, rejected.to_string());
    }

    let kind = registry.resolve(&instance.component_type.name);
    log::debug!("{}: translating as {}", instance.name, kind.name());
    let mut node = {
        let mut context = BuildContext::new(instance, evaluator, diagnostics, !fragments.is_empty());
        kind.build(&mut context)
    };

    let mut outer = None;
    if !nodes.is_empty() {
        let group = transformations_group(&instance.name, nodes, evaluator, diagnostics);
        outer = outer_transformation(&group)?;
        node.insert_group(TRANSFORMATIONS, group);
    }

    let mut chain_overridden = false;
    for (name, fragment) in fragments.entries {
        if name == TRANSFORMATIONS {
            match fragment {
                Fragment::Group(extension) if extension.class() == "NXtransformations" => {
                    extend_transformations(&mut node, extension);
                    chain_overridden = true;
                }
                other => {
                    // de keten mag niet door iets anders vervangen worden
                    diagnostics.component(
                        DiagnosticKind::InvalidFragment,
                        &instance.name,
                        format!(
                            "fragment `{TRANSFORMATIONS}` must be an NXtransformations group, not {}",
                            other.class().unwrap_or("a field")
                        ),
                    );
                    continue;
                }
            }
        } else {
            attach_fragment(&mut node, name, fragment, outer.as_deref());
        }
        if let Some(group) = node.group(TRANSFORMATIONS) {
            outer = outer_transformation(group)?;
        }
    }

    if let Some(outer) = &outer {
        node.set_attribute(DEPENDS_ON, format!("{TRANSFORMATIONS}/{outer}"));
    }

    Ok(TranslatedComponent {
        node,
        outer,
        chain_overridden,
    })
}

fn attach_fragment(node: &mut TargetNode, name: String, mut fragment: Fragment, outer: Option<&str>) {
    if fragment.depends_on().is_none() {
        if let Some(outer) = outer {
            fragment.set_attribute(DEPENDS_ON, format!("{TRANSFORMATIONS}/{outer}"));
        }
    }
    match fragment {
        Fragment::Field(field) => node.insert_field(name, field),
        Fragment::Group(group) => node.insert_group(name, group),
    }
}

fn extend_transformations(node: &mut TargetNode, extension: TargetNode) {
    if !node.contains(TRANSFORMATIONS) {
        node.insert_group(TRANSFORMATIONS, TargetNode::new("NXtransformations"));
    }
    if let Some(group) = node.group_mut(TRANSFORMATIONS) {
        for (name, child) in extension.into_children() {
            group.insert(name, child);
        }
    }
}

/// Bouwt de `NXtransformations`-groep uit de geëxporteerde nodes.
fn transformations_group(
    component: &str,
    nodes: &[TransformationNode],
    evaluator: &ParameterEvaluator,
    diagnostics: &mut Diagnostics,
) -> TargetNode {
    let mut group = TargetNode::new("NXtransformations");
    for transformation in nodes {
        let value = match evaluator.resolve(&transformation.value) {
            Resolution::Constant(value) => Value::Number(value),
            Resolution::Text(text) => Value::Text(text),
            Resolution::Deferred(deferred) => {
                diagnostics.component(
                    DiagnosticKind::DeferredBinding,
                    component,
                    format!("`{}` = {} is only known at run time", transformation.name, deferred.expression),
                );
                Value::Deferred(deferred)
            }
            Resolution::Unresolved { expression, unbound } => {
                diagnostics.component(
                    DiagnosticKind::UnresolvedParameter,
                    component,
                    format!(
                        "`{}` = {expression} has unknown names {}; kept as text",
                        transformation.name,
                        unbound.join(", ")
                    ),
                );
                Value::Text(expression)
            }
        };
        let field = Field::new(value)
            .with_attribute(DEPENDS_ON, transformation.depends_on.as_str())
            .with_attribute("transformation_type", transformation.kind.as_str())
            .with_attribute("vector", direction_value(&transformation.direction, evaluator))
            .with_attribute("units", transformation.units);
        group.insert_field(transformation.name.as_str(), field);
    }
    group
}

fn direction_value(direction: &Vector, evaluator: &ParameterEvaluator) -> Value {
    let resolved: Vec<Resolution> = direction.iter().map(|component| evaluator.resolve(component)).collect();
    match resolved.iter().map(Resolution::constant).collect::<Option<Vec<f64>>>() {
        Some(values) => Value::Vector([values[0], values[1], values[2]]),
        None => Value::List(
            resolved
                .into_iter()
                .map(|component| match component {
                    Resolution::Constant(value) => Value::Number(value),
                    Resolution::Text(text) => Value::Text(text),
                    Resolution::Deferred(deferred) => Value::Deferred(deferred),
                    Resolution::Unresolved { expression, .. } => Value::Text(expression),
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::expr::Bindings;
    use crate::instrument::ComponentType;
    use crate::orientation::{ComponentOrientation, OrientationChain, OrientationPart, chain_nodes, vector};
    use crate::parse::fragments::fragments_from_json;

    pub(crate) fn instance(type_name: &str, parameters: &[(&str, Expr)]) -> ComponentInstance {
        let orientation = Arc::new(ComponentOrientation::origin("component"));
        parameters.iter().fold(
            ComponentInstance::new("component", ComponentType::new(type_name), orientation),
            |instance, (name, value)| instance.with_parameter(*name, value.clone()),
        )
    }

    pub(crate) fn evaluator(runtime: &[&str]) -> ParameterEvaluator {
        ParameterEvaluator::new(
            Bindings::new(),
            runtime.iter().map(|name| (*name).to_owned()),
            "/entry/instrument/parameters",
        )
    }

    /// Bouwt een component zonder transformaties of fragmenten.
    pub(crate) fn build(instance: &ComponentInstance, evaluator: &ParameterEvaluator) -> (TargetNode, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let registry = ComponentRegistry::default();
        let translated = translate(&registry, instance, &[], Fragments::default(), evaluator, &mut diagnostics)
            .unwrap();
        (translated.node, diagnostics)
    }

    fn translation_nodes() -> Vec<TransformationNode> {
        let chain = OrientationChain::new(vec![OrientationPart::Translation(vector(0.0, 0.0, 2.0))]);
        chain_nodes("component", &chain).unwrap()
    }

    #[test]
    fn registry_falls_back_to_default() {
        let registry = ComponentRegistry::default();
        assert_eq!(registry.resolve("Guide_gravity"), ComponentKind::Guide);
        assert_eq!(registry.resolve(" slit "), ComponentKind::Slit);
        assert_eq!(registry.resolve("Monitor_nD"), ComponentKind::Default);
    }

    #[test]
    fn transformations_and_depends_on_are_attached() {
        let instance = instance("Arm", &[]);
        let mut diagnostics = Diagnostics::new();
        let translated = translate(
            &ComponentRegistry::default(),
            &instance,
            &translation_nodes(),
            Fragments::default(),
            &evaluator(&[]),
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(translated.outer.as_deref(), Some("component_0"));
        assert_eq!(translated.node.depends_on(), Some("transformations/component_0"));
        let group = translated.node.group(TRANSFORMATIONS).unwrap();
        let field = group.field("component_0").unwrap();
        assert_eq!(field.value, Value::Number(2.0));
        assert_eq!(field.attribute("vector"), Some(&Value::Vector([0.0, 0.0, 1.0])));
        assert_eq!(field.attribute("units"), Some(&Value::Text("m".into())));
        assert_eq!(field.depends_on(), Some("."));
        assert!(!translated.chain_overridden);
    }

    #[test]
    fn empty_chain_omits_depends_on() {
        let (node, _) = build(&instance("Arm", &[]), &evaluator(&[]));
        assert_eq!(node.class(), "NXnote");
        assert!(node.depends_on().is_none());
        assert!(!node.contains(TRANSFORMATIONS));
    }

    #[test]
    fn fragments_hang_off_the_outer_transformation() {
        let instance = instance("Arm", &[]);
        let fragments = fragments_from_json(
            &json!({
                "distance": {"type": "NXfield", "value": 1.0},
                "pinned": {"type": "NXfield", "value": 2.0, "attributes": {"depends_on": "."}},
                "transformations": {"type": "NXtransformations", "value": {
                    "tilt": {"type": "NXfield", "value": 3.0,
                             "attributes": {"depends_on": "component_0", "transformation_type": "rotation"}}
                }},
                "after": {"type": "NXfield", "value": 4.0}
            }),
            true,
        );
        let mut diagnostics = Diagnostics::new();
        let translated = translate(
            &ComponentRegistry::default(),
            &instance,
            &translation_nodes(),
            fragments,
            &evaluator(&[]),
            &mut diagnostics,
        )
        .unwrap();

        let node = &translated.node;
        assert_eq!(node.field("distance").unwrap().depends_on(), Some("transformations/component_0"));
        assert_eq!(node.field("pinned").unwrap().depends_on(), Some("."));
        assert_eq!(node.field("after").unwrap().depends_on(), Some("transformations/tilt"));
        assert_eq!(translated.outer.as_deref(), Some("tilt"));
        assert_eq!(node.depends_on(), Some("transformations/tilt"));
        assert!(translated.chain_overridden);
    }

    #[test]
    fn broken_chain_extension_is_structural() {
        let instance = instance("Arm", &[]);
        let fragments = fragments_from_json(
            &json!({
                "transformations": {"type": "NXtransformations", "value": {
                    "fork": {"type": "NXfield", "value": 3.0, "attributes": {"depends_on": "."}}
                }}
            }),
            true,
        );
        let mut diagnostics = Diagnostics::new();
        let result = translate(
            &ComponentRegistry::default(),
            &instance,
            &translation_nodes(),
            fragments,
            &evaluator(&[]),
            &mut diagnostics,
        );
        assert!(matches!(result, Err(StructuralError::Chain(_))));
    }

    #[test]
    fn foreign_transformations_fragment_is_rejected() {
        let instance = instance("Arm", &[]);
        let fragments = fragments_from_json(
            &json!({
                "transformations": {"type": "NXcollection", "value": {
                    "note": {"type": "NXfield", "value": "not a chain"}
                }}
            }),
            true,
        );
        let mut diagnostics = Diagnostics::new();
        let translated = translate(
            &ComponentRegistry::default(),
            &instance,
            &translation_nodes(),
            fragments,
            &evaluator(&[]),
            &mut diagnostics,
        )
        .unwrap();

        let group = translated.node.group(TRANSFORMATIONS).unwrap();
        assert_eq!(group.class(), "NXtransformations");
        assert!(group.field("component_0").is_some());
        assert!(group.field("note").is_none());
        assert_eq!(translated.node.depends_on(), Some("transformations/component_0"));
        assert!(!translated.chain_overridden);
        assert_eq!(diagnostics.of_kind(DiagnosticKind::InvalidFragment).count(), 1);
    }

    #[test]
    fn missing_parameter_suggests_close_name() {
        let instance = instance("Guide", &[("w1", Expr::number(0.1)), ("mm", Expr::number(2.0))]);
        let (_, diagnostics) = build(&instance, &evaluator(&[]));
        let messages: Vec<&str> = diagnostics
            .of_kind(DiagnosticKind::UnresolvedParameter)
            .map(|diagnostic| diagnostic.message.as_str())
            .collect();
        assert!(messages.contains(&"parameter `m` is not set (did you mean `mm`?)"));
    }

    #[test]
    fn runtime_magnitude_becomes_deferred() {
        let chain = OrientationChain::new(vec![OrientationPart::translation(
            Expr::zero(),
            Expr::zero(),
            Expr::ident("L"),
        )]);
        let nodes = chain_nodes("component", &chain).unwrap();
        let mut diagnostics = Diagnostics::new();
        let translated = translate(
            &ComponentRegistry::default(),
            &instance("Arm", &[]),
            &nodes,
            Fragments::default(),
            &evaluator(&["L"]),
            &mut diagnostics,
        )
        .unwrap();
        let group = translated.node.group(TRANSFORMATIONS).unwrap();
        let field = group.field("component_0").unwrap();
        let deferred = field.value.expect_deferred().unwrap();
        assert_eq!(deferred.links[0].target, "/entry/instrument/parameters/L");
        assert!(diagnostics.has(DiagnosticKind::DeferredBinding));
    }
}
