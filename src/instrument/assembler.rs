//! Assembles the `NXinstrument` tree: picks the reference component,
//! re-centers every placement on it and translates the components in
//! declaration order.

use serde_json::json;

use crate::components::{ComponentRegistry, PROVENANCE, translate};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{ExportError, StructuralError};
use crate::expr::ParameterEvaluator;
use crate::graph::{Field, TargetNode};
use crate::orientation::{OrientationChain, chain_nodes};
use crate::parse::fragments::{Fragments, fragments_from_json};

use super::options::{ExportOptions, ReferenceSelection, StructuralPolicy};
use super::{ComponentInstance, Instrument};

/// Where one component ended up.
#[derive(Debug, Clone)]
pub struct ComponentPlacement {
    pub name: String,
    /// Reduced, re-centered chain. `None` when metadata replaced part of the
    /// transformation group, so the chain no longer describes it.
    pub chain: Option<OrientationChain>,
    /// Terminal transformation inside the component's group.
    pub outer: Option<String>,
}

/// Result of an export.
#[derive(Debug, Clone)]
pub struct Export {
    pub tree: TargetNode,
    pub diagnostics: Diagnostics,
    pub placements: Vec<ComponentPlacement>,
    /// Component the scene is centered on.
    pub reference: Option<String>,
}

impl Export {
    #[must_use]
    pub fn placement(&self, name: &str) -> Option<&ComponentPlacement> {
        self.placements.iter().find(|placement| placement.name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.tree)
    }
}

/// Translates `instrument` into a target tree.
///
/// A structural failure in one component either aborts the export or skips
/// that component, depending on [`ExportOptions::structural_policy`].
pub fn export(instrument: &Instrument, options: &ExportOptions) -> Result<Export, ExportError> {
    let mut diagnostics = Diagnostics::new();
    let evaluator = ParameterEvaluator::new(
        instrument.bindings.clone(),
        instrument.runtime_names(),
        options.runtime_namespace.as_str(),
    );
    let registry = ComponentRegistry::default();

    let reference = select_reference(instrument, &options.reference, &mut diagnostics)?;
    let offset = reference.map_or_else(OrientationChain::empty, |component| {
        component.orientation.combine().evaluate(evaluator.bindings()).inverse()
    });

    let mut tree = TargetNode::new("NXinstrument");
    tree.insert_field("name", Field::new(instrument.name.as_str()));
    if options.provenance {
        tree.insert_field(PROVENANCE, Field::new(instrument.summary()));
    }

    let mut placements = Vec::with_capacity(instrument.components.len());
    for (order, instance) in instrument.components.iter().enumerate() {
        let fragments = instance
            .metadata
            .as_ref()
            .map(|metadata| fragments_from_json(metadata, options.only_nx))
            .unwrap_or_default();

        match place(&registry, instance, &offset, fragments, &evaluator, &mut diagnostics) {
            Ok((mut node, placement)) => {
                if options.provenance {
                    let source = json!({"instance": instance.to_string(), "order": order});
                    node.insert_field(PROVENANCE, Field::new(source.to_string()));
                }
                tree.insert_group(instance.name.as_str(), node);
                placements.push(placement);
            }
            Err(source) => match options.structural_policy {
                StructuralPolicy::Abort => {
                    return Err(ExportError::Structural {
                        component: instance.name.clone(),
                        source,
                    });
                }
                StructuralPolicy::Skip => {
                    diagnostics.component(
                        DiagnosticKind::SkippedComponent,
                        &instance.name,
                        format!("left out: {source}"),
                    );
                }
            },
        }
    }

    Ok(Export {
        tree,
        diagnostics,
        placements,
        reference: reference.map(|component| component.name.clone()),
    })
}

fn place(
    registry: &ComponentRegistry,
    instance: &ComponentInstance,
    offset: &OrientationChain,
    fragments: Fragments,
    evaluator: &ParameterEvaluator,
    diagnostics: &mut Diagnostics,
) -> Result<(TargetNode, ComponentPlacement), StructuralError> {
    let orientation = offset.clone() + (*instance.orientation).clone();
    let chain = orientation.combine().evaluate(evaluator.bindings()).reduce();
    log::debug!("{}: reduced chain {chain}", instance.name);

    let nodes = chain_nodes(&instance.name, &chain)?;
    let translated = translate(registry, instance, &nodes, fragments, evaluator, diagnostics)?;
    let placement = ComponentPlacement {
        name: instance.name.clone(),
        chain: (!translated.chain_overridden).then_some(chain),
        outer: translated.outer,
    };
    Ok((translated.node, placement))
}

fn select_reference<'a>(
    instrument: &'a Instrument,
    selection: &ReferenceSelection,
    diagnostics: &mut Diagnostics,
) -> Result<Option<&'a ComponentInstance>, ExportError> {
    match selection {
        ReferenceSelection::Absolute => Ok(None),
        ReferenceSelection::Named(name) => instrument
            .component(name)
            .map(Some)
            .ok_or_else(|| ExportError::UnknownReference(name.clone())),
        ReferenceSelection::Category(category) => {
            let candidates: Vec<&ComponentInstance> = instrument
                .components
                .iter()
                .filter(|component| component.category() == Some(category.as_str()))
                .collect();
            match candidates.as_slice() {
                [] => {
                    diagnostics.instrument(
                        DiagnosticKind::NotCentered,
                        format!("no `{category}` component; positions are not centered on a sample"),
                    );
                    Ok(None)
                }
                [single] => Ok(Some(*single)),
                [first, ..] => {
                    diagnostics.instrument(
                        DiagnosticKind::MultipleReferences,
                        format!(
                            "{} `{category}` components; centering on the first, `{}`",
                            candidates.len(),
                            first.name
                        ),
                    );
                    Ok(Some(*first))
                }
            }
        }
    }
}
