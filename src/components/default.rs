//! Generieke bouwer: klasse en velden volgen uit de schematabellen.

use crate::graph::TargetNode;

use super::schema::{class_for, fields_for};
use super::{BuildContext, Component};

/// Markerstruct voor de generieke bouwer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentImpl;

impl Component for ComponentImpl {
    fn build(&self, context: &mut BuildContext<'_>) -> TargetNode {
        let component_type = &context.instance().component_type;
        let class = class_for(&component_type.name, component_type.category.as_deref());
        let mut node = TargetNode::new(class);
        for (target, parameter) in fields_for(class) {
            if let Some(field) = context.field(parameter, None) {
                node.insert_field(*target, field);
            }
        }
        node
    }
}
