//! Nodes van de NeXus-doelboom: groepen met een klasse, geordende kinderen
//! en attributen.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use super::value::Value;

/// Attribuutnaam die de afhankelijkheid van een node of veld vastlegt.
pub const DEPENDS_ON: &str = "depends_on";

/// Een veld met een waarde en optionele attributen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub value: Value,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

impl Field {
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Zet een attribuut en geeft het veld terug voor chaining.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// De tekstuele `depends_on` van dit veld, indien aanwezig.
    #[must_use]
    pub fn depends_on(&self) -> Option<&str> {
        self.attribute(DEPENDS_ON).and_then(|value| value.expect_text().ok())
    }
}

/// Kind van een groep: een subgroep of een veld.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Group(TargetNode),
    Field(Field),
}

impl Serialize for Child {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Group(node) => node.serialize(serializer),
            Self::Field(field) => field.serialize(serializer),
        }
    }
}

/// Groep in de doelboom. De invoegvolgorde van kinderen blijft bewaard;
/// opzoeken gebeurt op naam.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetNode {
    class: String,
    children: BTreeMap<String, Child>,
    order: Vec<String>,
    attributes: BTreeMap<String, Value>,
}

impl TargetNode {
    /// Maak een lege groep van de gegeven NeXus-klasse.
    #[must_use]
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            children: BTreeMap::new(),
            order: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Voeg een kind toe. Een bestaand kind met dezelfde naam wordt
    /// vervangen en behoudt zijn positie.
    pub fn insert(&mut self, name: impl Into<String>, child: Child) {
        let name = name.into();
        if !self.children.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.children.insert(name, child);
    }

    /// Voeg een veld toe.
    pub fn insert_field(&mut self, name: impl Into<String>, field: Field) {
        self.insert(name, Child::Field(field));
    }

    /// Voeg een subgroep toe.
    pub fn insert_group(&mut self, name: impl Into<String>, group: TargetNode) {
        self.insert(name, Child::Group(group));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Child> {
        self.children.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self.children.get(name) {
            Some(Child::Field(field)) => Some(field),
            _ => None,
        }
    }

    #[must_use]
    pub fn group(&self, name: &str) -> Option<&TargetNode> {
        match self.children.get(name) {
            Some(Child::Group(group)) => Some(group),
            _ => None,
        }
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut TargetNode> {
        match self.children.get_mut(name) {
            Some(Child::Group(group)) => Some(group),
            _ => None,
        }
    }

    /// Namen van de kinderen in invoegvolgorde.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Consumeert de groep en levert de kinderen in invoegvolgorde.
    #[must_use]
    pub fn into_children(mut self) -> Vec<(String, Child)> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|name| self.children.remove(&name).map(|child| (name, child)))
            .collect()
    }

    /// Kinderen in invoegvolgorde.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Child)> {
        self.order.iter().filter_map(|name| {
            self.children
                .get(name)
                .map(|child| (name.as_str(), child))
        })
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// De tekstuele `depends_on` van deze groep, indien aanwezig.
    #[must_use]
    pub fn depends_on(&self) -> Option<&str> {
        self.attribute(DEPENDS_ON).and_then(|value| value.expect_text().ok())
    }
}

struct OrderedChildren<'a>(&'a TargetNode);

impl Serialize for OrderedChildren<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, child) in self.0.children() {
            map.serialize_entry(name, child)?;
        }
        map.end()
    }
}

impl Serialize for TargetNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("NX_class", &self.class)?;
        if !self.attributes.is_empty() {
            map.serialize_entry("attributes", &self.attributes)?;
        }
        if !self.order.is_empty() {
            map.serialize_entry("children", &OrderedChildren(self))?;
        }
        map.end()
    }
}
