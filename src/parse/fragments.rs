//! Omzetting van gedecodeerde JSON-metadata naar hulpfragmenten die aan een
//! component-node gehangen worden.
//!
//! Een fragment is een mapping `naam → {type, value, attributes?}`:
//! `NXfield` levert een veld, een ander `NX*`-type een groep waarvan `value`
//! de velden bevat, en `dict` is een ontsnappingsluik voor vrije payloads dat
//! alleen geldt als `only_nx` uit staat. Alle andere waarden worden als
//! gewone velden doorgegeven.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value as Json};
use thiserror::Error;

use crate::graph::{Field, TargetNode, Value};

static NEXUS_NAME: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]([A-Za-z0-9_.]*[A-Za-z0-9_])?$"));

const FIELD_TYPE: &str = "NXfield";
const DICT_TYPE: &str = "dict";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FragmentError {
    #[error("metadata is not a mapping of fragments")]
    NotAMapping,
    #[error("`{0}` is not a valid NeXus name")]
    InvalidName(String),
    #[error("fragment `{name}` has type `{class}`, which is not a NeXus class")]
    NotNexus { name: String, class: String },
    #[error("fragment `{name}` of class `{class}` needs a mapping as value")]
    GroupValue { name: String, class: String },
}

/// Een geconverteerd fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Field(Field),
    Group(TargetNode),
}

impl Fragment {
    #[must_use]
    pub fn depends_on(&self) -> Option<&str> {
        match self {
            Self::Field(field) => field.depends_on(),
            Self::Group(group) => group.depends_on(),
        }
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<Value>) {
        match self {
            Self::Field(field) => field.set_attribute(name, value),
            Self::Group(group) => group.set_attribute(name, value),
        }
    }

    #[must_use]
    pub fn class(&self) -> Option<&str> {
        match self {
            Self::Field(_) => None,
            Self::Group(group) => Some(group.class()),
        }
    }
}

/// Geordende fragmenten plus de afgewezen entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragments {
    pub entries: Vec<(String, Fragment)>,
    pub rejected: Vec<FragmentError>,
}

impl Fragments {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Controleert of `name` een geldige NeXus-naam is.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    NEXUS_NAME.as_ref().is_ok_and(|pattern| pattern.is_match(name))
}

/// Converteert een JSON-mapping naar fragmenten in gedeclareerde volgorde.
#[must_use]
pub fn fragments_from_json(metadata: &Json, only_nx: bool) -> Fragments {
    let mut fragments = Fragments::default();
    let Json::Object(entries) = metadata else {
        fragments.rejected.push(FragmentError::NotAMapping);
        return fragments;
    };
    for (name, entry) in entries {
        match convert_entry(name, entry, only_nx) {
            Ok(fragment) => fragments.entries.push((name.clone(), fragment)),
            Err(error) => fragments.rejected.push(error),
        }
    }
    fragments
}

fn convert_entry(name: &str, entry: &Json, only_nx: bool) -> Result<Fragment, FragmentError> {
    if !is_valid_name(name) {
        return Err(FragmentError::InvalidName(name.to_owned()));
    }
    let Some((class, value, attributes)) = as_record(entry) else {
        return Ok(Fragment::Field(Field::new(json_to_value(entry))));
    };

    if class == DICT_TYPE && !only_nx {
        return Ok(Fragment::Field(Field::new(Value::Json(value.clone()))));
    }
    if !class.starts_with("NX") {
        return Err(FragmentError::NotNexus {
            name: name.to_owned(),
            class: class.to_owned(),
        });
    }

    if class == FIELD_TYPE {
        let mut field = Field::new(json_to_value(value));
        for (key, attribute) in attributes.into_iter().flatten() {
            field.set_attribute(key.as_str(), json_to_value(attribute));
        }
        return Ok(Fragment::Field(field));
    }

    let Json::Object(members) = value else {
        return Err(FragmentError::GroupValue {
            name: name.to_owned(),
            class: class.to_owned(),
        });
    };
    let mut group = TargetNode::new(class);
    for (key, attribute) in attributes.into_iter().flatten() {
        group.set_attribute(key.as_str(), json_to_value(attribute));
    }
    for (member, entry) in members {
        match convert_entry(member, entry, only_nx)? {
            Fragment::Field(field) => group.insert_field(member.as_str(), field),
            Fragment::Group(child) => group.insert_group(member.as_str(), child),
        }
    }
    Ok(Fragment::Group(group))
}

/// Een record is een object met een tekstuele `type` en een `value`.
fn as_record(entry: &Json) -> Option<(&str, &Json, Option<&Map<String, Json>>)> {
    let Json::Object(map) = entry else {
        return None;
    };
    let class = map.get("type")?.as_str()?;
    let value = map.get("value")?;
    let attributes = map.get("attributes").and_then(Json::as_object);
    Some((class, value, attributes))
}

/// Zet een JSON-waarde om naar de meest specifieke [`Value`].
#[must_use]
pub fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Bool(flag) => Value::Boolean(*flag),
        Json::Number(number) => match number.as_i64() {
            Some(integer) => Value::Integer(integer),
            None => Value::Number(number.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(text) => Value::Text(text.clone()),
        Json::Array(items) => {
            if let Some(numbers) = items.iter().map(Json::as_f64).collect::<Option<Vec<f64>>>() {
                return Value::Numbers(numbers);
            }
            if let Some(points) = items.iter().map(as_point).collect::<Option<Vec<[f64; 3]>>>() {
                return Value::Points(points);
            }
            Value::List(items.iter().map(json_to_value).collect())
        }
        Json::Null | Json::Object(_) => Value::Json(json.clone()),
    }
}

fn as_point(json: &Json) -> Option<[f64; 3]> {
    match json.as_array()?.as_slice() {
        [x, y, z] => Some([x.as_f64()?, y.as_f64()?, z.as_f64()?]),
        _ => None,
    }
}
