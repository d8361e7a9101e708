//! Basis Value-enum waarin veld- en attribuutwaarden van de doelboom
//! worden opgeslagen.

use core::fmt;

use serde::Serialize;

use crate::expr::DeferredValue;

/// Beschikbare waardetypes binnen de doelboom.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Een enkele numerieke waarde.
    Number(f64),
    /// Een geheel getal, bv. een aantal slits.
    Integer(i64),
    Boolean(bool),
    Text(String),
    /// Een 3D-vector (richting van een transformatie).
    Vector([f64; 3]),
    /// Een reeks getallen, bv. `slit_edges`.
    Numbers(Vec<f64>),
    /// Een reeks indices, bv. `winding_order` of `faces`.
    Indices(Vec<u32>),
    /// Een reeks 3D-punten (mesh-vertices).
    Points(Vec<[f64; 3]>),
    /// Een lijst van waarden.
    List(Vec<Value>),
    /// Een waarde die pas tijdens de simulatie bekend is.
    Deferred(DeferredValue),
    /// Vrije JSON-payload uit een hulpfragment.
    Json(serde_json::Value),
}

impl Value {
    /// Geeft de variantnaam terug. Wordt gebruikt in foutmeldingen.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Number(_) => ValueKind::Number,
            Self::Integer(_) => ValueKind::Integer,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Text(_) => ValueKind::Text,
            Self::Vector(_) => ValueKind::Vector,
            Self::Numbers(_) => ValueKind::Numbers,
            Self::Indices(_) => ValueKind::Indices,
            Self::Points(_) => ValueKind::Points,
            Self::List(_) => ValueKind::List,
            Self::Deferred(_) => ValueKind::Deferred,
            Self::Json(_) => ValueKind::Json,
        }
    }

    /// Verwacht een `Number` (of `Integer`) en retourneert de f64-waarde.
    pub fn expect_number(&self) -> Result<f64, ValueError> {
        match self {
            Self::Number(value) => Ok(*value),
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(value) => Ok(*value as f64),
            _ => Err(ValueError::type_mismatch("Number", self.kind())),
        }
    }

    /// Verwacht tekst en retourneert een verwijzing.
    pub fn expect_text(&self) -> Result<&str, ValueError> {
        match self {
            Self::Text(text) => Ok(text),
            _ => Err(ValueError::type_mismatch("Text", self.kind())),
        }
    }

    /// Verwacht een `Vector` en retourneert de componenten.
    pub fn expect_vector(&self) -> Result<[f64; 3], ValueError> {
        match self {
            Self::Vector(vector) => Ok(*vector),
            _ => Err(ValueError::type_mismatch("Vector", self.kind())),
        }
    }

    /// Verwacht een reeks getallen.
    pub fn expect_numbers(&self) -> Result<&[f64], ValueError> {
        match self {
            Self::Numbers(values) => Ok(values),
            _ => Err(ValueError::type_mismatch("Numbers", self.kind())),
        }
    }

    /// Verwacht een reeks indices.
    pub fn expect_indices(&self) -> Result<&[u32], ValueError> {
        match self {
            Self::Indices(values) => Ok(values),
            _ => Err(ValueError::type_mismatch("Indices", self.kind())),
        }
    }

    /// Verwacht een reeks punten.
    pub fn expect_points(&self) -> Result<&[[f64; 3]], ValueError> {
        match self {
            Self::Points(points) => Ok(points),
            _ => Err(ValueError::type_mismatch("Points", self.kind())),
        }
    }

    /// Verwacht een uitgestelde waarde.
    pub fn expect_deferred(&self) -> Result<&DeferredValue, ValueError> {
        match self {
            Self::Deferred(deferred) => Ok(deferred),
            _ => Err(ValueError::type_mismatch("Deferred", self.kind())),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Typefout voor wanneer een `Value` naar het verkeerde type wordt
/// geconverteerd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueError {
    expected: &'static str,
    found: ValueKind,
}

impl ValueError {
    #[must_use]
    pub fn type_mismatch(expected: &'static str, found: ValueKind) -> Self {
        Self { expected, found }
    }

    #[must_use]
    pub fn expected(&self) -> &'static str {
        self.expected
    }

    #[must_use]
    pub fn found(&self) -> ValueKind {
        self.found
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "verwachtte type `{}` maar kreeg `{}`",
            self.expected, self.found
        )
    }
}

impl std::error::Error for ValueError {}

/// Beschrijft het soort `Value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Integer,
    Boolean,
    Text,
    Vector,
    Numbers,
    Indices,
    Points,
    List,
    Deferred,
    Json,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Number => "Number",
            Self::Integer => "Integer",
            Self::Boolean => "Boolean",
            Self::Text => "Text",
            Self::Vector => "Vector",
            Self::Numbers => "Numbers",
            Self::Indices => "Indices",
            Self::Points => "Points",
            Self::List => "List",
            Self::Deferred => "Deferred",
            Self::Json => "Json",
        };
        f.write_str(name)
    }
}
