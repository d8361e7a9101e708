//! Three-way classification of component parameter expressions.

use std::collections::BTreeSet;

use serde::Serialize;

use super::{Bindings, Expr};

/// Where a runtime-only value will be found once the instrument runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeLink {
    pub parameter: String,
    pub target: String,
}

/// A value that can only be known at run time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeferredValue {
    /// The expression as written.
    pub expression: String,
    /// The expression after static substitution.
    pub resolved: String,
    pub links: Vec<RuntimeLink>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Constant(f64),
    Text(String),
    Deferred(DeferredValue),
    /// Symbolic, but none of the remaining names are known anywhere.
    Unresolved {
        expression: String,
        unbound: Vec<String>,
    },
}

impl Resolution {
    #[must_use]
    pub fn constant(&self) -> Option<f64> {
        match self {
            Self::Constant(value) => Some(*value),
            _ => None,
        }
    }
}

/// Resolves expressions against static bindings and the set of runtime-only
/// instrument parameters.
#[derive(Debug, Clone)]
pub struct ParameterEvaluator {
    bindings: Bindings,
    runtime: BTreeSet<String>,
    namespace: String,
}

impl ParameterEvaluator {
    pub fn new(
        bindings: Bindings,
        runtime: impl IntoIterator<Item = String>,
        namespace: impl Into<String>,
    ) -> Self {
        let runtime: BTreeSet<String> = runtime.into_iter().collect();
        // runtime parameters shadow static bindings and built-in constants
        let mut bindings = bindings;
        for name in &runtime {
            bindings.insert(name.clone(), Expr::ident(name.clone()));
        }
        Self {
            bindings,
            runtime,
            namespace: namespace.into().trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Static substitution only.
    #[must_use]
    pub fn evaluate(&self, expr: &Expr) -> Expr {
        expr.evaluate(&self.bindings)
    }

    #[must_use]
    pub fn resolve(&self, expr: &Expr) -> Resolution {
        let evaluated = self.evaluate(expr);
        match &evaluated {
            Expr::Number(value) => return Resolution::Constant(*value),
            Expr::Text(text) => return Resolution::Text(text.clone()),
            _ => {}
        }

        let (runtime, unbound): (Vec<String>, Vec<String>) = evaluated
            .free_variables()
            .into_iter()
            .partition(|name| self.runtime.contains(name));

        if runtime.is_empty() {
            return Resolution::Unresolved {
                expression: expr.to_string(),
                unbound,
            };
        }

        let links = runtime
            .into_iter()
            .map(|parameter| RuntimeLink {
                target: format!("{}/{parameter}", self.namespace),
                parameter,
            })
            .collect();

        Resolution::Deferred(DeferredValue {
            expression: expr.to_string(),
            resolved: evaluated.to_string(),
            links,
        })
    }
}
