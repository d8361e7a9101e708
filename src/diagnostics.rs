//! Verzameling van niet-fatale meldingen die tijdens een export ontstaan.
//!
//! Elke melding wordt ook naar de `log`-facade gespiegeld, zodat een
//! ontwikkelaar ze in de console ziet terwijl de aanroeper ze gestructureerd
//! terugkrijgt.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// Soort melding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Er is geen referentiecomponent; posities blijven absoluut.
    NotCentered,
    /// Meer dan één kandidaat-referentie; de eerste wordt gebruikt.
    MultipleReferences,
    /// Een waarde hangt af van instrumentparameters die pas bij het draaien
    /// bekend zijn.
    DeferredBinding,
    /// Een parameter blijft symbolisch zonder bekende afhankelijkheden.
    UnresolvedParameter,
    /// Een parametrisatie wordt niet volledig ondersteund.
    UnsupportedParametrization,
    /// Een gegenereerde mesh heeft ontaarde vlakken of ringen.
    DegenerateGeometry,
    /// Een component moet extern verschoven worden.
    ExternalTranslation,
    /// Een hulpfragment werd afgewezen.
    InvalidFragment,
    /// Een component werd overgeslagen na een structurele fout.
    SkippedComponent,
}

impl DiagnosticKind {
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::DeferredBinding => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
        };
        match &self.component {
            Some(component) => write!(f, "{level}: {component}: {}", self.message),
            None => write!(f, "{level}: {}", self.message),
        }
    }
}

/// Geordende verzameling meldingen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Voeg een melding toe; de ernst volgt uit de soort.
    pub fn push(&mut self, kind: DiagnosticKind, component: Option<&str>, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            severity: kind.severity(),
            kind,
            component: component.map(str::to_owned),
            message: message.into(),
        };
        match diagnostic.severity {
            Severity::Warning => log::warn!("{diagnostic}"),
            Severity::Info => log::info!("{diagnostic}"),
        }
        self.records.push(diagnostic);
    }

    /// Melding over een specifieke component.
    pub fn component(&mut self, kind: DiagnosticKind, component: &str, message: impl Into<String>) {
        self.push(kind, Some(component), message);
    }

    /// Melding over het instrument als geheel.
    pub fn instrument(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(kind, None, message);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.records.extend(other.records);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(move |diagnostic| diagnostic.kind == kind)
    }

    #[must_use]
    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.of_kind(kind).next().is_some()
    }

    #[must_use]
    pub fn warnings(&self) -> usize {
        self.records
            .iter()
            .filter(|diagnostic| diagnostic.severity == Severity::Warning)
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{DiagnosticKind, Diagnostics, Severity};

    #[test]
    fn severity_follows_kind() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.component(DiagnosticKind::DeferredBinding, "chopper", "nu depends on E");
        diagnostics.instrument(DiagnosticKind::NotCentered, "no sample");

        let severities: Vec<Severity> = diagnostics.iter().map(|d| d.severity).collect();
        assert_eq!(severities, vec![Severity::Info, Severity::Warning]);
        assert_eq!(diagnostics.warnings(), 1);
        assert!(diagnostics.has(DiagnosticKind::NotCentered));
        assert!(!diagnostics.has(DiagnosticKind::SkippedComponent));
    }

    #[test]
    fn serializes_as_a_flat_list() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.component(DiagnosticKind::InvalidFragment, "slit", "bad name");
        let json = serde_json::to_string(&diagnostics).unwrap();
        assert_eq!(
            json,
            r#"[{"severity":"warning","kind":"invalid_fragment","component":"slit","message":"bad name"}]"#
        );
    }
}
