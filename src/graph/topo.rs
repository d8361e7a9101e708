//! Ketenresolutie voor `depends_on`-afhankelijkheden.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::node::{Child, TargetNode};

/// Marker voor het absolute assenstelsel.
pub const ABSOLUTE: &str = ".";

/// Fouttype voor een verzameling transformaties die geen enkele lineaire
/// keten vormt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Elke node verwijst naar een andere node uit de verzameling.
    NoExternalTarget,
    /// Meerdere nodes verwijzen naar verschillende externe doelen.
    MultipleExternalTargets { targets: Vec<String> },
    /// Meerdere nodes hangen af van dezelfde voorganger.
    Branch { after: String, candidates: Vec<String> },
    /// De wandeling stopt voordat alle nodes bezocht zijn.
    Disconnected { after: String, unreached: Vec<String> },
    /// De onbereikte nodes verwijzen alleen naar elkaar.
    Cycle { nodes: Vec<String> },
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoExternalTarget => {
                f.write_str("keten heeft geen extern aanknopingspunt")
            }
            Self::MultipleExternalTargets { targets } => {
                write!(f, "keten heeft meerdere externe doelen: {}", targets.join(", "))
            }
            Self::Branch { after, candidates } => write!(
                f,
                "keten vertakt na `{after}`: {}",
                candidates.join(", ")
            ),
            Self::Disconnected { after, unreached } => write!(
                f,
                "keten breekt af na `{after}`; niet bereikt: {}",
                unreached.join(", ")
            ),
            Self::Cycle { nodes } => {
                write!(f, "keten bevat een cyclus: {}", nodes.join(" -> "))
            }
        }
    }
}

impl std::error::Error for ChainError {}

/// Zoekt de laatste (meest afhankelijke) node van een lineaire keten.
///
/// `links` bevat per node de naam en het `depends_on`-doel. Een lege
/// verzameling heeft geen eindnode; een verzameling van één node levert die
/// node zonder verdere controle.
pub fn outer_dependency<'a, I>(links: I) -> Result<Option<String>, ChainError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let depends: BTreeMap<&str, &str> = links.into_iter().collect();
    if depends.is_empty() {
        return Ok(None);
    }
    if depends.len() == 1 {
        return Ok(depends.keys().next().map(|name| (*name).to_owned()));
    }

    let external: BTreeSet<&str> = depends
        .values()
        .copied()
        .filter(|target| !depends.contains_key(target))
        .collect();
    let root_target = match external.len() {
        0 => return Err(ChainError::NoExternalTarget),
        1 => external.iter().next().copied().unwrap_or(ABSOLUTE),
        _ => {
            return Err(ChainError::MultipleExternalTargets {
                targets: external.iter().map(|target| (*target).to_owned()).collect(),
            });
        }
    };

    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut current = root_target;
    while visited.len() < depends.len() {
        let next = successors(&depends, current);
        match next.as_slice() {
            [single] => {
                visited.insert(*single);
                current = *single;
            }
            [] => {
                let unreached: Vec<&str> = depends
                    .keys()
                    .copied()
                    .filter(|name| !visited.contains(name))
                    .collect();
                return Err(disconnected(current, &unreached, &depends));
            }
            several => {
                return Err(ChainError::Branch {
                    after: current.to_owned(),
                    candidates: several.iter().map(|name| (*name).to_owned()).collect(),
                });
            }
        }
    }

    Ok(Some(current.to_owned()))
}

fn successors<'a>(depends: &BTreeMap<&'a str, &'a str>, previous: &str) -> Vec<&'a str> {
    depends
        .iter()
        .filter(|(_, target)| **target == previous)
        .map(|(name, _)| *name)
        .collect()
}

fn disconnected(after: &str, unreached: &[&str], depends: &BTreeMap<&str, &str>) -> ChainError {
    let closed = unreached.iter().all(|name| {
        depends
            .get(name)
            .is_some_and(|target| unreached.contains(target))
    });
    if closed {
        if let Some(start) = unreached.first() {
            let mut nodes = vec![(*start).to_owned()];
            let mut cursor = *start;
            while let Some(target) = depends.get(cursor).copied() {
                nodes.push(target.to_owned());
                if target == *start || nodes.len() > unreached.len() {
                    break;
                }
                cursor = target;
            }
            return ChainError::Cycle { nodes };
        }
    }
    ChainError::Disconnected {
        after: after.to_owned(),
        unreached: unreached.iter().map(|name| (*name).to_owned()).collect(),
    }
}

/// Zoekt de eindnode van de velden in een `NXtransformations`-groep.
/// Velden zonder `depends_on` hangen af van het absolute assenstelsel.
pub fn outer_transformation(group: &TargetNode) -> Result<Option<String>, ChainError> {
    let links: Vec<(&str, &str)> = group
        .children()
        .filter_map(|(name, child)| match child {
            Child::Field(field) => Some((name, field.depends_on().unwrap_or(ABSOLUTE))),
            Child::Group(_) => None,
        })
        .collect();
    outer_dependency(links)
}

#[cfg(test)]
mod tests {
    use super::{ChainError, outer_dependency, outer_transformation};
    use crate::graph::node::{Field, TargetNode};

    #[test]
    fn finds_terminal_of_linear_chain() {
        let links = [("b", "a"), ("a", "."), ("c", "b")];
        assert_eq!(outer_dependency(links), Ok(Some("c".to_owned())));
    }

    #[test]
    fn chain_may_hang_off_a_foreign_node() {
        let links = [("x_1", "/entry/other/x_0"), ("x_2", "x_1")];
        assert_eq!(outer_dependency(links), Ok(Some("x_2".to_owned())));
    }

    #[test]
    fn single_and_empty_sets() {
        assert_eq!(outer_dependency([("only", "somewhere")]), Ok(Some("only".to_owned())));
        assert_eq!(outer_dependency(Vec::<(&str, &str)>::new()), Ok(None));
    }

    #[test]
    fn rejects_two_roots() {
        let links = [("a", "."), ("b", "/elsewhere")];
        assert!(matches!(
            outer_dependency(links),
            Err(ChainError::MultipleExternalTargets { .. })
        ));
    }

    #[test]
    fn rejects_missing_root() {
        let links = [("a", "b"), ("b", "a")];
        assert_eq!(outer_dependency(links), Err(ChainError::NoExternalTarget));
    }

    #[test]
    fn rejects_branch() {
        let links = [("a", "."), ("b", "a"), ("c", "a")];
        let err = outer_dependency(links).unwrap_err();
        assert_eq!(
            err,
            ChainError::Branch {
                after: "a".to_owned(),
                candidates: vec!["b".to_owned(), "c".to_owned()],
            }
        );
    }

    #[test]
    fn reports_detached_cycle() {
        let links = [("a", "."), ("b", "c"), ("c", "b")];
        let err = outer_dependency(links).unwrap_err();
        assert!(matches!(err, ChainError::Cycle { ref nodes } if nodes.len() == 3));
        assert!(err.to_string().contains("cyclus"));
    }

    #[test]
    fn reads_links_from_transformation_group() {
        let mut group = TargetNode::new("NXtransformations");
        group.insert_field("g_0", Field::new(1.0).with_attribute("depends_on", "."));
        group.insert_field("g_1", Field::new(2.0).with_attribute("depends_on", "g_0"));
        assert_eq!(outer_transformation(&group), Ok(Some("g_1".to_owned())));
    }
}
