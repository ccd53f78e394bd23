//! Referential integrity checks over a parsed tree.
//!
//! Layout tolerates bad links by skipping them; this module lists them all up front so an import
//! can be reviewed before it is edited.

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};
use serde::Serialize;

use crate::{
    diagnostic::Diagnostic,
    index::GraphIndex,
    record::{RecordTree, TAG_CHIL, TAG_FAMC, TAG_FAMS, TAG_HUSB, TAG_WIFE},
};

#[derive(Debug, Clone, Default, Serialize)]
pub struct IntegrityReport {
    pub diagnostics: Vec<Diagnostic>,
    /// Sets of individuals that are, through FAMC/CHIL links, their own ancestors.
    pub ancestry_cycles: Vec<Vec<String>>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && self.ancestry_cycles.is_empty()
    }
}

pub fn validate(tree: &RecordTree, index: &GraphIndex) -> IntegrityReport {
    let mut report = IntegrityReport::default();

    for (id, &record) in index.individuals() {
        for famc in tree.pointers(record, TAG_FAMC) {
            match index.family(&famc) {
                None => report
                    .diagnostics
                    .push(Diagnostic::dangling(&famc, id, TAG_FAMC)),
                Some(family) if !tree.points_to(family, TAG_CHIL, id) => {
                    report.diagnostics.push(Diagnostic::MissingBacklink {
                        from: id.clone(),
                        tag: TAG_FAMC.to_string(),
                        to: famc.clone(),
                        expected: TAG_CHIL.to_string(),
                    })
                }
                Some(_) => {}
            }
        }
        for fams in tree.pointers(record, TAG_FAMS) {
            match index.family(&fams) {
                None => report
                    .diagnostics
                    .push(Diagnostic::dangling(&fams, id, TAG_FAMS)),
                Some(family)
                    if !tree.points_to(family, TAG_HUSB, id)
                        && !tree.points_to(family, TAG_WIFE, id) =>
                {
                    report.diagnostics.push(Diagnostic::MissingBacklink {
                        from: id.clone(),
                        tag: TAG_FAMS.to_string(),
                        to: fams.clone(),
                        expected: format!("{TAG_HUSB}/{TAG_WIFE}"),
                    })
                }
                Some(_) => {}
            }
        }
    }

    for (id, &record) in index.families() {
        for (tag, expected) in [(TAG_HUSB, TAG_FAMS), (TAG_WIFE, TAG_FAMS), (TAG_CHIL, TAG_FAMC)] {
            for member in tree.pointers(record, tag) {
                match index.individual(&member) {
                    None => report.diagnostics.push(Diagnostic::dangling(&member, id, tag)),
                    Some(individual) if !tree.points_to(individual, expected, id) => {
                        report.diagnostics.push(Diagnostic::MissingBacklink {
                            from: id.clone(),
                            tag: tag.to_string(),
                            to: member.clone(),
                            expected: expected.to_string(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }
    }

    report.ancestry_cycles = ancestry_cycles(tree, index);
    for cycle in report.ancestry_cycles.iter() {
        tracing::warn!("[validate] ancestry cycle through {}", cycle.join(", "));
    }
    tracing::debug!(
        "[validate] {} diagnostics, {} ancestry cycles",
        report.diagnostics.len(),
        report.ancestry_cycles.len()
    );
    report
}

/// Strongly connected components of the child → parent graph that contain a cycle.
fn ancestry_cycles(tree: &RecordTree, index: &GraphIndex) -> Vec<Vec<String>> {
    let parents_by_family = index
        .families()
        .values()
        .map(|&record| {
            let parents = [TAG_HUSB, TAG_WIFE]
                .iter()
                .flat_map(|tag| tree.pointers(record, tag))
                .collect::<Vec<_>>();
            let children = tree.pointers(record, TAG_CHIL);
            (parents, children)
        })
        .collect::<Vec<_>>();

    let mut graph = DiGraphMap::<&str, ()>::new();
    for (parents, children) in parents_by_family.iter() {
        for child in children.iter() {
            graph.add_node(child.as_str());
            for parent in parents.iter() {
                graph.add_edge(child.as_str(), parent.as_str(), ());
            }
        }
    }

    tarjan_scc(&graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|node| graph.contains_edge(*node, *node))
        })
        .map(|component| {
            let mut ids = component.into_iter().map(str::to_string).collect::<Vec<_>>();
            ids.sort();
            ids
        })
        .collect()
}
