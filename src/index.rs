//! Id lookup over a parsed [`RecordTree`].
//!
//! The index is derived data. It is rebuilt from the root's INDI and FAM collections after
//! parsing and after every structural mutation, and can always be thrown away and recomputed.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::record::{RecordId, RecordTree, TAG_FAM, TAG_INDI};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphIndex {
    individuals: BTreeMap<String, RecordId>,
    families: BTreeMap<String, RecordId>,
    /// Individual ids in document order; the maps are sorted by id string.
    individual_order: Vec<String>,
}

impl GraphIndex {
    pub fn rebuild(tree: &RecordTree) -> GraphIndex {
        let mut index = GraphIndex::default();
        index.rebuild_mut(tree);
        index
    }

    /// Clears and repopulates both maps. Safe to call any number of times.
    pub fn rebuild_mut(&mut self, tree: &RecordTree) {
        self.individuals.clear();
        self.families.clear();
        self.individual_order.clear();

        for record_id in tree.top_level(TAG_INDI) {
            if let Some(id) = tree.get(record_id).and_then(|r| r.id.clone()) {
                if self.individuals.contains_key(&id) {
                    tracing::warn!("[GraphIndex::rebuild] duplicate individual id {}", id);
                    continue;
                }
                self.individuals.insert(id.clone(), record_id);
                self.individual_order.push(id);
            } else {
                tracing::warn!("[GraphIndex::rebuild] INDI record {} has no id", record_id);
            }
        }
        for record_id in tree.top_level(TAG_FAM) {
            if let Some(id) = tree.get(record_id).and_then(|r| r.id.clone()) {
                if self.families.contains_key(&id) {
                    tracing::warn!("[GraphIndex::rebuild] duplicate family id {}", id);
                    continue;
                }
                self.families.insert(id, record_id);
            } else {
                tracing::warn!("[GraphIndex::rebuild] FAM record {} has no id", record_id);
            }
        }
        tracing::debug!(
            "[GraphIndex::rebuild] {} individuals, {} families",
            self.individuals.len(),
            self.families.len()
        );
    }

    pub fn individual(&self, id: &str) -> Option<RecordId> {
        self.individuals.get(id).copied()
    }

    pub fn family(&self, id: &str) -> Option<RecordId> {
        self.families.get(id).copied()
    }

    pub fn individuals(&self) -> &BTreeMap<String, RecordId> {
        &self.individuals
    }

    pub fn families(&self) -> &BTreeMap<String, RecordId> {
        &self.families
    }

    /// Individual ids in the order they appear in the file.
    pub fn individual_ids(&self) -> impl Iterator<Item = &str> {
        self.individual_order.iter().map(String::as_str)
    }

    pub fn first_individual(&self) -> Option<&str> {
        self.individual_order.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty() && self.families.is_empty()
    }

    /// Looks an id up in both namespaces, individuals first.
    pub fn resolve(&self, id: &str) -> Option<RecordId> {
        self.individual(id).or_else(|| self.family(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::LineParser;

    #[test]
    fn test_rebuild_is_idempotent() {
        let outcome = LineParser::parse(Vec::<String>::new());
        let first = GraphIndex::rebuild(&outcome.tree);
        let mut second = first.clone();
        second.rebuild_mut(&outcome.tree);
        assert_eq!(first, second);
        assert_eq!(first.individuals().len(), 3);
        assert_eq!(first.families().len(), 1);
    }

    #[test]
    fn test_no_top_level_collections_gives_empty_maps() {
        let outcome = LineParser::parse(["0 HEAD", "0 TRLR"]);
        let index = GraphIndex::rebuild(&outcome.tree);
        assert!(index.is_empty());
        assert_eq!(index.first_individual(), None);
    }

    #[test]
    fn test_document_order_differs_from_map_order() {
        let outcome = LineParser::parse(["0 @I2@ INDI", "0 @I10@ INDI"]);
        let index = GraphIndex::rebuild(&outcome.tree);
        assert_eq!(index.first_individual(), Some("@I2@"));
        assert_eq!(
            index.individuals().keys().next().map(String::as_str),
            Some("@I10@")
        );
        assert_eq!(index.individual_ids().collect::<Vec<_>>(), vec!["@I2@", "@I10@"]);
    }

    #[test]
    fn test_single_indi_is_indexed() {
        let outcome = LineParser::parse(["0 @I1@ INDI", "0 @F1@ FAM"]);
        let index = GraphIndex::rebuild(&outcome.tree);
        assert!(index.individual("@I1@").is_some());
        assert!(index.family("@F1@").is_some());
        assert!(index.individual("@F1@").is_none());
        assert_eq!(index.resolve("@F1@"), index.family("@F1@"));
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let outcome = LineParser::parse(["0 @I1@ INDI", "1 NAME A", "0 @I1@ INDI", "1 NAME B"]);
        let index = GraphIndex::rebuild(&outcome.tree);
        let record = index.individual("@I1@").unwrap();
        assert_eq!(outcome.tree.value_of(record, "NAME"), Some("A"));
        assert_eq!(index.individual_ids().count(), 1);
    }
}
