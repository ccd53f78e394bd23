//! The editing session: one record tree plus the index derived from it.

use crate::{
    codec::{LineParser, LineWriter},
    config::LineageConfig,
    diagnostic::Diagnostic,
    error::LineageError,
    index::GraphIndex,
    layout::{Layout, LayoutEngine, LayoutOptions},
    record::{RecordId, RecordTree, TAG_SEX},
    validate::{validate, IntegrityReport},
};

/// Sex as read from a SEX field. Anything other than `M`/`F` is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

impl Sex {
    pub fn from_value(value: Option<&str>) -> Sex {
        match value.map(str::trim) {
            Some("M") => Sex::Male,
            Some("F") => Sex::Female,
            _ => Sex::Unknown,
        }
    }

    pub fn as_value(&self) -> Option<&'static str> {
        match self {
            Sex::Male => Some("M"),
            Sex::Female => Some("F"),
            Sex::Unknown => None,
        }
    }
}

/// What an edit operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Individual(String),
    Family(String),
}

/// Owns the record tree and keeps the [`GraphIndex`] in step with it.
///
/// Every structural mutation ends with an index rebuild, so readers never see an index that
/// disagrees with the tree. Layout is computed on demand and never cached.
#[derive(Debug, Clone)]
pub struct FamilyTree {
    pub(crate) tree: RecordTree,
    pub(crate) index: GraphIndex,
    pub(crate) config: LineageConfig,
}

impl Default for FamilyTree {
    fn default() -> Self {
        FamilyTree::new(LineageConfig::default())
    }
}

impl FamilyTree {
    /// A session holding the built-in starter tree.
    pub fn new(config: LineageConfig) -> FamilyTree {
        let (tree, _) = FamilyTree::from_lines(Vec::<String>::new(), config);
        tree
    }

    pub fn from_lines<I, S>(lines: I, config: LineageConfig) -> (FamilyTree, Vec<Diagnostic>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parser = LineParser::with_starter(config.starter.clone());
        parser.extend(lines);
        let outcome = parser.finish();
        let index = GraphIndex::rebuild(&outcome.tree);
        (
            FamilyTree {
                tree: outcome.tree,
                index,
                config,
            },
            outcome.diagnostics,
        )
    }

    pub fn from_text(text: &str, config: LineageConfig) -> (FamilyTree, Vec<Diagnostic>) {
        FamilyTree::from_lines(text.lines(), config)
    }

    pub fn records(&self) -> &RecordTree {
        &self.tree
    }

    pub fn index(&self) -> &GraphIndex {
        &self.index
    }

    pub fn config(&self) -> &LineageConfig {
        &self.config
    }

    pub fn rebuild_index(&mut self) {
        self.index.rebuild_mut(&self.tree);
    }

    pub fn individual(&self, id: &str) -> Result<RecordId, LineageError> {
        self.index
            .individual(id)
            .ok_or_else(|| LineageError::not_found("individual", id))
    }

    pub fn family(&self, id: &str) -> Result<RecordId, LineageError> {
        self.index
            .family(id)
            .ok_or_else(|| LineageError::not_found("family", id))
    }

    pub fn sex_of(&self, individual: RecordId) -> Sex {
        Sex::from_value(self.tree.value_of(individual, TAG_SEX))
    }

    pub fn layout(&self) -> Result<Layout, LineageError> {
        let options = LayoutOptions::from(&self.config.layout);
        LayoutEngine::with_options(&self.tree, &self.index, options).run()
    }

    pub fn validate(&self) -> IntegrityReport {
        validate(&self.tree, &self.index)
    }

    pub fn to_lines(&self) -> Vec<String> {
        LineWriter::serialize(&self.tree)
    }

    pub fn to_text(&self) -> String {
        LineWriter::to_text(&self.tree)
    }
}
