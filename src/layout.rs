//! Generation/order placement of individuals and families for diagram rendering.
//!
//! The layout is a breadth-first walk over the family graph:
//!
//! 1. **Anchor discovery**: starting from the first individual (or the configured one), follow
//!    FAMC → HUSB upwards until the paternal line ends. That topmost ancestor is the anchor.
//! 2. **Frontier expansion**: from a family, spouses share its row and children go one row down;
//!    from an individual, its FAMS families share its row and its FAMC family goes one row up.
//!    A neighbor's row is fixed the first time it is discovered.
//! 3. **Row placement**: when a node is dequeued it is inserted into its row next to an already
//!    placed relative. A family goes right of its husband or left of its wife; an individual goes
//!    left of a family it heads as HUSB or right of one it belongs to as WIFE.
//! 4. **Normalization**: rows are shifted so the smallest one is 0.
//!
//! Traversal bookkeeping lives in a side table owned by one [`LayoutEngine`] run, so repeated
//! layouts never observe stale state on the records themselves.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

use crate::{
    config::{LayoutConfig, DEFAULT_MAX_ANCESTOR_STEPS},
    diagnostic::Diagnostic,
    error::LineageError,
    index::GraphIndex,
    record::{
        RecordId, RecordTree, TAG_CHIL, TAG_FAMC, TAG_FAMS, TAG_HUSB, TAG_INDI, TAG_ORDER,
        TAG_WIFE,
    },
};

/// Row given to the anchor before normalization.
pub const ANCHOR_ROW: i32 = -1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum NodeKind {
    Individual,
    Family,
}

impl NodeKind {
    fn of(tree: &RecordTree, record: RecordId) -> NodeKind {
        match tree.get(record) {
            Some(r) if r.tag == TAG_INDI => NodeKind::Individual,
            _ => NodeKind::Family,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutNode {
    pub id: String,
    pub kind: NodeKind,
    pub record: RecordId,
}

/// The nodes of one row, left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RowBucket {
    nodes: Vec<LayoutNode>,
}

impl RowBucket {
    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Position of the first node with this id, of either kind.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    /// Position of the node with this id and kind. Individual and family ids are separate
    /// namespaces, so `@X1@` may name one of each.
    pub fn position_of_kind(&self, kind: NodeKind, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.kind == kind && n.id == id)
    }

    pub fn push(&mut self, node: LayoutNode) {
        self.nodes.push(node);
    }

    /// Inserts right of `reference`, or at the end when `reference` is not in this row.
    pub fn insert_after(&mut self, kind: NodeKind, reference: &str, node: LayoutNode) {
        match self.position_of_kind(kind, reference) {
            Some(pos) => self.nodes.insert(pos + 1, node),
            None => self.nodes.push(node),
        }
    }

    /// Inserts left of `reference`, or at the front when `reference` is not in this row.
    pub fn insert_before(&mut self, kind: NodeKind, reference: &str, node: LayoutNode) {
        match self.position_of_kind(kind, reference) {
            Some(pos) => self.nodes.insert(pos, node),
            None => self.nodes.insert(0, node),
        }
    }
}

/// Result of one layout run. Rows start at 0.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Layout {
    pub anchor: String,
    pub rows: BTreeMap<usize, RowBucket>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Layout {
    pub fn row(&self, row: usize) -> Option<&RowBucket> {
        self.rows.get(&row)
    }

    /// Row and left-to-right position of a node.
    pub fn position_of(&self, id: &str) -> Option<(usize, usize)> {
        self.rows
            .iter()
            .find_map(|(row, bucket)| bucket.position(id).map(|order| (*row, order)))
    }

    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.position_of(id).map(|(row, _)| row)
    }

    pub fn node_count(&self) -> usize {
        self.rows.values().map(RowBucket::len).sum()
    }

    /// No dangling references were met while laying out.
    pub fn is_complete(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_dangling_reference)
    }

    pub fn to_json(&self) -> Result<String, LineageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutOptions {
    pub max_ancestor_steps: usize,
    pub anchor: Option<String>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            max_ancestor_steps: DEFAULT_MAX_ANCESTOR_STEPS,
            anchor: None,
        }
    }
}

impl From<&LayoutConfig> for LayoutOptions {
    fn from(config: &LayoutConfig) -> Self {
        LayoutOptions {
            max_ancestor_steps: config.max_ancestor_steps,
            anchor: config.anchor.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TraversalState {
    visited: bool,
    row: Option<i32>,
}

pub struct LayoutEngine<'a> {
    tree: &'a RecordTree,
    index: &'a GraphIndex,
    options: LayoutOptions,
    state: BTreeMap<RecordId, TraversalState>,
    queue: VecDeque<(RecordId, NodeKind)>,
    rows: BTreeMap<i32, RowBucket>,
    diagnostics: Vec<Diagnostic>,
}

/// Lays out `tree` with default options. `index` must have been rebuilt from `tree`.
pub fn layout(tree: &RecordTree, index: &GraphIndex) -> Result<Layout, LineageError> {
    LayoutEngine::new(tree, index).run()
}

impl<'a> LayoutEngine<'a> {
    pub fn new(tree: &'a RecordTree, index: &'a GraphIndex) -> LayoutEngine<'a> {
        LayoutEngine::with_options(tree, index, LayoutOptions::default())
    }

    pub fn with_options(
        tree: &'a RecordTree,
        index: &'a GraphIndex,
        options: LayoutOptions,
    ) -> LayoutEngine<'a> {
        LayoutEngine {
            tree,
            index,
            options,
            state: BTreeMap::new(),
            queue: VecDeque::new(),
            rows: BTreeMap::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn run(mut self) -> Result<Layout, LineageError> {
        let anchor = self.find_anchor()?;
        let anchor_id = self.id_of(anchor);
        tracing::debug!("[LayoutEngine::run] anchor {}", anchor_id);

        self.discover(anchor, NodeKind::Individual, ANCHOR_ROW);
        while let Some((current, kind)) = self.queue.pop_front() {
            let entry = self.state.entry(current).or_default();
            if entry.visited {
                continue;
            }
            entry.visited = true;
            let Some(row) = entry.row else {
                tracing::error!("[LayoutEngine::run] {} dequeued without a row", current);
                continue;
            };
            self.place(current, kind, row);
            self.expand(current, kind, row);
        }

        self.report_unreachable();
        Ok(self.normalize(anchor_id))
    }

    fn id_of(&self, record: RecordId) -> String {
        self.tree
            .get(record)
            .and_then(|r| r.id.clone())
            .unwrap_or_default()
    }

    fn is_visited(&self, record: RecordId) -> bool {
        self.state.get(&record).is_some_and(|s| s.visited)
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        if !self.diagnostics.contains(&diagnostic) {
            tracing::warn!("[LayoutEngine] {}", diagnostic);
            self.diagnostics.push(diagnostic);
        }
    }

    /// The father of `individual` through its first FAMC, if both resolve.
    fn paternal_parent(&mut self, individual: RecordId) -> Option<RecordId> {
        let famc = self.tree.pointers(individual, TAG_FAMC).into_iter().next()?;
        let Some(family) = self.index.family(&famc) else {
            let referrer = self.id_of(individual);
            self.report(Diagnostic::dangling(&famc, &referrer, TAG_FAMC));
            return None;
        };
        let husband = self.tree.pointers(family, TAG_HUSB).into_iter().next()?;
        self.index.individual(&husband)
    }

    fn find_anchor(&mut self) -> Result<RecordId, LineageError> {
        let start_id = match self.options.anchor.clone() {
            Some(id) => id,
            None => self
                .index
                .first_individual()
                .map(str::to_string)
                .ok_or(LineageError::EmptyGraph)?,
        };
        let start = self
            .index
            .individual(&start_id)
            .ok_or_else(|| LineageError::not_found("individual", &start_id))?;

        let mut current = start;
        for _ in 0..self.options.max_ancestor_steps {
            match self.paternal_parent(current) {
                Some(father) => current = father,
                None => return Ok(current),
            }
        }
        if self.paternal_parent(current).is_none() {
            return Ok(current);
        }
        tracing::error!(
            "[LayoutEngine::find_anchor] paternal walk from {} did not terminate",
            start_id
        );
        Err(LineageError::AncestorBound {
            start: start_id,
            steps: self.options.max_ancestor_steps,
        })
    }

    /// Fixes the row of a newly seen node (first discovery wins) and queues it.
    fn discover(&mut self, record: RecordId, kind: NodeKind, row: i32) {
        let entry = self.state.entry(record).or_default();
        if entry.row.is_none() {
            entry.row = Some(row);
        }
        self.queue.push_back((record, kind));
    }

    fn place(&mut self, record: RecordId, kind: NodeKind, row: i32) {
        let id = self.id_of(record);
        let mut after = None;
        let mut before = None;

        match kind {
            NodeKind::Family => {
                let husband = self.tree.pointers(record, TAG_HUSB).into_iter().next();
                if let Some(h) = husband.filter(|h| self.visited_individual(h)) {
                    after = Some(h);
                }
                let wife = self.tree.pointers(record, TAG_WIFE).into_iter().next();
                if let Some(w) = wife.filter(|w| self.visited_individual(w)) {
                    before = Some(w);
                }
            }
            NodeKind::Individual => {
                for fams in self.tree.pointers(record, TAG_FAMS) {
                    let Some(family) = self.index.family(&fams) else {
                        self.report(Diagnostic::dangling(&fams, &id, TAG_FAMS));
                        continue;
                    };
                    if !self.is_visited(family) {
                        continue;
                    }
                    if self.tree.points_to(family, TAG_HUSB, &id) {
                        before = Some(fams);
                        break;
                    }
                    if self.tree.points_to(family, TAG_WIFE, &id) {
                        after = Some(fams);
                        break;
                    }
                }
            }
        }

        let node = LayoutNode {
            id,
            kind,
            record,
        };
        // families anchor on spouses, individuals on families
        let reference_kind = match kind {
            NodeKind::Family => NodeKind::Individual,
            NodeKind::Individual => NodeKind::Family,
        };
        let bucket = self.rows.entry(row).or_default();
        match (after, before) {
            (Some(reference), _) => bucket.insert_after(reference_kind, &reference, node),
            (None, Some(reference)) => bucket.insert_before(reference_kind, &reference, node),
            (None, None) => bucket.push(node),
        }
    }

    fn visited_individual(&self, id: &str) -> bool {
        self.index
            .individual(id)
            .is_some_and(|record| self.is_visited(record))
    }

    fn expand(&mut self, record: RecordId, kind: NodeKind, row: i32) {
        match kind {
            NodeKind::Family => {
                self.enqueue_batch(record, &[TAG_HUSB, TAG_WIFE], NodeKind::Individual, row);
                self.enqueue_batch(record, &[TAG_CHIL], NodeKind::Individual, row + 1);
            }
            NodeKind::Individual => {
                self.enqueue_batch(record, &[TAG_FAMS], NodeKind::Family, row);
                self.enqueue_batch(record, &[TAG_FAMC], NodeKind::Family, row - 1);
            }
        }
    }

    /// Queues every unvisited target of `tags`, ordered by ORDER when the whole batch has one.
    fn enqueue_batch(&mut self, source: RecordId, tags: &[&str], kind: NodeKind, row: i32) {
        let source_id = self.id_of(source);
        let mut batch = Vec::new();
        for tag in tags {
            for target in self.tree.pointers(source, tag) {
                let resolved = match kind {
                    NodeKind::Individual => self.index.individual(&target),
                    NodeKind::Family => self.index.family(&target),
                };
                match resolved {
                    Some(record) if !self.is_visited(record) => batch.push(record),
                    Some(_) => {}
                    None => self.report(Diagnostic::dangling(&target, &source_id, tag)),
                }
            }
        }

        self.sort_by_order(&mut batch);
        for record in batch {
            self.discover(record, kind, row);
        }
    }

    fn sort_by_order(&self, batch: &mut [RecordId]) {
        if batch.len() < 2 {
            return;
        }
        let keys = batch
            .iter()
            .map(|record| {
                self.tree
                    .value_of(*record, TAG_ORDER)
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .filter(|key| key.is_finite())
            })
            .collect::<Option<Vec<f64>>>();
        let Some(keys) = keys else {
            return;
        };
        let mut keyed = keys.into_iter().zip(batch.iter().copied()).collect::<Vec<_>>();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (slot, (_, record)) in batch.iter_mut().zip(keyed) {
            *slot = record;
        }
    }

    fn report_unreachable(&mut self) {
        let unreachable = self
            .index
            .individual_ids()
            .filter(|id| {
                self.index
                    .individual(id)
                    .is_some_and(|record| !self.is_visited(record))
            })
            .map(str::to_string)
            .collect::<Vec<_>>();
        if !unreachable.is_empty() {
            tracing::info!(
                "[LayoutEngine] {} individuals not connected to the anchor",
                unreachable.len()
            );
            self.diagnostics.push(Diagnostic::Unreachable(unreachable));
        }
    }

    fn normalize(self, anchor: String) -> Layout {
        let min_row = self.rows.keys().next().copied().unwrap_or(0);
        let rows = self
            .rows
            .into_iter()
            .map(|(row, bucket)| ((row - min_row) as usize, bucket))
            .collect();
        Layout {
            anchor,
            rows,
            diagnostics: self.diagnostics,
        }
    }
}
