//! The universal node type of a parsed family file and the arena that owns it.
//!
//! Every line of input becomes one [`Record`]. Records live in a [`RecordTree`] arena and refer to
//! each other by [`RecordId`]; the owning direction is always root → children, the `parent` link is
//! a plain index used for level-walking and for finding a record's level-0 owner.
//!
//! Children are grouped by tag into a [`Field`], which is either a single record or an ordered
//! sequence. Relationship tags ([`RELATIONSHIP_TAGS`]) are always stored as a sequence so that
//! multiple marriages and multiple children never need a representation change.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const TAG_ROOT: &str = "ROOT";
pub const TAG_INDI: &str = "INDI";
pub const TAG_FAM: &str = "FAM";
pub const TAG_NAME: &str = "NAME";
pub const TAG_SEX: &str = "SEX";
pub const TAG_ORDER: &str = "ORDER";
pub const TAG_FAMC: &str = "FAMC";
pub const TAG_FAMS: &str = "FAMS";
pub const TAG_HUSB: &str = "HUSB";
pub const TAG_WIFE: &str = "WIFE";
pub const TAG_CHIL: &str = "CHIL";

/// Tags that link individuals and families. Always stored as [`Field::Many`].
pub const RELATIONSHIP_TAGS: [&str; 5] = [TAG_FAMS, TAG_FAMC, TAG_CHIL, TAG_HUSB, TAG_WIFE];

/// Level of the synthetic root record; every level-0 line attaches directly beneath it.
pub const ROOT_LEVEL: i32 = -1;

pub fn is_relationship_tag(tag: &str) -> bool {
    RELATIONSHIP_TAGS.contains(&tag)
}

/// Index of a record inside its [`RecordTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub usize);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A child slot keyed by tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    One(RecordId),
    Many(Vec<RecordId>),
}

impl Field {
    pub fn ids(&self) -> &[RecordId] {
        match self {
            Field::One(id) => std::slice::from_ref(id),
            Field::Many(ids) => ids.as_slice(),
        }
    }

    pub fn first(&self) -> Option<RecordId> {
        self.ids().first().copied()
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }

    pub fn is_many(&self) -> bool {
        matches!(self, Field::Many(_))
    }

    /// Appends `id`, promoting a single child to a sequence on the second occurrence.
    pub fn push(&mut self, id: RecordId) {
        match self {
            Field::One(existing) => *self = Field::Many(vec![*existing, id]),
            Field::Many(ids) => ids.push(id),
        }
    }

    /// Removes `id` and reports whether it was present.
    fn remove(&mut self, id: RecordId) -> bool {
        match self {
            Field::One(existing) => *existing == id,
            Field::Many(ids) => {
                let before = ids.len();
                ids.retain(|other| *other != id);
                before != ids.len()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub level: i32,
    pub id: Option<String>,
    pub tag: String,
    pub value: Option<String>,
    pub parent: Option<RecordId>,
    fields: Vec<(String, Field)>,
}

impl Record {
    pub fn new(level: i32, tag: impl Into<String>) -> Record {
        Record {
            level,
            id: None,
            tag: tag.into(),
            value: None,
            parent: None,
            fields: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Record {
        self.id = Some(id.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Record {
        self.value = Some(value.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.level == ROOT_LEVEL && self.parent.is_none()
    }

    pub fn field(&self, tag: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(field_tag, _)| field_tag == tag)
            .map(|(_, field)| field)
    }

    /// Child ids under `tag`, empty when the tag is absent.
    pub fn child_ids(&self, tag: &str) -> &[RecordId] {
        self.field(tag).map(Field::ids).unwrap_or(&[])
    }

    /// Fields in first-insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(tag, field)| (tag.as_str(), field))
    }

    pub fn has_field(&self, tag: &str) -> bool {
        self.field(tag).is_some_and(|field| !field.is_empty())
    }

    fn attach(&mut self, tag: &str, child: RecordId) {
        if let Some((_, field)) = self.fields.iter_mut().find(|(t, _)| t == tag) {
            field.push(child);
        } else if is_relationship_tag(tag) {
            self.fields.push((tag.to_string(), Field::Many(vec![child])));
        } else {
            self.fields.push((tag.to_string(), Field::One(child)));
        }
    }

    /// Drops `child` from the `tag` slot; an emptied slot is removed entirely.
    fn detach(&mut self, tag: &str, child: RecordId) -> bool {
        let Some(pos) = self.fields.iter().position(|(t, _)| t == tag) else {
            return false;
        };
        let removed = self.fields[pos].1.remove(child);
        let emptied = match &self.fields[pos].1 {
            Field::One(existing) => *existing == child,
            Field::Many(ids) => ids.is_empty(),
        };
        if emptied {
            self.fields.remove(pos);
        }
        removed
    }
}

/// Arena owning every record of one parsed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordTree {
    slots: Vec<Option<Record>>,
    root: RecordId,
}

impl Default for RecordTree {
    fn default() -> Self {
        RecordTree::new()
    }
}

impl RecordTree {
    pub fn new() -> RecordTree {
        RecordTree {
            slots: vec![Some(Record::new(ROOT_LEVEL, TAG_ROOT))],
            root: RecordId(0),
        }
    }

    pub fn root(&self) -> RecordId {
        self.root
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live records, the synthetic root included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Stores `record` under `parent`, keyed by its tag. Returns `None` if `parent` is gone.
    pub fn insert(&mut self, parent: RecordId, mut record: Record) -> Option<RecordId> {
        if !self.contains(parent) {
            return None;
        }
        let id = RecordId(self.slots.len());
        let tag = record.tag.clone();
        record.parent = Some(parent);
        self.slots.push(Some(record));
        if let Some(owner) = self.get_mut(parent) {
            owner.attach(&tag, id);
        }
        Some(id)
    }

    /// Unlinks `id` from its parent and frees it together with its whole subtree.
    pub fn remove(&mut self, id: RecordId) -> Option<Record> {
        if id == self.root {
            return None;
        }
        let (parent, tag) = {
            let record = self.get(id)?;
            (record.parent, record.tag.clone())
        };
        if let Some(owner) = parent.and_then(|p| self.get_mut(p)) {
            owner.detach(&tag, id);
        }
        let mut pending = vec![id];
        let mut removed = None;
        while let Some(next) = pending.pop() {
            if let Some(record) = self.slots.get_mut(next.0).and_then(Option::take) {
                pending.extend(record.fields().flat_map(|(_, f)| f.ids().to_vec()));
                if next == id {
                    removed = Some(record);
                }
            }
        }
        removed
    }

    /// Removes every `tag` child of `id`, returning how many were dropped.
    pub fn remove_field(&mut self, id: RecordId, tag: &str) -> usize {
        let children = self
            .get(id)
            .map(|record| record.child_ids(tag).to_vec())
            .unwrap_or_default();
        for child in children.iter() {
            self.remove(*child);
        }
        children.len()
    }

    /// All direct children of `id` in field order, then insertion order within a field.
    pub fn children(&self, id: RecordId) -> Vec<RecordId> {
        self.get(id)
            .map(|record| {
                record
                    .fields()
                    .flat_map(|(_, field)| field.ids().iter().copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The records filed under `tag` beneath the root (e.g. every INDI).
    pub fn top_level(&self, tag: &str) -> Vec<RecordId> {
        self.get(self.root)
            .map(|root| root.child_ids(tag).to_vec())
            .unwrap_or_default()
    }

    pub fn child(&self, id: RecordId, tag: &str) -> Option<RecordId> {
        self.get(id)?.field(tag)?.first()
    }

    /// Follows a chain of tags, e.g. `["BIRT", "DATE"]`, taking the first child at each step.
    pub fn lookup(&self, id: RecordId, path: &[&str]) -> Option<RecordId> {
        path.iter().try_fold(id, |current, tag| self.child(current, tag))
    }

    pub fn value_of(&self, id: RecordId, tag: &str) -> Option<&str> {
        self.get(self.child(id, tag)?)?.value.as_deref()
    }

    /// The target ids of pointer children under `tag`, such as every `FAMS @F1@`.
    pub fn pointers(&self, id: RecordId, tag: &str) -> Vec<String> {
        self.get(id)
            .map(|record| {
                record
                    .child_ids(tag)
                    .iter()
                    .filter_map(|child| self.get(*child)?.id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether a `tag` pointer child of `id` targets `target`.
    pub fn points_to(&self, id: RecordId, tag: &str, target: &str) -> bool {
        self.pointers(id, tag).iter().any(|p| p == target)
    }

    /// Appends a pointer child `<level+1> <tag> <target>` beneath `id`.
    pub fn add_pointer(&mut self, id: RecordId, tag: &str, target: &str) -> Option<RecordId> {
        let level = self.get(id)?.level + 1;
        self.insert(id, Record::new(level, tag).with_id(target))
    }

    /// Removes every `tag` pointer child of `id` that targets `target`.
    pub fn remove_pointer(&mut self, id: RecordId, tag: &str, target: &str) -> usize {
        let matching = self
            .get(id)
            .map(|record| {
                record
                    .child_ids(tag)
                    .iter()
                    .copied()
                    .filter(|child| {
                        self.get(*child)
                            .is_some_and(|c| c.id.as_deref() == Some(target))
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        for child in matching.iter() {
            self.remove(*child);
        }
        matching.len()
    }

    /// Walks parent links up to the level-0 record that owns `id`.
    pub fn owner(&self, id: RecordId) -> Option<RecordId> {
        let mut current = id;
        loop {
            let record = self.get(current)?;
            match record.parent {
                Some(parent) if parent != self.root => current = parent,
                Some(_) => return Some(current),
                None => return None,
            }
        }
    }
}
