//! Structural edits: adding relatives, deleting records, editing plain fields.
//!
//! Every operation resolves the ids it needs before touching the tree, so a failed lookup leaves
//! the session unchanged. Each successful structural edit ends with an index rebuild.
//!
//! Deleting an individual strips it from every family's HUSB/WIFE/CHIL and removes any family
//! left without members. That family removal only unlinks its remaining members' FAMC/FAMS; an
//! individual orphaned this way is kept.

use crate::{
    codec::{is_id_token, is_pointer_tag},
    error::LineageError,
    record::{
        is_relationship_tag, Record, RecordId, TAG_CHIL, TAG_FAM, TAG_FAMC, TAG_FAMS, TAG_HUSB,
        TAG_INDI, TAG_NAME, TAG_SEX, TAG_WIFE,
    },
    tree::{FamilyTree, Selection, Sex},
};

/// Ids removed by a delete operation, the cascade included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Removed {
    pub individuals: Vec<String>,
    pub families: Vec<String>,
}

fn spouse_tag(sex: Sex) -> &'static str {
    match sex {
        Sex::Male => TAG_HUSB,
        // Absent or unrecognized SEX files the individual as WIFE.
        Sex::Female | Sex::Unknown => TAG_WIFE,
    }
}

fn internal(what: &str) -> LineageError {
    LineageError::InvalidOperation(format!("could not attach {what} to the record tree"))
}

/// A tag must be one whitespace-free token that cannot be read as an id.
fn check_tag(tag: &str) -> Result<(), LineageError> {
    if tag.is_empty() || tag.starts_with('@') || tag.chars().any(char::is_whitespace) {
        return Err(LineageError::InvalidOperation(format!(
            "{tag:?} is not a valid tag"
        )));
    }
    Ok(())
}

/// Splits an edited value into the `(id, value)` pair the parser would read back from
/// `<level> <tag> <value>`.
///
/// Line breaks would split the record, so they are refused. Runs of whitespace collapse to one
/// space. An id-shaped value is a cross-reference on pointer tags and refused anywhere else.
fn field_content(
    tag: &str,
    value: &str,
) -> Result<(Option<String>, Option<String>), LineageError> {
    if value.contains(['\n', '\r']) {
        return Err(LineageError::InvalidOperation(format!(
            "{tag} value must be a single line"
        )));
    }
    let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if is_id_token(&value) {
        if is_pointer_tag(tag) {
            return Ok((Some(value), None));
        }
        return Err(LineageError::InvalidOperation(format!(
            "{tag} value {value} would be read back as a record id"
        )));
    }
    Ok((None, (!value.is_empty()).then_some(value)))
}

impl FamilyTree {
    /// First unused `@<prefix><n>@`, trying n = count + 1 upwards.
    pub fn allocate_id(&self, prefix: char) -> String {
        let taken = match prefix {
            'F' => self.index.families(),
            _ => self.index.individuals(),
        };
        let mut n = taken.len() + 1;
        loop {
            let candidate = format!("@{prefix}{n}@");
            if !taken.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn create_individual(&mut self, sex: Sex) -> Result<(String, RecordId), LineageError> {
        let id = self.allocate_id('I');
        let root = self.tree.root();
        let record = self
            .tree
            .insert(root, Record::new(0, TAG_INDI).with_id(id.clone()))
            .ok_or_else(|| internal("individual"))?;
        let name = self.config.mutation.unknown_name.clone();
        self.tree.insert(record, Record::new(1, TAG_NAME).with_value(name));
        if let Some(value) = sex.as_value() {
            self.tree.insert(record, Record::new(1, TAG_SEX).with_value(value));
        }
        self.rebuild_index();
        tracing::debug!("[FamilyTree::create_individual] created {}", id);
        Ok((id, record))
    }

    fn create_family(&mut self) -> Result<(String, RecordId), LineageError> {
        let id = self.allocate_id('F');
        let root = self.tree.root();
        let record = self
            .tree
            .insert(root, Record::new(0, TAG_FAM).with_id(id.clone()))
            .ok_or_else(|| internal("family"))?;
        self.rebuild_index();
        tracing::debug!("[FamilyTree::create_family] created {}", id);
        Ok((id, record))
    }

    /// Writes both directions of a relationship: `individual <ind_tag> family` and
    /// `family <fam_tag> individual`.
    fn link(
        &mut self,
        individual: (&str, RecordId),
        ind_tag: &str,
        family: (&str, RecordId),
        fam_tag: &str,
    ) -> Result<(), LineageError> {
        self.tree
            .add_pointer(individual.1, ind_tag, family.0)
            .ok_or_else(|| internal(ind_tag))?;
        self.tree
            .add_pointer(family.1, fam_tag, individual.0)
            .ok_or_else(|| internal(fam_tag))?;
        Ok(())
    }

    /// The first FAMC family of `id`, created and linked when there is none.
    ///
    /// Only the first FAMC entry is considered.
    pub fn create_or_get_family_of_child(&mut self, id: &str) -> Result<String, LineageError> {
        let individual = self.individual(id)?;
        if let Some(famc) = self.tree.pointers(individual, TAG_FAMC).into_iter().next() {
            self.index
                .family(&famc)
                .ok_or_else(|| LineageError::DanglingReference {
                    missing: famc.clone(),
                    referrer: id.to_string(),
                    tag: TAG_FAMC.to_string(),
                })?;
            return Ok(famc);
        }
        let (family_id, family) = self.create_family()?;
        self.link((id, individual), TAG_FAMC, (family_id.as_str(), family), TAG_CHIL)?;
        self.rebuild_index();
        Ok(family_id)
    }

    /// The first FAMS family of `id`, created when there is none. A new family files the
    /// individual as HUSB when SEX is `M` and as WIFE otherwise.
    pub fn create_or_get_family_of_partner(&mut self, id: &str) -> Result<String, LineageError> {
        let individual = self.individual(id)?;
        if let Some(fams) = self.tree.pointers(individual, TAG_FAMS).into_iter().next() {
            self.index
                .family(&fams)
                .ok_or_else(|| LineageError::DanglingReference {
                    missing: fams.clone(),
                    referrer: id.to_string(),
                    tag: TAG_FAMS.to_string(),
                })?;
            return Ok(fams);
        }
        self.new_family_with_spouse(id, individual)
    }

    fn new_family_with_spouse(
        &mut self,
        id: &str,
        individual: RecordId,
    ) -> Result<String, LineageError> {
        let slot = spouse_tag(self.sex_of(individual));
        let (family_id, family) = self.create_family()?;
        self.link((id, individual), TAG_FAMS, (family_id.as_str(), family), slot)?;
        self.rebuild_index();
        Ok(family_id)
    }

    /// Adds a partner of the opposite sex. The partner fills the open spouse slot of the first
    /// FAMS family that has one; otherwise a new family (another marriage) is started.
    pub fn add_spouse(&mut self, id: &str) -> Result<String, LineageError> {
        let individual = self.individual(id)?;
        let sex = self.sex_of(individual);
        let partner_slot = match spouse_tag(sex) {
            TAG_HUSB => TAG_WIFE,
            _ => TAG_HUSB,
        };
        let partner_sex = match sex {
            Sex::Male => Sex::Female,
            Sex::Female | Sex::Unknown => Sex::Male,
        };

        let open_family = self
            .tree
            .pointers(individual, TAG_FAMS)
            .into_iter()
            .find(|fams| {
                self.index.family(fams).is_some_and(|family| {
                    !self
                        .tree
                        .get(family)
                        .is_some_and(|f| f.has_field(partner_slot))
                })
            });
        let family_id = match open_family {
            Some(family_id) => family_id,
            None => self.new_family_with_spouse(id, individual)?,
        };
        let family = self.family(&family_id)?;

        let (partner_id, partner) = self.create_individual(partner_sex)?;
        self.link(
            (partner_id.as_str(), partner),
            TAG_FAMS,
            (family_id.as_str(), family),
            partner_slot,
        )?;
        self.rebuild_index();
        tracing::info!(
            "[FamilyTree::add_spouse] {} joined {} as {}",
            partner_id,
            family_id,
            partner_slot
        );
        Ok(partner_id)
    }

    /// Adds a child to a family, or to the first family in which an individual is a spouse.
    pub fn add_child(&mut self, selection: &Selection) -> Result<String, LineageError> {
        let family_id = match selection {
            Selection::Individual(id) => self.create_or_get_family_of_partner(id)?,
            Selection::Family(id) => {
                self.family(id)?;
                id.clone()
            }
        };
        self.add_child_to(&family_id)
    }

    /// Adds a brother or sister, creating the parents' family if needed.
    pub fn add_sibling(&mut self, id: &str) -> Result<String, LineageError> {
        let family_id = self.create_or_get_family_of_child(id)?;
        self.add_child_to(&family_id)
    }

    fn add_child_to(&mut self, family_id: &str) -> Result<String, LineageError> {
        let family = self.family(family_id)?;
        let (child_id, child) = self.create_individual(Sex::Unknown)?;
        self.link((child_id.as_str(), child), TAG_FAMC, (family_id, family), TAG_CHIL)?;
        self.rebuild_index();
        tracing::info!("[FamilyTree::add_child] {} added to {}", child_id, family_id);
        Ok(child_id)
    }

    /// Fills whichever of father and mother are missing. Returns the ids created.
    pub fn add_parents(&mut self, id: &str) -> Result<Vec<String>, LineageError> {
        self.individual(id)?;
        let family_id = self.create_or_get_family_of_child(id)?;
        let family = self.family(&family_id)?;

        let mut created = Vec::new();
        for (slot, sex) in [(TAG_HUSB, Sex::Male), (TAG_WIFE, Sex::Female)] {
            if self.tree.get(family).is_some_and(|f| f.has_field(slot)) {
                continue;
            }
            let (parent_id, parent) = self.create_individual(sex)?;
            self.link(
                (parent_id.as_str(), parent),
                TAG_FAMS,
                (family_id.as_str(), family),
                slot,
            )?;
            created.push(parent_id);
        }
        self.rebuild_index();
        tracing::info!(
            "[FamilyTree::add_parents] {} parent(s) added for {}",
            created.len(),
            id
        );
        Ok(created)
    }

    /// Removes an individual, every reference to it, and any family this leaves empty.
    pub fn delete_individual(&mut self, id: &str) -> Result<Removed, LineageError> {
        let individual = self.individual(id)?;

        let mut affected = Vec::new();
        for (family_id, family) in self.index.families().clone() {
            let mut touched = 0;
            for tag in [TAG_HUSB, TAG_WIFE, TAG_CHIL] {
                touched += self.tree.remove_pointer(family, tag, id);
            }
            if touched > 0 {
                affected.push((family_id, family));
            }
        }
        self.tree.remove(individual);

        let mut removed = Removed {
            individuals: vec![id.to_string()],
            families: Vec::new(),
        };
        for (family_id, family) in affected {
            let empty = self.tree.get(family).is_some_and(|f| {
                !f.has_field(TAG_HUSB) && !f.has_field(TAG_WIFE) && !f.has_field(TAG_CHIL)
            });
            if empty {
                self.unlink_family(family_id.as_str(), family);
                removed.families.push(family_id);
            }
        }
        self.rebuild_index();
        tracing::info!(
            "[FamilyTree::delete_individual] removed {} and {} empty famil(ies)",
            id,
            removed.families.len()
        );
        Ok(removed)
    }

    /// Removes a family and every FAMC/FAMS pointing at it. Its members are kept.
    pub fn delete_family(&mut self, id: &str) -> Result<Removed, LineageError> {
        let family = self.family(id)?;
        self.unlink_family(id, family);
        self.rebuild_index();
        tracing::info!("[FamilyTree::delete_family] removed {}", id);
        Ok(Removed {
            individuals: Vec::new(),
            families: vec![id.to_string()],
        })
    }

    fn unlink_family(&mut self, id: &str, family: RecordId) {
        for individual in self.index.individuals().values().copied().collect::<Vec<_>>() {
            self.tree.remove_pointer(individual, TAG_FAMC, id);
            self.tree.remove_pointer(individual, TAG_FAMS, id);
        }
        self.tree.remove(family);
    }

    pub fn delete(&mut self, selection: &Selection) -> Result<Removed, LineageError> {
        match selection {
            Selection::Individual(id) => self.delete_individual(id),
            Selection::Family(id) => self.delete_family(id),
        }
    }

    fn editable(&self, id: &str, tag: &str) -> Result<RecordId, LineageError> {
        check_tag(tag)?;
        if is_relationship_tag(tag) {
            return Err(LineageError::InvalidOperation(format!(
                "{tag} links records; use the relative operations instead"
            )));
        }
        self.index
            .resolve(id)
            .ok_or_else(|| LineageError::not_found("record", id))
    }

    /// Sets the value at `path` beneath a top-level record, e.g. `["BIRT", "DATE"]`, creating
    /// missing intermediate records and replacing an existing value.
    pub fn set_field(&mut self, id: &str, path: &[&str], value: &str) -> Result<(), LineageError> {
        let Some(last_tag) = path.last() else {
            return Err(LineageError::InvalidOperation("empty field path".to_string()));
        };
        let mut current = self.editable(id, path[0])?;
        if let Some(tag) = path.iter().find(|tag| is_relationship_tag(tag)) {
            return Err(LineageError::InvalidOperation(format!(
                "{tag} links records; use the relative operations instead"
            )));
        }
        for tag in path.iter() {
            check_tag(tag)?;
        }
        let (pointer, text) = field_content(last_tag, value)?;
        for tag in path.iter() {
            current = match self.tree.child(current, tag) {
                Some(child) => child,
                None => {
                    let level = self.tree.get(current).map(|r| r.level + 1).unwrap_or(1);
                    self.tree
                        .insert(current, Record::new(level, *tag))
                        .ok_or_else(|| internal(tag))?
                }
            };
        }
        if let Some(record) = self.tree.get_mut(current) {
            record.id = pointer;
            record.value = text;
        }
        tracing::debug!("[FamilyTree::set_field] {} {} = {}", id, last_tag, value);
        Ok(())
    }

    /// Appends another `tag` field, keeping existing ones.
    pub fn add_field(&mut self, id: &str, tag: &str, value: &str) -> Result<(), LineageError> {
        let record = self.editable(id, tag)?;
        let (pointer, text) = field_content(tag, value)?;
        let level = self.tree.get(record).map(|r| r.level + 1).unwrap_or(1);
        let mut field = Record::new(level, tag);
        field.id = pointer;
        field.value = text;
        self.tree
            .insert(record, field)
            .ok_or_else(|| internal(tag))?;
        Ok(())
    }

    /// Removes every `tag` field of a top-level record with its sub-fields.
    pub fn remove_field(&mut self, id: &str, tag: &str) -> Result<usize, LineageError> {
        let record = self.editable(id, tag)?;
        Ok(self.tree.remove_field(record, tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LineageConfig;

    fn starter() -> FamilyTree {
        FamilyTree::new(LineageConfig::default())
    }

    #[test]
    fn test_allocate_id_skips_taken() {
        let (session, _) = FamilyTree::from_lines(
            ["0 @I1@ INDI", "0 @I3@ INDI", "0 @F2@ FAM"],
            LineageConfig::default(),
        );
        // two individuals, so start at 3, which is taken
        assert_eq!(session.allocate_id('I'), "@I4@");
        assert_eq!(session.allocate_id('F'), "@F3@");
    }

    #[test]
    fn test_add_spouse_without_family_creates_one() {
        let mut session = starter();
        let partner = session.add_spouse("@I1@").unwrap();

        let me = session.individual("@I1@").unwrap();
        let fams = session.records().pointers(me, TAG_FAMS);
        assert_eq!(fams.len(), 1);
        let family = session.family(&fams[0]).unwrap();
        assert!(session.records().points_to(family, TAG_HUSB, "@I1@"));
        assert!(session.records().points_to(family, TAG_WIFE, &partner));

        let partner_record = session.individual(&partner).unwrap();
        assert_eq!(session.sex_of(partner_record), Sex::Female);
        assert_eq!(session.records().value_of(partner_record, TAG_NAME), Some("Unknown"));
    }

    #[test]
    fn test_add_spouse_to_full_family_starts_second_marriage() {
        let mut session = starter();
        // @I2@ is already HUSB of @F1@ with @I3@ as WIFE
        let second = session.add_spouse("@I2@").unwrap();
        let father = session.individual("@I2@").unwrap();
        let fams = session.records().pointers(father, TAG_FAMS);
        assert_eq!(fams.len(), 2);
        let new_family = session.family(&fams[1]).unwrap();
        assert!(session.records().points_to(new_family, TAG_WIFE, &second));
    }

    #[test]
    fn test_unknown_sex_defaults_to_wife_slot() {
        let (mut session, _) = FamilyTree::from_lines(["0 @I1@ INDI"], LineageConfig::default());
        let family_id = session.create_or_get_family_of_partner("@I1@").unwrap();
        let family = session.family(&family_id).unwrap();
        assert!(session.records().points_to(family, TAG_WIFE, "@I1@"));
        // second call returns the same family
        assert_eq!(session.create_or_get_family_of_partner("@I1@").unwrap(), family_id);
    }

    #[test]
    fn test_add_child_and_sibling() {
        let mut session = starter();
        let child = session
            .add_child(&Selection::Family("@F1@".to_string()))
            .unwrap();
        let sibling = session.add_sibling("@I1@").unwrap();
        let family = session.family("@F1@").unwrap();
        assert_eq!(
            session.records().pointers(family, TAG_CHIL),
            vec!["@I1@".to_string(), child.clone(), sibling.clone()]
        );
        let child_record = session.individual(&child).unwrap();
        assert_eq!(session.records().pointers(child_record, TAG_FAMC), vec!["@F1@".to_string()]);
    }

    #[test]
    fn test_add_parents_fills_only_missing_slots() {
        let mut session = starter();
        assert!(session.add_parents("@I1@").unwrap().is_empty());

        let created = session.add_parents("@I2@").unwrap();
        assert_eq!(created.len(), 2);
        let father = session.individual("@I2@").unwrap();
        let famc = session.records().pointers(father, TAG_FAMC);
        let family = session.family(&famc[0]).unwrap();
        assert!(session.records().points_to(family, TAG_HUSB, &created[0]));
        assert!(session.records().points_to(family, TAG_WIFE, &created[1]));
    }

    #[test]
    fn test_failed_lookup_leaves_tree_unchanged() {
        let mut session = starter();
        let before = session.to_lines();
        assert!(matches!(
            session.add_spouse("@I99@"),
            Err(LineageError::NotFound(_))
        ));
        assert!(session.delete_family("@F99@").is_err());
        assert_eq!(session.to_lines(), before);
    }

    #[test]
    fn test_delete_individual_keeps_nonempty_family() {
        let mut session = starter();
        let removed = session.delete_individual("@I2@").unwrap();
        assert!(removed.families.is_empty());
        assert!(session.index().individual("@I2@").is_none());
        let family = session.family("@F1@").unwrap();
        assert!(!session.records().get(family).unwrap().has_field(TAG_HUSB));
        assert!(session.records().points_to(family, TAG_WIFE, "@I3@"));
    }

    #[test]
    fn test_delete_family_unlinks_but_keeps_members() {
        let mut session = starter();
        session.delete_family("@F1@").unwrap();
        assert!(session.index().families().is_empty());
        assert_eq!(session.index().individuals().len(), 3);
        for id in ["@I1@", "@I2@", "@I3@"] {
            let record = session.individual(id).unwrap();
            assert!(session.records().pointers(record, TAG_FAMC).is_empty());
            assert!(session.records().pointers(record, TAG_FAMS).is_empty());
        }
    }

    #[test]
    fn test_field_edits() {
        let mut session = starter();
        session.set_field("@I1@", &["BIRT", "DATE"], "1 JAN 1990").unwrap();
        session.set_field("@I1@", &["BIRT", "DATE"], "2 JAN 1990").unwrap();
        let me = session.individual("@I1@").unwrap();
        let date = session.records().lookup(me, &["BIRT", "DATE"]).unwrap();
        assert_eq!(session.records().get(date).unwrap().value.as_deref(), Some("2 JAN 1990"));

        session.add_field("@I1@", "NOTE", "one").unwrap();
        session.add_field("@I1@", "NOTE", "two").unwrap();
        assert_eq!(session.remove_field("@I1@", "NOTE").unwrap(), 2);

        assert!(matches!(
            session.add_field("@I1@", TAG_FAMS, "@F1@"),
            Err(LineageError::InvalidOperation(_))
        ));
        assert!(matches!(
            session.set_field("@I1@", &[], "x"),
            Err(LineageError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_field_values_must_survive_reload() {
        let mut session = starter();
        let before = session.to_text();

        assert!(matches!(
            session.add_field("@I1@", "NOTE", "line one\nline two"),
            Err(LineageError::InvalidOperation(_))
        ));
        assert!(matches!(
            session.set_field("@I1@", &["EMAIL"], "@handle@"),
            Err(LineageError::InvalidOperation(_))
        ));
        assert!(matches!(
            session.set_field("@I1@", &["BIRT", "PLAC"], "Turin\r"),
            Err(LineageError::InvalidOperation(_))
        ));
        assert!(matches!(
            session.add_field("@I1@", "BAD TAG", "x"),
            Err(LineageError::InvalidOperation(_))
        ));
        assert_eq!(session.to_text(), before);

        session.add_field("@I1@", "NOTE", "@N1@").unwrap();
        session.set_field("@I1@", &["OCCU"], "  Clock   maker ").unwrap();
        let (reloaded, diagnostics) =
            FamilyTree::from_text(&session.to_text(), LineageConfig::default());
        assert!(diagnostics.is_empty());
        assert_eq!(reloaded.to_text(), session.to_text());

        let me = reloaded.individual("@I1@").unwrap();
        assert_eq!(reloaded.records().pointers(me, "NOTE"), vec!["@N1@".to_string()]);
        assert_eq!(reloaded.records().value_of(me, "OCCU"), Some("Clock maker"));
    }
}
