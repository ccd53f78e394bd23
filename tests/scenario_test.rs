mod common;

use common::{init_logging, SCENARIO_A};
use lineage_core::{
    config::LineageConfig,
    record::{TAG_FAMS, TAG_HUSB, TAG_WIFE},
    tree::{FamilyTree, Sex},
    Diagnostic,
};
use test_log::test;

fn scenario_a() -> FamilyTree {
    init_logging();
    let (session, diagnostics) = FamilyTree::from_lines(SCENARIO_A, LineageConfig::default());
    assert!(diagnostics.is_empty());
    session
}

#[test]
fn test_scenario_a_parents_above_child() {
    let session = scenario_a();
    let layout = session.layout().unwrap();

    assert_eq!(layout.row_of("@F1@"), Some(0));
    assert_eq!(layout.row_of("@I2@"), Some(0));
    assert_eq!(layout.row_of("@I3@"), Some(0));
    assert_eq!(layout.row_of("@I1@"), Some(1));
    assert_eq!(layout.row(0).unwrap().ids(), vec!["@I2@", "@F1@", "@I3@"]);
}

#[test]
fn test_scenario_b_add_spouse_creates_family() {
    let mut session = scenario_a();
    let partner = session.add_spouse("@I1@").unwrap();

    let me = session.individual("@I1@").unwrap();
    let fams = session.records().pointers(me, TAG_FAMS);
    assert_eq!(fams.len(), 1);
    let family = session.family(&fams[0]).unwrap();

    // @I1@ is SEX M, so it is HUSB and the partner takes WIFE
    assert!(session.records().points_to(family, TAG_HUSB, "@I1@"));
    assert!(session.records().points_to(family, TAG_WIFE, &partner));
    let partner_record = session.individual(&partner).unwrap();
    assert_eq!(session.sex_of(partner_record), Sex::Female);
    assert!(session.validate().is_clean());
}

#[test]
fn test_scenario_c_delete_father_keeps_family() {
    let mut session = scenario_a();
    let removed = session.delete_individual("@I2@").unwrap();

    assert_eq!(removed.individuals, vec!["@I2@".to_string()]);
    assert!(removed.families.is_empty());
    assert!(session.index().individual("@I2@").is_none());

    let family = session.family("@F1@").unwrap();
    let record = session.records().get(family).unwrap();
    assert!(!record.has_field(TAG_HUSB));
    assert!(record.has_field(TAG_WIFE));
    assert!(record.has_field("CHIL"));
}

#[test]
fn test_scenario_d_two_marriages() {
    init_logging();
    let (session, _) = FamilyTree::from_lines(
        [
            "0 @I1@ INDI",
            "1 SEX F",
            "1 FAMS @F1@",
            "1 FAMS @F2@",
            "0 @I2@ INDI",
            "1 SEX M",
            "1 FAMS @F1@",
            "0 @I3@ INDI",
            "1 SEX M",
            "1 FAMS @F2@",
            "0 @F1@ FAM",
            "1 HUSB @I2@",
            "1 WIFE @I1@",
            "0 @F2@ FAM",
            "1 HUSB @I3@",
            "1 WIFE @I1@",
        ],
        LineageConfig::default(),
    );
    let layout = session.layout().unwrap();

    let row = layout.row(0).unwrap();
    assert_eq!(row.len(), 5);
    assert_eq!(layout.row_of("@I1@"), Some(0));
    assert_eq!(layout.row_of("@F1@"), Some(0));
    assert_eq!(layout.row_of("@F2@"), Some(0));
    assert!(layout.rows.get(&1).is_none());
}

#[test]
fn test_scenario_e_nested_date() {
    let (session, _) = FamilyTree::from_lines(
        ["0 @I1@ INDI", "1 BIRT", "2 DATE 15 JAN 1990"],
        LineageConfig::default(),
    );
    let me = session.individual("@I1@").unwrap();
    let date = session.records().lookup(me, &["BIRT", "DATE"]).unwrap();
    assert_eq!(
        session.records().get(date).unwrap().value.as_deref(),
        Some("15 JAN 1990")
    );
}

#[test]
fn test_cascade_removes_emptied_families() {
    let (mut session, _) = FamilyTree::from_lines(
        [
            "0 @I1@ INDI",
            "1 FAMS @F1@",
            "1 FAMS @F2@",
            "0 @F1@ FAM",
            "1 HUSB @I1@",
            "0 @F2@ FAM",
            "1 WIFE @I1@",
        ],
        LineageConfig::default(),
    );
    let removed = session.delete_individual("@I1@").unwrap();
    assert_eq!(removed.families, vec!["@F1@".to_string(), "@F2@".to_string()]);
    assert!(session.index().families().is_empty());
    assert!(session.index().individuals().is_empty());
}

#[test]
fn test_cascade_only_unlinks_orphaned_members() {
    let (mut session, _) = FamilyTree::from_lines(
        [
            "0 @I1@ INDI",
            "1 FAMS @F1@",
            "0 @I2@ INDI",
            "1 FAMS @F1@",
            "0 @F1@ FAM",
            "1 HUSB @I1@",
            "1 WIFE @I2@",
        ],
        LineageConfig::default(),
    );
    // @F1@ still has a WIFE after @I1@ goes, so nothing cascades
    assert!(session.delete_individual("@I1@").unwrap().families.is_empty());
    // now the family empties out; @I2@'s own FAMS was removed with the record, nothing dangles
    let removed = session.delete_individual("@I2@").unwrap();
    assert_eq!(removed.families, vec!["@F1@".to_string()]);
    assert!(session.validate().is_clean());
}

#[test]
fn test_empty_session_reports_nothing_to_display() {
    let (mut session, _) = FamilyTree::from_lines(["0 @I1@ INDI"], LineageConfig::default());
    session.delete_individual("@I1@").unwrap();
    assert_eq!(
        session.layout().unwrap_err(),
        lineage_core::LineageError::EmptyGraph
    );
}

#[test]
fn test_dangling_famc_reported_during_layout() {
    let (session, _) = FamilyTree::from_lines(
        ["0 @I1@ INDI", "1 FAMC @F7@"],
        LineageConfig::default(),
    );
    let layout = session.layout().unwrap();
    assert_eq!(layout.anchor, "@I1@");
    assert!(layout
        .diagnostics
        .contains(&Diagnostic::dangling("@F7@", "@I1@", "FAMC")));
    assert!(!layout.is_complete());
}
