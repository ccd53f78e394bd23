//! Shared test utilities for layout and mutation testing

use crate::{config::LineageConfig, tree::FamilyTree};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn session_from(lines: &[&str]) -> FamilyTree {
    init_logging();
    let (session, diagnostics) = FamilyTree::from_lines(lines, LineageConfig::default());
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    session
}

/// Three generations: grandparents @F1@ (@I1@ + @I2@) with children @I3@ and @I4@; @I3@ marries
/// @I5@ in @F2@ and they have @I6@ and @I7@.
pub fn three_generations() -> FamilyTree {
    session_from(&[
        "0 @I1@ INDI",
        "1 NAME Grandfather",
        "1 SEX M",
        "1 FAMS @F1@",
        "0 @I2@ INDI",
        "1 NAME Grandmother",
        "1 SEX F",
        "1 FAMS @F1@",
        "0 @I3@ INDI",
        "1 NAME Son",
        "1 SEX M",
        "1 FAMC @F1@",
        "1 FAMS @F2@",
        "0 @I4@ INDI",
        "1 NAME Daughter",
        "1 SEX F",
        "1 FAMC @F1@",
        "0 @I5@ INDI",
        "1 NAME Daughter-in-law",
        "1 SEX F",
        "1 FAMS @F2@",
        "0 @I6@ INDI",
        "1 NAME Grandchild A",
        "1 FAMC @F2@",
        "0 @I7@ INDI",
        "1 NAME Grandchild B",
        "1 FAMC @F2@",
        "0 @F1@ FAM",
        "1 HUSB @I1@",
        "1 WIFE @I2@",
        "1 CHIL @I3@",
        "1 CHIL @I4@",
        "0 @F2@ FAM",
        "1 HUSB @I3@",
        "1 WIFE @I5@",
        "1 CHIL @I6@",
        "1 CHIL @I7@",
    ])
}

/// A man married twice: @I1@ with @I2@ in @F1@ and with @I3@ in @F2@, one child in each.
pub fn two_marriages() -> FamilyTree {
    session_from(&[
        "0 @I1@ INDI",
        "1 SEX M",
        "1 FAMS @F1@",
        "1 FAMS @F2@",
        "0 @I2@ INDI",
        "1 SEX F",
        "1 FAMS @F1@",
        "0 @I3@ INDI",
        "1 SEX F",
        "1 FAMS @F2@",
        "0 @I4@ INDI",
        "1 FAMC @F1@",
        "0 @I5@ INDI",
        "1 FAMC @F2@",
        "0 @F1@ FAM",
        "1 HUSB @I1@",
        "1 WIFE @I2@",
        "1 CHIL @I4@",
        "0 @F2@ FAM",
        "1 HUSB @I1@",
        "1 WIFE @I3@",
        "1 CHIL @I5@",
    ])
}
