//! # lineage-core
//!
//! A Rust library for loading line-tagged genealogical records into an editable family graph and
//! laying that graph out as a generation-by-generation diagram.
//!
//! ## Overview
//!
//! Input is the familiar leveled line format (`0 @I1@ INDI`, `1 NAME ...`, `1 FAMS @F1@`). The
//! parser rebuilds the record hierarchy, an index maps individual and family ids to records, and a
//! breadth-first layout engine assigns every reachable individual and family a row (generation)
//! and a stable left-to-right position within it.
//!
//! ### Key Features
//!
//! - **Fail-soft parsing**: a malformed line is reported as a [`Diagnostic`] and skipped
//! - **Typed field slots**: repeated tags are [`record::Field::Many`], relationship tags always are
//! - **Stable layout**: spouses sit beside their family, children one row down, rows start at 0
//! - **Consistent edits**: add spouses, children, siblings and parents; deletes cascade to empty
//!   families and never leave dangling ids behind
//! - **Integrity checks**: dangling pointers, missing back-links and ancestry cycles
//!
//! ## Architecture
//!
//! - **[`record`]**: `Record`, `Field` and the `RecordTree` arena
//! - **[`codec`]**: `LineParser` and `LineWriter`
//! - **[`index`]**: `GraphIndex`, the id lookup rebuilt after every structural change
//! - **[`layout`]**: `LayoutEngine`, `RowBucket`, `Layout`
//! - **[`tree`]** and **[`mutation`]**: the `FamilyTree` editing session and its operations
//! - **[`validate`]**: referential integrity report
//!
//! ## Quick Start
//!
//! ```rust
//! use lineage_core::{config::LineageConfig, tree::FamilyTree};
//!
//! let lines = [
//!     "0 @I1@ INDI", "1 NAME You", "1 SEX M", "1 FAMC @F1@",
//!     "0 @I2@ INDI", "1 NAME Father", "1 SEX M", "1 FAMS @F1@",
//!     "0 @I3@ INDI", "1 NAME Mother", "1 SEX F", "1 FAMS @F1@",
//!     "0 @F1@ FAM", "1 HUSB @I2@", "1 WIFE @I3@", "1 CHIL @I1@",
//! ];
//! let (mut session, diagnostics) = FamilyTree::from_lines(lines, LineageConfig::default());
//! assert!(diagnostics.is_empty());
//!
//! let layout = session.layout()?;
//! assert_eq!(layout.row_of("@F1@"), Some(0));
//! assert_eq!(layout.row_of("@I1@"), Some(1));
//!
//! let partner = session.add_spouse("@I1@")?;
//! assert_eq!(session.layout()?.row_of(&partner), Some(1));
//! # Ok::<(), lineage_core::LineageError>(())
//! ```
//!
//! ## Errors and Diagnostics
//!
//! Conditions that invalidate a whole request (unknown id, empty graph, a paternal walk that never
//! ends) are [`LineageError`]s. Conditions local to one line or one branch are [`Diagnostic`]s
//! returned next to the result, so one bad record never discards an entire import.

pub mod codec;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod index;
pub mod layout;
pub mod mutation;
pub mod record;
#[cfg(test)]
mod tests;
pub mod tree;
pub mod validate;

pub use diagnostic::Diagnostic;
pub use error::*;
