//! Reading and writing the leveled line format.
//!
//! Input is one record per line, `<level> [<id>] <tag> [<value...>]`:
//!
//! ```text
//! 0 @I1@ INDI
//! 1 NAME Ada /Lovelace/
//! 1 BIRT
//! 2 DATE 10 DEC 1815
//! 1 FAMS @F1@
//! ```
//!
//! - [`LineParser`] - rebuilds the record hierarchy, reporting bad lines as diagnostics
//! - [`LineWriter`] - walks a tree back into lines; `parse(serialize(tree))` is isomorphic to `tree`
//! - [`starter_lines`] - the built-in three-person tree used when there is no input
//!
//! ```rust
//! use lineage_core::codec::{LineParser, LineWriter};
//!
//! let outcome = LineParser::parse(["0 @I1@ INDI", "1 NAME Ada"]);
//! assert!(outcome.diagnostics.is_empty());
//! assert_eq!(LineWriter::serialize(&outcome.tree), vec!["0 @I1@ INDI", "1 NAME Ada"]);
//! ```

pub mod parser;
pub mod writer;

pub use parser::{is_id_token, is_pointer_tag, starter_lines, LineParser, ParseOutcome, ParsedLine};
pub use writer::LineWriter;
