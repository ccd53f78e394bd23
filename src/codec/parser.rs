use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::StarterConfig,
    diagnostic::Diagnostic,
    record::{is_relationship_tag, Record, RecordId, RecordTree},
};

/// Matches a whole token wrapped in the id marker, e.g. `@I12@`.
static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@[^@\s]+@$").expect("id pattern is a valid regex"));

/// Non-relationship tags whose value is routinely a pointer to another top-level record.
const POINTER_TAGS: [&str; 7] = ["SOUR", "NOTE", "OBJE", "REPO", "SUBM", "ASSO", "ALIA"];

pub fn is_id_token(token: &str) -> bool {
    ID_PATTERN.is_match(token)
}

/// Whether an id in the value position of `tag` is an ordinary cross-reference.
pub fn is_pointer_tag(tag: &str) -> bool {
    is_relationship_tag(tag) || POINTER_TAGS.contains(&tag)
}

/// One tokenized input line: `<level> [<id>] <tag> [<value>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub level: i32,
    pub id: Option<String>,
    pub tag: String,
    pub value: Option<String>,
    /// The id was taken from the value position.
    pub id_from_value: bool,
}

impl ParsedLine {
    /// Tokenizes a line. `Ok(None)` for blank lines, `Err(reason)` for lines that cannot be read.
    pub fn tokenize(line: &str) -> Result<Option<ParsedLine>, String> {
        let mut tokens = line.split_whitespace();
        let Some(level_token) = tokens.next() else {
            return Ok(None);
        };
        let level = level_token
            .parse::<u16>()
            .map_err(|_| format!("level {level_token:?} is not a non-negative integer"))?;

        let mut next = tokens.next().ok_or("missing tag")?;
        let mut id = None;
        if next.starts_with('@') {
            id = Some(next.to_string());
            next = tokens.next().ok_or("missing tag after id")?;
        }
        if next.starts_with('@') {
            return Err(format!("tag {next:?} looks like an id"));
        }
        let tag = next.to_string();

        let rest = tokens.collect::<Vec<&str>>();
        let mut value = (!rest.is_empty()).then(|| rest.join(" "));
        let mut id_from_value = false;
        if value.as_deref().is_some_and(is_id_token) {
            id = value.take();
            id_from_value = true;
        }

        Ok(Some(ParsedLine {
            level: level as i32,
            id,
            tag,
            value,
            id_from_value,
        }))
    }

    fn into_record(self) -> Record {
        let mut record = Record::new(self.level, self.tag);
        record.id = self.id;
        record.value = self.value;
        record
    }
}

/// What [`LineParser`] hands back: the record tree and everything it had to skip or flag.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub tree: RecordTree,
    pub diagnostics: Vec<Diagnostic>,
    /// The input was empty and the built-in starter tree was used instead.
    pub used_starter: bool,
}

/// Rebuilds the record hierarchy from flat, level-numbered lines.
///
/// Each new record's parent is found by walking up from the previously built record until a
/// record one level shallower is reached. The synthetic root sits at level -1, so every level-0
/// line lands directly beneath it. Lines that cannot be tokenized are reported and skipped.
#[derive(Debug)]
pub struct LineParser {
    tree: RecordTree,
    last: RecordId,
    line_number: usize,
    records: usize,
    diagnostics: Vec<Diagnostic>,
    starter: StarterConfig,
}

impl Default for LineParser {
    fn default() -> Self {
        LineParser::new()
    }
}

impl LineParser {
    pub fn new() -> LineParser {
        LineParser::with_starter(StarterConfig::default())
    }

    pub fn with_starter(starter: StarterConfig) -> LineParser {
        let tree = RecordTree::new();
        let last = tree.root();
        LineParser {
            tree,
            last,
            line_number: 0,
            records: 0,
            diagnostics: Vec::new(),
            starter,
        }
    }

    /// Parses a whole line sequence with the default starter names.
    pub fn parse<I, S>(lines: I) -> ParseOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parser = LineParser::new();
        parser.extend(lines);
        parser.finish()
    }

    pub fn parse_str(text: &str) -> ParseOutcome {
        LineParser::parse(text.lines())
    }

    pub fn extend<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.push_line(line.as_ref());
        }
    }

    pub fn push_line(&mut self, line: &str) {
        self.line_number += 1;
        let line = match self.line_number {
            1 => line.strip_prefix('\u{feff}').unwrap_or(line),
            _ => line,
        };
        let parsed = match ParsedLine::tokenize(line) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => return,
            Err(reason) => {
                tracing::warn!(
                    "[LineParser::push_line] skipping line {}: {}",
                    self.line_number,
                    reason
                );
                self.diagnostics
                    .push(Diagnostic::malformed(self.line_number, line, reason));
                return;
            }
        };
        self.records += 1;

        if parsed.id_from_value && !is_pointer_tag(&parsed.tag) {
            let id = parsed.id.clone().unwrap_or_default();
            tracing::warn!(
                "[LineParser::push_line] line {}: {} value {} read as an id",
                self.line_number,
                parsed.tag,
                id
            );
            self.diagnostics.push(Diagnostic::IdInValue {
                line: self.line_number,
                tag: parsed.tag.clone(),
                id,
            });
        }

        let parent = self.find_parent(parsed.level);
        match self.tree.insert(parent, parsed.into_record()) {
            Some(id) => self.last = id,
            None => {
                // find_parent only returns live records
                tracing::error!(
                    "[LineParser::push_line] parent {} vanished at line {}",
                    parent,
                    self.line_number
                );
            }
        }
    }

    /// Ascends from the last record until reaching one whose level is `level - 1` or shallower.
    fn find_parent(&self, level: i32) -> RecordId {
        let mut current = self.last;
        while let Some(record) = self.tree.get(current) {
            if level - 1 >= record.level {
                return current;
            }
            match record.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        self.tree.root()
    }

    /// Completes the parse. Input without a single non-blank line yields the starter tree.
    pub fn finish(self) -> ParseOutcome {
        if self.records == 0 && self.diagnostics.is_empty() {
            tracing::info!("[LineParser::finish] no input, synthesizing starter tree");
            let mut outcome = LineParser::parse(starter_lines(&self.starter));
            outcome.used_starter = true;
            return outcome;
        }
        tracing::debug!(
            "[LineParser::finish] {} records from {} lines, {} diagnostics",
            self.records,
            self.line_number,
            self.diagnostics.len()
        );
        ParseOutcome {
            tree: self.tree,
            diagnostics: self.diagnostics,
            used_starter: false,
        }
    }
}

/// The three-person tree (self plus both parents in one family) shown when nothing was loaded.
pub fn starter_lines(names: &StarterConfig) -> Vec<String> {
    vec![
        "0 @I1@ INDI".to_string(),
        format!("1 NAME {}", names.self_name),
        "1 SEX M".to_string(),
        "1 FAMC @F1@".to_string(),
        "0 @I2@ INDI".to_string(),
        format!("1 NAME {}", names.father_name),
        "1 SEX M".to_string(),
        "1 FAMS @F1@".to_string(),
        "0 @I3@ INDI".to_string(),
        format!("1 NAME {}", names.mother_name),
        "1 SEX F".to_string(),
        "1 FAMS @F1@".to_string(),
        "0 @F1@ FAM".to_string(),
        "1 HUSB @I2@".to_string(),
        "1 WIFE @I3@".to_string(),
        "1 CHIL @I1@".to_string(),
    ]
}
