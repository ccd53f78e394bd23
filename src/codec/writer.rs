use crate::record::{RecordId, RecordTree};

/// Walks a [`RecordTree`] back into the leveled line format.
///
/// Levels are recomputed from tree depth rather than read from the records, so records created by
/// mutations can never produce a gap. Level-0 ids are written before the tag (`0 @I1@ INDI`),
/// nested pointers after it (`1 FAMC @F1@`).
pub struct LineWriter;

impl LineWriter {
    pub fn serialize(tree: &RecordTree) -> Vec<String> {
        let mut lines = Vec::with_capacity(tree.len());
        let mut stack = tree
            .children(tree.root())
            .into_iter()
            .rev()
            .map(|child| (child, 0usize))
            .collect::<Vec<(RecordId, usize)>>();

        while let Some((id, depth)) = stack.pop() {
            let Some(record) = tree.get(id) else {
                continue;
            };
            let line = match (&record.id, &record.value) {
                (Some(rid), Some(value)) => format!("{depth} {rid} {} {value}", record.tag),
                (Some(rid), None) if depth == 0 => format!("{depth} {rid} {}", record.tag),
                (Some(rid), None) => format!("{depth} {} {rid}", record.tag),
                (None, Some(value)) => format!("{depth} {} {value}", record.tag),
                (None, None) => format!("{depth} {}", record.tag),
            };
            lines.push(line);
            stack.extend(
                tree.children(id)
                    .into_iter()
                    .rev()
                    .map(|child| (child, depth + 1)),
            );
        }
        lines
    }

    pub fn to_text(tree: &RecordTree) -> String {
        let mut text = LineWriter::serialize(tree).join("\n");
        text.push('\n');
        text
    }
}
