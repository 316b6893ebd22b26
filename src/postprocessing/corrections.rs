//! Inline correction annotations.

use crate::memory::MistakeRecord;

pub fn correction_line(mistake: &MistakeRecord) -> String {
    format!("[Correction: {}]", mistake.correction_pair())
}

/// Appends one `[Correction: a → b]` line per mistake after the reply.
pub fn annotate(reply: &str, mistakes: &[&MistakeRecord]) -> String {
    if mistakes.is_empty() {
        return reply.to_string();
    }

    let lines = mistakes
        .iter()
        .map(|mistake| correction_line(mistake))
        .collect::<Vec<_>>()
        .join("\n");

    if reply.is_empty() {
        lines
    } else {
        format!("{}\n\n{}", reply, lines)
    }
}
