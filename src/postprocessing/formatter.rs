//! Cleans and trims the raw model reply.

const CORRECTION_PREFIX: &str = "[Correction:";

pub fn clean(raw: &str) -> String {
    let trimmed = raw.trim();
    // Remove code-fence markers if the model wrapped the answer.
    trimmed
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
        .to_string()
}

/// Drops correction lines the model wrote on its own; the composer adds the
/// authoritative ones.
pub fn strip_corrections(reply: &str) -> String {
    reply
        .lines()
        .filter(|line| !is_correction_line(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

pub fn is_correction_line(line: &str) -> bool {
    let line = line.trim();
    line.starts_with(CORRECTION_PREFIX) && line.ends_with(']')
}
