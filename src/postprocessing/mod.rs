//! Final polish of the tutor reply before it reaches the learner.

pub mod corrections;
pub mod formatter;

pub use corrections::{annotate, correction_line};
pub use formatter::{clean, is_correction_line, strip_corrections};

#[cfg(test)]
mod tests;
