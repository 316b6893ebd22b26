use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CleanerError {
    #[error("Input is empty after cleaning")]
    EmptyInput,
    #[error("Input exceeds maximum length: {0} characters")]
    TooLong(usize),
}

pub struct Cleaner;

impl Cleaner {
    pub const MAX_LENGTH: usize = 10000;

    /// Normalises a learner utterance before analysis.
    ///
    /// Only whitespace is touched: accents, scripts and punctuation are the
    /// material being corrected and must reach the analyzer untouched.
    pub fn clean(input: &str) -> Result<String, CleanerError> {
        let cleaned = input.split_whitespace().collect::<Vec<_>>().join(" ");

        if cleaned.is_empty() {
            return Err(CleanerError::EmptyInput);
        }

        let length = cleaned.chars().count();
        if length > Self::MAX_LENGTH {
            return Err(CleanerError::TooLong(length));
        }

        Ok(cleaned)
    }

    pub fn is_exit_command(input: &str) -> bool {
        matches!(
            input.trim().to_lowercase().as_str(),
            "exit" | "quit" | "bye"
        )
    }
}
