//! Defines `MistakeRecord` and the 1–3 `Importance` scale.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Importance must be between {min} and {max}, got {value}")]
pub struct InvalidImportance {
    pub value: i64,
    pub min: u8,
    pub max: u8,
}

/// Severity assigned by the analysis, 3 = critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Importance(u8);

impl Importance {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 3;

    pub const MINOR: Importance = Importance(1);
    pub const NOTABLE: Importance = Importance(2);
    pub const CRITICAL: Importance = Importance(3);

    pub fn new(value: i64) -> Result<Self, InvalidImportance> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Importance(value as u8))
        } else {
            Err(InvalidImportance {
                value,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    /// Pulls an out-of-range rating back onto the scale.
    pub fn clamped(value: i64) -> Self {
        Importance(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Importance {
    type Error = InvalidImportance;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Importance::new(value)
    }
}

impl From<Importance> for u8 {
    fn from(importance: Importance) -> Self {
        importance.0
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One detected error in a learner utterance.
///
/// Built by the turn analyzer, owned by the session's `MistakeStore` and
/// never mutated afterwards; the store only hands out shared references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MistakeRecord {
    pub incorrect_text: String,
    pub correction: String,
    pub explanation: Option<String>,
    pub category: String,
    pub importance: Importance,
}

impl MistakeRecord {
    pub const DEFAULT_CATEGORY: &'static str = "other";

    pub fn new(
        incorrect_text: impl Into<String>,
        correction: impl Into<String>,
        category: &str,
        importance: Importance,
    ) -> Self {
        Self {
            incorrect_text: incorrect_text.into().trim().to_string(),
            correction: correction.into().trim().to_string(),
            explanation: None,
            category: normalize_category(category),
            importance,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        let explanation = explanation.into();
        let explanation = explanation.trim();
        self.explanation = (!explanation.is_empty()).then(|| explanation.to_string());
        self
    }

    /// `original → corrected`, as shown to the learner.
    pub fn correction_pair(&self) -> String {
        format!("{} → {}", self.incorrect_text, self.correction)
    }
}

/// Categories compare case- and whitespace-insensitively, so
/// "Grammar " and "grammar" land in the same bucket.
pub fn normalize_category(category: &str) -> String {
    let collapsed = category.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() || collapsed.eq_ignore_ascii_case("unknown") {
        MistakeRecord::DEFAULT_CATEGORY.to_string()
    } else {
        collapsed.to_lowercase()
    }
}
