//! Shared structs.

use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

use crate::memory::MistakeRecord;
use crate::preprocessing::{CleanerError, Language, Proficiency, Scene};
use crate::sgbd::{SessionId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Chat(String),
    Exit,
    Skip(CleanerError),
}

/// Everything a component needs to know about the running session.
///
/// Passed by reference into the analyzer, composer and aggregator; none of
/// them keep session state of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub target_language: Language,
    pub native_language: String,
    pub proficiency: Proficiency,
    pub scene: Scene,
}

/// Choices made ahead of time; each one set skips its prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPresets {
    pub target_language: Option<Language>,
    pub native_language: Option<String>,
    pub proficiency: Option<Proficiency>,
    pub scene: Option<Scene>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition { from: SessionPhase, to: SessionPhase },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Created,
    Configured,
    Active,
    Ended,
}

impl SessionPhase {
    pub fn next(self) -> Option<SessionPhase> {
        match self {
            SessionPhase::Created => Some(SessionPhase::Configured),
            SessionPhase::Configured => Some(SessionPhase::Active),
            SessionPhase::Active => Some(SessionPhase::Ended),
            SessionPhase::Ended => None,
        }
    }

    /// Moves one step forward; anything else is rejected.
    pub fn transition(self, to: SessionPhase) -> Result<SessionPhase, LifecycleError> {
        if self.next() == Some(to) {
            Ok(to)
        } else {
            Err(LifecycleError::InvalidTransition { from: self, to })
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Created => "created",
            SessionPhase::Configured => "configured",
            SessionPhase::Active => "active",
            SessionPhase::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Outcome of analyzing one utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub mistakes: Vec<MistakeRecord>,
    pub overall_quality: u8,
    pub strengths: Vec<String>,
    pub improvement_areas: Vec<String>,
}

impl AnalysisResult {
    pub const NEUTRAL_QUALITY: u8 = 3;

    pub fn empty() -> Self {
        Self {
            mistakes: Vec::new(),
            overall_quality: Self::NEUTRAL_QUALITY,
            strengths: Vec::new(),
            improvement_areas: Vec::new(),
        }
    }
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self::empty()
    }
}

/// Per-turn analysis metadata gathered over a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionObservations {
    qualities: Vec<u8>,
    strengths: Vec<String>,
    improvement_areas: Vec<String>,
}

impl SessionObservations {
    pub fn record(&mut self, analysis: &AnalysisResult) {
        self.qualities.push(analysis.overall_quality);
        merge_unique(&mut self.strengths, &analysis.strengths);
        merge_unique(&mut self.improvement_areas, &analysis.improvement_areas);
    }

    pub fn turns(&self) -> usize {
        self.qualities.len()
    }

    pub fn average_quality(&self) -> Option<f32> {
        if self.qualities.is_empty() {
            return None;
        }
        let total: u32 = self.qualities.iter().map(|&q| q as u32).sum();
        Some(total as f32 / self.qualities.len() as f32)
    }

    pub fn strengths(&self) -> &[String] {
        &self.strengths
    }

    pub fn improvement_areas(&self) -> &[String] {
        &self.improvement_areas
    }
}

// First spelling wins; later case variants are dropped.
fn merge_unique(into: &mut Vec<String>, items: &[String]) {
    for item in items {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if !into.iter().any(|seen| seen.eq_ignore_ascii_case(item)) {
            into.push(item.to_string());
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineState {
    pub turns: VecDeque<(String, String)>, // (user, assistant)
    pub max_turns: usize,
    pub observations: SessionObservations,
}

impl EngineState {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: VecDeque::new(),
            max_turns,
            observations: SessionObservations::default(),
        }
    }
}
