//! End-of-session feedback.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::engine::types::{SessionContext, SessionObservations};
use crate::llm::{ChatMessage, GenerationConfig, LLMError, LanguageModel};
use crate::memory::{Importance, MistakeRecord, MistakeStore};
use crate::postprocessing::clean;
use crate::preprocessing::Catalog;

pub const NO_MISTAKES_MESSAGE: &str =
    "Great job! You didn't make any significant mistakes in this conversation.";

/// Lowest importance listed under "Top Mistakes to Focus On".
pub const FOCUS_THRESHOLD: Importance = Importance::NOTABLE;

/// Aggregates reduced from a session's mistake store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MistakeSummary {
    pub total: usize,
    /// Most frequent category first; ties in first-seen order.
    pub by_category: Vec<(String, usize)>,
    /// Importance ≥ `FOCUS_THRESHOLD`, highest first, ties in arrival order.
    pub focus: Vec<MistakeRecord>,
}

impl MistakeSummary {
    pub fn from_store(store: &MistakeStore) -> Self {
        Self {
            total: store.len(),
            by_category: store.category_breakdown(),
            focus: store.ranked(FOCUS_THRESHOLD).into_iter().cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

pub fn feedback_prompt(
    ctx: &SessionContext,
    summary: &MistakeSummary,
    observations: &SessionObservations,
) -> String {
    let categories = summary
        .by_category
        .iter()
        .map(|(category, count)| format!("{}: {}", category, count))
        .collect::<Vec<_>>()
        .join(", ");

    let focus = if summary.focus.is_empty() {
        "none".to_string()
    } else {
        summary
            .focus
            .iter()
            .map(|m| {
                let mut line = format!(
                    "\n  - {} (type: {}, importance: {})",
                    m.correction_pair(),
                    m.category,
                    m.importance
                );
                if let Some(explanation) = &m.explanation {
                    line.push_str(&format!(" - {}", explanation));
                }
                line
            })
            .collect::<String>()
    };

    let mut prompt = format!(
        "Generate comprehensive feedback for a {level} level {language} learner whose native \
         language is {native}.\n\n\
         The user had a conversation in a \"{scene}\" scenario.\n\n\
         Here's an analysis of their mistakes:\n\
         - Mistake types: {categories}\n\
         - Important mistakes: {focus}\n",
        level = ctx.proficiency.key(),
        language = ctx.target_language.label(),
        native = ctx.native_language,
        scene = ctx.scene.key(),
        categories = categories,
        focus = focus,
    );

    if let Some(average) = observations.average_quality() {
        prompt.push_str(&format!(
            "- Average message quality: {:.1}/5 over {} turns\n",
            average,
            observations.turns()
        ));
    }
    if !observations.strengths().is_empty() {
        prompt.push_str(&format!(
            "- Observed strengths: {}\n",
            observations.strengths().join(", ")
        ));
    }
    if !observations.improvement_areas().is_empty() {
        prompt.push_str(&format!(
            "- Observed areas to improve: {}\n",
            observations.improvement_areas().join(", ")
        ));
    }

    prompt.push_str(
        "\nProvide:\n\
         1. A short overall assessment\n\
         2. 2-3 specific areas where they should focus on improving\n\
         3. 2-3 strengths they demonstrated\n\
         4. Specific practice exercises they could do to address their errors\n\
         5. Common words/phrases they struggled with (if applicable)\n\n\
         Make the feedback encouraging but constructive.",
    );
    prompt
}

pub struct FeedbackAggregator {
    model: Arc<dyn LanguageModel>,
    options: GenerationConfig,
}

impl FeedbackAggregator {
    pub fn new(model: Arc<dyn LanguageModel>, options: GenerationConfig) -> Self {
        Self { model, options }
    }

    /// Narrative feedback for the whole session.
    ///
    /// An empty store short-circuits to `NO_MISTAKES_MESSAGE` without a model
    /// call. Otherwise exactly one call is made and its failure propagates.
    #[instrument(skip_all, fields(session_id = %ctx.session_id, mistakes = store.len()))]
    pub async fn summarize(
        &self,
        ctx: &SessionContext,
        store: &MistakeStore,
        observations: &SessionObservations,
    ) -> Result<String, LLMError> {
        if store.is_empty() {
            info!("No mistakes recorded; skipping feedback request");
            return Ok(NO_MISTAKES_MESSAGE.to_string());
        }

        let summary = MistakeSummary::from_store(store);
        let messages = [ChatMessage::user(feedback_prompt(ctx, &summary, observations))];
        let raw = self.model.complete_text(&messages, &self.options).await?;
        Ok(clean(&raw))
    }
}
