//! In-character replies for the simulated native speaker.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::engine::types::{AnalysisResult, SessionContext};
use crate::llm::{ChatMessage, GenerationConfig, LLMError, LanguageModel};
use crate::memory::{Importance, MistakeRecord};
use crate::postprocessing::{annotate, clean, correction_line, strip_corrections};
use crate::preprocessing::Catalog;

/// Lowest importance shown inline to the learner.
pub const INLINE_CORRECTION_THRESHOLD: Importance = Importance::NOTABLE;

/// The mistakes of a turn that are worth interrupting the learner for, in
/// the order the analysis reported them.
pub fn surfaced(analysis: &AnalysisResult) -> Vec<&MistakeRecord> {
    analysis
        .mistakes
        .iter()
        .filter(|mistake| mistake.importance >= INLINE_CORRECTION_THRESHOLD)
        .collect()
}

pub fn scene_system_prompt(ctx: &SessionContext) -> String {
    let language = ctx.target_language.label();
    let level = ctx.proficiency.key();

    format!(
        "You are an AI language tutor helping someone learn {language}.\n\
         Their native language is {native} and their level is {level}.\n\n\
         Scene: {scene}\n\n\
         You will play the role of a native {language} speaker in this scene.\n\n\
         Guidelines:\n\
         1. Primarily use {language}, but adapt your language complexity to their {level} level.\n\
         2. {guidance}\n\
         3. Corrections are added below your reply automatically as \
         [Correction: original mistake → corrected version]. Never write correction lines yourself.\n\
         4. Be patient, encouraging, and make the conversation natural and engaging.\n\
         5. Stay in the scene described above.\n\n\
         Begin the conversation in {language}, introducing yourself according to the scene \
         and asking a question to engage the user.",
        language = language,
        native = ctx.native_language,
        level = level,
        scene = ctx.scene.description(),
        guidance = ctx.proficiency.speaker_guidance(&ctx.native_language),
    )
}

pub fn turn_prompt(ctx: &SessionContext, utterance: &str, corrections: &[&MistakeRecord]) -> String {
    let language = ctx.target_language.label();
    let mut prompt = format!(
        "The user (a {level} {language} learner) said:\n\"{utterance}\"\n\n\
         You are a native {language} speaker in this scene: {scene}\n\n\
         Continue the conversation naturally. Respond in {language} appropriate for their level.",
        level = ctx.proficiency.key(),
        language = language,
        utterance = utterance,
        scene = ctx.scene.description(),
    );

    if !corrections.is_empty() {
        prompt.push_str(
            "\n\nThese corrections will be shown to the user right after your reply, \
             so do not repeat them:\n",
        );
        for mistake in corrections {
            prompt.push_str(&correction_line(mistake));
            prompt.push('\n');
        }
    }

    prompt.push_str("\n\nKeep your response conversational and appropriate to the scene.");
    prompt
}

pub struct ResponseComposer {
    model: Arc<dyn LanguageModel>,
    options: GenerationConfig,
}

impl ResponseComposer {
    pub fn new(model: Arc<dyn LanguageModel>, options: GenerationConfig) -> Self {
        Self { model, options }
    }

    /// Opening line of the scene, before the learner has said anything.
    #[instrument(skip(self, ctx), fields(session_id = %ctx.session_id, scene = %ctx.scene))]
    pub async fn introduce(&self, ctx: &SessionContext) -> Result<String, LLMError> {
        let messages = [ChatMessage::system(scene_system_prompt(ctx))];
        let raw = self.model.complete_text(&messages, &self.options).await?;
        Ok(strip_corrections(&clean(&raw)))
    }

    /// Reply to one utterance. Mistakes at or above
    /// `INLINE_CORRECTION_THRESHOLD` are appended as correction lines; the
    /// rest never appear.
    #[instrument(skip_all, fields(session_id = %ctx.session_id))]
    pub async fn compose<'h, H>(
        &self,
        ctx: &SessionContext,
        utterance: &str,
        analysis: &AnalysisResult,
        history: H,
    ) -> Result<String, LLMError>
    where
        H: IntoIterator<Item = &'h (String, String)>,
        H::IntoIter: ExactSizeIterator,
    {
        let corrections = surfaced(analysis);
        let history = history.into_iter();

        let mut messages = Vec::with_capacity(2 + history.len() * 2);
        messages.push(ChatMessage::system(scene_system_prompt(ctx)));
        for (user, assistant) in history {
            messages.push(ChatMessage::user(user.as_str()));
            messages.push(ChatMessage::assistant(assistant.as_str()));
        }
        messages.push(ChatMessage::user(turn_prompt(ctx, utterance, &corrections)));

        let raw = self.model.complete_text(&messages, &self.options).await?;
        let reply = strip_corrections(&clean(&raw));

        debug!(inline_corrections = corrections.len(), "Reply composed");
        Ok(annotate(&reply, &corrections))
    }
}
