//! Conversation turn analysis.
//!
//! Sends one utterance to the model in JSON mode and turns the reply into an
//! `AnalysisResult`. A reply that cannot be decoded never stops the
//! conversation: it degrades to `AnalysisResult::empty()`.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::engine::types::{AnalysisResult, SessionContext};
use crate::llm::{extract_json_from_response, GenerationConfig, LLMError, LanguageModel};
use crate::memory::{Importance, MistakeRecord};
use crate::preprocessing::Catalog;

pub const ANALYSIS_SCHEMA: &str = r#"{
    "mistakes": [
        {
            "incorrect": "mistake text",
            "correction": "corrected text",
            "explanation": "brief explanation",
            "type": "grammar/vocabulary/etc",
            "importance": 2
        }
    ],
    "overall_quality": 3,
    "strengths": ["strength1", "strength2"],
    "improvement_areas": ["area1", "area2"]
}"#;

const MIN_QUALITY: f64 = 1.0;
const MAX_QUALITY: f64 = 5.0;

/// Tagged outcome of decoding a model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisDecode {
    Decoded(AnalysisResult),
    Malformed { reason: String },
}

impl AnalysisDecode {
    pub fn into_result(self) -> AnalysisResult {
        match self {
            AnalysisDecode::Decoded(result) => result,
            AnalysisDecode::Malformed { .. } => AnalysisResult::empty(),
        }
    }
}

#[derive(Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    mistakes: Vec<RawMistake>,
    #[serde(default)]
    overall_quality: Option<f64>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvement_areas: Vec<String>,
}

#[derive(Deserialize)]
struct RawMistake {
    incorrect: String,
    correction: String,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    importance: Option<f64>,
}

impl RawMistake {
    fn into_record(self) -> Option<MistakeRecord> {
        if self.incorrect.trim().is_empty() || self.correction.trim().is_empty() {
            return None;
        }
        let importance = self
            .importance
            .map(|value| Importance::clamped(value.round() as i64))
            .unwrap_or(Importance::MINOR);
        let category = self.kind.as_deref().unwrap_or(MistakeRecord::DEFAULT_CATEGORY);

        let record = MistakeRecord::new(self.incorrect, self.correction, category, importance);
        Some(match self.explanation {
            Some(explanation) => record.with_explanation(explanation),
            None => record,
        })
    }
}

/// Decodes the analysis object out of a raw model reply.
///
/// Accepts a bare object or one wrapped in a code fence or prose. Missing
/// lists default to empty, ratings are clamped onto their scales and entries
/// without both texts are dropped. Anything that is not an object of the
/// expected shape is `Malformed`.
pub fn decode_analysis(body: &str) -> AnalysisDecode {
    let json = match extract_json_from_response(body) {
        Ok(json) => json,
        Err(reason) => return AnalysisDecode::Malformed { reason },
    };

    let raw: RawAnalysis = match serde_json::from_str(&json) {
        Ok(raw) => raw,
        Err(e) => {
            return AnalysisDecode::Malformed {
                reason: e.to_string(),
            }
        }
    };

    let overall_quality = raw
        .overall_quality
        .map(|q| q.round().clamp(MIN_QUALITY, MAX_QUALITY) as u8)
        .unwrap_or(AnalysisResult::NEUTRAL_QUALITY);

    AnalysisDecode::Decoded(AnalysisResult {
        mistakes: raw
            .mistakes
            .into_iter()
            .filter_map(RawMistake::into_record)
            .collect(),
        overall_quality,
        strengths: clean_list(raw.strengths),
        improvement_areas: clean_list(raw.improvement_areas),
    })
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

pub fn analysis_prompt(ctx: &SessionContext, utterance: &str) -> String {
    format!(
        "Analyze the following message in {language} from a {level} level student:\n\n\
         \"{utterance}\"\n\n\
         Identify any mistakes with grammar, vocabulary, sentence structure, or idioms.\n\
         For each mistake, provide:\n\
         1. The incorrect text\n\
         2. The corrected version\n\
         3. A brief explanation of the rule or why it's incorrect\n\
         4. The type of mistake (grammar, vocabulary, structure, idiom, etc.)\n\
         5. Importance (1-3, where 3 is a critical mistake)\n\n\
         Also rate the overall quality of the message from 1 to 5 and list its strengths \
         and areas for improvement.\n\n\
         If there are no mistakes, return an empty array for mistakes.",
        language = ctx.target_language.label(),
        level = ctx.proficiency.key(),
        utterance = utterance,
    )
}

pub struct TurnAnalyzer {
    model: Arc<dyn LanguageModel>,
    options: GenerationConfig,
}

impl TurnAnalyzer {
    pub fn new(model: Arc<dyn LanguageModel>, options: GenerationConfig) -> Self {
        Self { model, options }
    }

    /// Model failures propagate; undecodable replies do not.
    #[instrument(skip(self, ctx, utterance), fields(session_id = %ctx.session_id, chars = utterance.len()))]
    pub async fn analyze(
        &self,
        ctx: &SessionContext,
        utterance: &str,
    ) -> Result<AnalysisResult, LLMError> {
        let prompt = analysis_prompt(ctx, utterance);
        let body = self
            .model
            .complete_structured(&prompt, ANALYSIS_SCHEMA, &self.options)
            .await?;

        match decode_analysis(&body) {
            AnalysisDecode::Decoded(result) => {
                debug!(
                    mistakes = result.mistakes.len(),
                    quality = result.overall_quality,
                    "Utterance analyzed"
                );
                Ok(result)
            }
            AnalysisDecode::Malformed { reason } => {
                warn!(%reason, "Error parsing analysis response; continuing without corrections");
                Ok(AnalysisResult::empty())
            }
        }
    }
}
