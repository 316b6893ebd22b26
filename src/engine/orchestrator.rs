//! Session lifecycle: Created → Configured → Active → Ended.
//!
//! Drives scene selection, the turn loop and session bookkeeping. Every
//! external call is awaited in turn, so a reply is never shown before its
//! analysis has been recorded.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cli::{describe_scene, render_summary, Console};
use crate::config::Config;
use crate::engine::analyzer::TurnAnalyzer;
use crate::engine::composer::ResponseComposer;
use crate::engine::core::{parse_input, update_state};
use crate::engine::feedback::{FeedbackAggregator, MistakeSummary};
use crate::engine::types::{
    EngineState, SessionContext, SessionPhase, SessionPresets, Task,
};
use crate::error::{TutorError, TutorResult};
use crate::llm::LanguageModel;
use crate::memory::{Importance, MistakeRecord, MistakeStore};
use crate::preprocessing::{Catalog, CleanerError, Language, Proficiency, Scene};
use crate::sgbd::{NewSession, SessionId, Storage};

pub const WELCOME: &str = "Welcome to the Language Learning Bot!";
pub const FAREWELL: &str = "\nThank you for practicing with the Language Learning Bot!";

/// What a finished session leaves behind.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub session_id: SessionId,
    pub mistakes: Vec<MistakeRecord>,
    pub summary: MistakeSummary,
    pub feedback: String,
    pub interrupted: bool,
}

enum TurnStep {
    Continue,
    Finished,
}

struct Choices {
    target_language: Language,
    native_language: String,
    proficiency: Proficiency,
    scene: Scene,
}

pub struct SessionController {
    storage: Arc<dyn Storage>,
    analyzer: TurnAnalyzer,
    composer: ResponseComposer,
    aggregator: FeedbackAggregator,
    record_threshold: Importance,
    history_turns: usize,
    presets: SessionPresets,
    phase: SessionPhase,
}

impl SessionController {
    pub fn new(
        storage: Arc<dyn Storage>,
        model: Arc<dyn LanguageModel>,
        config: &Config,
        presets: SessionPresets,
    ) -> TutorResult<Self> {
        Ok(Self {
            storage,
            analyzer: TurnAnalyzer::new(model.clone(), config.llm.analysis),
            composer: ResponseComposer::new(model.clone(), config.llm.conversation),
            aggregator: FeedbackAggregator::new(model, config.llm.feedback),
            record_threshold: config.tutor.recording_threshold()?,
            history_turns: config.tutor.history_turns,
            presets,
            phase: SessionPhase::Created,
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    fn advance(&mut self, to: SessionPhase) -> TutorResult<()> {
        self.phase = self.phase.transition(to)?;
        info!(phase = %self.phase, "Session phase changed");
        Ok(())
    }

    /// Runs one session to completion.
    ///
    /// `shutdown` resolving once the session is active (during the opening
    /// line or the turn loop) ends it early; mistakes are already persisted
    /// turn by turn, so nothing is lost.
    /// The controller is consumed: one session per instance.
    #[instrument(skip_all)]
    pub async fn run<R, W, S>(
        mut self,
        console: &mut Console<R, W>,
        shutdown: S,
    ) -> TutorResult<SessionOutcome>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
        S: Future<Output = ()>,
    {
        let user_id = self.storage.create_user()?;
        console.say(WELCOME)?;

        let choices = self.configure(console).await?;
        self.advance(SessionPhase::Configured)?;

        let session_id = self.storage.start_session(&NewSession {
            user_id,
            target_language: choices.target_language,
            native_language: choices.native_language.clone(),
            proficiency: choices.proficiency,
            scene: choices.scene,
        })?;
        let ctx = SessionContext {
            session_id,
            user_id,
            target_language: choices.target_language,
            native_language: choices.native_language,
            proficiency: choices.proficiency,
            scene: choices.scene,
        };
        self.advance(SessionPhase::Active)?;
        info!(
            %session_id,
            language = %ctx.target_language,
            level = %ctx.proficiency,
            scene = %ctx.scene,
            "Session started"
        );

        let mut store = MistakeStore::new(session_id, self.storage.clone());
        let mut state = EngineState::new(self.history_turns);

        // Active from here: `shutdown` races every model call and read.
        tokio::pin!(shutdown);
        let mut interrupted = tokio::select! {
            biased;
            _ = &mut shutdown => true,
            intro = self.composer.introduce(&ctx) => {
                console.say(&format!("\n\n{}\n", intro?))?;
                false
            }
        };

        while !interrupted {
            tokio::select! {
                biased;
                _ = &mut shutdown => interrupted = true,
                step = self.turn(&ctx, console, &mut store, &mut state) => match step? {
                    TurnStep::Continue => {}
                    TurnStep::Finished => break,
                },
            }
        }

        if interrupted {
            warn!(%session_id, "Interrupted; ending session");
            console.say("\nEnding conversation...")?;
        }

        self.storage.end_session(session_id)?;
        self.advance(SessionPhase::Ended)?;

        console.say("\n\n--- Session Feedback ---")?;
        let feedback = self
            .aggregator
            .summarize(&ctx, &store, &state.observations)
            .await?;
        console.say(&feedback)?;

        let summary = MistakeSummary::from_store(&store);
        if !summary.is_empty() {
            console.say(&render_summary(&summary))?;
        }
        console.say(FAREWELL)?;

        info!(%session_id, mistakes = store.len(), interrupted, "Session ended");
        Ok(SessionOutcome {
            session_id,
            mistakes: store.records().to_vec(),
            summary,
            feedback,
            interrupted,
        })
    }

    async fn configure<R, W>(&self, console: &mut Console<R, W>) -> TutorResult<Choices>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let target_language = match self.presets.target_language {
            Some(language) => language,
            None => console
                .choose::<Language, _>(
                    "\nAvailable languages for learning:",
                    "\nWhich language would you like to learn? (Enter the number): ",
                    |l| l.label().to_string(),
                )
                .await?
                .ok_or(TutorError::InputClosed {
                    stage: "language selection",
                })?,
        };

        let native_language = match &self.presets.native_language {
            Some(native) => native.clone(),
            None => console
                .ask_text("\nWhat is your native language? ")
                .await?
                .ok_or(TutorError::InputClosed {
                    stage: "native language entry",
                })?,
        };

        let proficiency = match self.presets.proficiency {
            Some(level) => level,
            None => console
                .choose::<Proficiency, _>(
                    &format!(
                        "\nPlease select your proficiency level in {}:",
                        target_language.label()
                    ),
                    "\nEnter the number of your level: ",
                    |p| p.label().to_string(),
                )
                .await?
                .ok_or(TutorError::InputClosed {
                    stage: "proficiency selection",
                })?,
        };

        let scene = match self.presets.scene {
            Some(scene) => scene,
            None => console
                .choose::<Scene, _>(
                    "\nPlease select a conversation scenario to practice:",
                    "\nEnter the number of the scene: ",
                    describe_scene,
                )
                .await?
                .ok_or(TutorError::InputClosed {
                    stage: "scene selection",
                })?,
        };

        Ok(Choices {
            target_language,
            native_language,
            proficiency,
            scene,
        })
    }

    async fn turn<R, W>(
        &self,
        ctx: &SessionContext,
        console: &mut Console<R, W>,
        store: &mut MistakeStore,
        state: &mut EngineState,
    ) -> TutorResult<TurnStep>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        // Closed input ends the loop like an exit command.
        let Some(line) = console.ask("> ").await? else {
            return Ok(TurnStep::Finished);
        };

        match parse_input(&line) {
            Task::Exit => Ok(TurnStep::Finished),
            Task::Skip(CleanerError::EmptyInput) => Ok(TurnStep::Continue),
            Task::Skip(e) => {
                console.say(&format!("{}. Please send a shorter message.", e))?;
                Ok(TurnStep::Continue)
            }
            Task::Chat(text) => {
                self.chat(ctx, &text, console, store, state).await?;
                Ok(TurnStep::Continue)
            }
        }
    }

    #[instrument(skip_all, fields(session_id = %ctx.session_id, turn_id = %Uuid::new_v4()))]
    async fn chat<R, W>(
        &self,
        ctx: &SessionContext,
        text: &str,
        console: &mut Console<R, W>,
        store: &mut MistakeStore,
        state: &mut EngineState,
    ) -> TutorResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let analysis = self.analyzer.analyze(ctx, text).await?;

        for mistake in &analysis.mistakes {
            if mistake.importance >= self.record_threshold {
                store.add(mistake.clone())?;
            }
        }

        let reply = self
            .composer
            .compose(ctx, text, &analysis, state.turns.iter())
            .await?;
        console.say(&format!("\n{}\n", reply))?;

        state.observations.record(&analysis);
        update_state(state, text, &reply);
        Ok(())
    }
}
