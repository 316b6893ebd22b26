pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod llm;
pub mod logging;
pub mod memory;
pub mod postprocessing;
pub mod preprocessing;
pub mod sgbd;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use tokio::io::BufReader;
use tracing::warn;

pub use config::Config;
pub use engine::{SessionController, SessionOutcome, SessionPresets};
pub use error::{TutorError, TutorResult};

use crate::cli::{Console, LineChannel};
use crate::llm::{LanguageModel, OpenAiClient};
use crate::sgbd::{SqliteStorage, Storage};

/// Runs one interactive session on stdin/stdout. Ctrl-C during the
/// conversation ends it early and still produces feedback.
///
/// Stdin is read on a detached thread, so returning from here never waits
/// for a pending read.
pub async fn run(config: Config, presets: SessionPresets) -> TutorResult<SessionOutcome> {
    config.validate()?;

    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::open(&config.storage.db_path)?);
    let model: Arc<dyn LanguageModel> = Arc::new(OpenAiClient::new(&config.llm)?);
    let controller = SessionController::new(storage, model, &config, presets)?;

    let input = LineChannel::stdin()?;
    let mut console = Console::new(BufReader::new(input), std::io::stdout());
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Unable to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    controller.run(&mut console, shutdown).await
}
