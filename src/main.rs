use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use linguabot_lib::preprocessing::{Language, Proficiency, Scene};
use linguabot_lib::{logging, Config, SessionPresets};

/// Practise a foreign language by role-playing a scene with a native speaker.
#[derive(Parser, Debug)]
#[command(name = "linguabot", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long)]
    db: Option<PathBuf>,

    /// Model name sent to the chat-completions API
    #[arg(long)]
    model: Option<String>,

    /// Language to practise (e.g. Spanish); skips the language menu
    #[arg(long)]
    language: Option<Language>,

    /// Your native language; skips the prompt
    #[arg(long)]
    native: Option<String>,

    /// beginner, intermediate or advanced; skips the level menu
    #[arg(long)]
    level: Option<Proficiency>,

    /// Scene key such as restaurant or job_interview; skips the scene menu
    #[arg(long)]
    scene: Option<Scene>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_tracing();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(db) = args.db {
        config.storage.db_path = db;
    }
    if let Some(model) = args.model {
        config.llm.model = model;
    }

    let presets = SessionPresets {
        target_language: args.language,
        native_language: args.native.filter(|n| !n.trim().is_empty()),
        proficiency: args.level,
        scene: args.scene,
    };

    linguabot_lib::run(config, presets).await?;
    Ok(())
}
