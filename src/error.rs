use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::LifecycleError;
use crate::llm::LLMError;
use crate::sgbd::StorageError;

#[derive(Error, Debug)]
pub enum TutorError {
    #[error("Language model request failed: {0}")]
    Model(#[from] LLMError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("Console I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input closed during {stage}")]
    InputClosed { stage: &'static str },
}

pub type TutorResult<T> = Result<T, TutorError>;
