use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::preprocessing::{Language, Proficiency, Scene};

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Session {id} does not exist")]
    SessionNotFound { id: SessionId },

    #[error("Session {id} has already ended")]
    SessionAlreadyEnded { id: SessionId },

    #[error("Corrupt record: {reason}")]
    Corrupt { reason: String },
}

macro_rules! row_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(UserId);
row_id!(SessionId);
row_id!(MistakeId);

/// Fields needed to open a session row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub user_id: UserId,
    pub target_language: Language,
    pub native_language: String,
    pub proficiency: Proficiency,
    pub scene: Scene,
}

/// A session row as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub user_id: UserId,
    pub target_language: String,
    pub native_language: String,
    pub proficiency_level: String,
    pub scene: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn is_closed(&self) -> bool {
        self.end_time.is_some()
    }
}
