use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{ffi, params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::memory::{Importance, MistakeRecord};
use crate::preprocessing::Catalog;
use crate::sgbd::types::*;
use crate::sgbd::Storage;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    target_language TEXT NOT NULL,
    native_language TEXT NOT NULL,
    proficiency_level TEXT NOT NULL,
    scene TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT,
    FOREIGN KEY (user_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS mistakes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL,
    mistake_text TEXT NOT NULL,
    correction TEXT NOT NULL,
    explanation TEXT,
    mistake_type TEXT NOT NULL,
    importance INTEGER NOT NULL CHECK (importance BETWEEN 1 AND 3),
    created_at TEXT NOT NULL,
    FOREIGN KEY (session_id) REFERENCES sessions (id)
);

CREATE INDEX IF NOT EXISTS idx_mistakes_session ON mistakes (session_id);
"#;

/// SQLite-backed storage.
///
/// Holds only the database path. Every operation opens its own connection,
/// runs in autocommit mode and closes the connection when it returns, so no
/// transaction ever spans two logical operations.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    path: PathBuf,
}

impl SqliteStorage {
    /// Opens (creating if needed) the database and ensures the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let storage = Self {
            path: path.as_ref().to_path_buf(),
        };
        storage.connect()?.execute_batch(SCHEMA)?;
        info!(path = %storage.path.display(), "Storage initialised");
        Ok(storage)
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt {
            reason: format!("bad timestamp '{}': {}", value, e),
        })
}

/// A mistake insert rejected by the `session_id` foreign key names an unknown
/// session; any other failure, CHECK and NOT NULL included, is passed on.
fn mistake_insert_error(session_id: SessionId, error: rusqlite::Error) -> StorageError {
    match &error {
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            StorageError::SessionNotFound { id: session_id }
        }
        _ => StorageError::Sqlite(error),
    }
}

impl Storage for SqliteStorage {
    #[instrument(skip(self))]
    fn create_user(&self) -> Result<UserId> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO users (created_at) VALUES (?1)",
            params![now_timestamp()],
        )?;
        let id = UserId(conn.last_insert_rowid());
        debug!(user_id = %id, "User created");
        Ok(id)
    }

    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    fn start_session(&self, session: &NewSession) -> Result<SessionId> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO sessions (user_id, target_language, native_language, proficiency_level, scene, start_time)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                session.user_id.get(),
                session.target_language.key(),
                session.native_language,
                session.proficiency.key(),
                session.scene.key(),
                now_timestamp(),
            ],
        )?;
        let id = SessionId(conn.last_insert_rowid());
        info!(session_id = %id, scene = session.scene.key(), "Session started");
        Ok(id)
    }

    #[instrument(skip(self))]
    fn end_session(&self, id: SessionId) -> Result<()> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE sessions SET end_time = ?1 WHERE id = ?2 AND end_time IS NULL",
            params![now_timestamp(), id.get()],
        )?;

        if changed == 0 {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sessions WHERE id = ?1)",
                params![id.get()],
                |row| row.get(0),
            )?;
            return Err(if exists {
                StorageError::SessionAlreadyEnded { id }
            } else {
                StorageError::SessionNotFound { id }
            });
        }

        info!(session_id = %id, "Session ended");
        Ok(())
    }

    #[instrument(skip(self, mistake), fields(category = %mistake.category, importance = %mistake.importance))]
    fn record_mistake(&self, session_id: SessionId, mistake: &MistakeRecord) -> Result<MistakeId> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO mistakes (session_id, mistake_text, correction, explanation, mistake_type, importance, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                session_id.get(),
                mistake.incorrect_text,
                mistake.correction,
                mistake.explanation,
                mistake.category,
                mistake.importance.get(),
                now_timestamp(),
            ],
        )
        .map_err(|e| mistake_insert_error(session_id, e))?;
        Ok(MistakeId(conn.last_insert_rowid()))
    }

    fn get_session(&self, id: SessionId) -> Result<Option<SessionRecord>> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                r#"
                SELECT id, user_id, target_language, native_language, proficiency_level,
                       scene, start_time, end_time
                FROM sessions
                WHERE id = ?1
                "#,
                params![id.get()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, Option<String>>(7)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, user_id, target_language, native_language, proficiency_level, scene, start, end)) =
            row
        else {
            return Ok(None);
        };

        Ok(Some(SessionRecord {
            id: SessionId(id),
            user_id: UserId(user_id),
            target_language,
            native_language,
            proficiency_level,
            scene,
            start_time: parse_timestamp(&start)?,
            end_time: end.as_deref().map(parse_timestamp).transpose()?,
        }))
    }

    fn session_mistakes(&self, id: SessionId) -> Result<Vec<MistakeRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT mistake_text, correction, explanation, mistake_type, importance
            FROM mistakes
            WHERE session_id = ?1
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map(params![id.get()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut mistakes = Vec::new();
        for row in rows {
            let (incorrect_text, correction, explanation, category, importance) = row?;
            let importance = Importance::new(importance).map_err(|e| StorageError::Corrupt {
                reason: e.to_string(),
            })?;
            mistakes.push(MistakeRecord {
                incorrect_text,
                correction,
                explanation,
                category,
                importance,
            });
        }
        Ok(mistakes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_foreign_key_failures_mean_unknown_session() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::open(temp_dir.path().join("tutor.db")).unwrap();
        let conn = storage.connect().unwrap();

        let insert = |session_id: i64, importance: i64| {
            conn.execute(
                "INSERT INTO mistakes (session_id, mistake_text, correction, mistake_type, importance, created_at)
                 VALUES (?1, 'a', 'b', 'grammar', ?2, ?3)",
                params![session_id, importance, now_timestamp()],
            )
            .unwrap_err()
        };

        let missing_session = insert(99, 1);
        assert!(matches!(
            mistake_insert_error(SessionId(99), missing_session),
            StorageError::SessionNotFound { id: SessionId(99) }
        ));

        let user = storage.create_user().unwrap();
        let session = storage
            .start_session(&NewSession {
                user_id: user,
                target_language: crate::preprocessing::Language::Spanish,
                native_language: "English".to_string(),
                proficiency: crate::preprocessing::Proficiency::Beginner,
                scene: crate::preprocessing::Scene::Restaurant,
            })
            .unwrap();
        let out_of_range = insert(session.get(), 9);
        assert!(matches!(
            mistake_insert_error(session, out_of_range),
            StorageError::Sqlite(_)
        ));
    }
}
