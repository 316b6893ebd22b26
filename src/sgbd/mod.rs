//! Durable session bookkeeping: users, sessions and their mistakes.

pub mod engine;
pub mod types;

pub use engine::SqliteStorage;
pub use types::*;

use crate::memory::MistakeRecord;

/// The storage collaborator.
///
/// Each call is a standalone, committed operation; a failure in one never
/// rolls back an earlier one.
pub trait Storage: Send + Sync {
    fn create_user(&self) -> Result<UserId>;

    fn start_session(&self, session: &NewSession) -> Result<SessionId>;

    /// Closes a session. Fails if the id is unknown or the session already
    /// has an end time; the end time is never overwritten.
    fn end_session(&self, id: SessionId) -> Result<()>;

    fn record_mistake(&self, session_id: SessionId, mistake: &MistakeRecord) -> Result<MistakeId>;

    fn get_session(&self, id: SessionId) -> Result<Option<SessionRecord>>;

    /// Mistakes of one session, in the order they were recorded.
    fn session_mistakes(&self, id: SessionId) -> Result<Vec<MistakeRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Importance;
    use crate::preprocessing::{Language, Proficiency, Scene};

    fn open_temp() -> (tempfile::TempDir, SqliteStorage) {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::open(temp_dir.path().join("tutor.db")).unwrap();
        (temp_dir, storage)
    }

    fn new_session(user_id: UserId) -> NewSession {
        NewSession {
            user_id,
            target_language: Language::Spanish,
            native_language: "English".to_string(),
            proficiency: Proficiency::Intermediate,
            scene: Scene::Restaurant,
        }
    }

    #[test]
    fn session_round_trip() {
        let (_dir, storage) = open_temp();
        let user = storage.create_user().unwrap();
        let id = storage.start_session(&new_session(user)).unwrap();

        let session = storage.get_session(id).unwrap().unwrap();
        assert_eq!(session.user_id, user);
        assert_eq!(session.target_language, "Spanish");
        assert_eq!(session.proficiency_level, "intermediate");
        assert_eq!(session.scene, "restaurant");
        assert!(!session.is_closed());
    }

    #[test]
    fn end_session_sets_end_time_once() {
        let (_dir, storage) = open_temp();
        let user = storage.create_user().unwrap();
        let id = storage.start_session(&new_session(user)).unwrap();

        storage.end_session(id).unwrap();
        let closed = storage.get_session(id).unwrap().unwrap();
        let end_time = closed.end_time.expect("end time set");
        assert!(end_time >= closed.start_time);

        assert!(matches!(
            storage.end_session(id),
            Err(StorageError::SessionAlreadyEnded { .. })
        ));
        let again = storage.get_session(id).unwrap().unwrap();
        assert_eq!(again.end_time, Some(end_time));
    }

    #[test]
    fn end_session_fails_for_unknown_id() {
        let (_dir, storage) = open_temp();
        assert!(matches!(
            storage.end_session(SessionId(42)),
            Err(StorageError::SessionNotFound { id: SessionId(42) })
        ));
    }

    #[test]
    fn mistakes_are_kept_in_order_per_session() {
        let (_dir, storage) = open_temp();
        let user = storage.create_user().unwrap();
        let first = storage.start_session(&new_session(user)).unwrap();
        let second = storage.start_session(&new_session(user)).unwrap();

        let a = MistakeRecord::new("yo es", "yo soy", "grammar", Importance::CRITICAL)
            .with_explanation("Ser conjugates to soy.");
        let b = MistakeRecord::new("la problema", "el problema", "vocabulary", Importance::MINOR);
        storage.record_mistake(first, &a).unwrap();
        storage.record_mistake(second, &b).unwrap();
        storage.record_mistake(first, &b).unwrap();

        assert_eq!(storage.session_mistakes(first).unwrap(), vec![a, b.clone()]);
        assert_eq!(storage.session_mistakes(second).unwrap(), vec![b]);
    }

    #[test]
    fn mistake_requires_existing_session() {
        let (_dir, storage) = open_temp();
        let mistake = MistakeRecord::new("x", "y", "grammar", Importance::MINOR);
        assert!(matches!(
            storage.record_mistake(SessionId(7), &mistake),
            Err(StorageError::SessionNotFound { .. })
        ));
    }

    #[test]
    fn reopening_keeps_existing_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("tutor.db");
        let id = {
            let storage = SqliteStorage::open(&path).unwrap();
            let user = storage.create_user().unwrap();
            storage.start_session(&new_session(user)).unwrap()
        };

        let reopened = SqliteStorage::open(&path).unwrap();
        assert!(reopened.get_session(id).unwrap().is_some());
    }
}
