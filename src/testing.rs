//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::llm::{ChatMessage, GenerationConfig, LLMError, LanguageModel};
use crate::memory::MistakeRecord;
use crate::sgbd::{
    MistakeId, NewSession, SessionId, SessionRecord, Storage, StorageError, UserId,
};

/// Language model that replays queued replies and counts calls.
#[derive(Default)]
pub struct ScriptedModel {
    text_replies: Mutex<VecDeque<Result<String, LLMError>>>,
    structured_replies: Mutex<VecDeque<Result<String, LLMError>>>,
    text_calls: AtomicUsize,
    structured_calls: AtomicUsize,
    text_prompts: Mutex<Vec<Vec<ChatMessage>>>,
    structured_prompts: Mutex<Vec<String>>,
}

type Result<T, E> = std::result::Result<T, E>;

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, reply: &str) -> Self {
        self.text_replies
            .lock()
            .unwrap()
            .push_back(Ok(reply.to_string()));
        self
    }

    pub fn with_text_error(self, error: LLMError) -> Self {
        self.text_replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn with_structured(self, body: &str) -> Self {
        self.structured_replies
            .lock()
            .unwrap()
            .push_back(Ok(body.to_string()));
        self
    }

    pub fn with_structured_error(self, error: LLMError) -> Self {
        self.structured_replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    pub fn structured_calls(&self) -> usize {
        self.structured_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.text_calls() + self.structured_calls()
    }

    pub fn text_prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.text_prompts.lock().unwrap().clone()
    }

    pub fn structured_prompts(&self) -> Vec<String> {
        self.structured_prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete_text(
        &self,
        messages: &[ChatMessage],
        _options: &GenerationConfig,
    ) -> Result<String, LLMError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        self.text_prompts.lock().unwrap().push(messages.to_vec());
        self.text_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Muy bien.".to_string()))
    }

    async fn complete_structured(
        &self,
        prompt: &str,
        _schema_hint: &str,
        _options: &GenerationConfig,
    ) -> Result<String, LLMError> {
        self.structured_calls.fetch_add(1, Ordering::SeqCst);
        self.structured_prompts.lock().unwrap().push(prompt.to_string());
        self.structured_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(r#"{"mistakes": [], "overall_quality": 3}"#.to_string()))
    }
}

#[derive(Default)]
struct Tables {
    users: i64,
    sessions: Vec<SessionRecord>,
    mistakes: Vec<(SessionId, MistakeRecord)>,
}

/// In-memory `Storage` with the same constraints as the SQLite one.
#[derive(Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
    fail_mistakes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `record_mistake` call fails.
    pub fn failing_mistakes() -> Self {
        Self {
            fail_mistakes: true,
            ..Self::default()
        }
    }

    pub fn mistake_count(&self) -> usize {
        self.tables.lock().unwrap().mistakes.len()
    }

    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.tables.lock().unwrap().sessions.clone()
    }
}

impl Storage for MemoryStorage {
    fn create_user(&self) -> crate::sgbd::Result<UserId> {
        let mut tables = self.tables.lock().unwrap();
        tables.users += 1;
        Ok(UserId(tables.users))
    }

    fn start_session(&self, session: &NewSession) -> crate::sgbd::Result<SessionId> {
        let mut tables = self.tables.lock().unwrap();
        let id = SessionId(tables.sessions.len() as i64 + 1);
        tables.sessions.push(SessionRecord {
            id,
            user_id: session.user_id,
            target_language: session.target_language.to_string(),
            native_language: session.native_language.clone(),
            proficiency_level: session.proficiency.to_string(),
            scene: session.scene.to_string(),
            start_time: Utc::now(),
            end_time: None,
        });
        Ok(id)
    }

    fn end_session(&self, id: SessionId) -> crate::sgbd::Result<()> {
        let mut tables = self.tables.lock().unwrap();
        let session = tables
            .sessions
            .iter_mut()
            .find(|session| session.id == id)
            .ok_or(StorageError::SessionNotFound { id })?;
        if session.end_time.is_some() {
            return Err(StorageError::SessionAlreadyEnded { id });
        }
        session.end_time = Some(Utc::now());
        Ok(())
    }

    fn record_mistake(
        &self,
        session_id: SessionId,
        mistake: &MistakeRecord,
    ) -> crate::sgbd::Result<MistakeId> {
        let mut tables = self.tables.lock().unwrap();
        if self.fail_mistakes || !tables.sessions.iter().any(|s| s.id == session_id) {
            return Err(StorageError::SessionNotFound { id: session_id });
        }
        tables.mistakes.push((session_id, mistake.clone()));
        Ok(MistakeId(tables.mistakes.len() as i64))
    }

    fn get_session(&self, id: SessionId) -> crate::sgbd::Result<Option<SessionRecord>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.sessions.iter().find(|s| s.id == id).cloned())
    }

    fn session_mistakes(&self, id: SessionId) -> crate::sgbd::Result<Vec<MistakeRecord>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .mistakes
            .iter()
            .filter(|(session_id, _)| *session_id == id)
            .map(|(_, mistake)| mistake.clone())
            .collect())
    }
}

/// Blocking reader whose reads never return, like an idle terminal.
pub struct Stalled;

impl std::io::Read for Stalled {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            std::thread::park();
        }
    }
}
