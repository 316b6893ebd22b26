//! Per-session mistake accumulation: append, group, filter, rank.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::memory::record::{Importance, MistakeRecord};
use crate::sgbd::{SessionId, Storage, StorageError};

pub struct MistakeStore {
    session_id: SessionId,
    storage: Arc<dyn Storage>,
    records: Vec<MistakeRecord>,
}

impl MistakeStore {
    pub fn new(session_id: SessionId, storage: Arc<dyn Storage>) -> Self {
        Self {
            session_id,
            storage,
            records: Vec::new(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Persists the record for this session, then appends it.
    ///
    /// A record is only kept in memory once storage accepted it, so an
    /// interrupted session never loses a mistake it has already shown.
    #[instrument(skip(self, record), fields(session_id = %self.session_id, category = %record.category))]
    pub fn add(&mut self, record: MistakeRecord) -> Result<(), StorageError> {
        let id = self.storage.record_mistake(self.session_id, &record)?;
        debug!(mistake_id = %id, importance = %record.importance, "Mistake recorded");
        self.records.push(record);
        Ok(())
    }

    /// All records in arrival order.
    pub fn records(&self) -> &[MistakeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn count_by_category(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Category counts, most frequent first; ties keep first-seen order.
    pub fn category_breakdown(&self) -> Vec<(String, usize)> {
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        let mut breakdown: Vec<(String, usize)> = Vec::new();

        for record in &self.records {
            match first_seen.get(record.category.as_str()) {
                Some(&slot) => breakdown[slot].1 += 1,
                None => {
                    first_seen.insert(record.category.as_str(), breakdown.len());
                    breakdown.push((record.category.clone(), 1));
                }
            }
        }

        breakdown.sort_by(|a, b| b.1.cmp(&a.1));
        breakdown
    }

    /// Records at or above `min_importance`, in arrival order.
    pub fn filter(&self, min_importance: Importance) -> Vec<&MistakeRecord> {
        self.records
            .iter()
            .filter(|record| record.importance >= min_importance)
            .collect()
    }

    /// Same subsequence as `filter`, highest importance first. The sort is
    /// stable, so equal importances stay in arrival order.
    pub fn ranked(&self, min_importance: Importance) -> Vec<&MistakeRecord> {
        let mut ranked = self.filter(min_importance);
        ranked.sort_by(|a, b| b.importance.cmp(&a.importance));
        ranked
    }
}
