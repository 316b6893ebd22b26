//! Session mistake memory.
//! Records are persisted one by one as they arrive; the in-memory copy
//! serves grouping and ranking for the end-of-session report.

pub mod record;
pub mod store;

pub use record::{normalize_category, Importance, InvalidImportance, MistakeRecord};
pub use store::MistakeStore;
