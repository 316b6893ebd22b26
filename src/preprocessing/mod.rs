//! Everything that happens to learner input before it reaches the model:
//! catalog menus and utterance cleaning.

pub mod cleaner;
pub mod router;

pub use cleaner::{Cleaner, CleanerError};
pub use router::{Catalog, Language, Proficiency, Scene, SelectionError};
