//! Journal entry domain: models, the month value type, image preconditions,
//! and the store trait remote implementations fulfil.

pub mod image;
pub mod model;
pub mod month;
pub mod store;

pub use image::{ImageUpload, content_type_for_extension};
pub use model::{EntryDraft, JournalEntry, MoodScore};
pub use month::Month;
pub use store::EntryStore;
