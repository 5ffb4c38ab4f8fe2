//! Application layer: the page controllers that keep the entry form, the
//! calendar and the mood chart consistent with the remote journal store,
//! gated behind a resolved session.

pub mod calendar;
pub mod editor;
pub mod gate;
pub mod mood;
pub mod notice;
pub mod profile;
pub mod refresh;

#[cfg(test)]
pub(crate) mod testing;

pub use calendar::CalendarController;
pub use editor::JournalEditor;
pub use gate::{GateOutcome, SessionGate};
pub use mood::MoodTrendController;
pub use notice::{Notice, NoticeBoard, NoticeKind};
pub use profile::ProfileView;
pub use refresh::{Refresh, RefreshHub};
