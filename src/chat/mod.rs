pub mod session;
pub mod timeline;

pub use session::{ChatSession, Effect, SessionState};
pub use timeline::{EntryId, Timeline, TimelineEntry};
