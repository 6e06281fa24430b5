pub mod item;
pub mod match_record;
pub mod message;
pub mod swipe;

pub use item::{Item, value_parity_holds};
pub use match_record::{MatchRecord, MatchSummary, MatchWithItems};
pub use message::Message;
pub use swipe::{SwipeDirection, SwipeEvent};
