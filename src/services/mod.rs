pub mod conversation;
pub mod dispatcher;
pub mod policy;
pub mod swipe;

pub use conversation::{ConversationService, PostOutcome};
pub use dispatcher::RealtimeDispatcher;
pub use policy::{ContentPolicy, StaticDenylist};
pub use swipe::{SwipeOutcome, SwipeRejection, SwipeService};
