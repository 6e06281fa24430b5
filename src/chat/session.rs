use crate::chat::timeline::{EntryId, Timeline};
use crate::domain::Message;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Subscribed, waiting for the history fetch to resolve. Pushes that
    /// arrive before it are already applied to the timeline.
    Loading(Uuid),
    Live(Uuid),
}

impl SessionState {
    #[must_use]
    pub const fn match_id(self) -> Option<Uuid> {
        match self {
            Self::Idle => None,
            Self::Loading(id) | Self::Live(id) => Some(id),
        }
    }
}

/// Side effect the embedding event loop must carry out for the session.
/// The session itself never touches the transport or the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Subscribe(Uuid),
    Unsubscribe(Uuid),
    FetchHistory(Uuid),
}

/// Client-side conversation state machine. All inputs are events fed by a
/// single-threaded event loop; outputs are the timeline view plus effects.
/// Late events for a previously selected match are filtered by match id, so
/// switching conversations cannot corrupt the new timeline.
#[derive(Debug)]
pub struct ChatSession {
    user_id: Uuid,
    user_name: String,
    state: SessionState,
    timeline: Timeline,
}

impl ChatSession {
    #[must_use]
    pub fn new(user_id: Uuid, user_name: impl Into<String>) -> Self {
        Self { user_id, user_name: user_name.into(), state: SessionState::Idle, timeline: Timeline::default() }
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Selects a conversation. Subscribing comes before the history fetch so
    /// no push can fall between them.
    pub fn select_match(&mut self, match_id: Uuid) -> Vec<Effect> {
        if self.state.match_id() == Some(match_id) {
            return Vec::new();
        }

        let mut effects = Vec::with_capacity(3);
        if let Some(previous) = self.state.match_id() {
            effects.push(Effect::Unsubscribe(previous));
        }

        self.timeline.clear();
        self.state = SessionState::Loading(match_id);
        effects.push(Effect::Subscribe(match_id));
        effects.push(Effect::FetchHistory(match_id));
        effects
    }

    /// Leaves the current conversation, if any.
    pub fn close(&mut self) -> Vec<Effect> {
        let effects = self.state.match_id().map(Effect::Unsubscribe).into_iter().collect();
        self.state = SessionState::Idle;
        self.timeline.clear();
        effects
    }

    /// History response arrived. A response for a match that is no longer
    /// selected is stale and ignored.
    pub fn history_loaded(&mut self, match_id: Uuid, history: Vec<Message>) {
        if self.state.match_id() != Some(match_id) {
            return;
        }
        self.timeline.merge_history(history);
        self.state = SessionState::Live(match_id);
    }

    /// Realtime push arrived. Pushes for other matches (late arrivals from
    /// an unsubscribed channel) are dropped.
    pub fn push_received(&mut self, message: Message) {
        if self.state.match_id() != Some(message.match_id) {
            return;
        }
        self.timeline.apply_push(message, self.user_id);
    }

    /// Starts an optimistic send: the entry is visible immediately and the
    /// caller invokes the post operation. Returns `None` unless Live.
    pub fn begin_send(&mut self, content: &str) -> Option<EntryId> {
        let SessionState::Live(match_id) = self.state else {
            return None;
        };
        Some(self.timeline.push_optimistic(match_id, self.user_id, &self.user_name, content))
    }

    /// The post failed or was rejected; roll the optimistic entry back.
    pub fn send_failed(&mut self, id: EntryId) {
        self.timeline.remove(id);
    }
}
