use crate::domain::Message;
use std::collections::HashSet;
use time::OffsetDateTime;
use uuid::Uuid;

/// Identity of a timeline entry. Pending ids are assigned locally on an
/// optimistic send and can never collide with server-assigned ids, which is
/// what makes "my own echo just arrived" recognizable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryId {
    Confirmed(Uuid),
    Pending(Uuid),
}

impl EntryId {
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub id: EntryId,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub content: String,
    pub created_at: OffsetDateTime,
}

impl From<Message> for TimelineEntry {
    fn from(message: Message) -> Self {
        Self {
            id: EntryId::Confirmed(message.id),
            match_id: message.match_id,
            sender_id: message.sender_id,
            sender_name: message.sender_name,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

/// The locally visible message sequence for one conversation: server
/// history, realtime pushes, and the user's own optimistic sends merged into
/// a single deduplicated, time-ordered view.
///
/// History-fetch completion and push arrival race on the same state; both
/// entry points are order-independent for any given message id.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    #[must_use]
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Merges a fetched history into the view: every history message is
    /// kept, plus any held entry whose id is absent from history (pushes
    /// that raced the fetch, and the user's own pending sends).
    pub fn merge_history(&mut self, history: Vec<Message>) {
        let history_ids: HashSet<Uuid> = history.iter().map(|m| m.id).collect();

        let held: Vec<TimelineEntry> = self
            .entries
            .drain(..)
            .filter(|entry| match entry.id {
                EntryId::Confirmed(id) => !history_ids.contains(&id),
                EntryId::Pending(_) => true,
            })
            .collect();

        self.entries = history.into_iter().map(Into::into).chain(held).collect();
        self.sort();
    }

    /// Applies a realtime push. A message already present is dropped; a push
    /// from the local user first clears their pending entries, replacing the
    /// optimistic copy with the confirmed one.
    pub fn apply_push(&mut self, message: Message, local_user_id: Uuid) {
        if self.entries.iter().any(|e| e.id == EntryId::Confirmed(message.id)) {
            return;
        }

        if message.sender_id == local_user_id {
            self.entries.retain(|e| !(e.id.is_pending() && e.sender_id == local_user_id));
        }

        self.entries.push(message.into());
        self.sort();
    }

    /// Appends an optimistic entry for a not-yet-confirmed send and returns
    /// its pending id.
    pub fn push_optimistic(&mut self, match_id: Uuid, sender_id: Uuid, sender_name: &str, content: &str) -> EntryId {
        let id = EntryId::Pending(Uuid::new_v4());
        self.entries.push(TimelineEntry {
            id,
            match_id,
            sender_id,
            sender_name: sender_name.to_string(),
            content: content.to_string(),
            created_at: OffsetDateTime::now_utc(),
        });
        id
    }

    /// Removes an entry, used to roll back a failed optimistic send.
    pub fn remove(&mut self, id: EntryId) {
        self.entries.retain(|e| e.id != id);
    }

    fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    }
}
