use crate::domain::{Item, MatchRecord, MatchWithItems, Message, SwipeDirection, SwipeEvent};
use crate::error::{AppError, Result};
use crate::storage::{ItemStore, MatchStore, MessageStore, NewItem, SwipeStore};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;
use uuid::Uuid;

/// Process-memory store with the same uniqueness semantics as the Postgres
/// schema: one LIKE per (source, target) pair and one match per ordered item
/// pair. All mutations happen under a single lock, which is what makes the
/// concurrent reciprocal-swipe race test meaningful.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    items: Vec<Item>,
    swipes: Vec<SwipeEvent>,
    liked_pairs: HashSet<(Uuid, Uuid)>,
    matches: Vec<MatchRecord>,
    match_pairs: HashMap<(Uuid, Uuid), Uuid>,
    messages: Vec<Message>,
}

impl Inner {
    fn item(&self, id: Uuid) -> Option<Item> {
        self.items.iter().find(|i| i.id == id).cloned()
    }

    fn with_items(&self, record: MatchRecord) -> Result<MatchWithItems> {
        let item_a = self.item(record.item_a_id).ok_or(AppError::NotFound)?;
        let item_b = self.item(record.item_b_id).ok_or(AppError::NotFound)?;
        Ok(MatchWithItems { record, item_a, item_b })
    }
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn insert(&self, item: NewItem) -> Result<Item> {
        let mut inner = self.lock();
        let item = Item {
            id: Uuid::now_v7(),
            owner_id: item.owner_id,
            owner_name: item.owner_name,
            title: item.title,
            value: item.value,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.items.push(item.clone());
        Ok(item)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Item>> {
        Ok(self.lock().item(id))
    }

    async fn latest_owned_by(&self, user_id: Uuid) -> Result<Option<Item>> {
        let inner = self.lock();
        Ok(inner
            .items
            .iter()
            .filter(|i| i.owner_id == user_id)
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
            .cloned())
    }
}

#[async_trait]
impl SwipeStore for MemoryStore {
    async fn record_like(&self, user_id: Uuid, source_item_id: Uuid, target_item_id: Uuid) -> Result<bool> {
        let mut inner = self.lock();
        if !inner.liked_pairs.insert((source_item_id, target_item_id)) {
            return Ok(false);
        }
        inner.swipes.push(SwipeEvent {
            id: Uuid::now_v7(),
            user_id,
            source_item_id: Some(source_item_id),
            target_item_id,
            direction: SwipeDirection::Like,
            created_at: OffsetDateTime::now_utc(),
        });
        Ok(true)
    }

    async fn record_pass(&self, user_id: Uuid, source_item_id: Option<Uuid>, target_item_id: Uuid) -> Result<()> {
        self.lock().swipes.push(SwipeEvent {
            id: Uuid::now_v7(),
            user_id,
            source_item_id,
            target_item_id,
            direction: SwipeDirection::Pass,
            created_at: OffsetDateTime::now_utc(),
        });
        Ok(())
    }

    async fn like_exists(&self, source_item_id: Uuid, target_item_id: Uuid) -> Result<bool> {
        Ok(self.lock().liked_pairs.contains(&(source_item_id, target_item_id)))
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn create_or_get(&self, item_x: Uuid, item_y: Uuid) -> Result<(MatchRecord, bool)> {
        let pair = MatchRecord::ordered_pair(item_x, item_y);
        let mut inner = self.lock();

        if let Some(existing_id) = inner.match_pairs.get(&pair).copied() {
            let existing = inner
                .matches
                .iter()
                .find(|m| m.id == existing_id)
                .cloned()
                .ok_or_else(|| AppError::Conflict("match index points at a missing row".to_string()))?;
            return Ok((existing, false));
        }

        let record = MatchRecord {
            id: Uuid::now_v7(),
            item_a_id: pair.0,
            item_b_id: pair.1,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.match_pairs.insert(pair, record.id);
        inner.matches.push(record.clone());
        Ok((record, true))
    }

    async fn find_by_pair(&self, item_x: Uuid, item_y: Uuid) -> Result<Option<MatchRecord>> {
        let pair = MatchRecord::ordered_pair(item_x, item_y);
        let inner = self.lock();
        let record = inner
            .match_pairs
            .get(&pair)
            .and_then(|id| inner.matches.iter().find(|m| m.id == *id))
            .cloned();
        Ok(record)
    }

    async fn get_with_items(&self, id: Uuid) -> Result<Option<MatchWithItems>> {
        let inner = self.lock();
        match inner.matches.iter().find(|m| m.id == id).cloned() {
            Some(record) => Ok(Some(inner.with_items(record)?)),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<MatchWithItems>> {
        let inner = self.lock();
        let mut records: Vec<MatchRecord> = inner.matches.clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let mut out = Vec::new();
        for record in records {
            let joined = inner.with_items(record)?;
            if joined.involves(user_id) {
                out.push(joined);
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, match_id: Uuid, sender_id: Uuid, sender_name: &str, content: &str) -> Result<Message> {
        let message = Message {
            id: Uuid::now_v7(),
            match_id,
            sender_id,
            sender_name: sender_name.to_string(),
            content: content.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.lock().messages.push(message.clone());
        Ok(message)
    }

    async fn history(&self, match_id: Uuid) -> Result<Vec<Message>> {
        let mut messages: Vec<Message> =
            self.lock().messages.iter().filter(|m| m.match_id == match_id).cloned().collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn latest(&self, match_id: Uuid) -> Result<Option<Message>> {
        Ok(self.history(match_id).await?.pop())
    }
}
