//! Session-scoped Result Store.
//!
//! Holds at most one analysis document per session, as the raw JSON the
//! upload handler received. The document stays opaque until the results
//! view deserialises it; the store never validates what it is given.
//!
//! Lifecycle: one writer (the upload handler), one reader (the results
//! view). Reads do not clear the slot; a new upload overwrites it (last
//! write wins) and slots are evicted after an inactivity TTL, which is the
//! server-side equivalent of the browser session ending.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

struct ResultSlot {
    raw: Value,
    touched_at: DateTime<Utc>,
}

/// In-process store of per-session analysis documents.
pub struct ResultStore {
    ttl: Duration,
    slots: RwLock<HashMap<Uuid, ResultSlot>>,
}

impl ResultStore {
    /// Creates an empty store whose slots expire after `ttl` of inactivity.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Stores `raw` for `session`, replacing any previous document.
    pub fn put(&self, session: Uuid, raw: Value) {
        let now = Utc::now();
        let mut slots = self.slots.write().expect("result store lock poisoned");
        slots.retain(|_, slot| now - slot.touched_at <= self.ttl);
        let replaced = slots
            .insert(
                session,
                ResultSlot {
                    raw,
                    touched_at: now,
                },
            )
            .is_some();
        tracing::debug!(%session, replaced, "stored analysis result");
    }

    /// Returns a copy of the stored document for `session`, if any.
    ///
    /// Reading refreshes the slot's inactivity clock but does not clear it;
    /// reloading the results page keeps working until the session expires.
    pub fn get(&self, session: &Uuid) -> Option<Value> {
        let now = Utc::now();
        let mut slots = self.slots.write().expect("result store lock poisoned");
        match slots.get_mut(session) {
            Some(slot) if now - slot.touched_at <= self.ttl => {
                slot.touched_at = now;
                Some(slot.raw.clone())
            }
            Some(_) => {
                slots.remove(session);
                None
            }
            None => None,
        }
    }

    /// Number of live (possibly stale) slots. Test and metrics helper.
    pub fn len(&self) -> usize {
        self.slots.read().expect("result store lock poisoned").len()
    }

    /// True when no slots are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
