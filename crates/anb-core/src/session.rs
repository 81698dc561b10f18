//! Ephemeral per-sender conversational state.
//!
//! A sender with no entry is idle. State is process-local and deliberately
//! not persisted across restarts; an interrupted conversation is restarted
//! by opening the invite link again.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::UserId;

/// What the sender's next inbound message will be treated as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    /// Opened someone's invite link; the next message relays to `target`.
    AwaitingMessage { target: UserId },
    /// Pressed the reply affordance on a received relay; the next message
    /// relays back to `target`.
    AwaitingReply { target: UserId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Session {
    pub mode: SessionMode,
}

impl Session {
    pub fn awaiting_message(target: UserId) -> Self {
        Self {
            mode: SessionMode::AwaitingMessage { target },
        }
    }

    pub fn awaiting_reply(target: UserId) -> Self {
        Self {
            mode: SessionMode::AwaitingReply { target },
        }
    }

    /// The identity on the other end of this conversation.
    pub fn counterpart(&self) -> UserId {
        match self.mode {
            SessionMode::AwaitingMessage { target } => target,
            SessionMode::AwaitingReply { target } => target,
        }
    }
}

/// Conversation state store keyed by sender identity.
///
/// The store guards the map itself, not read-modify-write sequences across
/// calls. Callers must serialize event handling per sender (see `UserLocks`)
/// so that at most one event per sender is in flight at a time.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<UserId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, sender: UserId) -> Option<Session> {
        self.inner.lock().await.get(&sender).copied()
    }

    pub async fn set(&self, sender: UserId, session: Session) {
        self.inner.lock().await.insert(sender, session);
    }

    /// Remove the sender's session, returning what was cleared.
    pub async fn clear(&self, sender: UserId) -> Option<Session> {
        self.inner.lock().await.remove(&sender)
    }
}

/// One async mutex per sender so events from the same sender never overlap,
/// while different senders proceed concurrently. The guard must be held for
/// the whole handling of an event, including its storage and delivery I/O.
#[derive(Default)]
pub struct UserLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub async fn lock_user(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            // An entry with no holder and no waiter is only referenced by the
            // map itself; sweep those so the map does not grow with every
            // identity ever seen.
            map.retain(|_, l| Arc::strong_count(l) > 1);
            map.entry(user_id.0)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
