//! In-memory reference implementation of the storage port.
//!
//! Durable (SQL-backed) storage is an external collaborator; this store keeps
//! the same contract in process memory so the bot runs standalone and tests
//! have a faithful collaborator. Relay-record insertion and the window
//! counter update happen under one lock acquisition, mirroring the single
//! transaction a durable implementation must use.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{Profile, RecordId, RelayKind, UserId};
use crate::ports::{StoragePort, StoreStats};
use crate::ratelimit::RateLimiter;
use crate::Result;

// Fields mirror what a durable store would persist per relay; only the
// counters are read back in-process.
#[allow(dead_code)]
#[derive(Clone, Debug)]
struct RelayRecord {
    id: RecordId,
    sender: UserId,
    recipient: UserId,
    content: String,
    kind: RelayKind,
    created_at: DateTime<Utc>,
}

#[allow(dead_code)]
#[derive(Clone, Debug)]
struct ReportRecord {
    reporter: UserId,
    reported: UserId,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<i64, Profile>,
    blocks: HashMap<(i64, i64), Option<String>>,
    admin_blocks: HashMap<i64, Option<String>>,
    records: Vec<RelayRecord>,
    reports: Vec<ReportRecord>,
    window_counter: RateLimiter,
    next_record_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoragePort for MemoryStore {
    async fn register_identity(&self, profile: Profile) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.users.insert(profile.user_id.0, profile);
        Ok(())
    }

    async fn identity_exists(&self, id: UserId) -> Result<bool> {
        Ok(self.inner.lock().await.users.contains_key(&id.0))
    }

    async fn is_blocked(&self, blocker: UserId, blocked: UserId) -> Result<bool> {
        Ok(self
            .inner
            .lock()
            .await
            .blocks
            .contains_key(&(blocker.0, blocked.0)))
    }

    async fn block(&self, blocker: UserId, blocked: UserId, reason: Option<String>) -> Result<()> {
        self.inner
            .lock()
            .await
            .blocks
            .insert((blocker.0, blocked.0), reason);
        Ok(())
    }

    async fn unblock(&self, blocker: UserId, blocked: UserId) -> Result<()> {
        self.inner.lock().await.blocks.remove(&(blocker.0, blocked.0));
        Ok(())
    }

    async fn is_admin_blocked(&self, id: UserId) -> Result<bool> {
        Ok(self.inner.lock().await.admin_blocks.contains_key(&id.0))
    }

    async fn set_admin_block(
        &self,
        id: UserId,
        blocked: bool,
        reason: Option<String>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if blocked {
            inner.admin_blocks.insert(id.0, reason);
        } else {
            inner.admin_blocks.remove(&id.0);
        }
        Ok(())
    }

    async fn report(
        &self,
        reporter: UserId,
        reported: UserId,
        reason: Option<String>,
    ) -> Result<()> {
        self.inner.lock().await.reports.push(ReportRecord {
            reporter,
            reported,
            reason,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn recent_relay_count(&self, sender: UserId, window: Duration) -> Result<u32> {
        Ok(self
            .inner
            .lock()
            .await
            .window_counter
            .count_within(sender, window))
    }

    async fn create_relay_record(
        &self,
        sender: UserId,
        recipient: UserId,
        content: &str,
        kind: RelayKind,
    ) -> Result<RecordId> {
        let mut inner = self.inner.lock().await;

        inner.next_record_id += 1;
        let id = RecordId(inner.next_record_id);

        inner.records.push(RelayRecord {
            id,
            sender,
            recipient,
            content: content.to_string(),
            kind,
            created_at: Utc::now(),
        });
        inner.window_counter.record(sender);

        Ok(id)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let inner = self.inner.lock().await;
        Ok(StoreStats {
            total_users: inner.users.len() as u64,
            total_relays: inner.records.len() as u64,
            total_reports: inner.reports.len() as u64,
        })
    }

    async fn all_identities(&self) -> Result<Vec<UserId>> {
        let inner = self.inner.lock().await;
        let mut ids: Vec<UserId> = inner.users.keys().map(|&id| UserId(id)).collect();
        ids.sort_by_key(|id| id.0);
        Ok(ids)
    }
}
