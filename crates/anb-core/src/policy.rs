//! Delivery-policy checks evaluated before any relay goes out.

use std::time::Duration;

use crate::domain::UserId;
use crate::ports::StoragePort;
use crate::Result;

/// Why a relay attempt was denied.
///
/// Checks run in a fixed order (identity, then relationship, then
/// throughput), so the most specific, actionable reason is the one surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyReason {
    RecipientUnknown,
    SenderBlockedByAdmin,
    BlockedByRecipient,
    RateLimited,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Denied(DenyReason),
}

/// The gate holds only its quota configuration; every fact it checks is read
/// from the storage collaborator.
#[derive(Clone, Copy, Debug)]
pub struct PolicyGate {
    max_per_window: u32,
    window: Duration,
}

impl PolicyGate {
    pub fn new(max_per_window: u32, window: Duration) -> Self {
        Self {
            max_per_window,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Short-circuits on the first failing check:
    /// recipient existence, admin block on sender, recipient-initiated block,
    /// sender rate quota.
    pub async fn check(
        &self,
        store: &dyn StoragePort,
        sender: UserId,
        recipient: UserId,
    ) -> Result<Verdict> {
        if !store.identity_exists(recipient).await? {
            return Ok(Verdict::Denied(DenyReason::RecipientUnknown));
        }

        if store.is_admin_blocked(sender).await? {
            return Ok(Verdict::Denied(DenyReason::SenderBlockedByAdmin));
        }

        if store.is_blocked(recipient, sender).await? {
            return Ok(Verdict::Denied(DenyReason::BlockedByRecipient));
        }

        if store.recent_relay_count(sender, self.window).await? >= self.max_per_window {
            return Ok(Verdict::Denied(DenyReason::RateLimited));
        }

        Ok(Verdict::Allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Profile, RecordId, RelayKind};
    use crate::ports::StoreStats;
    use async_trait::async_trait;

    /// Storage stub with directly settable facts.
    #[derive(Default)]
    struct FakeStore {
        recipient_exists: bool,
        sender_admin_blocked: bool,
        recipient_blocks_sender: bool,
        recent_count: u32,
    }

    #[async_trait]
    impl StoragePort for FakeStore {
        async fn register_identity(&self, _profile: Profile) -> Result<()> {
            Ok(())
        }

        async fn identity_exists(&self, _id: UserId) -> Result<bool> {
            Ok(self.recipient_exists)
        }

        async fn is_blocked(&self, _blocker: UserId, _blocked: UserId) -> Result<bool> {
            Ok(self.recipient_blocks_sender)
        }

        async fn block(
            &self,
            _blocker: UserId,
            _blocked: UserId,
            _reason: Option<String>,
        ) -> Result<()> {
            Ok(())
        }

        async fn unblock(&self, _blocker: UserId, _blocked: UserId) -> Result<()> {
            Ok(())
        }

        async fn is_admin_blocked(&self, _id: UserId) -> Result<bool> {
            Ok(self.sender_admin_blocked)
        }

        async fn set_admin_block(
            &self,
            _id: UserId,
            _blocked: bool,
            _reason: Option<String>,
        ) -> Result<()> {
            Ok(())
        }

        async fn report(
            &self,
            _reporter: UserId,
            _reported: UserId,
            _reason: Option<String>,
        ) -> Result<()> {
            Ok(())
        }

        async fn recent_relay_count(&self, _sender: UserId, _window: Duration) -> Result<u32> {
            Ok(self.recent_count)
        }

        async fn create_relay_record(
            &self,
            _sender: UserId,
            _recipient: UserId,
            _content: &str,
            _kind: RelayKind,
        ) -> Result<RecordId> {
            Ok(RecordId(1))
        }

        async fn stats(&self) -> Result<StoreStats> {
            Ok(StoreStats::default())
        }

        async fn all_identities(&self) -> Result<Vec<UserId>> {
            Ok(vec![])
        }
    }

    const HOUR: Duration = Duration::from_secs(3600);

    fn gate() -> PolicyGate {
        PolicyGate::new(10, HOUR)
    }

    #[tokio::test]
    async fn allows_when_all_checks_pass() {
        let store = FakeStore {
            recipient_exists: true,
            ..Default::default()
        };
        let v = gate().check(&store, UserId(1), UserId(2)).await.unwrap();
        assert_eq!(v, Verdict::Allowed);
    }

    #[tokio::test]
    async fn unknown_recipient_wins_over_rate_limit() {
        // Recipient unknown AND sender over quota: existence is checked first.
        let store = FakeStore {
            recipient_exists: false,
            recent_count: 1000,
            ..Default::default()
        };
        let v = gate().check(&store, UserId(1), UserId(2)).await.unwrap();
        assert_eq!(v, Verdict::Denied(DenyReason::RecipientUnknown));
    }

    #[tokio::test]
    async fn admin_block_wins_over_recipient_block() {
        let store = FakeStore {
            recipient_exists: true,
            sender_admin_blocked: true,
            recipient_blocks_sender: true,
            ..Default::default()
        };
        let v = gate().check(&store, UserId(1), UserId(2)).await.unwrap();
        assert_eq!(v, Verdict::Denied(DenyReason::SenderBlockedByAdmin));
    }

    #[tokio::test]
    async fn recipient_block_denies_regardless_of_quota() {
        let store = FakeStore {
            recipient_exists: true,
            recipient_blocks_sender: true,
            recent_count: 0,
            ..Default::default()
        };
        let v = gate().check(&store, UserId(1), UserId(2)).await.unwrap();
        assert_eq!(v, Verdict::Denied(DenyReason::BlockedByRecipient));
    }

    #[tokio::test]
    async fn quota_boundary_is_inclusive() {
        // Exactly max relays already in the window: the next one is denied.
        let store = FakeStore {
            recipient_exists: true,
            recent_count: 10,
            ..Default::default()
        };
        let v = gate().check(&store, UserId(1), UserId(2)).await.unwrap();
        assert_eq!(v, Verdict::Denied(DenyReason::RateLimited));

        let store = FakeStore {
            recipient_exists: true,
            recent_count: 9,
            ..Default::default()
        };
        let v = gate().check(&store, UserId(1), UserId(2)).await.unwrap();
        assert_eq!(v, Verdict::Allowed);
    }
}
