use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Profile, RecordId, RelayKind, UserId};
use crate::Result;

/// Aggregate counters for the admin stats surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total_users: u64,
    pub total_relays: u64,
    pub total_reports: u64,
}

/// Persistence collaborator: user registry, blocks, relay records.
///
/// The bot this replaces opened an ad hoc SQLite connection per query and ran
/// multi-row updates as independent statements. Here the whole surface is one
/// async port; an implementation owns its handle/pool and its transaction
/// boundaries, and the engine never touches storage details directly.
#[async_trait]
pub trait StoragePort: Send + Sync {
    /// Insert or refresh a participant. Registration must happen before the
    /// participant's identity can pass an existence check.
    async fn register_identity(&self, profile: Profile) -> Result<()>;

    async fn identity_exists(&self, id: UserId) -> Result<bool>;

    /// Directed block: `blocker` refuses relays from `blocked`.
    async fn is_blocked(&self, blocker: UserId, blocked: UserId) -> Result<bool>;
    async fn block(&self, blocker: UserId, blocked: UserId, reason: Option<String>) -> Result<()>;
    async fn unblock(&self, blocker: UserId, blocked: UserId) -> Result<()>;

    /// Administrative block flag on an identity.
    async fn is_admin_blocked(&self, id: UserId) -> Result<bool>;
    async fn set_admin_block(&self, id: UserId, blocked: bool, reason: Option<String>)
        -> Result<()>;

    /// Flag a received relay for admin attention. Reporting never blocks;
    /// pair it with `block` when the reporter wants no further contact.
    async fn report(&self, reporter: UserId, reported: UserId, reason: Option<String>)
        -> Result<()>;

    /// Number of relays `sender` created within the trailing `window`.
    async fn recent_relay_count(&self, sender: UserId, window: Duration) -> Result<u32>;

    /// Persist one relay attempt. Creating the record and updating any
    /// derived counters must be a single atomic unit.
    async fn create_relay_record(
        &self,
        sender: UserId,
        recipient: UserId,
        content: &str,
        kind: RelayKind,
    ) -> Result<RecordId>;

    async fn stats(&self) -> Result<StoreStats>;

    /// All registered identities, for the admin broadcast.
    async fn all_identities(&self) -> Result<Vec<UserId>>;
}

/// Outbound payload handed to the transport for one relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayPayload {
    pub text: String,
    /// Transport file handle when the relay is a photo.
    pub photo_file_id: Option<String>,
    /// When present, the transport should render a "reply anonymously"
    /// affordance carrying this token.
    pub reply_token: Option<String>,
}

impl RelayPayload {
    pub fn kind(&self) -> RelayKind {
        if self.photo_file_id.is_some() {
            RelayKind::Photo
        } else {
            RelayKind::Text
        }
    }
}

/// Transport send to a recipient. One attempt from the engine's point of
/// view; a transport may absorb its own flow-control retries (429s).
#[async_trait]
pub trait DeliveryPort: Send + Sync {
    async fn deliver(&self, recipient: UserId, payload: RelayPayload) -> Result<()>;
}
