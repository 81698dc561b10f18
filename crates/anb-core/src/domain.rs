/// Telegram user id (numeric). Other participants only ever see this identity
/// through the codec token, never the raw value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Id of a persisted relay record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordId(pub i64);

/// Content kind of a relayed message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayKind {
    Text,
    Photo,
}

impl RelayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayKind::Text => "text",
            RelayKind::Photo => "photo",
        }
    }
}

/// A registered participant as handed to the persistence collaborator.
#[derive(Clone, Debug)]
pub struct Profile {
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
}
