//! The relay state machine.
//!
//! One entry point (`handle_event`) drives the whole conversational protocol:
//! opening an invite link, relaying an anonymous message or photo, replying,
//! and stopping. Every failure is converted into exactly one reply to the
//! sender here; nothing propagates past this boundary as an error.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{Config, SessionPolicy};
use crate::domain::{RelayKind, UserId};
use crate::policy::{DenyReason, PolicyGate, Verdict};
use crate::ports::{DeliveryPort, RelayPayload, StoragePort};
use crate::session::{Session, SessionStore};
use crate::{texts, token};

/// Inbound event as mapped from the transport by the wiring layer.
#[derive(Clone, Debug)]
pub enum InboundEvent {
    /// `/start <token>` deep-link open.
    Open { token: String },
    /// Reply affordance pressed on a delivered relay.
    OpenReply { token: String },
    Text {
        content: String,
    },
    Photo {
        file_id: String,
        caption: Option<String>,
    },
    /// Explicit `/stop` directive.
    Stop,
    /// Content the bot does not handle (stickers, voice, ...).
    Unsupported,
}

/// What came out of one transition.
///
/// `SendToSender` entries must be sent to the sender's own chat by the wiring
/// layer. A `SendToRecipient` entry is emitted only after the delivery port
/// already accepted the payload; it records the relay for callers and tests,
/// and needs no further transport call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundAction {
    SendToSender(String),
    SendToRecipient {
        recipient: UserId,
        payload: RelayPayload,
    },
}

fn reply(text: impl Into<String>) -> OutboundAction {
    OutboundAction::SendToSender(text.into())
}

enum OpenKind {
    Invite,
    Reply,
}

enum RelayContent {
    Text(String),
    Photo {
        file_id: String,
        caption: Option<String>,
    },
}

pub struct RelayEngine {
    store: Arc<dyn StoragePort>,
    delivery: Arc<dyn DeliveryPort>,
    sessions: SessionStore,
    gate: PolicyGate,
    session_policy: SessionPolicy,
    allow_photos: bool,
    max_message_length: usize,
}

impl RelayEngine {
    pub fn new(cfg: &Config, store: Arc<dyn StoragePort>, delivery: Arc<dyn DeliveryPort>) -> Self {
        Self {
            store,
            delivery,
            sessions: SessionStore::new(),
            gate: PolicyGate::new(cfg.max_relays_per_window, cfg.rate_window),
            session_policy: cfg.session_policy,
            allow_photos: cfg.allow_photos,
            max_message_length: cfg.max_message_length,
        }
    }

    /// Run one state-machine transition for `sender`.
    ///
    /// Callers must hold the sender's `UserLocks` guard across this call so
    /// that events from the same sender never interleave.
    pub async fn handle_event(&self, sender: UserId, event: InboundEvent) -> Vec<OutboundAction> {
        match event {
            InboundEvent::Open { token } => self.open(sender, &token, OpenKind::Invite).await,
            InboundEvent::OpenReply { token } => self.open(sender, &token, OpenKind::Reply).await,
            InboundEvent::Text { content } => {
                self.relay(sender, RelayContent::Text(content)).await
            }
            InboundEvent::Photo { file_id, caption } => {
                if !self.allow_photos {
                    return vec![reply(texts::unsupported_content())];
                }
                self.relay(sender, RelayContent::Photo { file_id, caption })
                    .await
            }
            InboundEvent::Stop => {
                let had = self.sessions.clear(sender).await;
                debug!("stop from {sender:?} (had session: {})", had.is_some());
                vec![reply(texts::stopped())]
            }
            InboundEvent::Unsupported => vec![reply(texts::unsupported_content())],
        }
    }

    /// Current session state, for the wiring layer and tests.
    pub async fn session_of(&self, sender: UserId) -> Option<Session> {
        self.sessions.get(sender).await
    }

    async fn open(&self, sender: UserId, raw: &str, kind: OpenKind) -> Vec<OutboundAction> {
        let target = match token::decode(raw) {
            Ok(t) => t,
            Err(e) => {
                debug!("undecodable start token from {sender:?}: {e}");
                return vec![reply(texts::decode_failed(e))];
            }
        };

        if target == sender {
            return vec![reply(texts::cannot_message_self())];
        }

        match self.store.identity_exists(target).await {
            Ok(true) => {}
            Ok(false) => return vec![reply(texts::target_not_active())],
            Err(e) => {
                warn!("existence check failed for {target:?}: {e}");
                return vec![reply(texts::temporary_failure())];
            }
        }

        let (session, prompt) = match kind {
            OpenKind::Invite => (Session::awaiting_message(target), texts::prompt_for_message()),
            OpenKind::Reply => (Session::awaiting_reply(target), texts::prompt_for_reply()),
        };
        self.sessions.set(sender, session).await;

        vec![reply(prompt)]
    }

    async fn relay(&self, sender: UserId, content: RelayContent) -> Vec<OutboundAction> {
        let Some(session) = self.sessions.get(sender).await else {
            return vec![reply(texts::no_open_conversation())];
        };
        let recipient = session.counterpart();

        // The bound covers captions too, not just plain text.
        let text_len = match &content {
            RelayContent::Text(t) => t.chars().count(),
            RelayContent::Photo { caption, .. } => {
                caption.as_deref().map_or(0, |c| c.chars().count())
            }
        };
        if text_len > self.max_message_length {
            return vec![reply(texts::message_too_long(self.max_message_length))];
        }

        let verdict = match self.gate.check(self.store.as_ref(), sender, recipient).await {
            Ok(v) => v,
            Err(e) => {
                warn!("policy check failed ({sender:?} -> {recipient:?}): {e}");
                return vec![reply(texts::temporary_failure())];
            }
        };
        if let Verdict::Denied(reason) = verdict {
            debug!("relay denied ({sender:?} -> {recipient:?}): {reason:?}");
            // A rate-limited sender has to come back later anyway; other
            // denials keep the session so a retry is possible.
            if reason == DenyReason::RateLimited {
                self.sessions.clear(sender).await;
            }
            return vec![reply(texts::denied(reason))];
        }

        let reply_token = Some(token::encode(sender));
        let (stored_content, kind, payload) = match &content {
            RelayContent::Text(t) => (
                t.clone(),
                RelayKind::Text,
                RelayPayload {
                    text: texts::relay_body(t),
                    photo_file_id: None,
                    reply_token,
                },
            ),
            RelayContent::Photo { file_id, caption } => (
                file_id.clone(),
                RelayKind::Photo,
                RelayPayload {
                    text: texts::relay_photo_caption(caption.as_deref()),
                    photo_file_id: Some(file_id.clone()),
                    reply_token,
                },
            ),
        };

        // No delivery without a durable record: a failed write aborts the
        // attempt before anything reaches the recipient.
        if let Err(e) = self
            .store
            .create_relay_record(sender, recipient, &stored_content, kind)
            .await
        {
            warn!("relay record not created ({sender:?} -> {recipient:?}): {e}");
            return vec![reply(texts::persistence_failed())];
        }

        match self.delivery.deliver(recipient, payload.clone()).await {
            Ok(()) => {
                debug!("relayed {kind:?} {sender:?} -> {recipient:?}");
                if self.session_policy == SessionPolicy::SingleShot {
                    self.sessions.clear(sender).await;
                }
                vec![
                    OutboundAction::SendToRecipient { recipient, payload },
                    reply(texts::relay_sent()),
                ]
            }
            Err(e) => {
                warn!("delivery failed ({sender:?} -> {recipient:?}): {e}");
                self.sessions.clear(sender).await;
                vec![reply(texts::delivery_failed())]
            }
        }
    }
}
