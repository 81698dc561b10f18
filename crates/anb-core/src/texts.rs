//! User-facing message texts.
//!
//! Every denial or failure maps to exactly one reply to the sender; the
//! recipient is never told about a failed or denied attempt.

use crate::policy::DenyReason;
use crate::token::DecodeError;

pub fn welcome(invite_link: &str) -> String {
    format!(
        "🎭 Welcome to the anonymous message bot!\n\n\
         👤 Your personal link:\n{invite_link}\n\n\
         📤 How it works:\n\
         1. Share your link with others\n\
         2. They can send you anonymous messages\n\
         3. You'll receive them here\n\n\
         🔒 Senders stay anonymous."
    )
}

pub fn your_link(invite_link: &str) -> String {
    format!("🔗 Your anonymous message link:\n{invite_link}")
}

pub fn prompt_for_message() -> &'static str {
    "🔗 You've been invited to send an anonymous message!\n\n\
     📝 Type your message below.\n\n\
     ⚠️ It will be delivered anonymously. Send /stop to cancel."
}

pub fn prompt_for_reply() -> &'static str {
    "↩️ Replying anonymously.\n\n📝 Type your reply below. Send /stop to cancel."
}

pub fn invalid_link() -> &'static str {
    "❌ Invalid link. Ask for a fresh one and try again."
}

pub fn cannot_message_self() -> &'static str {
    "❌ You can't send an anonymous message to yourself."
}

pub fn target_not_active() -> &'static str {
    "❌ Invalid link. The user might not exist or hasn't used the bot yet."
}

pub fn no_open_conversation() -> &'static str {
    "🤔 You need to open someone's invite link before sending a message.\n\
     💡 Use /start to get your own link!"
}

pub fn relay_body(content: &str) -> String {
    format!("📨 Anonymous message:\n\n{content}")
}

pub fn relay_photo_caption(caption: Option<&str>) -> String {
    match caption {
        Some(c) if !c.trim().is_empty() => format!("📨 Anonymous photo:\n\n{c}"),
        _ => "📨 Anonymous photo".to_string(),
    }
}

pub fn relay_sent() -> &'static str {
    "✅ Message sent anonymously."
}

pub fn delivery_failed() -> &'static str {
    "❌ Could not deliver the message. The recipient may have closed the bot."
}

pub fn persistence_failed() -> &'static str {
    "❌ Failed to save your message. Nothing was sent; please try again."
}

pub fn temporary_failure() -> &'static str {
    "⚠️ Something went wrong. Please try again."
}

pub fn unsupported_content() -> &'static str {
    "❌ This kind of message is not supported here."
}

pub fn message_too_long(limit: usize) -> String {
    format!("❌ Message too long (limit {limit} characters).")
}

pub fn stopped() -> &'static str {
    "🛑 Conversation closed. Open an invite link to start a new one."
}

pub fn denied(reason: DenyReason) -> &'static str {
    match reason {
        DenyReason::RecipientUnknown => target_not_active(),
        DenyReason::SenderBlockedByAdmin => "🚫 You are not allowed to send messages.",
        DenyReason::BlockedByRecipient => "🚫 This user is not accepting your messages.",
        DenyReason::RateLimited => {
            "⏳ You've sent too many messages this hour. Please try again later."
        }
    }
}

pub fn decode_failed(err: DecodeError) -> &'static str {
    let _ = err; // all decode failures read the same to the user
    invalid_link()
}

pub fn blocked_sender() -> &'static str {
    "🚫 Sender blocked. They can no longer message you."
}

pub fn unblocked_sender() -> &'static str {
    "🔓 Sender unblocked."
}

pub fn report_received() -> &'static str {
    "⚠️ Report received. An admin will take a look."
}

pub fn not_authorized() -> &'static str {
    "❌ You are not authorized to use this command."
}

pub fn unknown_command() -> &'static str {
    "❌ This command does not exist."
}

pub fn stats(total_users: u64, total_relays: u64, total_reports: u64) -> String {
    format!(
        "📊 Bot statistics:\n\n👥 Total users: {total_users}\n\
         💬 Total messages: {total_relays}\n🚩 Reports: {total_reports}"
    )
}

pub fn broadcast_usage() -> &'static str {
    "⚠️ Usage: /broadcast Your message here."
}

pub fn broadcast_body(text: &str) -> String {
    format!("📢 Broadcast:\n\n{text}")
}

pub fn broadcast_summary(sent: u32, failed: u32) -> String {
    format!("✅ Broadcast sent!\n📬 Delivered: {sent} | ❌ Failed: {failed}")
}

pub fn ban_usage() -> &'static str {
    "⚠️ Usage: /ban <user id> [reason]"
}

pub fn unban_usage() -> &'static str {
    "⚠️ Usage: /unban <user id>"
}

pub fn banned(user_id: i64) -> String {
    format!("🚫 User {user_id} banned.")
}

pub fn unbanned(user_id: i64) -> String {
    format!("✅ User {user_id} unbanned.")
}
