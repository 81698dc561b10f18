//! Identity codec: turns a numeric user id into the opaque token carried in
//! a shareable `?start=` link, and back.
//!
//! The token is url-safe base64 (no padding) over the decimal identity. It is
//! obfuscation against casual link-guessing, not cryptographic protection:
//! anyone who already knows an identity can forge a valid token for it.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::domain::UserId;

/// Why a start token failed to decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("token is not url-safe base64")]
    Alphabet,

    #[error("token payload is not a numeric identity")]
    Payload,

    #[error("identity out of range")]
    Range,
}

/// Deterministic and total over valid identities; `decode(encode(x)) == x`.
pub fn encode(user_id: UserId) -> String {
    URL_SAFE_NO_PAD.encode(user_id.0.to_string())
}

/// Decode a token back to an identity.
///
/// Fails with an explicit `DecodeError` on anything `encode` could not have
/// produced: wrong alphabet, stray padding, non-numeric payload, values
/// outside the positive id range. Never panics.
pub fn decode(token: &str) -> Result<UserId, DecodeError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|_| DecodeError::Alphabet)?;

    let text = std::str::from_utf8(&bytes).map_err(|_| DecodeError::Payload)?;
    let id = text.parse::<i64>().map_err(|_| DecodeError::Payload)?;

    if id <= 0 {
        return Err(DecodeError::Range);
    }

    Ok(UserId(id))
}

/// Shareable deep link for a user, e.g. `https://t.me/somebot?start=NDI`.
pub fn invite_link(bot_username: &str, user_id: UserId) -> String {
    format!("https://t.me/{bot_username}?start={}", encode(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_over_representative_ids() {
        for id in [1i64, 7, 42, 99, 1_000, 1_868_394_048, i64::MAX] {
            let token = encode(UserId(id));
            assert_eq!(decode(&token), Ok(UserId(id)), "id {id}");
        }
    }

    #[test]
    fn tokens_are_url_safe() {
        let token = encode(UserId(i64::MAX));
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert!(!token.contains('='));
    }

    #[test]
    fn decode_rejects_wrong_alphabet() {
        assert_eq!(decode("not a token!"), Err(DecodeError::Alphabet));
        assert_eq!(decode("abc+/=="), Err(DecodeError::Alphabet));
    }

    #[test]
    fn decode_rejects_padding() {
        // `encode` never emits padding, so padded input cannot be ours.
        let padded = format!("{}==", encode(UserId(42)));
        assert_eq!(decode(&padded), Err(DecodeError::Alphabet));
    }

    #[test]
    fn decode_rejects_non_numeric_payload() {
        let forged = URL_SAFE_NO_PAD.encode("hello");
        assert_eq!(decode(&forged), Err(DecodeError::Payload));

        let binary = URL_SAFE_NO_PAD.encode([0xffu8, 0xfe]);
        assert_eq!(decode(&binary), Err(DecodeError::Payload));
    }

    #[test]
    fn decode_rejects_overflow_and_non_positive() {
        let too_big = URL_SAFE_NO_PAD.encode("99999999999999999999999999");
        assert_eq!(decode(&too_big), Err(DecodeError::Payload));

        let zero = URL_SAFE_NO_PAD.encode("0");
        assert_eq!(decode(&zero), Err(DecodeError::Range));

        let negative = URL_SAFE_NO_PAD.encode("-5");
        assert_eq!(decode(&negative), Err(DecodeError::Range));
    }

    #[test]
    fn decode_rejects_empty() {
        assert_eq!(decode(""), Err(DecodeError::Payload));
    }

    #[test]
    fn invite_link_embeds_token() {
        let link = invite_link("somebot", UserId(42));
        let token = link.rsplit("?start=").next().unwrap();
        assert_eq!(decode(token), Ok(UserId(42)));
    }
}
