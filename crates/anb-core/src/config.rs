use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// What happens to an awaiting session after one successful relay.
///
/// The divergent bot versions this replaces disagreed on the answer; here it
/// is a single explicit choice, never mixed per call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPolicy {
    /// Session clears after one delivered message (default).
    SingleShot,
    /// Session stays open so the sender can keep messaging the same target.
    Continuous,
}

/// Typed configuration, loaded from the environment (with `.env` support).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub bot_token: String,
    pub bot_username: String,
    pub admin_ids: Vec<i64>,

    // Relay behavior
    pub session_policy: SessionPolicy,
    pub allow_photos: bool,
    pub max_message_length: usize,

    // Rate limiting
    pub max_relays_per_window: u32,
    pub rate_window: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let bot_token = env_str("BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let bot_username = env_str("BOT_USERNAME")
            .and_then(non_empty)
            .map(|u| u.trim_start_matches('@').to_string())
            .ok_or_else(|| {
                Error::Config("BOT_USERNAME environment variable is required".to_string())
            })?;

        let admin_ids = parse_csv_i64(env_str("ADMIN_IDS"));

        let session_policy = match env_str("SESSION_POLICY").as_deref() {
            None | Some("") => SessionPolicy::SingleShot,
            Some(s) => parse_session_policy(s)?,
        };

        let allow_photos = env_bool("ALLOW_PHOTOS").unwrap_or(true);
        let max_message_length = env_usize("MAX_MESSAGE_LENGTH").unwrap_or(4096);

        let max_relays_per_window = env_u32("MAX_MESSAGES_PER_HOUR").unwrap_or(10);
        let rate_window =
            Duration::from_secs(env_u64("RATE_WINDOW_HOURS").unwrap_or(1).max(1) * 3600);

        Ok(Self {
            bot_token,
            bot_username,
            admin_ids,
            session_policy,
            allow_photos,
            max_message_length,
            max_relays_per_window,
            rate_window,
        })
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

fn parse_session_policy(s: &str) -> Result<SessionPolicy> {
    match s.trim().to_lowercase().as_str() {
        "single_shot" | "single-shot" | "singleshot" => Ok(SessionPolicy::SingleShot),
        "continuous" => Ok(SessionPolicy::Continuous),
        other => Err(Error::Config(format!(
            "SESSION_POLICY must be single_shot or continuous, got: {other}"
        ))),
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_policy_parsing() {
        assert_eq!(
            parse_session_policy("single_shot").unwrap(),
            SessionPolicy::SingleShot
        );
        assert_eq!(
            parse_session_policy("Continuous").unwrap(),
            SessionPolicy::Continuous
        );
        assert!(parse_session_policy("both").is_err());
    }

    #[test]
    fn csv_admin_ids() {
        assert_eq!(
            parse_csv_i64(Some("1, 2,,3,x".to_string())),
            vec![1, 2, 3]
        );
        assert!(parse_csv_i64(None).is_empty());
    }
}
