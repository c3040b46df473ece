use std::env;
use std::time::Duration;

use uuid::Uuid;

use crate::domain::entities::ProfileId;
use crate::error::ConfigError;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend (REST and realtime share it)
    pub backend_url: String,
    /// Public anon key sent as `apikey` on every request
    pub anon_key: String,
    /// Bearer token for the signed-in session; the anon key when signed out
    pub access_token: String,
    /// Signed-in user, required for likes and the following view
    pub user_id: Option<ProfileId>,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_url = lookup("VERSE_BACKEND_URL")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("VERSE_BACKEND_URL"))?;
        let anon_key = lookup("VERSE_ANON_KEY")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("VERSE_ANON_KEY"))?;
        let access_token = lookup("VERSE_ACCESS_TOKEN")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| anon_key.clone());

        let user_id = match lookup("VERSE_USER_ID").filter(|v| !v.is_empty()) {
            Some(raw) => Some(ProfileId(Uuid::parse_str(&raw).map_err(|e| {
                ConfigError::Invalid {
                    key: "VERSE_USER_ID",
                    message: e.to_string(),
                }
            })?)),
            None => None,
        };

        let request_timeout = match lookup("VERSE_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                    key: "VERSE_REQUEST_TIMEOUT_SECS",
                    message: e.to_string(),
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            anon_key,
            access_token,
            user_id,
            request_timeout,
        })
    }

    /// Whether a user is signed in
    pub fn signed_in(&self) -> bool {
        self.user_id.is_some()
    }
}
