//! Credentials for the external platform integrations.
//!
//! These are loaded once alongside [`AppConfig`](super::AppConfig) so callers
//! receive them explicitly instead of reading process-wide state on demand.
//! The schema tooling never consumes them; `smc config show` reports them.

use std::path::PathBuf;

use crate::config::{optional_env, ConfigError};

pub const ENV_INSTAGRAM_ACCESS_TOKEN: &str = "INSTAGRAM_ACCESS_TOKEN";
pub const ENV_INSTAGRAM_USER_ID: &str = "INSTAGRAM_USER_ID";
pub const ENV_YOUTUBE_CLIENT_ID: &str = "YOUTUBE_CLIENT_ID";
pub const ENV_YOUTUBE_CLIENT_SECRET: &str = "YOUTUBE_CLIENT_SECRET";
pub const ENV_YOUTUBE_REDIRECT_URI: &str = "YOUTUBE_REDIRECT_URI";
pub const ENV_YOUTUBE_TOKEN_FILE: &str = "YOUTUBE_TOKEN_FILE";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstagramCredentials {
    pub access_token: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YouTubeCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub token_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrationCredentials {
    pub instagram: InstagramCredentials,
    pub youtube: YouTubeCredentials,
}

impl IntegrationCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            instagram: InstagramCredentials {
                access_token: optional_env(ENV_INSTAGRAM_ACCESS_TOKEN)?,
                user_id: optional_env(ENV_INSTAGRAM_USER_ID)?,
            },
            youtube: YouTubeCredentials {
                client_id: optional_env(ENV_YOUTUBE_CLIENT_ID)?,
                client_secret: optional_env(ENV_YOUTUBE_CLIENT_SECRET)?,
                redirect_uri: optional_env(ENV_YOUTUBE_REDIRECT_URI)?,
                token_file: optional_env(ENV_YOUTUBE_TOKEN_FILE)?.map(PathBuf::from),
            },
        })
    }

    /// `(variable, rendered value)` pairs with secrets masked, for display
    pub fn masked_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                ENV_INSTAGRAM_ACCESS_TOKEN,
                mask_secret(self.instagram.access_token.as_deref()),
            ),
            (ENV_INSTAGRAM_USER_ID, show_plain(self.instagram.user_id.as_deref())),
            (ENV_YOUTUBE_CLIENT_ID, show_plain(self.youtube.client_id.as_deref())),
            (
                ENV_YOUTUBE_CLIENT_SECRET,
                mask_secret(self.youtube.client_secret.as_deref()),
            ),
            (
                ENV_YOUTUBE_REDIRECT_URI,
                show_plain(self.youtube.redirect_uri.as_deref()),
            ),
            (
                ENV_YOUTUBE_TOKEN_FILE,
                show_plain(
                    self.youtube
                        .token_file
                        .as_ref()
                        .and_then(|path| path.to_str()),
                ),
            ),
        ]
    }
}

/// Keep the last four characters of a secret, enough to tell tokens apart.
pub fn mask_secret(value: Option<&str>) -> String {
    match value {
        None => "(unset)".to_string(),
        Some(secret) => {
            let chars: Vec<char> = secret.chars().collect();
            if chars.len() <= 8 {
                "****".to_string()
            } else {
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("****{}", tail)
            }
        }
    }
}

fn show_plain(value: Option<&str>) -> String {
    value.unwrap_or("(unset)").to_string()
}
