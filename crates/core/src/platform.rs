//! Social platforms an account connection can belong to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// Platforms whose active connections must be exclusive unless configured otherwise.
pub const DEFAULT_EXCLUSIVE_PLATFORMS: &[Platform] = &[Platform::Facebook, Platform::Instagram];

/// A social platform as stored in `social_media_connections.platform`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
    #[serde(rename = "tiktok")]
    TikTok,
    #[serde(alias = "twitter")]
    X,
    #[serde(rename = "youtube")]
    YouTube,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Facebook,
        Platform::Instagram,
        Platform::TikTok,
        Platform::X,
        Platform::YouTube,
    ];

    /// Value stored in the `platform` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::X => "x",
            Platform::YouTube => "youtube",
        }
    }

    /// Short code used when naming per-platform database objects
    pub fn short_code(&self) -> &'static str {
        match self {
            Platform::Facebook => "fb",
            Platform::Instagram => "ig",
            Platform::TikTok => "tt",
            Platform::X => "x",
            Platform::YouTube => "yt",
        }
    }

    /// Parse a comma separated list such as `facebook, instagram`.
    ///
    /// Blank entries are ignored; any unknown name fails the whole list.
    pub fn parse_list(value: &str) -> Result<Vec<Platform>, ConfigError> {
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "facebook" => Ok(Platform::Facebook),
            "instagram" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::TikTok),
            "x" | "twitter" => Ok(Platform::X),
            "youtube" => Ok(Platform::YouTube),
            _ => Err(ConfigError::invalid_value(
                "platform",
                s,
                "one of: facebook, instagram, tiktok, x, youtube",
            )),
        }
    }
}

impl TryFrom<String> for Platform {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
