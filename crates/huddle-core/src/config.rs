//! Huddlebot configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HuddleError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuddleConfig {
    /// Prefix that marks a message as a command, e.g. "!schedule".
    #[serde(default = "default_prefix")]
    pub command_prefix: String,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

fn default_prefix() -> String {
    "!".into()
}

impl Default for HuddleConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_prefix(),
            store: StoreConfig::default(),
            scheduler: SchedulerConfig::default(),
            channel: ChannelConfig::default(),
        }
    }
}

impl HuddleConfig {
    /// Load config from the default path (~/.huddlebot/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HuddleError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| HuddleError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| HuddleError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the huddlebot home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".huddlebot")
    }
}

/// Document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the store document.
    #[serde(default = "default_store_dir")]
    pub dir: String,
}

fn default_store_dir() -> String {
    "~/.huddlebot/store".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

impl StoreConfig {
    /// Resolve `~` against the home directory.
    pub fn resolved_dir(&self) -> PathBuf {
        if let Some(rest) = self.dir.strip_prefix("~/") {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(rest)
        } else {
            PathBuf::from(&self.dir)
        }
    }
}

/// Reminder scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between reminder checks.
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
}

fn default_poll_secs() -> u64 {
    15
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_secs: default_poll_secs(),
        }
    }
}

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    #[serde(default)]
    pub discord: Option<DiscordChannelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordChannelConfig {
    pub enabled: bool,
    pub bot_token: String,
    /// Gateway intents bitmask.
    #[serde(default = "default_intents")]
    pub intents: u64,
}

fn default_intents() -> u64 {
    // GUILDS | GUILD_MESSAGES | DIRECT_MESSAGES | MESSAGE_CONTENT
    (1 << 0) | (1 << 9) | (1 << 12) | (1 << 15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HuddleConfig::default();
        assert_eq!(config.command_prefix, "!");
        assert_eq!(config.scheduler.poll_secs, 15);
        assert!(config.channel.discord.is_none());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            command_prefix = "?"

            [scheduler]
            poll_secs = 5

            [channel.discord]
            enabled = true
            bot_token = "abc123"
        "#;

        let config: HuddleConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.command_prefix, "?");
        assert_eq!(config.scheduler.poll_secs, 5);
        let discord = config.channel.discord.unwrap();
        assert!(discord.enabled);
        assert_eq!(discord.bot_token, "abc123");
    }

    #[test]
    fn test_store_dir_resolution() {
        let cfg = StoreConfig {
            dir: "/var/lib/huddle".into(),
        };
        assert_eq!(cfg.resolved_dir(), PathBuf::from("/var/lib/huddle"));
    }
}
