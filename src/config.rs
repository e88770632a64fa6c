//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/craftbook.sqlite"
//!
//! [bot]
//! token = "123456:ABC..."        # or set BOT_TOKEN
//! mode = "polling"               # or "webhook"
//! trusted_forwarders = [408101137]
//!
//! [server]
//! bind = "0.0.0.0:8443"
//! public_url = "https://crafts.example.org"
//!
//! [data]
//! seed_path = "./data/items.json"
//! ```
//!
//! Only `[db]` is required. The bot token may come from the `BOT_TOKEN`
//! environment variable, which overrides the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Chat Wars game bot; the only default trusted forward source.
pub const CHAT_WARS_BOT_ID: i64 = 408101137;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub mode: BotMode,
    #[serde(default = "default_trusted_forwarders")]
    pub trusted_forwarders: Vec<i64>,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            mode: BotMode::Polling,
            trusted_forwarders: default_trusted_forwarders(),
            poll_timeout_secs: default_poll_timeout(),
            api_base: default_api_base(),
        }
    }
}

fn default_trusted_forwarders() -> Vec<i64> {
    vec![CHAT_WARS_BOT_ID]
}
fn default_poll_timeout() -> u64 {
    30
}
fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_url: None,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8443".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DataConfig {
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

impl BotConfig {
    /// The bot token, required by every command that talks to Telegram.
    pub fn require_token(&self) -> Result<&str> {
        match self.token.as_deref() {
            Some(t) if !t.trim().is_empty() => Ok(t),
            _ => anyhow::bail!("bot.token is not set (use [bot] token or BOT_TOKEN)"),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if let Ok(token) = std::env::var("BOT_TOKEN") {
        if !token.trim().is_empty() {
            config.bot.token = Some(token);
        }
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.bot.trusted_forwarders.is_empty() {
        anyhow::bail!("bot.trusted_forwarders must list at least one sender id");
    }

    if config.bot.poll_timeout_secs == 0 || config.bot.poll_timeout_secs > 50 {
        anyhow::bail!("bot.poll_timeout_secs must be in 1..=50");
    }

    if config.bot.mode == BotMode::Webhook {
        match config.server.public_url.as_deref() {
            Some(url) if url.starts_with("https://") => {}
            Some(url) => anyhow::bail!(
                "server.public_url must be an https:// URL in webhook mode, got '{}'",
                url
            ),
            None => anyhow::bail!("server.public_url is required when bot.mode = \"webhook\""),
        }
    }

    Ok(())
}
