//! Configuration management for tododex

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for the application
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Store configuration
    pub store: StoreConfig,

    /// Bot configuration
    pub bot: BotConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Local path to the JSON store file.
    ///
    /// Examples:
    /// - `~/.tododex/todo_data.json`
    /// - `./todo_data.json`
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Discord bot token.
    ///
    /// The conventional `DISCORD_TOKEN` environment variable takes over when
    /// this is unset. One of the two must be present to start the bot.
    #[serde(default)]
    pub token: Option<String>,

    /// Separator used by the bulk-add command to split one input string into
    /// several tasks.
    #[serde(default = "default_bulk_delimiter")]
    pub bulk_delimiter: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            bulk_delimiter: default_bulk_delimiter(),
        }
    }
}

// Default value functions
fn default_store_path() -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".tododex").join("todo_data.json"))
        .unwrap_or_else(|| PathBuf::from(".tododex/todo_data.json"))
}

fn default_bulk_delimiter() -> String {
    ";".to_string()
}

impl BotConfig {
    /// The bulk-add separator, falling back to the default when configured
    /// empty (an empty pattern would split between every character).
    pub fn bulk_delimiter(&self) -> &str {
        if self.bulk_delimiter.is_empty() {
            ";"
        } else {
            &self.bulk_delimiter
        }
    }

    /// Resolve the Discord token from config or the `DISCORD_TOKEN`
    /// environment variable. Missing token is a fatal startup error.
    pub fn resolve_token(&self) -> anyhow::Result<String> {
        if let Some(token) = self.token.as_deref()
            && !token.trim().is_empty()
        {
            return Ok(token.trim().to_string());
        }
        match std::env::var("DISCORD_TOKEN") {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => anyhow::bail!(
                "No Discord token configured. Set DISCORD_TOKEN or TODODEX__BOT__TOKEN."
            ),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            // Start with default values
            .set_default(
                "store.path",
                default_store_path().to_string_lossy().to_string(),
            )?
            .set_default("bot.bulk_delimiter", default_bulk_delimiter())?;

        // Try to load from tododex.toml in the current directory
        if std::path::Path::new("tododex.toml").exists() {
            builder = builder.add_source(config::File::with_name("tododex"));
        }

        // Try to load from ~/.tododex/tododex.toml
        if let Some(home_dir) = dirs::home_dir() {
            let config_path = home_dir.join(".tododex").join("tododex.toml");
            if config_path.exists() {
                builder = builder.add_source(config::File::from(config_path));
            }
        }

        // Override with environment variables (e.g. TODODEX__STORE__PATH=...)
        builder = builder.add_source(
            config::Environment::with_prefix("TODODEX")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?;
        settings.try_deserialize()
    }
}
