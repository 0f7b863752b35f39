use std::env;
use std::time::Duration;

use log::{debug, error, info};
use poise::serenity_prelude::GuildId;
use url::Url;

use crate::error::{BotError, Result};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub openai_api_key: String,
    /// Guild to register commands in; `None` registers them globally.
    pub guild_id: Option<GuildId>,
    pub remove_commands: bool,
    pub openai_model: String,
    pub openai_base_url: Url,
    pub completion_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| {
                    error!("Failed to load {key} from environment");
                    BotError::Config(format!("{key} must be set"))
                })
        };
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let discord_token = required("DISCORD_TOKEN")?;
        let openai_api_key = required("OPENAI_API_KEY")?;

        let guild_id = optional("DISCORD_GUILD_ID")
            .map(|raw| parse_guild_id(&raw))
            .transpose()?;

        let remove_commands = optional("REMOVE_COMMANDS")
            .map(|raw| parse_bool("REMOVE_COMMANDS", &raw))
            .transpose()?
            .unwrap_or(true);

        let openai_model = optional("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let openai_base_url = parse_base_url(
            &optional("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        )?;

        let completion_timeout = optional("COMPLETION_TIMEOUT_SECS")
            .map(|raw| parse_timeout(&raw))
            .transpose()?
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        info!("Configuration loaded successfully");
        debug!("Discord token length: {} characters", discord_token.len());
        debug!(
            "OpenAI API key length: {} characters",
            openai_api_key.len()
        );
        debug!("Guild scope: {guild_id:?}");
        debug!("Remove commands on shutdown: {remove_commands}");
        debug!("OpenAI model: {openai_model}");
        debug!("OpenAI base URL: {openai_base_url}");
        debug!("Completion timeout: {completion_timeout:?}");

        Ok(Self {
            discord_token,
            openai_api_key,
            guild_id,
            remove_commands,
            openai_model,
            openai_base_url,
            completion_timeout,
        })
    }
}

fn parse_guild_id(raw: &str) -> Result<GuildId> {
    match raw.trim().parse::<u64>() {
        Ok(id) if id != 0 => Ok(GuildId::new(id)),
        _ => Err(BotError::Config(format!(
            "DISCORD_GUILD_ID must be a non-zero snowflake, got '{raw}'"
        ))),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(BotError::Config(format!(
            "{key} must be a boolean, got '{raw}'"
        ))),
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(BotError::Config(format!(
            "COMPLETION_TIMEOUT_SECS must be a positive integer, got '{raw}'"
        ))),
    }
}

// Joining relative paths onto a base without a trailing slash drops its last segment.
fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Ok(Url::parse(trimmed)?)
    } else {
        Ok(Url::parse(&format!("{trimmed}/"))?)
    }
}
