use std::path::PathBuf;

use anyhow::bail;
use tracing::warn;

use veil_types::ChatId;

/// Runtime configuration, collected from the environment once at startup.
/// Core logic never reads env vars itself; this struct is the only source.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    /// Destination group for anonymized forwards. None when unset or not a
    /// chat id (e.g. a placeholder left in .env); relays are then rejected
    /// per-request instead of crashing the bot.
    pub target_group: Option<ChatId>,
    /// Path of the JSON snapshot file.
    pub data_file: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bot_token = match std::env::var("BOT_TOKEN") {
            Ok(token) if !token.trim().is_empty() => token,
            _ => bail!("BOT_TOKEN is not set; create a .env file with the bot credential"),
        };

        let target_group = std::env::var("TARGET_GROUP_ID")
            .ok()
            .and_then(|raw| parse_group_id(&raw));
        if target_group.is_none() {
            warn!("TARGET_GROUP_ID is not set to a chat id; relays will be rejected");
        }

        let data_file = std::env::var("VEIL_DATA_FILE")
            .unwrap_or_else(|_| "bot_data.json".into())
            .into();

        Ok(Self {
            bot_token,
            target_group,
            data_file,
        })
    }
}

fn parse_group_id(raw: &str) -> Option<ChatId> {
    raw.trim().parse::<i64>().ok().map(ChatId)
}
