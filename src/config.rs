use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub owner_id: Option<u64>,
    pub command_prefix: String,
    pub database_url: String,
    pub status_message: String,
    /// Guild where hideout-only commands (e.g. `addbot`) are allowed.
    pub hideout_guild_id: Option<u64>,
    pub bot_queue_channel_id: Option<u64>,
    /// Channel receiving operator notifications (RTFM build failures).
    pub log_channel_id: Option<u64>,
    pub rtfm_fetch_timeout_secs: u64,
    pub qr_api_url: String,
    pub dev_guild_id: Option<u64>,
    pub register_commands: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::build()
    }

    fn build() -> anyhow::Result<Self> {
        Ok(Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN must be set"))?,
            owner_id: snowflake("OWNER_ID"),
            command_prefix: env::var("COMMAND_PREFIX").unwrap_or_else(|_| "db.".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "data/hideout.db".to_string()),
            status_message: env::var("STATUS_MESSAGE")
                .unwrap_or_else(|_| "Reading the fine manual".to_string()),
            hideout_guild_id: snowflake("HIDEOUT_GUILD_ID"),
            bot_queue_channel_id: snowflake("BOT_QUEUE_CHANNEL_ID"),
            log_channel_id: snowflake("LOG_CHANNEL_ID"),
            rtfm_fetch_timeout_secs: env::var("RTFM_FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap_or(15),
            qr_api_url: env::var("QR_API_URL")
                .unwrap_or_else(|_| "http://api.qrserver.com/v1/read-qr-code/".to_string()),
            dev_guild_id: snowflake("DEV_GUILD_ID"),
            register_commands: env::var("REGISTER_COMMANDS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        })
    }
}

/// Reads a Discord ID. Zero is not a valid snowflake and counts as unset.
fn snowflake(var: &str) -> Option<u64> {
    env::var(var)
        .ok()
        .and_then(|id| id.trim().parse().ok())
        .filter(|id| *id != 0)
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"[REDACTED]")
            .field("owner_id", &self.owner_id)
            .field("command_prefix", &self.command_prefix)
            .field("database_url", &self.database_url)
            .field("status_message", &self.status_message)
            .field("hideout_guild_id", &self.hideout_guild_id)
            .field("bot_queue_channel_id", &self.bot_queue_channel_id)
            .field("log_channel_id", &self.log_channel_id)
            .field("rtfm_fetch_timeout_secs", &self.rtfm_fetch_timeout_secs)
            .field("qr_api_url", &self.qr_api_url)
            .field("dev_guild_id", &self.dev_guild_id)
            .field("register_commands", &self.register_commands)
            .finish()
    }
}

/// Discord message limit is 2000 characters
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;
/// Longest JSON dump that still fits in a code block reply
pub const RAW_MESSAGE_INLINE_LIMIT: usize = 1990;

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_config_logic() {
        // 1. Test missing vars
        env::remove_var("DISCORD_TOKEN");
        let result = Config::build();
        assert!(result.is_err(), "Should fail when DISCORD_TOKEN is missing");

        // 2. Test defaults
        env::set_var("DISCORD_TOKEN", "test_token");
        env::remove_var("RTFM_FETCH_TIMEOUT_SECS");
        let config = Config::build().unwrap();
        assert_eq!(config.discord_token, "test_token");
        assert_eq!(config.rtfm_fetch_timeout_secs, 15);
        assert!(config.qr_api_url.contains("read-qr-code"));

        // 3. Test overrides and bad values
        env::set_var("RTFM_FETCH_TIMEOUT_SECS", "30");
        env::set_var("LOG_CHANNEL_ID", "not-a-number");
        let config = Config::build().unwrap();
        assert_eq!(config.rtfm_fetch_timeout_secs, 30);
        assert_eq!(config.log_channel_id, None);

        // 4. Zero IDs are treated as unset
        env::set_var("OWNER_ID", "0");
        env::set_var("BOT_QUEUE_CHANNEL_ID", "0");
        env::set_var("HIDEOUT_GUILD_ID", "774561547930304536");
        let config = Config::build().unwrap();
        assert_eq!(config.owner_id, None);
        assert_eq!(config.bot_queue_channel_id, None);
        assert_eq!(config.hideout_guild_id, Some(774561547930304536));

        // 5. Test debug redaction
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("test_token"));
        assert!(debug_output.contains("[REDACTED]"));

        // Cleanup
        env::remove_var("DISCORD_TOKEN");
        env::remove_var("RTFM_FETCH_TIMEOUT_SECS");
        env::remove_var("LOG_CHANNEL_ID");
        env::remove_var("OWNER_ID");
        env::remove_var("BOT_QUEUE_CHANNEL_ID");
        env::remove_var("HIDEOUT_GUILD_ID");
    }
}
