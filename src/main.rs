use hideout::commands::{hideout as hideout_cmds, impersonate, inviter, qr, raw, rtfm};
use hideout::ratelimit::RateLimiter;
use hideout::rtfm::source::{ChannelNotifier, HttpInventorySource, LogNotifier, Notifier};
use hideout::rtfm::Rtfm;
use hideout::services::qr::QrClient;
use hideout::{config::Config, db::Database, Data};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let discord_token = config.discord_token.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                rtfm::rtfm(),
                rtfm::rtfm_rebuild(),
                qr::decode_qr_code(),
                impersonate::impersonate(),
                raw::raw_message(),
                raw::raw_message_menu(),
                inviter::inviter(),
                hideout_cmds::addbot(),
                hideout_cmds::check_user(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.command_prefix.clone()),
                ..Default::default()
            },
            event_handler: |ctx, event, _framework, data| {
                Box::pin(hideout::events::handle_event(ctx, event, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                info!("Bot is ready!");
                if config.register_commands {
                    match config.dev_guild_id {
                        Some(guild_id) => {
                            poise::builtins::register_in_guild(
                                ctx,
                                &framework.options().commands,
                                serenity::GuildId::new(guild_id),
                            )
                            .await?
                        }
                        None => {
                            poise::builtins::register_globally(ctx, &framework.options().commands)
                                .await?
                        }
                    }
                }

                // Set bot status
                ctx.set_activity(Some(serenity::ActivityData::custom(&config.status_message)));

                let db = Database::new(&config)?;
                db.execute_init()?;

                let http_client = reqwest::Client::new();
                let notifier: Arc<dyn Notifier> = match config.log_channel_id {
                    Some(channel_id) => Arc::new(ChannelNotifier::new(ctx.http.clone(), channel_id)),
                    None => Arc::new(LogNotifier),
                };
                let source = Arc::new(HttpInventorySource::new(
                    http_client.clone(),
                    config.rtfm_fetch_timeout_secs,
                ));
                let rtfm = Arc::new(Rtfm::new(source, notifier));
                let qr = QrClient::new(http_client, config.qr_api_url.clone());

                Ok(Data {
                    config,
                    db,
                    rtfm,
                    qr,
                    qr_limiter: RateLimiter::new(2, Duration::from_secs(30), 1000),
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MESSAGES;

    let mut client = serenity::ClientBuilder::new(&discord_token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    info!("Starting bot...");
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    Ok(())
}
