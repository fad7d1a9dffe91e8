use crate::config::DISCORD_MESSAGE_LIMIT;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use tracing::{debug, info};

const WEBHOOK_NAME: &str = "Hideout Webhook";

/// Sends a message as another member, through a channel webhook
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_bot_permissions = "MANAGE_WEBHOOKS",
    aliases("webhook-send", "wh-send", "say-as")
)]
pub async fn impersonate(
    ctx: Context<'_>,
    #[description = "Member to speak as"] member: serenity::Member,
    #[description = "What they should say"]
    #[rest]
    message: String,
) -> Result<(), Error> {
    if message.trim().is_empty() {
        ctx.say("❌ The message cannot be empty.").await?;
        return Ok(());
    }
    if message.chars().count() > DISCORD_MESSAGE_LIMIT {
        ctx.say(format!(
            "❌ Messages can be at most {} characters long.",
            DISCORD_MESSAGE_LIMIT
        ))
        .await?;
        return Ok(());
    }

    info!(
        "Impersonate: {} speaking as {} in channel {}",
        ctx.author().name,
        member.user.name,
        ctx.channel_id()
    );

    let webhook = get_webhook(ctx.serenity_context(), ctx.channel_id()).await?;
    let builder = serenity::ExecuteWebhook::new()
        .content(message)
        .username(member.display_name())
        .avatar_url(member.face())
        .allowed_mentions(serenity::CreateAllowedMentions::new());
    webhook.execute(ctx.http(), false, builder).await?;

    match ctx {
        poise::Context::Prefix(prefix) => {
            if let Err(e) = prefix.msg.delete(ctx.http()).await {
                debug!("Impersonate: could not delete invoking message: {}", e);
            }
        }
        poise::Context::Application(_) => {
            ctx.send(
                poise::CreateReply::default()
                    .content("✅ Sent.")
                    .ephemeral(true),
            )
            .await?;
        }
    }

    Ok(())
}

/// Reuses a webhook this bot created in the channel, or makes a new one.
pub async fn get_webhook(
    ctx: &serenity::Context,
    channel_id: serenity::ChannelId,
) -> Result<serenity::Webhook, Error> {
    let bot_id = ctx.cache.current_user().id;

    let existing = channel_id
        .webhooks(&ctx.http)
        .await?
        .into_iter()
        .find(|webhook| is_reusable(webhook.token.is_some(), webhook.user.as_ref().map(|u| u.id), bot_id));
    if let Some(webhook) = existing {
        return Ok(webhook);
    }

    debug!("Impersonate: creating webhook in channel {}", channel_id);
    let webhook = channel_id
        .create_webhook(ctx, serenity::CreateWebhook::new(WEBHOOK_NAME))
        .await?;
    Ok(webhook)
}

/// A webhook can only be executed by us if we own it and know its token.
fn is_reusable(has_token: bool, owner: Option<serenity::UserId>, bot_id: serenity::UserId) -> bool {
    has_token && owner == Some(bot_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_reuses_own_webhooks_with_tokens() {
        let bot = serenity::UserId::new(1);
        let other = serenity::UserId::new(2);

        assert!(is_reusable(true, Some(bot), bot));
        assert!(!is_reusable(false, Some(bot), bot));
        assert!(!is_reusable(true, Some(other), bot));
        assert!(!is_reusable(true, None, bot));
    }
}
