use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use ::serenity::utils::{content_safe, ContentSafeOptions};
use tracing::info;

async fn hideout_only(ctx: Context<'_>) -> Result<bool, Error> {
    let hideout = ctx.data().config.hideout_guild_id;
    if hideout.is_some() && ctx.guild_id().map(|id| id.get()) == hideout {
        return Ok(true);
    }

    ctx.say("❌ This command only works in the hideout.").await?;
    Ok(false)
}

/// OAuth2 URL that adds `bot_id` to a server.
pub fn oauth_url(bot_id: serenity::UserId) -> String {
    format!(
        "https://discord.com/oauth2/authorize?client_id={}&scope=bot+applications.commands",
        bot_id
    )
}

/// Backslash-escapes Discord markdown control characters.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '~' | '`' | '|' | '>') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Requests a bot to be added to the hideout
#[poise::command(slash_command, prefix_command, guild_only, check = "hideout_only")]
pub async fn addbot(
    ctx: Context<'_>,
    #[description = "The bot to add"] bot: serenity::User,
    #[description = "Why it should be added"]
    #[rest]
    reason: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;

    if !bot.bot {
        ctx.say("❌ That does not seem to be a bot...").await?;
        return Ok(());
    }
    if guild_id.member(ctx.http(), bot.id).await.is_ok() {
        ctx.say("❌ That bot is already on this server...").await?;
        return Ok(());
    }
    let Some(queue_channel) = ctx.data().config.bot_queue_channel_id else {
        ctx.say("❌ The bot queue channel is not configured.").await?;
        return Ok(());
    };

    let rules = ctx
        .guild()
        .and_then(|guild| guild.rules_channel_id)
        .map(|id| format!("<#{}>", id))
        .unwrap_or_else(|| "the rules".to_string());
    let reason = content_safe(ctx.cache(), &reason, &ContentSafeOptions::default(), &[]);

    let confirm_msg = format!(
        "This server has its own set of rules that you need to follow. Have you read {} and will \
make sure **{}** follows them?",
        rules, bot.name
    );
    let reply = ctx
        .send(
            poise::CreateReply::default()
                .content(confirm_msg)
                .components(vec![serenity::CreateActionRow::Buttons(vec![
                    serenity::CreateButton::new("confirm_addbot")
                        .label("Yes, submit")
                        .style(serenity::ButtonStyle::Success),
                    serenity::CreateButton::new("cancel_addbot")
                        .label("Cancel")
                        .style(serenity::ButtonStyle::Secondary),
                ])]),
        )
        .await?;

    let Some(interaction) = reply
        .message()
        .await?
        .await_component_interaction(ctx.serenity_context())
        .author_id(ctx.author().id)
        .timeout(std::time::Duration::from_secs(60))
        .await
    else {
        reply
            .edit(
                ctx,
                poise::CreateReply::default()
                    .content("⌛ Timed out, the request was not sent.")
                    .components(vec![]),
            )
            .await?;
        return Ok(());
    };

    let content = if interaction.data.custom_id == "confirm_addbot" {
        let embed = serenity::CreateEmbed::new()
            .author(
                serenity::CreateEmbedAuthor::new(bot.tag())
                    .icon_url(bot.face())
                    .url(oauth_url(bot.id)),
            )
            .description(reason)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Requested by {} ({})",
                ctx.author().tag(),
                ctx.author().id
            )))
            .color(0x5865F2);

        serenity::ChannelId::new(queue_channel)
            .send_message(ctx.http(), serenity::CreateMessage::new().embed(embed))
            .await?;

        info!("Addbot: {} requested bot {}", ctx.author().name, bot.id);
        "✅ The request has been submitted, it will be reviewed soon."
    } else {
        "❌ Request cancelled."
    };

    interaction
        .create_response(
            ctx.serenity_context(),
            serenity::CreateInteractionResponse::UpdateMessage(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .components(vec![]),
            ),
        )
        .await?;

    Ok(())
}

/// Checks whether a user is a member of this server
#[poise::command(slash_command, prefix_command, guild_only, rename = "check-user")]
pub async fn check_user(
    ctx: Context<'_>,
    #[description = "User to look for"] user: serenity::User,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;
    let is_member = guild_id.member(ctx.http(), user.id).await.is_ok();

    ctx.say(membership_message(&user.tag(), is_member)).await?;
    Ok(())
}

fn membership_message(tag: &str, is_member: bool) -> String {
    let tag = escape_markdown(tag);
    if is_member {
        format!("✅ **{}** is in this server.", tag)
    } else {
        format!("❌ **{}** is not in this server.", tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_oauth_url() {
        assert_eq!(
            oauth_url(serenity::UserId::new(42)),
            "https://discord.com/oauth2/authorize?client_id=42&scope=bot+applications.commands"
        );
    }

    #[test]
    fn escapes_markdown() {
        assert_eq!(escape_markdown("__duck__*"), "\\_\\_duck\\_\\_\\*");
        assert_eq!(escape_markdown("plain"), "plain");
    }

    #[test]
    fn membership_message_escapes_tag() {
        assert_eq!(membership_message("a_b", true), "✅ **a\\_b** is in this server.");
        assert_eq!(membership_message("ab", false), "❌ **ab** is not in this server.");
    }
}
