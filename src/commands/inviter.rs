use crate::commands::is_owner;
use crate::services::inviter::InviterService;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use tracing::info;

/// Post invites for new voice channels in a category
#[poise::command(
    slash_command,
    prefix_command,
    subcommands("set", "unset", "whitelist"),
    subcommand_required
)]
pub async fn inviter(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

async fn is_whitelisted(ctx: Context<'_>) -> Result<bool, Error> {
    let service = InviterService::new(ctx.data().db.clone());
    if service.is_whitelisted(ctx.author().id.get()).await? {
        return Ok(true);
    }

    ctx.say("❌ You are not whitelisted to run inviter commands!")
        .await?;
    Ok(false)
}

/// Watch a category and post invites for its new voice channels
#[poise::command(slash_command, prefix_command, guild_only, check = "is_whitelisted")]
pub async fn set(
    ctx: Context<'_>,
    #[description = "Category to watch"]
    #[channel_types("Category")]
    category: serenity::GuildChannel,
    #[description = "Channel the invites are posted in"]
    #[channel_types("Text")]
    text_channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;

    if category.kind != serenity::ChannelType::Category {
        ctx.say("❌ The first channel must be a category.").await?;
        return Ok(());
    }
    if text_channel.kind != serenity::ChannelType::Text {
        ctx.say("❌ The second channel must be a text channel.").await?;
        return Ok(());
    }
    if category.guild_id != guild_id || text_channel.guild_id != guild_id {
        ctx.say("❌ Both channels must belong to this server.").await?;
        return Ok(());
    }

    let service = InviterService::new(ctx.data().db.clone());
    service
        .set_inviter(guild_id.get(), category.id.get(), text_channel.id.get())
        .await?;

    info!(
        "Inviter set for guild {}: category {} -> channel {}",
        guild_id, category.id, text_channel.id
    );
    ctx.say(format!(
        "✅ Invites for new voice channels in **{}** will be posted in <#{}>.",
        category.name, text_channel.id
    ))
    .await?;
    Ok(())
}

/// Stop posting voice channel invites in this server
#[poise::command(slash_command, prefix_command, guild_only, check = "is_whitelisted")]
pub async fn unset(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;

    let service = InviterService::new(ctx.data().db.clone());
    if service.unset_inviter(guild_id.get()).await? == 0 {
        ctx.say("📭 The inviter is not set up in this server.").await?;
    } else {
        ctx.say("✅ Inviter disabled for this server.").await?;
    }
    Ok(())
}

/// Manage who may configure the inviter
#[poise::command(
    slash_command,
    prefix_command,
    subcommands("add", "remove"),
    subcommand_required,
    aliases("w")
)]
pub async fn whitelist(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Allow a user to run inviter commands
#[poise::command(slash_command, prefix_command, check = "is_owner", aliases("a"))]
pub async fn add(
    ctx: Context<'_>,
    #[description = "User to whitelist"] user: serenity::User,
) -> Result<(), Error> {
    let service = InviterService::new(ctx.data().db.clone());
    service.whitelist(user.id.get()).await?;
    ctx.say(format!("✅ **{}** can now run inviter commands.", user.name))
        .await?;
    Ok(())
}

/// Revoke a user's access to inviter commands
#[poise::command(slash_command, prefix_command, check = "is_owner", aliases("r"))]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "User to remove"] user: serenity::User,
) -> Result<(), Error> {
    let service = InviterService::new(ctx.data().db.clone());
    if service.unwhitelist(user.id.get()).await? == 0 {
        ctx.say(format!("📭 **{}** was not whitelisted.", user.name))
            .await?;
    } else {
        ctx.say(format!("✅ Removed **{}** from the whitelist.", user.name))
            .await?;
    }
    Ok(())
}
