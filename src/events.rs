use crate::services::inviter::InviterService;
use crate::{Data, Error};
use poise::serenity_prelude as serenity;
use tracing::{debug, info};

/// Voice channel invites stay valid for a day.
const INVITE_MAX_AGE_SECS: u32 = 24 * 60 * 60;

pub async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::ChannelCreate { channel } => on_channel_create(ctx, channel, data).await,
        serenity::FullEvent::ChannelDelete { channel, .. } => {
            on_channel_delete(ctx, channel, data).await
        }
        _ => Ok(()),
    }
}

async fn on_channel_create(
    ctx: &serenity::Context,
    channel: &serenity::GuildChannel,
    data: &Data,
) -> Result<(), Error> {
    if channel.kind != serenity::ChannelType::Voice {
        return Ok(());
    }

    let service = InviterService::new(data.db.clone());
    let Some(text_channel) = service
        .invite_channel_for(channel.guild_id.get(), channel.parent_id.map(|id| id.get()))
        .await?
    else {
        return Ok(());
    };

    let invite = channel
        .create_invite(ctx, serenity::CreateInvite::new().max_age(INVITE_MAX_AGE_SECS))
        .await?;
    let message = serenity::ChannelId::new(text_channel)
        .say(ctx, invite.url())
        .await?;
    service
        .record_invite(channel.id.get(), message.id.get())
        .await?;

    info!(
        "Inviter: posted invite for voice channel {} in {}",
        channel.id, text_channel
    );
    Ok(())
}

async fn on_channel_delete(
    ctx: &serenity::Context,
    channel: &serenity::GuildChannel,
    data: &Data,
) -> Result<(), Error> {
    if channel.kind != serenity::ChannelType::Voice {
        return Ok(());
    }

    let service = InviterService::new(data.db.clone());
    let Some(text_channel) = service
        .invite_channel_for(channel.guild_id.get(), channel.parent_id.map(|id| id.get()))
        .await?
    else {
        return Ok(());
    };
    let Some(message_id) = service.take_invite(channel.id.get()).await? else {
        return Ok(());
    };

    if let Err(e) = serenity::ChannelId::new(text_channel)
        .delete_message(&ctx.http, serenity::MessageId::new(message_id))
        .await
    {
        debug!(
            "Inviter: could not delete invite message {} for voice channel {}: {}",
            message_id, channel.id, e
        );
    }
    Ok(())
}
