use crate::services::qr::{classify, guild_icon_url, image_from_message, QrError, QrTarget};
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use tracing::debug;

/// Attempts to decode a QR code from an image, user, emoji, server or invite
#[poise::command(
    slash_command,
    prefix_command,
    rename = "decode-qr-code",
    aliases("qr-decode", "decode-qr", "qr")
)]
pub async fn decode_qr_code(
    ctx: Context<'_>,
    #[description = "Image containing a QR code"] image: Option<serenity::Attachment>,
    #[description = "Image URL, user, custom emoji, server ID or invite"]
    #[rest]
    target: Option<String>,
) -> Result<(), Error> {
    if let Err(wait) = ctx.data().qr_limiter.check(ctx.author().id.get()) {
        ctx.say(format!(
            "⏳ You're doing that too often. Try again in {}s.",
            wait.as_secs_f32().ceil() as u64
        ))
        .await?;
        return Ok(());
    }

    let target = target.filter(|t| !t.trim().is_empty());
    let link = match (target, image) {
        (Some(target), _) => match resolve_target(ctx, classify(&target)).await {
            Ok(Some(link)) => Some(link),
            Ok(None) => {
                ctx.say(failure_reply(&QrError::NotAUrl)).await?;
                return Ok(());
            }
            Err(e) => {
                debug!("QR: could not resolve '{}': {}", target, e);
                ctx.say(failure_reply(&QrError::NotAUrl)).await?;
                return Ok(());
            }
        },
        (None, Some(attachment)) => Some(attachment.url),
        (None, None) => match ctx {
            poise::Context::Prefix(prefix) => image_from_message(prefix.msg),
            poise::Context::Application(_) => None,
        },
    };

    let Some(link) = link else {
        ctx.say("❌ Give me an image, a link, a user, an emoji, or reply to a message with one.")
            .await?;
        return Ok(());
    };

    ctx.defer().await?;

    match ctx.data().qr.decode(&link).await {
        Ok(data) => {
            let embed = serenity::CreateEmbed::new()
                .title("I found the following data:")
                .description(data)
                .thumbnail(link)
                .color(0x5865F2);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e @ (QrError::NotAUrl | QrError::Status(_) | QrError::Unreadable(_) | QrError::Empty)) => {
            ctx.say(failure_reply(&e)).await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Turns a classified argument into the image URL to decode.
async fn resolve_target(ctx: Context<'_>, target: QrTarget) -> Result<Option<String>, Error> {
    let link = match target {
        QrTarget::Url(url) | QrTarget::Emoji(url) => Some(url),
        // Passed through so the decoder reports that no URL was found.
        QrTarget::Unknown(text) => Some(text),
        QrTarget::User(user_id) => Some(user_id.to_user(ctx.serenity_context()).await?.face()),
        QrTarget::Id(id) => match serenity::UserId::new(id).to_user(ctx.serenity_context()).await {
            Ok(user) => Some(user.face()),
            Err(_) => serenity::GuildId::new(id)
                .to_partial_guild(ctx.serenity_context())
                .await?
                .icon_url(),
        },
        QrTarget::Invite(code) => {
            let invite = serenity::Invite::get(ctx.http(), &code, false, false, None).await?;
            invite
                .guild
                .and_then(|guild| guild.icon.as_ref().map(|icon| guild_icon_url(guild.id, icon)))
        }
    };
    Ok(link)
}

fn failure_reply(error: &QrError) -> String {
    format!("❌ {}", error)
}
