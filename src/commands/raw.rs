use crate::config::RAW_MESSAGE_INLINE_LIMIT;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use ::serenity::http::{LightMethod, Request, Route};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

/// What to send back for a dumped message.
#[derive(Debug, PartialEq, Eq)]
pub enum RawReply {
    Inline(String),
    Attachment(Vec<u8>),
}

/// Shows the raw JSON of a message (reply to one, or pass a link or ID)
#[poise::command(
    slash_command,
    prefix_command,
    rename = "raw-message",
    aliases("rmsg", "raw"),
    user_cooldown = 40
)]
pub async fn raw_message(
    ctx: Context<'_>,
    #[description = "Message link or ID"] message: Option<serenity::Message>,
) -> Result<(), Error> {
    let referenced = match ctx {
        poise::Context::Prefix(prefix) => prefix
            .msg
            .referenced_message
            .as_deref()
            .map(|m| (m.channel_id, m.id)),
        poise::Context::Application(_) => None,
    };

    let Some((channel_id, message_id)) = referenced.or(message.map(|m| (m.channel_id, m.id))) else {
        ctx.say("❌ Reply to a message or give me a message link.").await?;
        return Ok(());
    };

    send_raw(ctx, channel_id, message_id).await
}

/// Raw message
#[poise::command(context_menu_command = "Raw message", user_cooldown = 40)]
pub async fn raw_message_menu(
    ctx: Context<'_>,
    message: serenity::Message,
) -> Result<(), Error> {
    send_raw(ctx, message.channel_id, message.id).await
}

async fn send_raw(
    ctx: Context<'_>,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
) -> Result<(), Error> {
    let payload = match fetch_raw_message(ctx.http(), channel_id, message_id).await {
        Ok(payload) => payload,
        Err(e) => {
            debug!("Raw message: fetch of {} failed: {}", message_id, e);
            ctx.say("❌ There was an error retrieving that message.").await?;
            return Ok(());
        }
    };

    let json = to_pretty_json(&payload)?;
    let reply = match render_raw(json) {
        RawReply::Inline(content) => poise::CreateReply::default().content(content),
        RawReply::Attachment(bytes) => poise::CreateReply::default()
            .content("**Output too long:**")
            .attachment(serenity::CreateAttachment::bytes(bytes, "raw_message.json")),
    };

    ctx.send(reply.reply(true)).await?;
    Ok(())
}

/// The message payload exactly as the REST API returns it.
async fn fetch_raw_message(
    http: &serenity::Http,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
) -> Result<serde_json::Value, Error> {
    let request = Request::new(
        Route::ChannelMessage {
            channel_id,
            message_id,
        },
        LightMethod::Get,
    );
    let payload = http.request(request).await?.json::<serde_json::Value>().await?;
    Ok(payload)
}

/// JSON with a four space indent.
pub fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn render_raw(json: String) -> RawReply {
    if json.chars().count() > RAW_MESSAGE_INLINE_LIMIT {
        RawReply::Attachment(json.into_bytes())
    } else {
        RawReply::Inline(format!("```json\n{}\n```", json))
    }
}
