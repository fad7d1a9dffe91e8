use lazy_static::lazy_static;
use poise::serenity_prelude as serenity;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

lazy_static! {
    static ref URL_RE: Regex =
        Regex::new(r"^https?://[a-zA-Z0-9$-_@.&+!*(),]+$").expect("valid url regex");
}

#[derive(Debug, Error)]
pub enum QrError {
    #[error("No URL was found")]
    NotAUrl,
    #[error("API failed with status {0}")]
    Status(u16),
    #[error("{0}")]
    Unreadable(String),
    #[error("The API returned no symbols")]
    Empty,
    #[error("QR API request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
pub struct QrResult {
    #[serde(default)]
    pub symbol: Vec<QrSymbol>,
}

#[derive(Debug, Deserialize)]
pub struct QrSymbol {
    pub data: Option<String>,
    pub error: Option<String>,
}

/// Client for the goqr.me `read-qr-code` endpoint.
pub struct QrClient {
    client: reqwest::Client,
    api_url: String,
}

impl QrClient {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    /// Decodes the QR code in the image at `image_url`.
    pub async fn decode(&self, image_url: &str) -> Result<String, QrError> {
        if !is_http_url(image_url) {
            return Err(QrError::NotAUrl);
        }

        debug!("QR: decoding {}", image_url);
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("fileurl", image_url)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(QrError::Status(status.as_u16()));
        }

        let results: Vec<QrResult> = response.json().await?;
        first_symbol_data(results)
    }
}

pub fn is_http_url(text: &str) -> bool {
    URL_RE.is_match(text)
}

/// Extracts the payload of the first decoded symbol.
pub fn first_symbol_data(results: Vec<QrResult>) -> Result<String, QrError> {
    let symbol = results
        .into_iter()
        .next()
        .and_then(|result| result.symbol.into_iter().next())
        .ok_or(QrError::Empty)?;

    match symbol.data {
        Some(data) => Ok(data),
        None => Err(QrError::Unreadable(
            symbol
                .error
                .unwrap_or_else(|| "Could not read a QR code from that image".to_string()),
        )),
    }
}

/// What a free-form `decode-qr-code` argument refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrTarget {
    /// Direct image URL
    Url(String),
    /// Custom emoji, already resolved to its CDN URL
    Emoji(String),
    User(serenity::UserId),
    /// Bare snowflake: a user or a guild
    Id(u64),
    /// Invite code; the guild icon is used
    Invite(String),
    Unknown(String),
}

pub fn classify(argument: &str) -> QrTarget {
    let argument = argument.trim();

    if let Some(emoji) = ::serenity::utils::parse_emoji(argument) {
        return QrTarget::Emoji(emoji.url());
    }
    if let Some(user_id) = ::serenity::utils::parse_user_mention(argument) {
        return QrTarget::User(user_id);
    }
    if let Some(id) = argument.parse::<u64>().ok().filter(|id| *id != 0) {
        return QrTarget::Id(id);
    }
    if argument.contains("discord.gg/") || argument.contains("discord.com/invite/") {
        let code = ::serenity::utils::parse_invite(argument);
        if !code.is_empty() && !code.contains('/') {
            return QrTarget::Invite(code.to_string());
        }
    }
    if is_http_url(argument) {
        return QrTarget::Url(argument.to_string());
    }
    QrTarget::Unknown(argument.to_string())
}

/// Picks an image from the invoking message: attachment, sticker, then the
/// replied-to message's attachment, embed thumbnail or embed image.
pub fn image_from_message(message: &serenity::Message) -> Option<String> {
    if let Some(attachment) = message.attachments.first() {
        return Some(attachment.url.clone());
    }
    if let Some(sticker) = message.sticker_items.first() {
        if let Some(url) = sticker.image_url() {
            return Some(url);
        }
    }

    let referenced = message.referenced_message.as_deref()?;
    if let Some(attachment) = referenced.attachments.first() {
        return Some(attachment.url.clone());
    }
    let embed = referenced.embeds.first()?;
    embed
        .thumbnail
        .as_ref()
        .and_then(|thumbnail| thumbnail.proxy_url.clone())
        .or_else(|| embed.image.as_ref().and_then(|image| image.proxy_url.clone()))
}

/// CDN URL of a guild icon.
pub fn guild_icon_url(guild_id: serenity::GuildId, icon: &serenity::ImageHash) -> String {
    let ext = if icon.is_animated() { "gif" } else { "webp" };
    format!(
        "https://cdn.discordapp.com/icons/{}/{}.{}?size=1024",
        guild_id, icon, ext
    )
}
