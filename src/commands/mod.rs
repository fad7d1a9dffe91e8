pub mod hideout;
pub mod impersonate;
pub mod inviter;
pub mod qr;
pub mod raw;
pub mod rtfm;

use crate::{Context, Error};
use poise::serenity_prelude as serenity;

/// Command check: the author is the configured bot owner.
pub async fn is_owner(ctx: Context<'_>) -> Result<bool, Error> {
    if let Some(owner_id) = ctx.data().config.owner_id {
        if ctx.author().id == serenity::UserId::new(owner_id) {
            return Ok(true);
        }
    }

    ctx.say("❌ Only the bot owner can do that.").await?;
    Ok(false)
}
