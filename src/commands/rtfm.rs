use crate::commands::is_owner;
use crate::rtfm::{documentation_set, render_links, RtfmError, DOCUMENTATION_SETS};
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use tracing::info;

/// Documentation sets selectable from `rtfm`. Extra names are prefix aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum Docs {
    #[name = "master"]
    #[name = "2.0"]
    Master,
    #[name = "latest"]
    #[name = "1.7"]
    Latest,
    #[name = "latest-jp"]
    #[name = "jp"]
    LatestJp,
    #[name = "python"]
    #[name = "py"]
    Python,
    #[name = "python-jp"]
    #[name = "py-jp"]
    PythonJp,
    #[name = "edpy"]
    #[name = "enhanced-dpy"]
    Edpy,
    #[name = "chai"]
    #[name = "cdpy"]
    Chai,
    #[name = "bing"]
    #[name = "asyncbing"]
    Bing,
    #[name = "pycord"]
    Pycord,
}

impl Docs {
    pub fn key(self) -> &'static str {
        match self {
            Docs::Master => "master",
            Docs::Latest => "latest",
            Docs::LatestJp => "latest-jp",
            Docs::Python => "python",
            Docs::PythonJp => "python-jp",
            Docs::Edpy => "edpy",
            Docs::Chai => "chai",
            Docs::Bing => "bing",
            Docs::Pycord => "pycord",
        }
    }
}

/// Gives you a documentation link for a discord.py (or Python) entity
#[poise::command(slash_command, prefix_command, aliases("rtfd", "rtdm"))]
pub async fn rtfm(
    ctx: Context<'_>,
    #[description = "Which documentation to search (defaults to discord.py master)"]
    docs: Option<Docs>,
    #[description = "What to look up"]
    #[rest]
    query: Option<String>,
) -> Result<(), Error> {
    let docs = docs.unwrap_or(Docs::Master);
    let set = documentation_set(docs.key()).ok_or_else(|| RtfmError::UnknownSet(docs.key().to_string()))?;

    let query = query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        ctx.say(set.base_url).await?;
        return Ok(());
    }

    // The first lookup downloads every inventory.
    if !ctx.data().rtfm.cache().is_built().await {
        ctx.defer().await?;
    }

    let links = match ctx.data().rtfm.lookup(set, query).await {
        Ok(links) => links,
        Err(e @ RtfmError::Unavailable(_)) => {
            ctx.say(format!("❌ {}", e)).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if links.is_empty() {
        ctx.say("Could not find anything. Sorry.").await?;
        return Ok(());
    }

    let embed = serenity::CreateEmbed::new()
        .title(set.title)
        .description(render_links(&links))
        .color(0x5865F2);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Throws away the RTFM lookup table and downloads it again
#[poise::command(
    slash_command,
    prefix_command,
    check = "is_owner",
    hide_in_help,
    rename = "rtfm-rebuild"
)]
pub async fn rtfm_rebuild(ctx: Context<'_>) -> Result<(), Error> {
    info!("RTFM rebuild requested by {}", ctx.author().name);
    ctx.defer().await?;

    let built = ctx.data().rtfm.rebuild().await;
    ctx.say(format!(
        "✅ Rebuilt the RTFM lookup table ({}/{} documentation sets).",
        built,
        DOCUMENTATION_SETS.len()
    ))
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_choice_has_a_documentation_set() {
        let all = [
            Docs::Master,
            Docs::Latest,
            Docs::LatestJp,
            Docs::Python,
            Docs::PythonJp,
            Docs::Edpy,
            Docs::Chai,
            Docs::Bing,
            Docs::Pycord,
        ];
        for docs in all {
            assert!(documentation_set(docs.key()).is_some(), "{:?}", docs);
        }
        assert_eq!(all.len(), DOCUMENTATION_SETS.len());
    }
}
