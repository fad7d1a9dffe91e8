//! Documentation lookups ("read the fine manual") against Sphinx inventories.

pub mod cache;
pub mod finder;
pub mod inventory;
pub mod source;

use cache::LookupCache;
use lazy_static::lazy_static;
use regex::Regex;
use source::{InventorySource, Notifier};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Maximum number of links returned for one query.
pub const MAX_RESULTS: usize = 8;

/// A remote Sphinx documentation site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentationSet {
    pub key: &'static str,
    pub base_url: &'static str,
    pub title: &'static str,
    /// Rewrite bare `abc.Messageable` method names (stable discord.py only).
    pub messageable_aliases: bool,
}

pub const DOCUMENTATION_SETS: &[DocumentationSet] = &[
    DocumentationSet {
        key: "latest",
        base_url: "https://discordpy.readthedocs.io/en/latest",
        title: "Documentation for `discord.py v1.7.3`",
        messageable_aliases: true,
    },
    DocumentationSet {
        key: "latest-jp",
        base_url: "https://discordpy.readthedocs.io/ja/latest",
        title: "Documentation for `discord.py v1.7.3` in Japanese",
        messageable_aliases: true,
    },
    DocumentationSet {
        key: "python",
        base_url: "https://docs.python.org/3",
        title: "Documentation for `python`",
        messageable_aliases: false,
    },
    DocumentationSet {
        key: "python-jp",
        base_url: "https://docs.python.org/ja/3",
        title: "Documentation for `python` in Japanese",
        messageable_aliases: false,
    },
    DocumentationSet {
        key: "master",
        base_url: "https://discordpy.readthedocs.io/en/master",
        title: "Documentation for `discord.py v2.0.0a`",
        messageable_aliases: false,
    },
    DocumentationSet {
        key: "edpy",
        base_url: "https://enhanced-dpy.readthedocs.io/en/latest",
        title: "Documentation for `enhanced-dpy`",
        messageable_aliases: false,
    },
    DocumentationSet {
        key: "chai",
        base_url: "https://chaidiscordpy.readthedocs.io/en/latest",
        title: "Documentation for `chaidiscord.py`",
        messageable_aliases: false,
    },
    DocumentationSet {
        key: "bing",
        base_url: "https://asyncbing.readthedocs.io/en/latest",
        title: "Documentation for `asyncbing`",
        messageable_aliases: false,
    },
    DocumentationSet {
        key: "pycord",
        base_url: "https://pycord.readthedocs.io/en/master",
        title: "Documentation for `pycord`",
        messageable_aliases: false,
    },
];

/// Public attributes of `discord.abc.Messageable` in discord.py 1.7.
const MESSAGEABLE_ATTRIBUTES: [&str; 6] = [
    "fetch_message",
    "history",
    "pins",
    "send",
    "trigger_typing",
    "typing",
];

lazy_static! {
    static ref NAMESPACE_RE: Regex =
        Regex::new(r"^(?:discord\.(?:ext\.)?)?(?:commands\.)?(.+)").expect("valid namespace regex");
}

pub fn documentation_set(key: &str) -> Option<&'static DocumentationSet> {
    DOCUMENTATION_SETS.iter().find(|set| set.key == key)
}

#[derive(Debug, Error)]
pub enum RtfmError {
    #[error("Unknown documentation set `{0}`")]
    UnknownSet(String),
    #[error("Documentation for `{0}` is currently unavailable")]
    Unavailable(&'static str),
    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// One ranked documentation link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocLink {
    pub key: String,
    pub url: String,
}

/// Owns the lookup table and answers queries against it.
pub struct Rtfm {
    cache: LookupCache,
}

impl Rtfm {
    pub fn new(source: Arc<dyn InventorySource>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_sets(DOCUMENTATION_SETS, source, notifier)
    }

    pub fn with_sets(
        sets: &'static [DocumentationSet],
        source: Arc<dyn InventorySource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            cache: LookupCache::new(sets, source, notifier),
        }
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    /// Finds the best [`MAX_RESULTS`] symbols for `query` in one set.
    pub async fn lookup(
        &self,
        set: &'static DocumentationSet,
        query: &str,
    ) -> Result<Vec<DocLink>, RtfmError> {
        let table = self.cache.get_or_build().await;
        let inventory = table.get(set.key).ok_or(RtfmError::Unavailable(set.key))?;

        let query = normalize_query(set, query);
        debug!("RTFM: searching '{}' for '{}'", set.key, query);

        let matches = finder::finder(&query, inventory.iter(), |(key, _)| key.as_str())?
            .take(MAX_RESULTS)
            .map(|(key, url)| DocLink {
                key: key.clone(),
                url: url.clone(),
            })
            .collect();

        Ok(matches)
    }

    /// Drops the table and builds it again straight away.
    pub async fn rebuild(&self) -> usize {
        self.cache.invalidate().await;
        self.cache.get_or_build().await.len()
    }
}

/// Strips a leading `discord.`, `discord.ext.` or `commands.` qualifier and
/// expands bare `abc.Messageable` method names where the set wants it.
pub fn normalize_query(set: &DocumentationSet, query: &str) -> String {
    let query = NAMESPACE_RE.replace(query, "$1").into_owned();

    if set.messageable_aliases {
        let lowered = query.to_lowercase();
        if let Some(name) = MESSAGEABLE_ATTRIBUTES.iter().find(|name| **name == lowered) {
            return format!("abc.Messageable.{}", name);
        }
    }

    query
}

/// One markdown link per match.
pub fn render_links(links: &[DocLink]) -> String {
    links
        .iter()
        .map(|link| format!("[`{}`]({})", link.key, link.url))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtfm::cache::tests::{FakeSource, RecordingNotifier};
    use crate::rtfm::inventory::tests::build_inventory;
    use std::collections::HashMap;

    const LATEST: &str = "https://discordpy.readthedocs.io/en/latest";

    fn rtfm_with(body: &str) -> Rtfm {
        let pages = HashMap::from([(LATEST, build_inventory("discord.py", body))]);
        Rtfm::new(
            Arc::new(FakeSource::new(pages)),
            Arc::new(RecordingNotifier::default()),
        )
    }

    fn run<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Runtime::new().unwrap().block_on(future)
    }

    #[test]
    fn documentation_sets_are_known() {
        assert_eq!(documentation_set("python").unwrap().base_url, "https://docs.python.org/3");
        assert!(documentation_set("nope").is_none());
    }

    #[test]
    fn strips_namespace_qualifiers() {
        let master = documentation_set("master").unwrap();
        assert_eq!(normalize_query(master, "discord.ext.commands.Bot"), "Bot");
        assert_eq!(normalize_query(master, "discord.Client"), "Client");
        assert_eq!(normalize_query(master, "commands.Cog"), "Cog");
        assert_eq!(normalize_query(master, "Embed"), "Embed");
    }

    #[test]
    fn expands_messageable_aliases_only_where_enabled() {
        let latest = documentation_set("latest").unwrap();
        let master = documentation_set("master").unwrap();
        assert_eq!(normalize_query(latest, "Send"), "abc.Messageable.send");
        assert_eq!(normalize_query(master, "send"), "send");
        assert_eq!(normalize_query(latest, "sender"), "sender");
    }

    #[test]
    fn lookup_returns_ranked_links() {
        let rtfm = rtfm_with(
            "discord.Client py:class 1 api.html#$ -\n\
             discord.Client.close py:method 1 api.html#$ -\n\
             discord.ClientUser py:class 1 api.html#$ -\n",
        );
        let latest = documentation_set("latest").unwrap();

        let links = run(rtfm.lookup(latest, "discord.Client")).unwrap();

        assert_eq!(links[0].key, "Client");
        assert_eq!(links[0].url, format!("{}/api.html#discord.Client", LATEST));
        assert_eq!(links.len(), 3);
    }

    #[test]
    fn lookup_truncates_to_eight_sorted_results() {
        let body: String = (0..20)
            .map(|i| format!("discord.Widget{:02} py:class 1 api.html#$ -\n", i))
            .collect();
        let rtfm = rtfm_with(&body);
        let latest = documentation_set("latest").unwrap();

        let links = run(rtfm.lookup(latest, "widget")).unwrap();

        let keys: Vec<_> = links.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "Widget00", "Widget01", "Widget02", "Widget03", "Widget04", "Widget05",
                "Widget06", "Widget07"
            ]
        );
    }

    #[test]
    fn lookup_with_no_matches_is_empty() {
        let rtfm = rtfm_with("discord.Client py:class 1 api.html#$ -\n");
        let latest = documentation_set("latest").unwrap();
        assert!(run(rtfm.lookup(latest, "zzz")).unwrap().is_empty());
    }

    #[test]
    fn lookup_on_failed_set_reports_unavailable() {
        let rtfm = rtfm_with("discord.Client py:class 1 api.html#$ -\n");
        let python = documentation_set("python").unwrap();
        let err = run(rtfm.lookup(python, "asyncio")).unwrap_err();
        assert!(matches!(err, RtfmError::Unavailable("python")));
    }

    #[test]
    fn renders_markdown_links() {
        let links = vec![DocLink {
            key: "Client".to_string(),
            url: "https://x/api.html#Client".to_string(),
        }];
        assert_eq!(render_links(&links), "[`Client`](https://x/api.html#Client)");
    }
}
