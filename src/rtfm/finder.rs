//! Subsequence fuzzy matching used to rank documentation symbols.

use regex::{Regex, RegexBuilder};

/// A candidate that matched the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<T> {
    /// Length in characters of the matched substring.
    pub span: usize,
    /// Character offset where the match starts.
    pub offset: usize,
    pub item: T,
}

/// Builds the case-insensitive pattern `q.*?u.*?e.*?r.*?y` for a query.
pub fn subsequence_pattern(query: &str) -> Result<Regex, regex::Error> {
    let pattern = query
        .chars()
        .map(|c| regex::escape(c.encode_utf8(&mut [0u8; 4])))
        .collect::<Vec<_>>()
        .join(".*?");
    RegexBuilder::new(&pattern).case_insensitive(true).build()
}

/// Scores every candidate and returns the matches sorted by
/// `(span, offset, key)`, tightest match first.
pub fn rank<T, K>(
    query: &str,
    collection: impl IntoIterator<Item = T>,
    key: K,
) -> Result<Vec<Match<T>>, regex::Error>
where
    K: Fn(&T) -> &str,
{
    let regex = subsequence_pattern(query)?;

    let mut suggestions: Vec<Match<T>> = collection
        .into_iter()
        .filter_map(|item| {
            let to_search = key(&item);
            let found = regex.find(to_search)?;
            Some(Match {
                span: found.as_str().chars().count(),
                offset: to_search[..found.start()].chars().count(),
                item,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| {
        (a.span, a.offset)
            .cmp(&(b.span, b.offset))
            .then_with(|| key(&a.item).cmp(key(&b.item)))
    });

    Ok(suggestions)
}

/// Lazy view over [`rank`]: yields the matching items in score order.
pub fn finder<T, K>(
    query: &str,
    collection: impl IntoIterator<Item = T>,
    key: K,
) -> Result<impl Iterator<Item = T>, regex::Error>
where
    K: Fn(&T) -> &str,
{
    Ok(rank(query, collection, key)?.into_iter().map(|m| m.item))
}
