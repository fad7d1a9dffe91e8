//! Decoder for Sphinx `objects.inv` (version 2) inventory files.
//!
//! The file starts with four plain-text header lines followed by a single
//! zlib stream of `name domain:role priority location display-name` lines.

use flate2::bufread::ZlibDecoder;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::io::{BufReader, Read};
use thiserror::Error;

/// Read size used while inflating the compressed body.
pub const BUFSIZE: usize = 16 * 1024;

const VERSION_MARKER: &str = "# Sphinx inventory version 2";
const PROJECT_PREFIX_LEN: usize = "# Project: ".len();

/// Project whose keys get the `discord.` namespaces stripped.
const FRAMEWORK_PROJECT: &str = "discord.py";
const STRIPPED_NAMESPACES: [&str; 2] = ["discord.ext.commands.", "discord."];

lazy_static! {
    static ref ENTRY_RE: Regex =
        Regex::new(r"^(.+?)\s+(\S*:\S*)\s+(-?\d+)\s+(\S+)\s+(.*)").expect("valid entry regex");
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Invalid objects.inv file version: {0:?}")]
    BadVersion(String),
    #[error("Invalid objects.inv file, not z-lib compatible.")]
    NotZlib,
    #[error("Failed to decompress objects.inv body: {0}")]
    Decompress(#[from] std::io::Error),
    #[error("objects.inv contains invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Symbol name to documentation URL.
pub type Inventory = HashMap<String, String>;

/// Cursor over a raw inventory buffer.
pub struct InventoryReader<'a> {
    buffer: &'a [u8],
}

impl<'a> InventoryReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer }
    }

    /// Reads one header line, keeping its trailing `\n`.
    pub fn readline(&mut self) -> Result<String, InventoryError> {
        let end = self
            .buffer
            .iter()
            .position(|b| *b == b'\n')
            .map(|pos| pos + 1)
            .unwrap_or(self.buffer.len());
        let (line, rest) = self.buffer.split_at(end);
        self.buffer = rest;
        Ok(String::from_utf8(line.to_vec())?)
    }

    /// Consumes the reader, inflating the rest of the buffer line by line.
    pub fn compressed_lines(self) -> CompressedLines<'a> {
        CompressedLines {
            decoder: ZlibDecoder::new(BufReader::with_capacity(BUFSIZE, self.buffer)),
            pending: Vec::new(),
            done: false,
        }
    }
}

/// Lines of the zlib body, yielded as soon as a full line has been inflated.
///
/// A trailing fragment with no newline is dropped.
pub struct CompressedLines<'a> {
    decoder: ZlibDecoder<BufReader<&'a [u8]>>,
    pending: Vec<u8>,
    done: bool,
}

impl CompressedLines<'_> {
    fn fill(&mut self) -> Result<(), InventoryError> {
        let mut chunk = [0u8; BUFSIZE];
        let read = self.decoder.read(&mut chunk)?;
        if read == 0 {
            self.done = true;
        }
        self.pending.extend_from_slice(&chunk[..read]);
        Ok(())
    }
}

impl Iterator for CompressedLines<'_> {
    type Item = Result<String, InventoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
                let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
                line.pop();
                return Some(String::from_utf8(line).map_err(InventoryError::from));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.fill() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

/// Parses a complete `objects.inv` buffer, resolving locations against `base_url`.
pub fn parse_object_inv(buffer: &[u8], base_url: &str) -> Result<Inventory, InventoryError> {
    let mut stream = InventoryReader::new(buffer);

    let version = stream.readline()?;
    let version = version.trim_end();
    if version != VERSION_MARKER {
        return Err(InventoryError::BadVersion(version.to_string()));
    }

    let project = stream.readline()?;
    let project = project.trim_end().get(PROJECT_PREFIX_LEN..).unwrap_or("");
    let project = project.to_string();
    // "# Version: <version>" is not used
    stream.readline()?;

    if !stream.readline()?.contains("zlib") {
        return Err(InventoryError::NotZlib);
    }

    let mut result = Inventory::new();
    for line in stream.compressed_lines() {
        let line = line?;
        if let Some(entry) = Entry::parse(&line) {
            entry.insert_into(&mut result, &project, base_url);
        }
    }

    Ok(result)
}

struct Entry<'a> {
    name: &'a str,
    directive: &'a str,
    location: &'a str,
    dispname: &'a str,
}

impl<'a> Entry<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let caps = ENTRY_RE.captures(line.trim_end())?;
        Some(Self {
            name: caps.get(1)?.as_str(),
            directive: caps.get(2)?.as_str(),
            location: caps.get(4)?.as_str(),
            dispname: caps.get(5)?.as_str(),
        })
    }

    fn insert_into(&self, result: &mut Inventory, project: &str, base_url: &str) {
        let (domain, subdirective) = self
            .directive
            .split_once(':')
            .unwrap_or((self.directive, ""));

        // Sphinx <= 1.1 emitted two entries per module; the first is correct.
        if self.directive == "py:module" && result.contains_key(self.name) {
            return;
        }

        let subdirective = if self.directive == "std:doc" {
            "label"
        } else {
            subdirective
        };

        let location = expand_location(self.location, self.name);

        let mut key = if self.dispname == "-" {
            self.name.to_string()
        } else {
            self.dispname.to_string()
        };
        if project == FRAMEWORK_PROJECT {
            for namespace in STRIPPED_NAMESPACES {
                key = key.replace(namespace, "");
            }
        }

        let prefix = if domain == "std" {
            format!("{}:", subdirective)
        } else {
            String::new()
        };

        result.insert(format!("{}{}", prefix, key), join_url(base_url, &location));
    }
}

/// Expands the `$` shorthand at the end of a location into the entry name.
pub fn expand_location(location: &str, name: &str) -> String {
    match location.strip_suffix('$') {
        Some(stem) => format!("{}{}", stem, name),
        None => location.to_string(),
    }
}

/// Appends a relative location to a base URL with exactly one separator.
pub fn join_url(base: &str, location: &str) -> String {
    if base.is_empty() {
        return location.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        location.trim_start_matches('/')
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    const BASE: &str = "https://discordpy.readthedocs.io/en/latest";

    pub(crate) fn build_inventory(project: &str, body: &str) -> Vec<u8> {
        let mut buffer = format!(
            "# Sphinx inventory version 2\n# Project: {}\n# Version: 1.0\n# The remainder of this file is compressed using zlib.\n",
            project
        )
        .into_bytes();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        buffer.extend(encoder.finish().unwrap());
        buffer
    }

    #[test]
    fn readline_keeps_newline() {
        let mut reader = InventoryReader::new(b"# Project: x\n# Version: 1");
        assert_eq!(reader.readline().unwrap(), "# Project: x\n");
        assert_eq!(reader.readline().unwrap(), "# Version: 1");
        assert_eq!(reader.readline().unwrap(), "");
    }

    #[test]
    fn parses_discord_py_class_entry() {
        let buffer = build_inventory("discord.py", "Client py:class 1 api.html#$ -\n");
        let result = parse_object_inv(&buffer, BASE).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(
            result.get("Client").map(String::as_str),
            Some("https://discordpy.readthedocs.io/en/latest/api.html#Client")
        );
    }

    #[test]
    fn strips_framework_namespaces() {
        let body = "discord.ext.commands.Bot py:class 1 ext/commands/api.html#$ -\n\
                    discord.Member.roles py:attribute 1 api.html#$ -\n";
        let result = parse_object_inv(&build_inventory("discord.py", body), BASE).unwrap();
        assert_eq!(
            result.get("Bot").map(String::as_str),
            Some("https://discordpy.readthedocs.io/en/latest/ext/commands/api.html#discord.ext.commands.Bot")
        );
        assert!(result.contains_key("Member.roles"));
    }

    #[test]
    fn keeps_namespaces_for_other_projects() {
        let body = "discord.Client py:class 1 api.html#$ -\n";
        let result = parse_object_inv(&build_inventory("pycord", body), BASE).unwrap();
        assert!(result.contains_key("discord.Client"));
    }

    #[test]
    fn std_entries_get_prefix_and_doc_becomes_label() {
        let body = "intro std:doc 1 intro.html Introduction\n\
                    quickstart std:label 1 quickstart.html#$ A Minimal Bot\n";
        let result = parse_object_inv(&build_inventory("Python", body), BASE).unwrap();
        assert_eq!(
            result.get("label:Introduction").map(String::as_str),
            Some("https://discordpy.readthedocs.io/en/latest/intro.html")
        );
        assert_eq!(
            result.get("label:A Minimal Bot").map(String::as_str),
            Some("https://discordpy.readthedocs.io/en/latest/quickstart.html#quickstart")
        );
    }

    #[test]
    fn first_py_module_entry_wins() {
        let body = "asyncio py:module 0 library/asyncio.html#module-$ -\n\
                    asyncio py:module 0 library/wrong.html -\n";
        let result = parse_object_inv(&build_inventory("Python", body), BASE).unwrap();
        assert_eq!(
            result.get("asyncio").map(String::as_str),
            Some("https://discordpy.readthedocs.io/en/latest/library/asyncio.html#module-asyncio")
        );
    }

    #[test]
    fn later_non_module_entries_overwrite() {
        let body = "thing py:function 1 a.html -\nthing py:function 1 b.html -\n";
        let result = parse_object_inv(&build_inventory("Python", body), "https://x").unwrap();
        assert_eq!(result.get("thing").map(String::as_str), Some("https://x/b.html"));
    }

    #[test]
    fn skips_lines_not_matching_grammar() {
        let body = "garbage\n\nno-directive 1 x.html -\nok py:data 1 x.html -\n";
        let result = parse_object_inv(&build_inventory("Python", body), "https://x").unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.contains_key("ok"));
    }

    #[test]
    fn rejects_wrong_version_marker() {
        let mut buffer = build_inventory("Python", "a py:data 1 x.html -\n");
        buffer[27] = b'1';
        let err = parse_object_inv(&buffer, BASE).unwrap_err();
        assert!(matches!(err, InventoryError::BadVersion(_)));
    }

    #[test]
    fn rejects_missing_zlib_marker() {
        let buffer = b"# Sphinx inventory version 2\n# Project: x\n# Version: 1\n# plain text\n";
        let err = parse_object_inv(buffer, BASE).unwrap_err();
        assert!(matches!(err, InventoryError::NotZlib));
    }

    #[test]
    fn parsing_is_deterministic() {
        let body = "a py:data 1 a.html -\nb py:class 1 b.html#$ -\nc std:label 1 c.html C\n";
        let buffer = build_inventory("Python", body);
        assert_eq!(
            parse_object_inv(&buffer, BASE).unwrap(),
            parse_object_inv(&buffer, BASE).unwrap()
        );
    }

    #[test]
    fn inflates_bodies_larger_than_one_chunk() {
        let body: String = (0..5000)
            .map(|i| format!("symbol_{i} py:function 1 api.html#$ -\n"))
            .collect();
        let buffer = build_inventory("Python", &body);
        let result = parse_object_inv(&buffer, "https://x").unwrap();
        assert_eq!(result.len(), 5000);
        assert_eq!(
            result.get("symbol_4999").map(String::as_str),
            Some("https://x/api.html#symbol_4999")
        );
    }

    #[test]
    fn dollar_location_expands_to_name() {
        assert_eq!(expand_location("foo/$", "bar.baz"), "foo/bar.baz");
        assert_eq!(expand_location("foo/bar.html", "bar.baz"), "foo/bar.html");
    }

    #[test]
    fn join_url_uses_single_separator() {
        assert_eq!(join_url("https://a/b/", "c.html"), "https://a/b/c.html");
        assert_eq!(join_url("https://a/b", "/c.html"), "https://a/b/c.html");
    }
}
