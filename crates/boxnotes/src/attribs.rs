//! Legacy attribute string decoding.
//!
//! Legacy notes store their text as one flat string plus a compact,
//! run-length encoded description of which attributes apply to which
//! characters. Each run ("chunk") has the shape
//!
//! ```text
//! ('*' <pool index>)* '+' <char count> ('|' <line breaks>)?
//! ```
//!
//! where every number is base-36. `*0*1+a|1+2` reads as: ten characters
//! carrying pool attributes 0 and 1 followed by one line break, then two
//! characters without attributes.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::utilities::scalar_string;

/// Raw `(name, value)` pair as stored in the attribute pool
pub type RawAttribute = (String, String);

/// Error returned by [`decode_base36`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid base-36 string: {0:?}")]
pub struct Base36Error(pub String);

/// Decode a base-36 number (digits `0-9` then `a-z`, case-insensitive)
pub fn decode_base36(value: &str) -> Result<u64, Base36Error> {
    if value.is_empty() {
        return Err(Base36Error(String::new()));
    }

    value.chars().try_fold(0u64, |acc, c| {
        c.to_digit(36)
            .and_then(|digit| acc.checked_mul(36)?.checked_add(u64::from(digit)))
            .ok_or_else(|| Base36Error(value.to_string()))
    })
}

/// One decoded run of the attribute string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeChunk {
    /// Pool indices active during the run
    pub attributes: BTreeSet<u64>,
    pub num_characters: usize,
    /// Line breaks following the characters
    pub num_linebreaks: usize,
}

impl AttributeChunk {
    pub fn new(attributes: impl IntoIterator<Item = u64>, num_characters: usize, num_linebreaks: usize) -> Self {
        Self {
            attributes: attributes.into_iter().collect(),
            num_characters,
            num_linebreaks,
        }
    }
}

/// Byte cursor over the attribute string. All delimiters are ASCII, so
/// every position the cursor stops at is a char boundary.
struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn eat(&mut self, delimiter: u8) -> bool {
        if self.input.as_bytes().get(self.pos) == Some(&delimiter) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume everything up to (not including) the next stop byte
    fn take_until(&mut self, stops: &[u8]) -> &'a str {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && !stops.contains(&bytes[self.pos]) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }
}

/// Decode a numeric field, treating malformed content as zero
fn lenient_number(field: &str, what: &str) -> u64 {
    match decode_base36(field) {
        Ok(n) => n,
        Err(err) => {
            tracing::warn!("Ignoring malformed {} in attribute string: {}", what, err);
            0
        }
    }
}

fn to_count(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// Parse a compressed attribute string into chunks.
///
/// Chunks that carry neither characters nor line breaks are dropped.
/// Malformed numbers never abort the parse; they count as zero (or, for
/// pool indices, are skipped).
pub fn parse_attribute_string(attribs: &str) -> Vec<AttributeChunk> {
    let mut scanner = Scanner::new(attribs);
    let mut chunks = Vec::new();

    loop {
        // Well-formed input has nothing to skip here
        scanner.take_until(b"*+");
        if scanner.is_at_end() {
            break;
        }

        let mut attributes = BTreeSet::new();
        while scanner.eat(b'*') {
            let field = scanner.take_until(b"*+|");
            if field.is_empty() {
                continue;
            }
            match decode_base36(field) {
                Ok(index) => {
                    attributes.insert(index);
                }
                Err(err) => tracing::warn!("Ignoring malformed pool index: {}", err),
            }
        }

        let mut num_characters = 0;
        if scanner.eat(b'+') {
            let field = scanner.take_until(b"|*+");
            if !field.is_empty() {
                num_characters = to_count(lenient_number(field, "character count"));
            }
        }

        let mut num_linebreaks = 0;
        if scanner.eat(b'|') {
            // A '+' here opens the next chunk
            let field = scanner.take_until(b"*+");
            if !field.is_empty() {
                num_linebreaks = to_count(lenient_number(field, "line break count"));
            }
        }

        if num_characters > 0 || num_linebreaks > 0 {
            tracing::trace!(?attributes, num_characters, num_linebreaks, "decoded chunk");
            chunks.push(AttributeChunk {
                attributes,
                num_characters,
                num_linebreaks,
            });
        }
    }

    chunks
}

/// The legacy attribute pool: small integer index to `(name, value)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributePool {
    entries: BTreeMap<u64, RawAttribute>,
}

impl AttributePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a pool object of the form `{"numToAttrib": {"0": [name, value]}}`.
    ///
    /// Entries whose key is not a number or whose value is not a pair are
    /// skipped. Non-string values are kept in their JSON spelling.
    pub fn from_json(pool: &Value) -> Self {
        let mut entries = BTreeMap::new();

        let Some(num_to_attrib) = pool.get("numToAttrib").and_then(Value::as_object) else {
            return Self { entries };
        };

        for (key, entry) in num_to_attrib {
            let Ok(index) = key.trim().parse::<u64>() else {
                tracing::debug!("Skipping pool entry with non-numeric key {:?}", key);
                continue;
            };
            let pair = entry
                .as_array()
                .filter(|pair| pair.len() >= 2)
                .and_then(|pair| Some((scalar_string(&pair[0])?, scalar_string(&pair[1])?)));
            match pair {
                Some(pair) => {
                    entries.insert(index, pair);
                }
                None => tracing::debug!("Skipping malformed pool entry {}", key),
            }
        }

        Self { entries }
    }

    pub fn insert(&mut self, index: u64, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(index, (name.into(), value.into()));
    }

    pub fn get(&self, index: u64) -> Option<&RawAttribute> {
        self.entries.get(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve pool indices to `(name, value)` pairs, ordered by ascending index.
///
/// Indices missing from the pool are skipped. Block type detection relies
/// on this order, so it does not depend on the iteration order of `indices`.
pub fn resolve_attributes<'a>(indices: impl IntoIterator<Item = &'a u64>, pool: &AttributePool) -> Vec<RawAttribute> {
    let mut sorted: Vec<u64> = indices.into_iter().copied().collect();
    sorted.sort_unstable();
    sorted.dedup();

    sorted
        .into_iter()
        .filter_map(|index| pool.get(index).cloned())
        .collect()
}

/// A slice of the raw text together with its resolved attributes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSpan {
    pub text: String,
    pub attributes: Vec<RawAttribute>,
}

impl RawSpan {
    pub fn new(text: impl Into<String>, attributes: Vec<RawAttribute>) -> Self {
        Self {
            text: text.into(),
            attributes,
        }
    }
}

/// Byte offset `n` characters after `start`, clamped to the end of `text`
fn advance(text: &str, start: usize, n: usize) -> usize {
    if n == 0 {
        return start;
    }
    text[start..]
        .char_indices()
        .nth(n)
        .map_or(text.len(), |(offset, _)| start + offset)
}

/// Walk the chunks over the raw text and emit `(text, attributes)` spans.
///
/// Line breaks consume characters from the same text buffer and are emitted
/// as separate attribute-less spans of `\n`. Reads never go past the end of
/// `text`.
pub fn extract_text_spans(text: &str, chunks: &[AttributeChunk], pool: &AttributePool) -> Vec<RawSpan> {
    let mut spans = Vec::new();
    let mut position = 0;

    for chunk in chunks {
        if chunk.num_characters > 0 {
            let end = advance(text, position, chunk.num_characters);
            let content = &text[position..end];
            position = end;

            let attributes = resolve_attributes(&chunk.attributes, pool);
            if !content.is_empty() || !attributes.is_empty() {
                spans.push(RawSpan::new(content, attributes));
            }
        }

        if chunk.num_linebreaks > 0 {
            position = advance(text, position, chunk.num_linebreaks);
            spans.push(RawSpan::new("\n".repeat(chunk.num_linebreaks), Vec::new()));
        }
    }

    spans
}
