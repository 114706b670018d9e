//! Inline tag grammar and the mutable tag view over an item's text.
//!
//! # Responsibility
//! - Recognize `@name` / `@name(value)` annotations with their byte spans.
//! - Rewrite the backing text in place for set/insert/delete operations.
//!
//! # Invariants
//! - Spans are re-derived from the current text before every lookup or splice.
//! - A tag only counts when followed by whitespace or end of text.
//! - After any mutation at most one `done` tag exists and it is the last tag.
//!
//! # See also
//! - <https://guide.taskpaper.com/getting-started/>

use crate::splice::{append_token, removal_range};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Range;

/// Reserved tag name marking a completed item.
pub const DONE_TAG: &str = "done";

const NAME_START: &str = r"A-Z_a-z\x{00C0}-\x{00D6}\x{00D8}-\x{00F6}\x{00F8}-\x{02FF}\x{0370}-\x{037D}\x{037F}-\x{1FFF}\x{200C}-\x{200D}\x{2070}-\x{218F}\x{2C00}-\x{2FEF}\x{3001}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFFD}";
const NAME_CONTINUE: &str = r"\-.0-9\x{00B7}\x{0300}-\x{036F}\x{203F}-\x{2040}";

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:^|\s+)@(?P<name>[{NAME_START}][{NAME_START}{NAME_CONTINUE}]*)(?:\((?P<value>(?:\\\)|[^)])*)\))?"
    ))
    .expect("valid tag regex")
});
static TAG_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^[{NAME_START}][{NAME_START}{NAME_CONTINUE}]*$"
    ))
    .expect("valid tag name regex")
});

/// Result type for tag operations.
pub type TagResult<T> = Result<T, TagError>;

/// Errors raised by tag lookups and tag rewrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// Value contains an unescaped `)` or a line break, or ends in `\`.
    InvalidTagValue(String),
    /// Name does not match the tag identifier grammar.
    InvalidTag(String),
    /// No tag with this name exists in the item.
    NoSuchTag(String),
}

impl Display for TagError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTagValue(value) => {
                write!(
                    f,
                    "tag value must not contain an unescaped `)` or a line break, \
                     nor end in `\\`: `{value}`"
                )
            }
            Self::InvalidTag(name) => write!(f, "invalid tag name: `{name}`"),
            Self::NoSuchTag(name) => write!(f, "no such tag: `{name}`"),
        }
    }
}

impl Error for TagError {}

/// One tag occurrence found in item text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name, taken verbatim from the text.
    pub name: String,
    /// Parenthesized value; empty when absent or `()`.
    pub value: String,
    /// Byte range of `@name(value)` in the owning text.
    #[serde(skip)]
    pub span: Range<usize>,
    /// Start of the whitespace run that introduced the tag.
    #[serde(skip)]
    pub lead_start: usize,
}

impl Tag {
    /// Returns `(name, value)` without position data.
    pub fn as_pair(&self) -> (&str, &str) {
        (self.name.as_str(), self.value.as_str())
    }

    /// Whether this is the reserved `done` tag.
    pub fn is_done(&self) -> bool {
        self.name == DONE_TAG
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&render_tag(&self.name, &self.value))
    }
}

/// Renders the textual form of a tag: `@name` or `@name(value)`.
pub fn render_tag(name: &str, value: &str) -> String {
    if value.is_empty() {
        format!("@{name}")
    } else {
        format!("@{name}({value})")
    }
}

/// Checks a tag name against the identifier grammar.
pub fn validate_name(name: &str) -> TagResult<()> {
    if TAG_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(TagError::InvalidTag(name.to_string()))
    }
}

/// Checks that a tag value has no unescaped `)`, stays on one line and does
/// not end in `\`.
///
/// A trailing backslash would turn the closing paren into `\)` and the value
/// would run on into whatever follows the tag.
pub fn validate_value(value: &str) -> TagResult<()> {
    let mut previous = None;
    for ch in value.chars() {
        if (ch == ')' && previous != Some('\\')) || ch == '\n' || ch == '\r' {
            return Err(TagError::InvalidTagValue(value.to_string()));
        }
        previous = Some(ch);
    }
    if previous == Some('\\') {
        return Err(TagError::InvalidTagValue(value.to_string()));
    }
    Ok(())
}

/// Scans `text` for tags in textual order.
///
/// Candidates not followed by whitespace or end of text are skipped,
/// e.g. `@tag)` or `@tag(value)extra`.
pub fn scan_tags(text: &str) -> Vec<Tag> {
    let mut tags = Vec::new();
    let mut cursor = 0;
    while cursor <= text.len() {
        let Some(caps) = TAG_RE.captures_at(text, cursor) else {
            break;
        };
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
            break;
        };
        let at = name.start() - 1;
        let value = caps.name("value");

        let end = if is_boundary(text, whole.end()) {
            Some(whole.end())
        } else {
            value.and_then(|value| escaped_close(text, value.start(), value.end()))
        };

        match end {
            Some(end) => {
                let value = value
                    .map(|value| text[value.start()..(end - 1).max(value.start())].to_string())
                    .unwrap_or_default();
                tags.push(Tag {
                    name: name.as_str().to_string(),
                    value,
                    span: at..end,
                    lead_start: whole.start(),
                });
                cursor = end;
            }
            None => cursor = at + 1,
        }
    }
    tags
}

/// Whether the byte at `pos` is whitespace or the end of text.
fn is_boundary(text: &str, pos: usize) -> bool {
    text[pos..].chars().next().map_or(true, char::is_whitespace)
}

/// Finds an earlier close for a value that was read past an escaped `\)`.
///
/// Backtracks from the longest candidate: any `\)` inside the value may act
/// as the closing paren if a tag boundary follows it.
fn escaped_close(text: &str, value_start: usize, value_end: usize) -> Option<usize> {
    text[value_start..value_end]
        .rmatch_indices("\\)")
        .map(|(offset, _)| value_start + offset + 2)
        .find(|&end| is_boundary(text, end))
}

/// Returns the keyed view: one `(name, value)` per name in order of first
/// occurrence, holding the value of the last occurrence.
pub fn keyed_tags(tags: &[Tag]) -> Vec<(String, String)> {
    let mut keyed: Vec<(String, String)> = Vec::new();
    for tag in tags {
        match keyed.iter_mut().find(|(name, _)| *name == tag.name) {
            Some(entry) => entry.1 = tag.value.clone(),
            None => keyed.push((tag.name.clone(), tag.value.clone())),
        }
    }
    keyed
}

/// Looks up the value of `name` in `text`; the last occurrence wins.
pub fn lookup(text: &str, name: &str) -> TagResult<String> {
    scan_tags(text)
        .into_iter()
        .rev()
        .find(|tag| tag.name == name)
        .map(|tag| tag.value)
        .ok_or_else(|| TagError::NoSuchTag(name.to_string()))
}

/// Compares two tag lists by `(name, value)`, ignoring order.
pub fn same_tags(left: &[Tag], right: &[Tag]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut left: Vec<_> = left.iter().map(Tag::as_pair).collect();
    let mut right: Vec<_> = right.iter().map(Tag::as_pair).collect();
    left.sort_unstable();
    right.sort_unstable();
    left == right
}

/// Mutable tag view over one item's text buffer.
///
/// Every read rescans the buffer; every write splices it and then runs the
/// `done`-last rearrangement.
pub struct TagCollection<'a> {
    text: &'a mut String,
}

impl<'a> TagCollection<'a> {
    /// Wraps a text buffer.
    pub fn new(text: &'a mut String) -> Self {
        Self { text }
    }

    /// Returns every tag occurrence in textual order.
    pub fn list(&self) -> Vec<Tag> {
        scan_tags(self.text.as_str())
    }

    /// Returns the keyed `(name, value)` view.
    pub fn entries(&self) -> Vec<(String, String)> {
        keyed_tags(&self.list())
    }

    /// Number of tag occurrences.
    pub fn len(&self) -> usize {
        self.list().len()
    }

    /// Whether the buffer holds no tags.
    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    /// Returns the value for `name`.
    ///
    /// # Errors
    /// - `NoSuchTag` when no tag has this name.
    pub fn get(&self, name: &str) -> TagResult<String> {
        lookup(self.text.as_str(), name)
    }

    /// Whether any tag is named `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.list().iter().any(|tag| tag.name == name)
    }

    /// Whether a tag with exactly this name and value exists.
    pub fn contains_tag(&self, name: &str, value: &str) -> bool {
        self.list()
            .iter()
            .any(|tag| tag.name == name && tag.value == value)
    }

    /// Sets `name` to `value`, rewriting the last occurrence in place or
    /// appending a new tag when absent.
    ///
    /// # Errors
    /// - `InvalidTag` for a name outside the identifier grammar.
    /// - `InvalidTagValue` for a value with an unescaped `)` or a trailing `\`.
    pub fn set(&mut self, name: &str, value: &str) -> TagResult<()> {
        validate_name(name)?;
        validate_value(value)?;
        self.set_unchecked(name, value);
        Ok(())
    }

    /// Appends a new occurrence of `name`, even when one already exists.
    ///
    /// # Errors
    /// - Same validation as [`TagCollection::set`].
    pub fn insert(&mut self, name: &str, value: &str) -> TagResult<()> {
        validate_name(name)?;
        validate_value(value)?;
        append_token(self.text, &render_tag(name, value));
        debug!(
            "event=tag_insert module=tags status=ok name={} value_len={}",
            name,
            value.len()
        );
        self.rearrange_done();
        Ok(())
    }

    /// Removes every occurrence of `name`.
    ///
    /// # Errors
    /// - `NoSuchTag` when no tag has this name; the text is left untouched.
    pub fn delete(&mut self, name: &str) -> TagResult<()> {
        let removed = self.remove_matching(|tag| tag.name == name);
        if removed == 0 {
            return Err(TagError::NoSuchTag(name.to_string()));
        }
        debug!(
            "event=tag_delete module=tags status=ok name={} removed={}",
            name, removed
        );
        self.rearrange_done();
        Ok(())
    }

    /// Removes occurrences of `name`, optionally only those with `value`.
    ///
    /// Returns how many occurrences were removed.
    pub fn remove(&mut self, name: &str, value: Option<&str>) -> usize {
        let removed = self.remove_matching(|tag| {
            tag.name == name && value.map_or(true, |value| tag.value == value)
        });
        if removed > 0 {
            debug!(
                "event=tag_remove module=tags status=ok name={} removed={}",
                name, removed
            );
            self.rearrange_done();
        }
        removed
    }

    /// Set without validation, for callers writing known-good values.
    pub(crate) fn set_unchecked(&mut self, name: &str, value: &str) {
        let rendered = render_tag(name, value);
        let existing = self.list().into_iter().rev().find(|tag| tag.name == name);
        match existing {
            Some(tag) => self.text.replace_range(tag.span, &rendered),
            None => append_token(self.text, &rendered),
        }
        debug!(
            "event=tag_set module=tags status=ok name={} value_len={}",
            name,
            value.len()
        );
        self.rearrange_done();
    }

    fn remove_matching(&mut self, predicate: impl Fn(&Tag) -> bool) -> usize {
        let doomed: Vec<Tag> = self.list().into_iter().filter(|tag| predicate(tag)).collect();
        // Back to front, so earlier spans stay valid.
        for tag in doomed.iter().rev() {
            let range = removal_range(self.text.as_str(), tag.lead_start, &tag.span);
            self.text.replace_range(range, "");
        }
        doomed.len()
    }

    /// Collapses `done` tags to the last one and moves it behind every
    /// other tag.
    fn rearrange_done(&mut self) {
        let tags = self.list();
        let done: Vec<&Tag> = tags.iter().filter(|tag| tag.is_done()).collect();
        let Some(survivor) = done.last() else {
            return;
        };
        let trailing = tags.last().map_or(false, |tag| tag.span == survivor.span);
        if done.len() == 1 && trailing {
            return;
        }

        let rendered = survivor.to_string();
        let count = done.len();
        self.remove_matching(Tag::is_done);
        match self.list().last() {
            Some(last) => self.text.insert_str(last.span.end, &format!(" {rendered}")),
            None => append_token(self.text, &rendered),
        }
        debug!(
            "event=done_rearrange module=tags status=ok collapsed={}",
            count
        );
    }
}
