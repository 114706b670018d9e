//! Outline item model.
//!
//! # Responsibility
//! - Own the text buffer of one outline line.
//! - Expose tag/link views, done state and task/project/note classification.
//!
//! # Invariants
//! - The buffer never carries trailing whitespace when constructed.
//! - Tags and links are always derived from the current buffer.
//! - Marking an already done item done keeps its existing done date.

use crate::links::{scan_links, Link, LinkCollection, LinkError};
use crate::splice::strip_ranges;
use crate::tags::{lookup, scan_tags, Tag, TagCollection, TagError, TagResult, DONE_TAG};
use chrono::{Local, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Spaces per indentation level unless configured otherwise.
pub const DEFAULT_TAB_SIZE: usize = 4;

const DONE_DATE_FORMAT: &str = "%Y-%m-%d";
const BULLET_MARKERS: [char; 3] = ['-', '*', '+'];

/// Result type for item operations.
pub type ItemResult<T> = Result<T, ItemError>;

/// Errors raised by item-level operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    /// `done_date` was requested from an item without a `done` tag.
    TaskNotDone(String),
    /// Done state input was not a boolean.
    InvalidDoneState(String),
    /// Tag-level failure.
    Tag(TagError),
    /// Link-level failure.
    Link(LinkError),
}

impl Display for ItemError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotDone(text) => write!(f, "item is not done: `{text}`"),
            Self::InvalidDoneState(value) => {
                write!(f, "expected true/false for done state, got `{value}`")
            }
            Self::Tag(err) => write!(f, "{err}"),
            Self::Link(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ItemError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tag(err) => Some(err),
            Self::Link(err) => Some(err),
            Self::TaskNotDone(_) | Self::InvalidDoneState(_) => None,
        }
    }
}

impl From<TagError> for ItemError {
    fn from(value: TagError) -> Self {
        Self::Tag(value)
    }
}

impl From<LinkError> for ItemError {
    fn from(value: LinkError) -> Self {
        Self::Link(value)
    }
}

/// Classification of an item by its tag/link-free content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// Content starts with a `-`, `*` or `+` bullet.
    Task,
    /// Content ends with `:`.
    Project,
    /// Anything else.
    Note,
}

impl ItemType {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Project => "project",
            Self::Note => "note",
        }
    }
}

impl Display for ItemType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of outline text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    text: String,
    tab_size: usize,
}

impl Item {
    /// Creates an item with the default tab size.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_tab_size(text, DEFAULT_TAB_SIZE)
    }

    /// Creates an item; trailing whitespace is trimmed from `text`.
    pub fn with_tab_size(text: impl Into<String>, tab_size: usize) -> Self {
        let mut text = text.into();
        text.truncate(text.trim_end().len());
        Self { text, tab_size }
    }

    /// Current backing text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    /// Indentation depth of the raw line: one level per leading tab and one
    /// per `tab_size` leading spaces.
    pub fn indent_level(&self) -> usize {
        let mut tabs = 0;
        let mut spaces = 0;
        for ch in self.text.chars() {
            match ch {
                '\t' => tabs += 1,
                ' ' => spaces += 1,
                _ => break,
            }
        }
        tabs + spaces / self.tab_size.max(1)
    }

    /// Tags in textual order.
    pub fn tags(&self) -> Vec<Tag> {
        scan_tags(&self.text)
    }

    /// Value of tag `name`.
    pub fn tag(&self, name: &str) -> TagResult<String> {
        lookup(&self.text, name)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags().iter().any(|tag| tag.name == name)
    }

    /// Mutable tag view over this item's text.
    pub fn tags_mut(&mut self) -> TagCollection<'_> {
        TagCollection::new(&mut self.text)
    }

    /// Links in textual order.
    pub fn links(&self) -> Vec<Link> {
        scan_links(&self.text)
    }

    /// Mutable link view over this item's text.
    pub fn links_mut(&mut self) -> LinkCollection<'_> {
        LinkCollection::new(&mut self.text)
    }

    /// Sets tag `name` to `value`; same as `tags_mut().set(..)`.
    pub fn add_tag(&mut self, name: &str, value: &str) -> TagResult<()> {
        self.tags_mut().set(name, value)
    }

    /// Removes every tag named `name`, or only those holding `value`.
    pub fn remove_tag(&mut self, name: &str, value: Option<&str>) -> usize {
        self.tags_mut().remove(name, value)
    }

    /// Whether the item carries a `done` tag.
    pub fn done(&self) -> bool {
        self.has_tag(DONE_TAG)
    }

    /// Marks done with today's date, or removes the `done` tag.
    ///
    /// Setting the current state again is a no-op.
    pub fn set_done(&mut self, done: bool) {
        if done {
            self.mark_done();
        } else {
            self.mark_undone();
        }
    }

    /// Parses `true`/`false` (any case) and applies it as done state.
    ///
    /// # Errors
    /// - `InvalidDoneState` for any other input; the item is unchanged.
    pub fn set_done_str(&mut self, value: &str) -> ItemResult<()> {
        let done = match value.trim().to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            _ => return Err(ItemError::InvalidDoneState(value.to_string())),
        };
        self.set_done(done);
        Ok(())
    }

    /// Marks the item done today, unless already done.
    pub fn mark_done(&mut self) {
        self.mark_done_on(Local::now().date_naive());
    }

    /// Marks the item done on `date`, unless already done.
    pub fn mark_done_on(&mut self, date: NaiveDate) {
        if self.done() {
            return;
        }
        let stamp = date.format(DONE_DATE_FORMAT).to_string();
        self.tags_mut().set_unchecked(DONE_TAG, &stamp);
        debug!("event=item_done module=item status=ok date={}", stamp);
    }

    /// Removes the `done` tag if present.
    pub fn mark_undone(&mut self) {
        if self.tags_mut().remove(DONE_TAG, None) > 0 {
            debug!("event=item_undone module=item status=ok");
        }
    }

    /// Flips the done state.
    pub fn toggle_done(&mut self) {
        let done = self.done();
        self.set_done(!done);
    }

    /// Value of the `done` tag.
    ///
    /// # Errors
    /// - `TaskNotDone` when the item has no `done` tag.
    pub fn done_date(&self) -> ItemResult<String> {
        self.tag(DONE_TAG)
            .map_err(|_| ItemError::TaskNotDone(self.text.clone()))
    }

    /// Text with every tag and link removed, trimmed.
    pub fn content(&self) -> String {
        let mut ranges: Vec<_> = self
            .tags()
            .into_iter()
            .map(|tag| tag.lead_start..tag.span.end)
            .collect();
        ranges.extend(
            self.links()
                .into_iter()
                .map(|link| link.lead_start..link.span.end),
        );
        strip_ranges(&self.text, ranges).trim().to_string()
    }

    /// Classifies the item as task, project or note.
    pub fn item_type(&self) -> ItemType {
        classify_content(&self.content())
    }
}

impl Display for Item {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Length in bytes of a leading bullet marker plus its separator, if any.
pub(crate) fn bullet_len(content: &str) -> Option<usize> {
    let mut chars = content.chars();
    let marker = chars.next().filter(|ch| BULLET_MARKERS.contains(ch))?;
    match chars.next() {
        None => Some(marker.len_utf8()),
        Some(next) if next.is_whitespace() => Some(marker.len_utf8() + next.len_utf8()),
        Some(_) => None,
    }
}

fn classify_content(content: &str) -> ItemType {
    if bullet_len(content).is_some() {
        ItemType::Task
    } else if content.ends_with(':') {
        ItemType::Project
    } else {
        ItemType::Note
    }
}
