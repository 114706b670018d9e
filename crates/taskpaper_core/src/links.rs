//! Link grammar and the link view over an item's text.
//!
//! # Responsibility
//! - Recognize bare email addresses, web addresses and file paths.
//! - Derive `href` values and classify each match.
//! - Validate and splice links into the backing text.
//!
//! # Invariants
//! - Links are never stored; every read rescans the current text.
//! - Inserted link text must match the grammar end to end.

use crate::splice::{append_token, removal_range};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Range;

const EMAIL_PATTERN: &str = r"\b[A-Z0-9._%+\-]+@[A-Z0-9.\-]+\.[A-Z]{2,4}\b";
const PATH_PATTERN: &str = r"\.?/(?:\\\s|[^\x00 ]+)";
const WEB_PATTERN: &str = concat!(
    r"\b(?:[a-z][\w\-]+:(?:/{1,3}|[a-z0-9%.])|www\d{0,3}[.])",
    r"(?:[^\s()<>]+|\([^\s()<>]+\))+",
    r#"(?:\([^\s()<>]+\)|[^`!()\[\]{};:'".,<>?«»“”‘’\s])"#,
);

static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:^|\s)(?P<link>{EMAIL_PATTERN}|{PATH_PATTERN}|{WEB_PATTERN})"
    ))
    .expect("valid link regex")
});
static LINK_FULL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:{EMAIL_PATTERN}|{PATH_PATTERN}|{WEB_PATTERN})$"
    ))
    .expect("valid anchored link regex")
});
static EMAIL_FULL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)^(?:{EMAIL_PATTERN})$")).expect("valid email regex")
});
static WEB_FULL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)^(?:{WEB_PATTERN})$")).expect("valid web regex"));
static SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z][\w\-]+:").expect("valid scheme regex"));

/// Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Errors raised by link insertion and replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Text is not a single email address, web address or path.
    InvalidLink(String),
    /// No link at this position in the item.
    NoSuchLink(usize),
}

impl Display for LinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLink(text) => write!(f, "not a valid link: `{text}`"),
            Self::NoSuchLink(index) => write!(f, "no link at index {index}"),
        }
    }
}

impl Error for LinkError {}

/// Link category, decided email first, then web, then path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Email,
    Web,
    Path,
}

/// One link found in item text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Matched text, verbatim.
    pub text: String,
    pub link_type: LinkType,
    /// Navigable target derived from `text`.
    pub href: String,
    /// Byte range of the link text in the owning text.
    #[serde(skip)]
    pub span: Range<usize>,
    #[serde(skip)]
    pub lead_start: usize,
}

impl Link {
    fn from_match(text: &str, span: Range<usize>, lead_start: usize) -> Self {
        let link_type = classify(text);
        Self {
            text: text.to_string(),
            link_type,
            href: href_for(text, link_type),
            span,
            lead_start,
        }
    }
}

impl Display for Link {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Classifies link text.
pub fn classify(text: &str) -> LinkType {
    if EMAIL_FULL_RE.is_match(text) {
        LinkType::Email
    } else if WEB_FULL_RE.is_match(text) {
        LinkType::Web
    } else {
        LinkType::Path
    }
}

/// Derives the `href` for link text of the given type.
///
/// Web text that already carries a scheme (`http:`, `ftp:`, ...) is kept.
pub fn href_for(text: &str, link_type: LinkType) -> String {
    let (prefix, present) = match link_type {
        LinkType::Email => ("mailto:", starts_with_ignore_case(text, "mailto:")),
        LinkType::Web => ("http://", SCHEME_RE.is_match(text)),
        LinkType::Path => ("file://", starts_with_ignore_case(text, "file://")),
    };
    if present {
        text.to_string()
    } else {
        format!("{prefix}{text}")
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Whether `text` is exactly one link.
pub fn is_link(text: &str) -> bool {
    LINK_FULL_RE.is_match(text)
}

/// Scans `text` for links in textual order.
pub fn scan_links(text: &str) -> Vec<Link> {
    LINK_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let link = caps.name("link")?;
            Some(Link::from_match(
                link.as_str(),
                link.range(),
                whole.start(),
            ))
        })
        .collect()
}

/// Link view over one item's text buffer.
pub struct LinkCollection<'a> {
    text: &'a mut String,
}

impl<'a> LinkCollection<'a> {
    /// Wraps a text buffer.
    pub fn new(text: &'a mut String) -> Self {
        Self { text }
    }

    /// Returns every link in textual order.
    pub fn list(&self) -> Vec<Link> {
        scan_links(self.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    /// Returns the link at `index`.
    ///
    /// # Errors
    /// - `NoSuchLink` when `index` is out of range.
    pub fn get(&self, index: usize) -> LinkResult<Link> {
        self.list()
            .into_iter()
            .nth(index)
            .ok_or(LinkError::NoSuchLink(index))
    }

    /// Appends `link` to the end of the text.
    ///
    /// # Errors
    /// - `InvalidLink` when `link` is not exactly one link; text is untouched.
    pub fn append(&mut self, link: &str) -> LinkResult<()> {
        ensure_link(link)?;
        append_token(self.text, link);
        debug!(
            "event=link_append module=links status=ok len={}",
            link.len()
        );
        Ok(())
    }

    /// Replaces the link at `index` with `link`.
    ///
    /// # Errors
    /// - `InvalidLink` when `link` is not exactly one link.
    /// - `NoSuchLink` when `index` is out of range.
    pub fn set(&mut self, index: usize, link: &str) -> LinkResult<()> {
        ensure_link(link)?;
        let existing = self.get(index)?;
        self.text.replace_range(existing.span, link);
        debug!(
            "event=link_replace module=links status=ok index={} len={}",
            index,
            link.len()
        );
        Ok(())
    }

    /// Removes the link at `index` and returns it.
    ///
    /// # Errors
    /// - `NoSuchLink` when `index` is out of range.
    pub fn remove(&mut self, index: usize) -> LinkResult<Link> {
        let existing = self.get(index)?;
        let range = removal_range(self.text.as_str(), existing.lead_start, &existing.span);
        self.text.replace_range(range, "");
        debug!("event=link_remove module=links status=ok index={}", index);
        Ok(existing)
    }
}

fn ensure_link(link: &str) -> LinkResult<()> {
    if is_link(link) {
        Ok(())
    } else {
        debug!(
            "event=link_rejected module=links status=error len={}",
            link.len()
        );
        Err(LinkError::InvalidLink(link.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, href_for, is_link, scan_links, LinkType};

    #[test]
    fn classification_prefers_email_then_web() {
        assert_eq!(classify("john@smith.com"), LinkType::Email);
        assert_eq!(classify("http://google.co.uk"), LinkType::Web);
        assert_eq!(classify("www.example.com"), LinkType::Web);
        assert_eq!(classify("./myfile.txt"), LinkType::Path);
    }

    #[test]
    fn href_prefixes_only_when_missing() {
        assert_eq!(
            href_for("john@smith.com", LinkType::Email),
            "mailto:john@smith.com"
        );
        assert_eq!(
            href_for("www.example.com", LinkType::Web),
            "http://www.example.com"
        );
        assert_eq!(
            href_for("https://example.com", LinkType::Web),
            "https://example.com"
        );
        assert_eq!(href_for("ftp://sekrit.org", LinkType::Web), "ftp://sekrit.org");
        assert_eq!(href_for("/tmp/x", LinkType::Path), "file:///tmp/x");
    }

    #[test]
    fn spans_exclude_leading_whitespace() {
        let text = "quick ftp://brownfox.com jumps";
        let links = scan_links(text);
        assert_eq!(links.len(), 1);
        assert_eq!(&text[links[0].span.clone()], "ftp://brownfox.com");
        assert_eq!(links[0].lead_start, 5);
    }

    #[test]
    fn anchored_validation() {
        assert!(is_link("http://x.co"));
        assert!(!is_link("notalink"));
        assert!(!is_link("http://example.org and some text"));
    }
}
