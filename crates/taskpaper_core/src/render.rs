//! HTML rendering of items.
//!
//! Pure functions of the item text and outline depth: projects become
//! headings, tasks become list items, notes stay plain text. Links become
//! anchors and every tag is wrapped in a classed span.

use crate::item::{bullet_len, Item, ItemType};
use crate::links::scan_links;
use crate::tags::{keyed_tags, scan_tags};
use std::ops::Range;

const MAX_HEADING_LEVEL: usize = 6;

enum Markup {
    Tag { name: String },
    Link { href: String },
}

/// Renders one item; `depth` is its outline depth (1 for roots).
pub fn item_to_html(item: &Item, depth: usize) -> String {
    let text = item.text();
    let item_type = item.item_type();

    let mut start = text.len() - text.trim_start().len();
    if item_type == ItemType::Task {
        start += bullet_len(&text[start..]).unwrap_or(0);
    }
    let body = render_inline(text, start);

    match item_type {
        ItemType::Project => {
            let level = depth.clamp(1, MAX_HEADING_LEVEL);
            format!("<h{level}>{body}</h{level}>")
        }
        ItemType::Task => {
            let classes = keyed_tags(&item.tags())
                .iter()
                .map(|(name, _)| format!("tagged-{}", escape_html(name)))
                .collect::<Vec<_>>()
                .join(" ");
            if classes.is_empty() {
                format!("<li>{body}</li>")
            } else {
                format!("<li class=\"{classes}\">{body}</li>")
            }
        }
        ItemType::Note => body,
    }
}

fn render_inline(text: &str, start: usize) -> String {
    let mut spans: Vec<(Range<usize>, Markup)> = scan_tags(text)
        .into_iter()
        .map(|tag| (tag.span, Markup::Tag { name: tag.name }))
        .chain(
            scan_links(text)
                .into_iter()
                .map(|link| (link.span, Markup::Link { href: link.href })),
        )
        .filter(|(span, _)| span.start >= start)
        .collect();
    spans.sort_by_key(|(span, _)| span.start);

    let mut out = String::with_capacity(text.len() * 2);
    let mut cursor = start;
    for (span, markup) in spans {
        if span.start < cursor {
            continue;
        }
        out.push_str(&escape_html(&text[cursor..span.start]));
        let inner = escape_html(&text[span.clone()]);
        match markup {
            Markup::Tag { name } => out.push_str(&format!(
                "<span class=\"tag\" data-tag=\"{}\">{inner}</span>",
                escape_html(&name)
            )),
            Markup::Link { href } => {
                out.push_str(&format!("<a href=\"{}\">{inner}</a>", escape_html(&href)))
            }
        }
        cursor = span.end;
    }
    out.push_str(&escape_html(&text[cursor..]));
    out.trim_end().to_string()
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
