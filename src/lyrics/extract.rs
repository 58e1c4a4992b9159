//! Lyrics text extraction
//!
//! Finds the lyrics container of a fetched page and renders it to plain text:
//! - known container markers first (attribute/class signatures, then the
//!   mirror site's marker comment),
//! - otherwise the innermost classless `div` whose text reads like lyrics.
//!
//! Noise (scripts, ads, headers, sidebars, footers) is skipped while walking,
//! and the result is normalized to LF lines with at most one blank line
//! between stanzas.

use super::dom::{self, NodeKind};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

const MARKER_COMMENT: &str = "usage of azlyrics.com content";

/// Container signatures, most specific first.
static CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "div[data-lyrics-container='true']",
        "[class^='Lyrics__Container']",
        "div.lyrics",
        "div.lyricbox",
    ]
    .into_iter()
    .map(dom::selector)
    .collect()
});

static PLAIN_BLOCK: Lazy<Selector> = Lazy::new(|| dom::selector("div:not([class])"));

const NOISE_TAGS: [&str; 10] = [
    "script", "style", "noscript", "template", "iframe", "form", "button", "svg", "ins", "aside",
];
const NOISE_TOKENS: [&str; 6] = ["ad", "ads", "advert", "banner", "promo", "share"];
const NOISE_FRAGMENTS: [&str; 5] = ["advert", "adsbygoogle", "header", "sidebar", "footer"];

/// Extract clean lyrics text, or `None` when the page has nothing usable.
pub fn extract(doc: &Html) -> Option<String> {
    from_marked_containers(doc)
        .or_else(|| from_marker_comment(doc))
        .or_else(|| from_plain_blocks(doc))
}

fn from_marked_containers(doc: &Html) -> Option<String> {
    for sel in CONTAINERS.iter() {
        // Some sites split one song across several sibling containers.
        let raw = doc
            .select(sel)
            .map(|container| render(container).trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        if let Some(text) = non_empty(clean(&raw)) {
            return Some(text);
        }
    }
    None
}

fn from_marker_comment(doc: &Html) -> Option<String> {
    doc.root_element().descendants().find_map(|node| {
        let Node::Comment(comment) = node.value() else {
            return None;
        };
        if !comment.to_lowercase().contains(MARKER_COMMENT) {
            return None;
        }
        let container = node.next_siblings().find_map(ElementRef::wrap)?;
        non_empty(clean(&render(container)))
    })
}

fn from_plain_blocks(doc: &Html) -> Option<String> {
    doc.select(&PLAIN_BLOCK)
        .filter(|div| looks_like_lyrics(&dom::visible_text(*div)))
        // Prefer the innermost qualifying block over a page-wide wrapper.
        .filter(|div| {
            !div.select(&PLAIN_BLOCK)
                .any(|inner| looks_like_lyrics(&dom::visible_text(inner)))
        })
        .find_map(|div| non_empty(clean(&render(div))))
}

/// Word count above 20 and length above 100 characters.
pub fn looks_like_lyrics(text: &str) -> bool {
    text.split_whitespace().count() > 20 && text.chars().count() > 100
}

/// Render a container to raw text; [`clean`] tidies it afterwards.
pub fn render(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    render_into(el, &mut out);
    out
}

fn render_into(el: ElementRef<'_>, out: &mut String) {
    let kids = dom::children_except(el, is_noise);
    for (i, kid) in kids.iter().enumerate() {
        match kid {
            NodeKind::Text(text) => push_text(out, text),
            NodeKind::Element(e) => match e.value().name() {
                "br" => out.push('\n'),
                "p" => {
                    render_into(*e, out);
                    out.push_str("\n\n");
                }
                "a" => {
                    render_into(*e, out);
                    let next_is_break = kids[i + 1..]
                        .iter()
                        .find(|k| !k.is_blank())
                        .and_then(NodeKind::tag_name)
                        == Some("br");
                    if !next_is_break && !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
                _ => render_into(*e, out),
            },
            NodeKind::Comment(_) | NodeKind::Other => {}
        }
    }
}

/// Append a text node with source-formatting whitespace collapsed.
fn push_text(out: &mut String, text: &str) {
    let starts_ws = text.starts_with(char::is_whitespace);
    let ends_ws = text.ends_with(char::is_whitespace);
    let body = dom::collapse(text);
    if starts_ws && !out.is_empty() && !out.ends_with([' ', '\n']) {
        out.push(' ');
    }
    out.push_str(&body);
    if ends_ws && !body.is_empty() {
        out.push(' ');
    }
}

fn is_noise(el: ElementRef<'_>) -> bool {
    if NOISE_TAGS.contains(&el.value().name()) {
        return true;
    }
    if el.value().attr("data-exclude-from-selection") == Some("true") {
        return true;
    }
    dom::class_and_id(el).iter().any(|name| {
        NOISE_FRAGMENTS.iter().any(|f| name.contains(f))
            || name
                .split(['-', '_'])
                .any(|token| NOISE_TOKENS.contains(&token))
    })
}

/// Normalize raw rendered text: no CRs, trimmed lines, at most one blank line
/// in a row, no leading or trailing blank lines.
pub fn clean(raw: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blank_run = 0usize;
    for line in raw.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() && blank_run > 0 {
            out.push("");
        }
        blank_run = 0;
        out.push(line);
    }
    out.join("\n").replace('\r', "")
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}
