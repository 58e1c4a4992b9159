//! Small helpers over scraper's DOM.
//!
//! [`NodeKind`] is the view of a child node the extractor works with; the
//! rest are text and class utilities shared by discovery and extraction.

use scraper::{ElementRef, Node, Selector};

/// A child node as seen by the walkers.
#[derive(Debug, Clone, Copy)]
pub enum NodeKind<'a> {
    Text(&'a str),
    Element(ElementRef<'a>),
    Comment(&'a str),
    Other,
}

impl<'a> NodeKind<'a> {
    /// Whitespace-only text node.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(t) if t.trim().is_empty())
    }

    /// Lowercase tag name for elements.
    pub fn tag_name(&self) -> Option<&'a str> {
        match self {
            Self::Element(el) => Some(el.value().name()),
            _ => None,
        }
    }
}

/// Child nodes of `el`.
pub fn children<'a>(el: ElementRef<'a>) -> impl Iterator<Item = NodeKind<'a>> + 'a {
    el.children().map(|child| match child.value() {
        Node::Text(text) => NodeKind::Text(&**text),
        Node::Comment(comment) => NodeKind::Comment(&**comment),
        Node::Element(_) => ElementRef::wrap(child)
            .map(NodeKind::Element)
            .unwrap_or(NodeKind::Other),
        _ => NodeKind::Other,
    })
}

/// Child nodes of `el` with every element matching `remove` left out.
pub fn children_except<'a, P>(el: ElementRef<'a>, remove: P) -> Vec<NodeKind<'a>>
where
    P: Fn(ElementRef<'a>) -> bool,
{
    children(el)
        .filter(|kid| match kid {
            NodeKind::Element(e) => !remove(*e),
            _ => true,
        })
        .collect()
}

/// Tags whose text never reaches a reader.
pub fn is_invisible(el: ElementRef<'_>) -> bool {
    matches!(
        el.value().name(),
        "script" | "style" | "noscript" | "template" | "head"
    )
}

/// Visible text of `el` with whitespace collapsed.
pub fn visible_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_visible_text(el, &mut out);
    collapse(&out)
}

fn push_visible_text(el: ElementRef<'_>, out: &mut String) {
    for kid in children(el) {
        match kid {
            NodeKind::Text(t) => {
                out.push_str(t);
                out.push(' ');
            }
            NodeKind::Element(e) if !is_invisible(e) => push_visible_text(e, out),
            _ => {}
        }
    }
}

/// Text of `el` with whitespace collapsed (every text node, visible or not).
pub fn collapsed_text(el: ElementRef<'_>) -> String {
    collapse(&el.text().collect::<Vec<_>>().join(" "))
}

pub fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased `class` and `id` values of `el`.
pub fn class_and_id(el: ElementRef<'_>) -> Vec<String> {
    el.value()
        .classes()
        .chain(el.value().id())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Up to `depth` element ancestors of `el`, nearest first.
pub fn ancestors<'a>(el: ElementRef<'a>, depth: usize) -> impl Iterator<Item = ElementRef<'a>> {
    el.ancestors().filter_map(ElementRef::wrap).take(depth)
}

/// Parse a compile-time selector.
pub fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}
