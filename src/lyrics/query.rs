//! Query normalization
//!
//! Turns a free-text track label such as `"Queen - Bohemian Rhapsody (Remastered 2011)"`
//! into a canonical artist/title pair.

use serde::Serialize;

/// Separator between artist and title in a track label.
pub const SEPARATOR: &str = " - ";

/// A normalized lookup query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    /// Artist part, empty when the label had no separator
    pub artist: String,
    /// Title part (or the whole label)
    pub title: String,
    /// The label exactly as it was supplied
    pub raw_text: String,
}

impl Query {
    /// Parse a raw label. Never fails; an unparseable label becomes a title-only query.
    pub fn parse(raw: &str) -> Self {
        let cleaned = normalize(raw);
        let (artist, title) = split_label(&cleaned);
        Self {
            artist,
            title,
            raw_text: raw.to_string(),
        }
    }

    /// Canonical `"Artist - Title"` label (just the title when there is no artist).
    pub fn label(&self) -> String {
        if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{}{}{}", self.artist, SEPARATOR, self.title)
        }
    }

    /// Single search phrase, artist first.
    pub fn phrase(&self) -> String {
        [self.artist.as_str(), self.title.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.artist.is_empty() && self.title.is_empty()
    }
}

/// Strip `(...)` / `[...]` annotations, collapse whitespace and trim.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut parens = 0usize;
    let mut brackets = 0usize;

    for c in raw.chars() {
        match c {
            '(' => parens += 1,
            '[' => brackets += 1,
            ')' => parens = parens.saturating_sub(1),
            ']' => brackets = brackets.saturating_sub(1),
            _ if parens == 0 && brackets == 0 => out.push(c),
            _ => {}
        }
    }

    collapse_whitespace(&out)
}

/// Split a normalized label on the first separator.
pub fn split_label(label: &str) -> (String, String) {
    match label.split_once(SEPARATOR) {
        Some((artist, title)) => (artist.trim().to_string(), title.trim().to_string()),
        None => (String::new(), label.trim().to_string()),
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
