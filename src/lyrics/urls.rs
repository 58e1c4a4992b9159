//! Direct document URL synthesis
//!
//! Guesses where a lyrics page lives from the artist/title pair alone, without
//! asking a search engine. No I/O happens here.

use super::query::Query;
use once_cell::sync::Lazy;
use regex::Regex;

/// Base URLs of the sites the pipeline talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    /// Hyphen-slug lyrics site, e.g. `https://genius.com`
    pub lyrics_base_url: String,
    /// Host name used to recognize lyrics-site links on a results page
    pub lyrics_host: String,
    /// Mirror with `/lyrics/{artist}/{title}.html` layout
    pub mirror_base_url: String,
    /// Search page template, `{query}` is replaced by the encoded phrase
    pub search_url: String,
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            lyrics_base_url: "https://genius.com".to_string(),
            lyrics_host: "genius.com".to_string(),
            mirror_base_url: "https://www.azlyrics.com".to_string(),
            search_url: "https://genius.com/search?q={query}".to_string(),
        }
    }
}

/// How a direct URL was guessed. Diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlStrategy {
    ArtistTitleSlug,
    MirrorPath,
    PrimaryArtistSlug,
    TitleSlug,
}

impl UrlStrategy {
    pub fn label(self) -> &'static str {
        match self {
            Self::ArtistTitleSlug => "artist-title-slug",
            Self::MirrorPath => "mirror-path",
            Self::PrimaryArtistSlug => "primary-artist-slug",
            Self::TitleSlug => "title-slug",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateUrl {
    pub url: String,
    pub strategy: UrlStrategy,
}

/// Build the ordered, deduplicated list of direct URLs for a query.
pub fn synthesize(query: &Query, sources: &Sources) -> Vec<CandidateUrl> {
    let base = sources.lyrics_base_url.trim_end_matches('/');
    let mirror = sources.mirror_base_url.trim_end_matches('/');
    let title = slug(&query.title);
    if title.is_empty() {
        return Vec::new();
    }

    let mut out: Vec<CandidateUrl> = Vec::new();
    let mut push = |url: String, strategy: UrlStrategy| {
        if !out.iter().any(|c| c.url == url) {
            out.push(CandidateUrl { url, strategy });
        }
    };

    let artist = slug(&query.artist);
    if !artist.is_empty() {
        push(
            format!("{base}/{artist}-{title}-lyrics"),
            UrlStrategy::ArtistTitleSlug,
        );

        let mirror_artist = compact(strip_article(&query.artist));
        let mirror_title = compact(&query.title);
        if !mirror_artist.is_empty() && !mirror_title.is_empty() {
            push(
                format!("{mirror}/lyrics/{mirror_artist}/{mirror_title}.html"),
                UrlStrategy::MirrorPath,
            );
        }

        let primary = slug(primary_artist(&query.artist));
        if !primary.is_empty() {
            push(
                format!("{base}/{primary}-{title}-lyrics"),
                UrlStrategy::PrimaryArtistSlug,
            );
        }
    }

    push(format!("{base}/{title}-lyrics"), UrlStrategy::TitleSlug);
    out
}

/// Search page URL for a phrase.
pub fn search_url(sources: &Sources, phrase: &str) -> String {
    let encoded = urlencoding::encode(phrase);
    if sources.search_url.contains("{query}") {
        sources.search_url.replace("{query}", &encoded)
    } else {
        format!("{}{}", sources.search_url, encoded)
    }
}

/// Hyphen slug: `"Guns N' Roses"` -> `"guns-n-roses"`.
pub fn slug(s: &str) -> String {
    let lower = s.to_lowercase().replace('&', " and ");
    let mut out = String::with_capacity(lower.len());
    for c in lower.chars() {
        match c {
            '\'' | '’' | '`' | ',' | '.' => {}
            c if c.is_alphanumeric() => out.push(c),
            _ => {
                if !out.is_empty() && !out.ends_with('-') {
                    out.push('-');
                }
            }
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Mirror-style slug: lowercase alphanumerics only, `&` spelled out.
pub fn compact(s: &str) -> String {
    s.to_lowercase()
        .replace('&', "and")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn strip_article(artist: &str) -> &str {
    let lower = artist.to_lowercase();
    if lower.starts_with("the ") && artist.len() > 4 {
        &artist[4..]
    } else {
        artist
    }
}

static COLLABORATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(?:feat\.?|ft\.?|featuring|x|and|&)\s+|,\s+").expect("collaboration regex")
});

/// First credited artist of a collaboration label.
fn primary_artist(artist: &str) -> &str {
    match COLLABORATION.find(artist) {
        Some(m) => artist[..m.start()].trim(),
        None => artist,
    }
}
