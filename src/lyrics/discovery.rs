//! Link discovery on search-result pages
//!
//! Four independent strategies mine a results page for lyrics-page links.
//! They run in a fixed priority order and the first one that finds anything
//! wins; later strategies are not consulted.

use super::dom;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

/// A lyrics-page link scraped from a results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchCandidate {
    pub artist: String,
    pub title: String,
    pub url: String,
    pub score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CardLink,
    TopResult,
    AnyMatchingLink,
    ResultItem,
}

impl Strategy {
    /// Priority order.
    pub const ALL: [Strategy; 4] = [
        Strategy::CardLink,
        Strategy::TopResult,
        Strategy::AnyMatchingLink,
        Strategy::ResultItem,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::CardLink => "card-link",
            Self::TopResult => "top-result",
            Self::AnyMatchingLink => "any-matching-link",
            Self::ResultItem => "result-item",
        }
    }
}

/// What the strategies need to know besides the document.
#[derive(Debug, Clone)]
pub struct DiscoveryContext<'a> {
    /// URL the results page was served from, for resolving relative links
    pub page_url: &'a Url,
    /// Lyrics site host, e.g. `genius.com`
    pub lyrics_host: &'a str,
    /// Cap for the any-matching-link strategy
    pub max_links: usize,
    /// How far up the top-result strategy climbs
    pub ancestor_depth: usize,
}

static LYRICS_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:/lyrics/|-lyrics(?:\.html?)?/?$|/[^/]+-[^/]+-[^/]+/?$)")
        .expect("lyrics path regex")
});

const EXCLUDED_PATHS: [&str; 3] = ["/albums/", "/artists/", "/users/"];

const BLOCKED_MARKERS: [&str; 5] = [
    "captcha",
    "access denied",
    "enable javascript",
    "unusual traffic",
    "are you a robot",
];

static ANCHOR: Lazy<Selector> = Lazy::new(|| dom::selector("a[href]"));
static CARD_ANCHOR: Lazy<Selector> =
    Lazy::new(|| dom::selector("a.mini_card, a[class*='mini_card'], a[class*='card']"));
static LABEL: Lazy<Selector> =
    Lazy::new(|| dom::selector("div, span, p, label, header, h1, h2, h3, h4, h5, h6"));
static RESULT_ITEM: Lazy<Selector> = Lazy::new(|| {
    dom::selector(
        "search-result-item, [class*='search-result'], [class*='search_result'], \
         [class*='result-item'], li[class*='result'], div.g, li.b_algo",
    )
});
static CARD_ARTIST: Lazy<Selector> = Lazy::new(|| {
    dom::selector("[class*='subtitle'], [class*='artist']")
});
static CARD_TITLE: Lazy<Selector> =
    Lazy::new(|| dom::selector("[class*='title']:not([class*='subtitle'])"));
static TITLE: Lazy<Selector> = Lazy::new(|| dom::selector("title"));
static BODY: Lazy<Selector> = Lazy::new(|| dom::selector("body"));

/// Run the strategies in priority order; the first non-empty result wins.
pub fn discover(doc: &Html, ctx: &DiscoveryContext<'_>) -> Option<(Strategy, Vec<SearchCandidate>)> {
    Strategy::ALL.into_iter().find_map(|strategy| {
        let found = run_strategy(strategy, doc, ctx);
        tracing::debug!(strategy = strategy.label(), found = found.len(), "link discovery");
        (!found.is_empty()).then_some((strategy, found))
    })
}

pub fn run_strategy(strategy: Strategy, doc: &Html, ctx: &DiscoveryContext<'_>) -> Vec<SearchCandidate> {
    let mut out = Collected::default();
    match strategy {
        Strategy::CardLink => {
            for a in doc.select(&CARD_ANCHOR) {
                if let Some(url) = qualifying_url(a, ctx) {
                    out.push(a, url);
                }
            }
        }
        Strategy::TopResult => {
            for label in doc.select(&LABEL) {
                if !is_top_result_label(label) {
                    continue;
                }
                let hit = dom::ancestors(label, ctx.ancestor_depth).find_map(|ancestor| {
                    ancestor
                        .select(&ANCHOR)
                        .find_map(|a| qualifying_url(a, ctx).map(|url| (a, url)))
                });
                if let Some((a, url)) = hit {
                    out.push(a, url);
                }
            }
        }
        Strategy::AnyMatchingLink => {
            for a in doc.select(&ANCHOR) {
                if out.len() >= ctx.max_links {
                    break;
                }
                if let Some(url) = qualifying_url(a, ctx).filter(|u| on_host(u, ctx.lyrics_host)) {
                    out.push(a, url);
                }
            }
        }
        Strategy::ResultItem => {
            for item in doc.select(&RESULT_ITEM) {
                let hit = item
                    .select(&ANCHOR)
                    .find_map(|a| qualifying_url(a, ctx).map(|url| (a, url)));
                if let Some((a, url)) = hit {
                    out.push(a, url);
                }
            }
        }
    }
    out.0
}

/// Anti-bot interstitial instead of real results.
///
/// Results pages echo the search phrase back, so markers that occur in
/// `phrase` itself (a song called "Access Denied") are not evidence.
pub fn is_blocked(doc: &Html, phrase: &str) -> bool {
    let mut text = doc
        .select(&TITLE)
        .next()
        .map(dom::collapsed_text)
        .unwrap_or_default();
    if let Some(body) = doc.select(&BODY).next() {
        text.push(' ');
        text.push_str(&dom::visible_text(body));
    }
    let text = text.to_lowercase();
    let phrase = phrase.to_lowercase();
    BLOCKED_MARKERS
        .iter()
        .filter(|m| !phrase.contains(*m))
        .any(|m| text.contains(m))
}

/// Path looks like a lyrics page and not an album/artist/user page.
pub fn looks_like_lyrics_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    !EXCLUDED_PATHS.iter().any(|p| lower.contains(p)) && LYRICS_PATH.is_match(&lower)
}

#[derive(Default)]
struct Collected(Vec<SearchCandidate>);

impl Collected {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn push(&mut self, anchor: ElementRef<'_>, url: Url) {
        let url = url.to_string();
        if self.0.iter().any(|c| c.url == url) {
            return;
        }
        let (artist, title) = describe(anchor, &url);
        self.0.push(SearchCandidate {
            artist,
            title,
            url,
            score: 0,
        });
    }
}

fn qualifying_url(a: ElementRef<'_>, ctx: &DiscoveryContext<'_>) -> Option<Url> {
    let url = resolve_href(ctx.page_url, a.value().attr("href")?)?;
    looks_like_lyrics_path(url.path()).then_some(url)
}

/// Resolve an href against the page, unwrapping `/url?q=` redirect links.
pub fn resolve_href(page_url: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    let url = page_url.join(href).ok()?;
    if url.path() == "/url" {
        let target = url
            .query_pairs()
            .find(|(k, _)| k == "q" || k == "url")
            .map(|(_, v)| v.into_owned())?;
        return Url::parse(&target).ok().filter(is_web);
    }
    Some(url).filter(is_web)
}

fn is_web(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

fn on_host(url: &Url, host: &str) -> bool {
    let host = host.trim_start_matches("www.");
    url.host_str().is_some_and(|h| {
        let h = h.trim_start_matches("www.");
        h == host || h.ends_with(&format!(".{host}"))
    })
}

fn is_top_result_label(el: ElementRef<'_>) -> bool {
    // Only the innermost element carrying the label text.
    dom::collapsed_text(el).eq_ignore_ascii_case("top result")
        && !el
            .children()
            .filter_map(ElementRef::wrap)
            .any(|c| dom::collapsed_text(c).eq_ignore_ascii_case("top result"))
}

/// Best-effort artist/title for an anchor.
fn describe(anchor: ElementRef<'_>, url: &str) -> (String, String) {
    let artist = anchor
        .select(&CARD_ARTIST)
        .map(dom::collapsed_text)
        .find(|s| !s.is_empty())
        .unwrap_or_default();
    let title = anchor
        .select(&CARD_TITLE)
        .map(dom::collapsed_text)
        .find(|s| !s.is_empty())
        .unwrap_or_default();
    if !title.is_empty() {
        return (artist, title);
    }

    let text = clean_link_text(&dom::collapsed_text(anchor));
    if let Some((title, by)) = text.split_once(" by ") {
        return (by.trim().to_string(), title.trim().to_string());
    }
    if text.contains(super::query::SEPARATOR) {
        return super::query::split_label(&text);
    }
    if !text.is_empty() {
        return (artist, text);
    }
    (artist, title_from_url(url))
}

fn clean_link_text(text: &str) -> String {
    const SUFFIX: &str = " lyrics";
    let text = text.split(" | ").next().unwrap_or_default().trim();
    let cut = text.len().saturating_sub(SUFFIX.len());
    match text.get(cut..) {
        Some(tail) if tail.eq_ignore_ascii_case(SUFFIX) => text[..cut].trim().to_string(),
        _ => text.to_string(),
    }
}

fn title_from_url(url: &str) -> String {
    let segment = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let segment = segment
        .trim_end_matches(".html")
        .trim_end_matches(".htm")
        .trim_end_matches("-lyrics");
    dom::collapse(&segment.replace(['-', '_'], " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://genius.com/search?q=obscure%20artist";

    fn run(html: &str) -> Option<(Strategy, Vec<SearchCandidate>)> {
        let doc = Html::parse_document(html);
        let page = Url::parse(PAGE).unwrap();
        let ctx = DiscoveryContext {
            page_url: &page,
            lyrics_host: "genius.com",
            max_links: 10,
            ancestor_depth: 5,
        };
        discover(&doc, &ctx)
    }

    #[test]
    fn test_lyrics_path_pattern() {
        assert!(looks_like_lyrics_path("/Queen-bohemian-rhapsody-lyrics"));
        assert!(looks_like_lyrics_path("/lyrics/queen/bohemianrhapsody.html"));
        assert!(looks_like_lyrics_path("/some-multi-hyphen-slug"));
        assert!(!looks_like_lyrics_path("/artists/Queen-the-band"));
        assert!(!looks_like_lyrics_path("/albums/Queen/A-night-at-the-opera"));
        assert!(!looks_like_lyrics_path("/users/some-user-name"));
        assert!(!looks_like_lyrics_path("/search"));
        assert!(!looks_like_lyrics_path("/two-words"));
    }

    #[test]
    fn test_resolve_href() {
        let page = Url::parse(PAGE).unwrap();
        assert_eq!(
            resolve_href(&page, "/Queen-bohemian-rhapsody-lyrics").unwrap().as_str(),
            "https://genius.com/Queen-bohemian-rhapsody-lyrics"
        );
        assert_eq!(
            resolve_href(
                &page,
                "/url?q=https://www.azlyrics.com/lyrics/queen/bohemianrhapsody.html&sa=U"
            )
            .unwrap()
            .as_str(),
            "https://www.azlyrics.com/lyrics/queen/bohemianrhapsody.html"
        );
        assert!(resolve_href(&page, "#top").is_none());
        assert!(resolve_href(&page, "javascript:void(0)").is_none());
        assert!(resolve_href(&page, "mailto:someone@example.org").is_none());
    }

    #[test]
    fn test_card_link_strategy() {
        let html = r#"
<html><body>
  <a class="mini_card" href="/Obscure-artist-b-side-cut-lyrics">
    <div class="mini_card-title">B-Side Cut</div>
    <div class="mini_card-subtitle">Obscure Artist</div>
  </a>
  <a class="mini_card" href="/artists/Obscure-artist">Obscure Artist</a>
</body></html>"#;
        let (strategy, found) = run(html).unwrap();
        assert_eq!(strategy, Strategy::CardLink);
        assert_eq!(
            found,
            vec![SearchCandidate {
                artist: "Obscure Artist".into(),
                title: "B-Side Cut".into(),
                url: "https://genius.com/Obscure-artist-b-side-cut-lyrics".into(),
                score: 0,
            }]
        );
    }

    #[test]
    fn test_first_non_empty_strategy_wins() {
        // Card links exist, so the plain link further down is never collected.
        let html = r#"
<html><body>
  <a class="mini_card" href="/Band-first-song-lyrics">First Song by Band</a>
  <p><a href="https://genius.com/Band-second-song-lyrics">Band - Second Song</a></p>
</body></html>"#;
        let (strategy, found) = run(html).unwrap();
        assert_eq!(strategy, Strategy::CardLink);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].artist, "Band");
        assert_eq!(found[0].title, "First Song");
    }

    #[test]
    fn test_top_result_strategy() {
        let html = r#"
<html><body>
  <section>
    <div><div><span>Top Result</span></div></div>
    <div><a href="/Band-hit-song-lyrics">Band - Hit Song</a></div>
  </section>
</body></html>"#;
        let doc = Html::parse_document(html);
        let page = Url::parse(PAGE).unwrap();
        let ctx = DiscoveryContext {
            page_url: &page,
            lyrics_host: "genius.com",
            max_links: 10,
            ancestor_depth: 5,
        };
        let found = run_strategy(Strategy::TopResult, &doc, &ctx);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].artist, "Band");
        assert_eq!(found[0].title, "Hit Song");

        let shallow = DiscoveryContext {
            ancestor_depth: 1,
            ..ctx
        };
        assert!(run_strategy(Strategy::TopResult, &doc, &shallow).is_empty());

        // The whole cascade stops at the top result, before the any-link strategy.
        assert_eq!(run(html).unwrap().0, Strategy::TopResult);
    }

    #[test]
    fn test_any_matching_link_filters_host_and_paths() {
        let html = r#"
<html><body>
  <a href="https://example.org/some-other-song-lyrics">elsewhere</a>
  <a href="/artists/Band">Band</a>
  <a href="/users/some-user-name">user</a>
  <a href="https://genius.com/Band-real-song-lyrics">Real Song</a>
  <a href="https://genius.com/Band-real-song-lyrics">duplicate</a>
</body></html>"#;
        let (strategy, found) = run(html).unwrap();
        assert_eq!(strategy, Strategy::AnyMatchingLink);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://genius.com/Band-real-song-lyrics");
        assert_eq!(found[0].title, "Real Song");
    }

    #[test]
    fn test_any_matching_link_respects_cap() {
        let links: String = (0..20)
            .map(|i| format!(r#"<a href="/band-song-number-{i}-lyrics">s</a>"#))
            .collect();
        let (_, found) = run(&format!("<html><body>{links}</body></html>")).unwrap();
        assert_eq!(found.len(), 10);
        assert_eq!(found[0].url, "https://genius.com/band-song-number-0-lyrics");
    }

    #[test]
    fn test_result_item_strategy() {
        let html = r#"
<html><body>
  <div class="g"><a href="/url?q=https://www.azlyrics.com/lyrics/band/song.html&sa=U">Band - Song Lyrics | AZLyrics.com</a></div>
  <div class="g"><a href="/preferences">settings</a></div>
</body></html>"#;
        let (strategy, found) = run(html).unwrap();
        assert_eq!(strategy, Strategy::ResultItem);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://www.azlyrics.com/lyrics/band/song.html");
        assert_eq!(found[0].artist, "Band");
        assert_eq!(found[0].title, "Song");
    }

    #[test]
    fn test_nothing_found() {
        assert!(run("<html><body><a href='/about'>About</a></body></html>").is_none());
    }

    #[test]
    fn test_title_falls_back_to_slug() {
        assert_eq!(title_from_url("https://genius.com/Band-hit-song-lyrics"), "Band hit song");
    }

    #[test]
    fn test_blocked_detection() {
        let blocked = Html::parse_document(
            "<html><head><title>Just a moment...</title></head><body><p>Please complete the CAPTCHA to continue</p></body></html>",
        );
        assert!(is_blocked(&blocked, "Band Song"));

        let denied = Html::parse_document("<html><head><title>Access Denied</title></head><body></body></html>");
        assert!(is_blocked(&denied, "Band Song"));

        let normal = Html::parse_document(
            "<html><head><title>Search results</title></head><body><noscript>Please enable JavaScript</noscript><p>results</p></body></html>",
        );
        assert!(!is_blocked(&normal, "Band Song"));
    }

    #[test]
    fn test_blocked_markers_in_the_phrase_are_ignored() {
        let echo = Html::parse_document(
            "<html><head><title>Search results for Access Denied</title></head><body><h1>Results for \"Access Denied\"</h1></body></html>",
        );
        assert!(!is_blocked(&echo, "Some Band Access Denied"));
        assert!(is_blocked(&echo, "Some Band Other Song"));

        // Other markers still count.
        let captcha = Html::parse_document(
            "<html><head><title>Access Denied</title></head><body>Solve the captcha</body></html>",
        );
        assert!(is_blocked(&captcha, "Some Band Access Denied"));
    }
}
