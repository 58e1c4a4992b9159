//! Relevance scoring for search candidates

use super::discovery::SearchCandidate;
use super::query::Query;
use std::collections::BTreeSet;

const EXACT_MATCH: i32 = 50;
const CANDIDATE_CONTAINS_QUERY: i32 = 30;
const QUERY_CONTAINS_CANDIDATE: i32 = 20;
const SHARED_TOKEN: i32 = 5;
const UNWANTED_PENALTY: i32 = -50;

/// Uploads that carry someone else's text under the song's name.
const DENYLIST: [&str; 6] = [
    "genius english translations",
    "genius romanizations",
    "genius traducciones",
    "genius traduções",
    "english translation",
    "romanized",
];

const UNWANTED: [&str; 2] = ["karaoke", "instrumental"];

/// Score one candidate against the query. Never negative.
pub fn score(query: &Query, candidate: &SearchCandidate) -> i32 {
    let artist = candidate.artist.to_lowercase();
    let title = candidate.title.to_lowercase();

    if DENYLIST
        .iter()
        .any(|d| artist.contains(d) || title.contains(d))
    {
        // No amount of overlap outweighs a denylist hit.
        return 0;
    }

    let q_artist = query.artist.to_lowercase();
    let q_title = query.title.to_lowercase();
    let mut total = 0;

    if q_artist.is_empty() {
        // Title-only query: the label may hold artist words too.
        total += field_match(&q_title, &title);
        total += shared_tokens(&q_title, &format!("{artist} {title}")) * SHARED_TOKEN;
    } else {
        total += field_match(&q_artist, &artist);
        total += field_match(&q_title, &title);
        total += shared_tokens(&q_artist, &artist) * SHARED_TOKEN;
        total += shared_tokens(&q_title, &title) * SHARED_TOKEN;
    }

    if UNWANTED
        .iter()
        .any(|m| (artist.contains(m) || title.contains(m)) && !q_title.contains(m))
    {
        total += UNWANTED_PENALTY;
    }

    total.max(0)
}

/// Score every candidate and sort by descending score, keeping discovery
/// order among equal scores.
pub fn rank(query: &Query, mut candidates: Vec<SearchCandidate>) -> Vec<SearchCandidate> {
    for c in &mut candidates {
        c.score = score(query, c);
    }
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates
}

fn field_match(query: &str, candidate: &str) -> i32 {
    if query.is_empty() || candidate.is_empty() {
        0
    } else if query == candidate {
        EXACT_MATCH
    } else if candidate.contains(query) {
        CANDIDATE_CONTAINS_QUERY
    } else if query.contains(candidate) {
        QUERY_CONTAINS_CANDIDATE
    } else {
        0
    }
}

fn shared_tokens(a: &str, b: &str) -> i32 {
    let left = tokens(a);
    let right = tokens(b);
    left.intersection(&right).count() as i32
}

fn tokens(s: &str) -> BTreeSet<&str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(artist: &str, title: &str) -> SearchCandidate {
        SearchCandidate {
            artist: artist.to_string(),
            title: title.to_string(),
            url: format!("https://genius.com/{}-{}-lyrics", artist, title).replace(' ', "-"),
            score: 0,
        }
    }

    #[test]
    fn test_exact_match() {
        let q = Query::parse("Queen - Bohemian Rhapsody");
        // 50 + 50 + tokens(queen) 5 + tokens(bohemian, rhapsody) 10
        assert_eq!(score(&q, &cand("QUEEN", "bohemian rhapsody")), 115);
    }

    #[test]
    fn test_containment_bonuses() {
        let q = Query::parse("Obscure Artist - B-Side Cut");
        // artist exact 50, title contained 30, tokens 2*5 + 2*5
        assert_eq!(score(&q, &cand("Obscure Artist", "B-Side Cut Demo")), 100);
        // reversed containment: candidate title inside the query title
        assert_eq!(score(&q, &cand("Obscure Artist", "Cut")), 50 + 20 + 10 + 5);
    }

    #[test]
    fn test_exact_beats_partial() {
        let q = Query::parse("Queen - Bohemian Rhapsody");
        let exact = score(&q, &cand("Queen", "Bohemian Rhapsody"));
        let partial = score(&q, &cand("Queen Tribute Band", "Rhapsody in Blue"));
        assert!(exact > partial, "{exact} <= {partial}");
    }

    #[test]
    fn test_denylist_always_zero() {
        let q = Query::parse("Queen - Bohemian Rhapsody");
        assert_eq!(
            score(&q, &cand("Genius English Translations", "Queen - Bohemian Rhapsody")),
            0
        );
        assert_eq!(
            score(&q, &cand("Queen", "Bohemian Rhapsody (English Translation)")),
            0
        );
    }

    #[test]
    fn test_unwanted_marker_penalty() {
        let q = Query::parse("Queen - Bohemian Rhapsody");
        assert_eq!(score(&q, &cand("Queen", "Bohemian Rhapsody Karaoke")), 115 - 20 - 50);
        // Asking for the karaoke version is not penalized.
        let k = Query::parse("Queen - Bohemian Rhapsody Karaoke");
        assert_eq!(score(&k, &cand("Queen", "Bohemian Rhapsody Karaoke")), 120);
    }

    #[test]
    fn test_floor_at_zero() {
        let q = Query::parse("Queen - Bohemian Rhapsody");
        assert_eq!(score(&q, &cand("Nobody", "Instrumental Jam")), 0);
    }

    #[test]
    fn test_title_only_query_uses_artist_tokens() {
        let q = Query::parse("Queen Bohemian Rhapsody");
        // the query title contains the candidate title; shared tokens queen, bohemian, rhapsody
        assert_eq!(score(&q, &cand("Queen", "Bohemian Rhapsody")), 20 + 15);
    }

    #[test]
    fn test_rank_is_stable() {
        let q = Query::parse("Band - Song");
        let ranked = rank(
            &q,
            vec![
                cand("Other", "Thing"),
                cand("Band", "Song"),
                cand("Someone", "Else"),
                cand("Band", "Song Live"),
            ],
        );
        let order: Vec<_> = ranked.iter().map(|c| (c.artist.as_str(), c.score)).collect();
        assert_eq!(
            order,
            vec![("Band", 110), ("Band", 90), ("Other", 0), ("Someone", 0)]
        );
        assert_eq!(ranked[1].title, "Song Live");
    }
}
