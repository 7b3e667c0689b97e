//! Candidate tag scoring.
//!
//! Ranks a source's tag-search hits against the requested character and
//! series. Three additive components: a series-suffix bonus, a name-match
//! bonus and a popularity bonus derived from the tag's post count. Within
//! the series and name components only the single best-matching tier is
//! awarded.

use super::normalize::{normalize, series_suffix, similarity, strip_series_suffix};

/// An ephemeral scoring record; discarded once the top candidate per source
/// is chosen.
#[derive(Debug, Clone)]
pub struct TagCandidate {
    pub name: String,
    pub post_count: u64,
    pub score: i64,
}

/// Score one candidate tag name. Deterministic for a given
/// `(tag, character, series, post_count)` tuple.
pub fn score_tag(tag: &str, character: &str, series: Option<&str>, post_count: u64) -> i64 {
    let char_norm = normalize(character);
    let char_first = char_norm.split('_').next().unwrap_or("");
    let tag_base = strip_series_suffix(tag);
    let tag_first = tag_base.split('_').next().unwrap_or("");

    let mut score = 0i64;

    // Series match dominates: a tag carrying the right parenthesized suffix
    // is almost always the canonical character tag.
    if let Some(series) = series {
        let series_norm = normalize(series);
        if let Some(tag_series) = series_suffix(tag) {
            if similarity(&series_norm, tag_series) >= 0.8 {
                score += if tag_first == char_first {
                    2000
                } else if tag_base == char_norm {
                    1500
                } else {
                    1000
                };
            }
        }
    }

    let char_sim = similarity(&tag_base, &char_norm);
    let first_sim = similarity(tag_first, char_first);

    score += if char_sim >= 0.9 {
        800
    } else if char_sim >= 0.7 {
        500
    } else if first_sim >= 0.9 {
        600
    } else if first_sim >= 0.7 {
        400
    } else {
        0
    };

    score += match post_count {
        c if c > 5000 => 150,
        c if c > 2000 => 100,
        c if c > 1000 => 75,
        c if c > 500 => 50,
        c if c > 100 => 25,
        _ => 0,
    };

    score
}
