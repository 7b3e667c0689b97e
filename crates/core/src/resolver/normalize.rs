//! Name normalization, variation generation and string similarity.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::HashSet;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w_()'\-]").unwrap());
static SERIES_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]+)\)$").unwrap());

/// Canonical form of a character or series name: lowercase, trimmed,
/// whitespace runs collapsed to a single underscore, everything outside
/// `[word, underscore, parentheses, apostrophe, hyphen]` stripped.
pub fn normalize(name: &str) -> String {
    let lowered = name.to_lowercase();
    let collapsed = WHITESPACE.replace_all(lowered.trim(), "_");
    DISALLOWED.replace_all(&collapsed, "").into_owned()
}

/// Cache key for a `(character, series)` pair, shared by the image and tag
/// stores.
pub fn cache_key(character: &str, series: Option<&str>) -> String {
    format!(
        "{}:{}",
        normalize(character),
        normalize(series.unwrap_or("none"))
    )
}

/// Candidate tag forms for probing a source's tag index, highest-value
/// first. Duplicates are dropped while preserving first-seen order.
pub fn generate_variations(character: &str, series: Option<&str>) -> Vec<String> {
    let base = normalize(character);
    let parts: Vec<&str> = base.split('_').filter(|p| !p.is_empty()).collect();
    let series_norm = series.map(normalize).filter(|s| !s.is_empty());

    let mut variations = Vec::new();

    // first_token_(series) is the dominant booru convention.
    if let (Some(series), Some(first)) = (&series_norm, parts.first()) {
        push_unique(&mut variations, format!("{first}_({series})"));
    }
    if let Some(first) = parts.first() {
        push_unique(&mut variations, (*first).to_string());
    }
    if let Some(series) = &series_norm {
        push_unique(&mut variations, format!("{base}_({series})"));
    }
    push_unique(&mut variations, base.clone());
    if parts.len() > 1 {
        push_unique(&mut variations, format!("{}_{}", parts[0], parts[1]));
        push_unique(&mut variations, parts[1].to_string());
    }

    variations
}

fn push_unique(variations: &mut Vec<String>, candidate: String) {
    if !candidate.is_empty() && !variations.iter().any(|v| v == &candidate) {
        variations.push(candidate);
    }
}

/// Similarity between two strings in `[0, 1]`: exact match 1.0, substring
/// containment either direction 0.8, otherwise Jaccard overlap of their
/// character sets. Case-insensitive.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        return 1.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return 0.8;
    }

    let set_a: HashSet<char> = a.chars().collect();
    let set_b: HashSet<char> = b.chars().collect();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f64 / union as f64
}

/// The content of a trailing parenthesized suffix, e.g.
/// `anya_(spy_x_family)` -> `spy_x_family`.
pub fn series_suffix(tag: &str) -> Option<&str> {
    SERIES_SUFFIX
        .captures(tag)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// A tag with its trailing parenthesized suffix (and any separator
/// underscore) removed.
pub fn strip_series_suffix(tag: &str) -> String {
    let stripped = SERIES_SUFFIX.replace(tag, "");
    stripped
        .strip_suffix('_')
        .unwrap_or(&stripped)
        .to_string()
}
