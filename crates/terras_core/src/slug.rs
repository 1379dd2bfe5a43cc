//! URL-safe slug derivation and collision suffixing.
//!
//! # Responsibility
//! - Turn display names into lowercase, hyphenated ASCII slugs.
//! - Mint a unique slug by probing `base`, `base-1`, `base-2`, ...
//!
//! # Invariants
//! - Derivation is deterministic and free of side effects.
//! - `base_slug` never returns an empty string.
//! - The unmodified base is always tried first.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Used when a name has no ASCII-representable characters at all.
pub const FALLBACK_SLUG: &str = "untitled";

static DISALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid disallowed-char regex"));
static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-\s]+").expect("valid separator regex"));

/// Converts a display name into a slug.
///
/// Accents are decomposed and dropped (`Apurinã` -> `apurina`), anything
/// other than ASCII word characters, whitespace and hyphens is removed, and
/// runs of whitespace/hyphens collapse into one hyphen. May return an empty
/// string; see [`base_slug`].
pub fn slugify(value: &str) -> String {
    let ascii: String = value.nfkd().filter(char::is_ascii).collect();
    let lowered = ascii.to_lowercase();
    let stripped = DISALLOWED_RE.replace_all(&lowered, "");
    let hyphenated = SEPARATOR_RE.replace_all(stripped.trim(), "-");
    hyphenated.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Slug of `name`, or [`FALLBACK_SLUG`] when the name slugifies to nothing.
pub fn base_slug(name: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Returns the first slug in `base`, `base-1`, `base-2`, ... for which
/// `is_taken` answers `false`.
///
/// `is_taken` is expected to ignore the entity the slug is minted for, so
/// re-saving an entity keeps its own slug.
///
/// # Errors
/// - Propagates the first error returned by `is_taken`.
pub fn unique_slug<E>(
    base: &str,
    mut is_taken: impl FnMut(&str) -> Result<bool, E>,
) -> Result<String, E> {
    if !is_taken(base)? {
        return Ok(base.to_string());
    }

    let mut counter: u64 = 1;
    loop {
        let candidate = format!("{base}-{counter}");
        if !is_taken(&candidate)? {
            return Ok(candidate);
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{base_slug, slugify, unique_slug, FALLBACK_SLUG};
    use std::collections::HashSet;
    use std::convert::Infallible;

    #[test]
    fn slugify_strips_accents_and_punctuation() {
        assert_eq!(slugify("Apurinã"), "apurina");
        assert_eq!(slugify("Kaiowá / Guarani-Ñandeva"), "kaiowa-guarani-nandeva");
        assert_eq!(slugify("  Fonte   Boa  "), "fonte-boa");
        assert_eq!(slugify("Hupd'äh"), "hupdah");
    }

    #[test]
    fn slugify_trims_leading_and_trailing_separators() {
        assert_eq!(slugify("--Kokama__"), "kokama");
        assert_eq!(slugify("_-_"), "");
    }

    #[test]
    fn base_slug_falls_back_when_nothing_survives() {
        assert_eq!(base_slug("???"), FALLBACK_SLUG);
        assert_eq!(base_slug("Yanomami"), "yanomami");
    }

    #[test]
    fn unique_slug_tries_base_first() {
        let slug = unique_slug("kokama", |_| Ok::<_, Infallible>(false)).unwrap();
        assert_eq!(slug, "kokama");
    }

    #[test]
    fn unique_slug_increments_suffix_until_free() {
        let taken: HashSet<&str> = ["kokama", "kokama-1", "kokama-2"].into_iter().collect();
        let mut tried = Vec::new();
        let slug = unique_slug("kokama", |candidate| {
            tried.push(candidate.to_string());
            Ok::<_, Infallible>(taken.contains(candidate))
        })
        .unwrap();

        assert_eq!(slug, "kokama-3");
        assert_eq!(tried, vec!["kokama", "kokama-1", "kokama-2", "kokama-3"]);
    }

    #[test]
    fn unique_slug_propagates_lookup_errors() {
        let err = unique_slug("kokama", |_| Err::<bool, _>("db down")).unwrap_err();
        assert_eq!(err, "db down");
    }
}
