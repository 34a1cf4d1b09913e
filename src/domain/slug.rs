//! Utilities for generating deterministic, URL-safe slugs.
//!
//! Slugs are lowercase ASCII words joined by single hyphens (`teak-care-101`).
//! Non-ASCII input is transliterated by the `slug` crate before filtering, so
//! "Crème Brûlée" becomes `creme-brulee`. Output is capped at
//! [`MAX_SLUG_LEN`] characters and never starts or ends with a hyphen.

use std::collections::HashMap;

use slug::slugify;
use thiserror::Error;

pub const MAX_SLUG_LEN: usize = 100;

/// Errors that can occur while generating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Derive a slug from the provided human-readable text.
pub fn generate_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = truncate_slug(&slugify(input), MAX_SLUG_LEN);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Returns `true` when `value` is already a well-formed slug.
pub fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_SLUG_LEN
        && !value.starts_with('-')
        && !value.ends_with('-')
        && !value.contains("--")
        && value
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

fn truncate_slug(slug: &str, max_len: usize) -> String {
    // slugify output is pure ASCII, so byte slicing is safe.
    let cut = if slug.len() > max_len {
        &slug[..max_len]
    } else {
        slug
    };
    cut.trim_matches('-').to_string()
}

/// Deterministically generate unique anchor slugs within a single document.
///
/// Headings processed in order will receive monotonic suffixes when duplicates
/// occur (e.g. `section`, `section-2`, `section-3`).
#[derive(Default, Debug)]
pub struct AnchorSlugger {
    occurrences: HashMap<String, usize>,
}

impl AnchorSlugger {
    pub fn new() -> Self {
        Self {
            occurrences: HashMap::new(),
        }
    }

    /// Generate a slug for the provided heading text, unique within this
    /// slugger. Headings that cannot produce a slug fall back to `section`.
    pub fn anchor_for(&mut self, heading: &str) -> String {
        let base = generate_slug(heading).unwrap_or_else(|_| "section".to_string());
        let count = self.occurrences.entry(base.clone()).or_insert(0);
        *count += 1;

        if *count == 1 {
            base
        } else {
            format!("{base}-{}", *count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_slug_lowercases_and_hyphenates() {
        assert_eq!(generate_slug("Teak Care 101").unwrap(), "teak-care-101");
        assert_eq!(generate_slug("Timber Tips").unwrap(), "timber-tips");
        assert_eq!(
            generate_slug("  Oak & Walnut: A Buyer's Guide!  ").unwrap(),
            "oak-walnut-a-buyer-s-guide"
        );
    }

    #[test]
    fn generate_slug_rejects_unrepresentable_input() {
        assert_eq!(generate_slug("   "), Err(SlugError::EmptyInput));
        assert!(matches!(
            generate_slug("!!!"),
            Err(SlugError::Unrepresentable { .. })
        ));
    }

    #[test]
    fn generate_slug_caps_length_without_trailing_hyphen() {
        let title = "decking board ".repeat(20);
        let slug = generate_slug(&title).unwrap();
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
        assert!(is_valid_slug(&slug));
    }

    #[test]
    fn generate_slug_is_idempotent_on_slugs() {
        for title in ["Teak Care 101", "Kiln-Dried Pine — Grades Explained", "2x4 studs"] {
            let slug = generate_slug(title).unwrap();
            assert_eq!(generate_slug(&slug).unwrap(), slug);
            assert!(is_valid_slug(&slug));
        }
    }

    #[test]
    fn is_valid_slug_rejects_malformed_values() {
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug("double--hyphen"));
        assert!(!is_valid_slug("Upper"));
        assert!(is_valid_slug("western-red-cedar"));
    }

    #[test]
    fn anchor_slugger_produces_unique_slugs() {
        let mut slugger = AnchorSlugger::new();

        assert_eq!(slugger.anchor_for("Overview"), "overview");
        assert_eq!(slugger.anchor_for("Overview"), "overview-2");
        assert_eq!(slugger.anchor_for("???"), "section");
    }
}
