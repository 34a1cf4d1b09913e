//! Declarative record validation.
//!
//! A [`Validator`] accumulates human-readable violations in the order checks
//! are declared; [`Validator::finish`] turns them into a [`Violations`] error
//! when at least one check failed. Validation never mutates its input.

mod schemas;

use std::fmt;

use url::Url;

pub use schemas::{
    MAX_MEDIA_BYTES, MEDIA_MIME_TYPES, validate_seo_block, validate_template_variables,
};

/// Non-empty ordered list of violation messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn single(message: impl Into<String>) -> Self {
        Self(vec![message.into()])
    }

    pub fn from_messages(messages: Vec<String>) -> Self {
        Self(messages)
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn into_messages(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("; "))
    }
}

impl std::error::Error for Violations {}

/// Records that can be checked before persistence.
pub trait Validate {
    fn validate(&self) -> Result<(), Violations>;
}

#[derive(Debug, Default)]
pub struct Validator {
    messages: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.messages.push(format!("{field}: is required"));
        }
        self
    }

    /// Character length within `min..=max`; an empty value only reports
    /// `is required`.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if len == 0 && min > 0 {
            self.messages.push(format!("{field}: is required"));
        } else if len < min || len > max {
            self.messages
                .push(format!("{field}: must be between {min} and {max} characters"));
        }
        self
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.chars().count() > max {
            self.messages
                .push(format!("{field}: must be at most {max} characters"));
        }
        self
    }

    pub fn matches(
        &mut self,
        field: &str,
        value: &str,
        predicate: impl Fn(&str) -> bool,
        expectation: &str,
    ) -> &mut Self {
        if !predicate(value) {
            self.messages.push(format!("{field}: {expectation}"));
        }
        self
    }

    pub fn range<N>(&mut self, field: &str, value: N, min: N, max: N) -> &mut Self
    where
        N: PartialOrd + fmt::Display + Copy,
    {
        if value < min || value > max {
            self.messages
                .push(format!("{field}: must be between {min} and {max}"));
        }
        self
    }

    pub fn check(&mut self, condition: bool, message: impl Into<String>) -> &mut Self {
        if !condition {
            self.messages.push(message.into());
        }
        self
    }

    /// Merge violations from a nested record under `prefix`.
    pub fn nested(&mut self, prefix: &str, result: Result<(), Violations>) -> &mut Self {
        if let Err(violations) = result {
            self.messages.extend(
                violations
                    .into_messages()
                    .into_iter()
                    .map(|message| format!("{prefix}.{message}")),
            );
        }
        self
    }

    /// Merge violations from a helper that already names its fields.
    pub fn merge(&mut self, result: Result<(), Violations>) -> &mut Self {
        if let Err(violations) = result {
            self.messages.extend(violations.into_messages());
        }
        self
    }

    pub fn is_clean(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn finish(self) -> Result<(), Violations> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(Violations(self.messages))
        }
    }
}

/// `100 - 20 * errors - 5 * warnings`, floored at zero.
pub fn quality_score(errors: usize, warnings: usize) -> u8 {
    let penalty = errors.saturating_mul(20).saturating_add(warnings.saturating_mul(5));
    u8::try_from(100usize.saturating_sub(penalty)).unwrap_or(0)
}

pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !local.contains(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains(char::is_whitespace)
        && !domain.contains('@')
}

/// Digits with optional leading `+` and space, dash, or parenthesis separators;
/// 8 to 15 digits overall.
pub fn is_phone(value: &str) -> bool {
    let trimmed = value.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits = body.chars().filter(char::is_ascii_digit).count();
    (8..=15).contains(&digits)
        && body
            .chars()
            .all(|ch| ch.is_ascii_digit() || matches!(ch, ' ' | '-' | '(' | ')'))
}

/// `#rgb` or `#rrggbb`.
pub fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|ch| ch.is_ascii_hexdigit()))
}

pub fn is_absolute_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

/// Site-relative path or absolute http(s) URL.
pub fn is_link_target(value: &str) -> bool {
    value.starts_with('/') || is_absolute_url(value)
}

/// `major.minor.patch` with numeric components.
pub fn is_semver(value: &str) -> bool {
    let parts: Vec<_> = value.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|ch| ch.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_keeps_declaration_order() {
        let mut validator = Validator::new();
        validator
            .required("title", "")
            .length("summary", "ok", 10, 500)
            .range("quantity", 0, 1, 10);

        let violations = validator.finish().unwrap_err();
        assert_eq!(
            violations.messages(),
            &[
                "title: is required",
                "summary: must be between 10 and 500 characters",
                "quantity: must be between 1 and 10",
            ]
        );
    }

    #[test]
    fn nested_prefixes_messages() {
        let mut inner = Validator::new();
        inner.required("grade", " ");
        let mut outer = Validator::new();
        outer.nested("specifications", inner.finish());
        assert_eq!(
            outer.finish().unwrap_err().messages(),
            &["specifications.grade: is required"]
        );
    }

    #[test]
    fn quality_score_floors_at_zero() {
        assert_eq!(quality_score(0, 0), 100);
        assert_eq!(quality_score(1, 2), 70);
        assert_eq!(quality_score(6, 0), 0);
    }

    #[test]
    fn format_predicates() {
        assert!(is_email("sales@timberyard.com.au"));
        assert!(!is_email("sales@localhost"));
        assert!(!is_email("no-at-sign.com"));

        assert!(is_phone("+61 2 9876 5432"));
        assert!(is_phone("(02) 9876-5432"));
        assert!(!is_phone("12345"));
        assert!(!is_phone("call me"));

        assert!(is_hex_color("#8B5E3C"));
        assert!(is_hex_color("#abc"));
        assert!(!is_hex_color("8B5E3C"));

        assert!(is_link_target("/decking"));
        assert!(is_link_target("https://example.com/oak"));
        assert!(!is_link_target("decking"));
        assert!(!is_absolute_url("ftp://example.com"));

        assert!(is_semver("1.4.0"));
        assert!(!is_semver("1.4"));
        assert!(!is_semver("v1.4.0"));
    }
}
