//! Slug allocation and validation
//!
//! Projects and stacks are addressed by slug; output keys follow the same
//! character rules. A slug is derived from the human name only when none
//! was supplied, and an empty result is rejected rather than defaulted.

use crate::errors::{Result, WatsonError};
use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref SLUG_REGEX: Regex =
        Regex::new(r"^[-a-zA-Z0-9_]+$").expect("SLUG_REGEX should be a valid regex pattern");
}

/// Derive a lowercase, hyphenated, URL-safe slug from a name.
///
/// The name is NFKD-decomposed and anything left outside ASCII is dropped,
/// so `é` becomes `e` while letters with no decomposition disappear.
/// Characters other than alphanumerics, `_`, `-` and whitespace are then
/// dropped. Runs of whitespace and hyphens collapse into a single `-`, and
/// leading or trailing `-`/`_` are trimmed. The result may be empty.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.nfkd().filter(char::is_ascii) {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '-' || c.is_ascii_whitespace() {
            pending_separator = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Whether `value` is a non-empty string of `[-a-zA-Z0-9_]`
pub fn is_valid_slug(value: &str) -> bool {
    SLUG_REGEX.is_match(value)
}

/// Reject empty or malformed slugs (and output keys)
pub fn validate_slug(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(WatsonError::validation_field(
            format!("{} may not be blank", field),
            field,
        ));
    }

    if !is_valid_slug(value) {
        return Err(WatsonError::validation_field(
            format!(
                "{} '{}' may only contain letters, numbers, underscores or hyphens",
                field, value
            ),
            field,
        ));
    }

    Ok(())
}

/// Use the explicit slug when given, otherwise derive one from `name`
pub fn allocate_slug(name: &str, explicit: Option<&str>) -> Result<String> {
    let slug = match explicit {
        Some(slug) => slug.to_string(),
        None => slugify(name),
    };

    validate_slug("slug", &slug)?;
    Ok(slug)
}
