//! Internal helpers for name normalization.
//!
//! These utilities are **not** part of the public API. They centralize the
//! rules that make category lookups accent- and case-insensitive so every
//! write path produces the same `name_norm` for the same display name.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Canonical display form: trimmed, inner whitespace collapsed to one space.
/// Returns `None` when nothing is left.
pub(crate) fn normalize_category_display(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut out = String::new();
    for token in trimmed.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    if out.is_empty() { None } else { Some(out) }
}

/// Accent-insensitive, case-insensitive lookup key: NFKD-decomposed,
/// combining marks stripped, lowercased, non-alphanumeric runs collapsed to
/// one space.
pub(crate) fn normalize_category_key(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut out = String::new();
    let mut prev_space = false;
    for ch in trimmed.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    let normalized = out.trim();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_collapses_whitespace() {
        assert_eq!(
            normalize_category_display("  Other   income ").as_deref(),
            Some("Other income")
        );
        assert_eq!(normalize_category_display("   "), None);
    }

    #[test]
    fn key_folds_accents_and_case() {
        assert_eq!(
            normalize_category_key("Alimentación").as_deref(),
            Some("alimentacion")
        );
        assert_eq!(
            normalize_category_key(" Transfer  SENT ").as_deref(),
            Some("transfer sent")
        );
        assert_eq!(normalize_category_key("!!!"), None);
    }
}
