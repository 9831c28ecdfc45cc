//! Text normalization for display strings pulled out of the export.
//!
//! All lengths are counted in Unicode scalar values, never bytes. Target
//! field limits are expressed in characters, and the same truncated form is
//! used both to look records up and to create them.

use crate::error::{ImportError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static DIV_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<div[^>]*>").expect("valid regex"));
static DIV_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"</div>").expect("valid regex"));
static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"<br ?/?>").expect("valid regex"));
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("valid regex"));

/// Dash-like characters that slugs normalize to a plain hyphen.
const DASHES: &[char] = &[
    '-', '\u{2010}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}', '\u{2043}', '\u{2212}',
    '\u{00AD}',
];

/// Number of Unicode characters in `s`.
#[must_use]
pub fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// First `n` characters of `s`.
#[must_use]
pub fn left(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Last `n` characters of `s`.
#[must_use]
pub fn right(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

/// Shorten `s` to at most `limit` characters by cutting out the middle and
/// joining the kept prefix and suffix with `ellipsis`.
///
/// Strings that already fit are returned unchanged. Otherwise the prefix gets
/// `ceil(limit/2) - floor(|ellipsis|/2)` characters and the suffix gets
/// `floor(limit/2) - ceil(|ellipsis|/2)`, so the result is exactly `limit`
/// characters long.
///
/// # Errors
///
/// Returns [`ImportError::InvalidArgument`] when `s` must be shortened but
/// `limit` cannot even hold the ellipsis.
pub fn center_truncate(s: &str, limit: usize, ellipsis: &str) -> Result<String> {
    let size = char_count(s);
    if size <= limit {
        return Ok(s.to_string());
    }

    let ellipsis_size = char_count(ellipsis);
    if limit < ellipsis_size {
        return Err(ImportError::InvalidArgument(format!(
            "truncation limit {limit} is shorter than ellipsis {ellipsis:?}"
        )));
    }

    let mut head = limit.div_ceil(2) - ellipsis_size / 2;
    let tail = match (limit / 2).checked_sub(ellipsis_size.div_ceil(2)) {
        Some(tail) => tail,
        None => {
            // Odd ellipsis with a tiny limit: the suffix would be negative, so
            // the prefix absorbs the deficit.
            head = limit - ellipsis_size;
            0
        }
    };

    Ok(format!("{}{}{}", left(s, head), ellipsis, right(s, tail)))
}

/// Strip double quotes, double the backslash in escape-like tokens that break
/// downstream quoting (`\C`, `\M`, `s\x`), and trim surrounding whitespace.
#[must_use]
pub fn cleanse_quotes(s: &str) -> String {
    s.replace('"', "")
        .replace("\\C", "\\\\C")
        .replace("\\M", "\\\\M")
        .replace("s\\x", "s\\\\x")
        .trim()
        .to_string()
}

/// Decode the basic HTML entities, drop `<div>` wrappers, and turn block
/// breaks into newlines.
///
/// Entities are decoded first, so an encoded `&lt;br&gt;` also becomes a line
/// break.
#[must_use]
pub fn cleanse_html(s: &str) -> String {
    let decoded = s
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    let without_open = DIV_OPEN.replace_all(&decoded, "");
    let with_breaks = DIV_CLOSE.replace_all(&without_open, "\n");
    let with_breaks = LINE_BREAK.replace_all(&with_breaks, "\n");
    with_breaks.trim().to_string()
}

/// URL-safe identifier derived from a display name.
#[must_use]
pub fn to_slug(s: &str) -> String {
    let lowered: String = s
        .chars()
        .map(|c| if DASHES.contains(&c) { '-' } else { c })
        .flat_map(char::to_lowercase)
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' ' {
                c
            } else {
                ' '
            }
        })
        .collect();
    SPACE_RUN.replace_all(lowered.trim(), "-").into_owned()
}
