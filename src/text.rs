//! Text sanitization for feed content.
//!
//! Feed titles and summaries arrive as tag soup: CDATA wrappers, embedded
//! HTML, character entities, and arbitrary whitespace. [`clean`] reduces all
//! of that to plain single-spaced text. The helpers compose idempotently and
//! never fail; malformed input degrades to an empty or partial string.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Maximum slug length in characters, before the date prefix.
const SLUG_MAX_CHARS: usize = 80;

static CDATA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static CHAR_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#(x?[0-9a-fA-F]+);").unwrap());

/// Remove CDATA wrapper markers, preserving the wrapped text.
pub fn strip_cdata(text: &str) -> String {
    CDATA_RE.replace_all(text, "$1").into_owned()
}

/// Replace every markup tag with a single space.
///
/// A space, not nothing: `word<br>word` must not collapse into one word.
pub fn strip_tags(text: &str) -> String {
    TAG_RE.replace_all(text, " ").into_owned()
}

/// Decode the common named entities plus numeric/hex character references.
///
/// A reference whose number fails to parse (or names no valid scalar) is
/// left untouched.
pub fn decode_entities(text: &str) -> String {
    let basic = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ");

    CHAR_REF_RE
        .replace_all(&basic, |caps: &Captures| {
            let raw = &caps[1];
            let (digits, radix) = match raw.strip_prefix('x') {
                Some(hex) => (hex, 16),
                None => (raw, 10),
            };
            match u32::from_str_radix(digits, radix).ok().and_then(char::from_u32) {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Collapse all whitespace runs (newlines and tabs included) to single
/// spaces and trim the ends.
pub fn compact_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduce raw feed text to clean single-spaced plain text.
pub fn clean(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    compact_whitespace(&decode_entities(&strip_tags(&strip_cdata(raw))))
}

/// Truncate `text` to at most `max_len` characters, replacing the tail with
/// a single ellipsis character when it was longer. Operates on `char`
/// boundaries.
pub fn shorten(text: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_len - 1).collect();
    out.push('…');
    out
}

/// Derive a URL-safe slug fragment from a title.
///
/// Lowercases, drops everything but ASCII word characters, hyphens and
/// whitespace (diacritics and other non-ASCII go with it), turns whitespace
/// runs into single hyphens, collapses hyphen runs, and caps the length.
/// May return an empty string; callers supply their own fallback.
pub fn slugify(value: &str) -> String {
    let kept: String = value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();
    let hyphenated = kept.split_whitespace().collect::<Vec<_>>().join("-");
    let collapsed = hyphenated
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    collapsed
        .chars()
        .take(SLUG_MAX_CHARS)
        .collect::<String>()
        .trim_end_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_markup_and_cdata() {
        let raw = "<![CDATA[<p>Hello <b>world</b></p>]]>";
        assert_eq!(clean(raw), "Hello world");
    }

    #[test]
    fn clean_output_has_no_markup_or_whitespace_runs() {
        let messy = "<div>a\n\n  b\t<span>c</span>   d</div>";
        let cleaned = clean(messy);
        assert_eq!(cleaned, "a b c d");
        assert!(!cleaned.contains('<'));
        assert!(!cleaned.contains('>'));
        assert!(!cleaned.chars().collect::<Vec<_>>().windows(2).any(|w| {
            w[0].is_whitespace() && w[1].is_whitespace()
        }));
    }

    #[test]
    fn clean_decodes_entities_after_stripping_markup() {
        // an escaped tag is data, not markup; it survives as literal text
        assert_eq!(clean("<p>&lt;tag&gt; here</p>"), "<tag> here");
    }

    #[test]
    fn clean_keeps_tag_boundaries_as_word_breaks() {
        assert_eq!(clean("word<br>another"), "word another");
    }

    #[test]
    fn decode_entities_handles_named_and_numeric_references() {
        assert_eq!(decode_entities("Fish &amp; Chips"), "Fish & Chips");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("caf&#233;"), "café");
        assert_eq!(decode_entities("it&#39;s"), "it's");
    }

    #[test]
    fn decode_entities_leaves_unparseable_references_untouched() {
        // overflows u32
        assert_eq!(decode_entities("&#99999999999;"), "&#99999999999;");
        // surrogate range is not a valid scalar
        assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
        // not a numeric reference at all
        assert_eq!(decode_entities("&#xZZ;"), "&#xZZ;");
    }

    #[test]
    fn shorten_returns_input_when_short_enough() {
        assert_eq!(shorten("short", 10), "short");
        assert_eq!(shorten("exact", 5), "exact");
    }

    #[test]
    fn shorten_caps_length_and_appends_ellipsis() {
        let out = shorten("abcdefghij", 5);
        assert_eq!(out, "abcd…");
        assert_eq!(out.chars().count(), 5);
    }

    #[test]
    fn shorten_respects_char_boundaries() {
        let out = shorten("日本語のテキストです", 5);
        assert_eq!(out.chars().count(), 5);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn shorten_length_property() {
        for n in 1..12 {
            let out = shorten("some longer text here", n);
            assert!(out.chars().count() <= n);
            assert_eq!(out.ends_with('…'), "some longer text here".chars().count() > n);
        }
    }

    #[test]
    fn slugify_basic_titles() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Bitcoin ETF: What's Next?"), "bitcoin-etf-whats-next");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
    }

    #[test]
    fn slugify_collapses_hyphen_runs_and_trims() {
        assert_eq!(slugify("a -- b - c"), "a-b-c");
        assert_eq!(slugify("--leading and trailing--"), "leading-and-trailing");
    }

    #[test]
    fn slugify_drops_non_ascii_and_can_return_empty() {
        assert_eq!(slugify("比特币"), "");
        assert_eq!(slugify("naïve café"), "nave-caf");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slugify_caps_length() {
        let long = "word ".repeat(40);
        assert!(slugify(&long).chars().count() <= 80);
        assert!(!slugify(&long).ends_with('-'));
    }

    #[test]
    fn clean_is_idempotent() {
        let raw = "<p>Some &amp; text\n with <i>markup</i></p>";
        let once = clean(raw);
        assert_eq!(clean(&once), once);
    }
}
