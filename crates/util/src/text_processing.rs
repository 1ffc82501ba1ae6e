//! # Text Processing Utilities
//!
//! Slug normalization used by derived fields, and HTML escaping for values
//! written into preview panes.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalize a single value into a URL-friendly slug.
///
/// The value is trimmed and lowercased, decomposed so diacritics can be
/// dropped, and reduced to ASCII `[a-z0-9]` words joined by `separator`. Runs
/// of whitespace, punctuation or symbols collapse into one separator; leading
/// and trailing separators are removed. Letters without a decomposition are
/// transliterated (`ß` becomes `ss`), every other character is dropped.
///
/// The result is stable under re-application.
///
/// # Example
/// ```rust
/// use fieldsync_util::slugify;
///
/// assert_eq!(slugify("  Hello, World! ", '-'), "hello-world");
/// assert_eq!(slugify("Straße", '-'), "strasse");
/// assert_eq!(slugify(&slugify("Crème Brûlée", '-'), '-'), "creme-brulee");
/// ```
pub fn slugify(input: &str, separator: char) -> String {
    let lowered = input.trim().to_lowercase();
    let mut slug = SlugBuilder::new(separator, lowered.len());

    for character in lowered.nfd() {
        if is_combining_mark(character) {
            continue;
        }
        if let Some(replacement) = transliterate(character) {
            slug.push_str(replacement);
        } else if character.is_ascii_lowercase() || character.is_ascii_digit() {
            slug.push(character);
        } else if character == separator || character.is_whitespace() || !character.is_alphanumeric() {
            slug.break_word();
        }
    }

    slug.finish()
}

/// Build the derived value of an ordered set of source values.
///
/// Empty values are skipped, the rest are slugified and joined with
/// `separator`. Values that normalize to nothing are skipped as well so the
/// output never contains doubled separators.
///
/// # Example
/// ```rust
/// use fieldsync_util::derive_slug;
///
/// assert_eq!(derive_slug(&["Ada", "Lovelace"], '-'), "ada-lovelace");
/// assert_eq!(derive_slug(&["Ada", ""], '-'), "ada");
/// assert_eq!(derive_slug::<&str>(&[], '-'), "");
/// ```
pub fn derive_slug<S: AsRef<str>>(values: &[S], separator: char) -> String {
    let joiner = separator.to_string();
    values
        .iter()
        .map(AsRef::as_ref)
        .filter(|value| !value.trim().is_empty())
        .map(|value| slugify(value, separator))
        .filter(|slug| !slug.is_empty())
        .collect::<Vec<_>>()
        .join(joiner.as_str())
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

struct SlugBuilder {
    output: String,
    separator: char,
    separator_pending: bool,
}

impl SlugBuilder {
    fn new(separator: char, capacity: usize) -> Self {
        Self {
            output: String::with_capacity(capacity),
            separator,
            separator_pending: false,
        }
    }

    fn push(&mut self, character: char) {
        if self.separator_pending && !self.output.is_empty() {
            self.output.push(self.separator);
        }
        self.separator_pending = false;
        self.output.push(character);
    }

    fn push_str(&mut self, text: &str) {
        text.chars().for_each(|character| self.push(character));
    }

    fn break_word(&mut self) {
        self.separator_pending = true;
    }

    fn finish(self) -> String {
        self.output
    }
}

/// Latin letters that have no canonical decomposition.
fn transliterate(character: char) -> Option<&'static str> {
    let replacement = match character {
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'ø' => "o",
        'đ' | 'ð' => "d",
        'þ' => "th",
        'ł' => "l",
        'ı' => "i",
        _ => return None,
    };
    Some(replacement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_whitespace_and_punctuation() {
        assert_eq!(slugify("Hello World", '-'), "hello-world");
        assert_eq!(slugify("C++ -- Rust_lang", '-'), "c-rust-lang");
        assert_eq!(slugify("  Élodie O'Brien  ", '-'), "elodie-o-brien");
        assert_eq!(slugify("Ñandú 2024!", '-'), "nandu-2024");
    }

    #[test]
    fn slugify_strips_diacritics_to_ascii() {
        assert_eq!(slugify("Straße", '-'), "strasse");
        assert_eq!(slugify("Łódź Ærø", '-'), "lodz-aero");
        assert!(slugify("Größe – Ωmega 日本", '-').is_ascii());
    }

    #[test]
    fn slugify_is_stable_under_reapplication() {
        for sample in ["Straße", "Hello   World", "--lead and trail--", "A.B.C", "déjà vu", "", "!!!"] {
            let once = slugify(sample, '-');
            assert_eq!(slugify(&once, '-'), once, "sample {sample:?}");
        }
    }

    #[test]
    fn slugify_honors_custom_separator() {
        assert_eq!(slugify("Scala IO 2024", '_'), "scala_io_2024");
        assert_eq!(slugify("a-b", '_'), "a_b");
    }

    #[test]
    fn derive_slug_skips_values_that_normalize_to_nothing() {
        assert_eq!(derive_slug(&["Ada", "!!!", "Lovelace"], '-'), "ada-lovelace");
        assert_eq!(derive_slug(&["", "  "], '-'), "");
    }

    #[test]
    fn escape_html_escapes_markup() {
        assert_eq!(escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#), "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
    }
}
