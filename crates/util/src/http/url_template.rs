//! Request URL construction from trigger values.
//!
//! Endpoint URLs come from page attributes and settings and carry a
//! placeholder that is replaced by the current value of a trigger field.
//! Attribute values are often already URL-encoded by the page, so the
//! percent-encoded form of a placeholder is recognized as well.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::{NoExpand, Regex};

/// Everything except RFC3986 unreserved bytes (`A-Z a-z 0-9 - . _ ~`).
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encodes a value for use as a path segment or query component.
///
/// # Example
/// ```rust
/// use fieldsync_util::encode_component;
///
/// assert_eq!(encode_component("team/app name"), "team%2Fapp%20name");
/// assert_eq!(encode_component("srv-d5f6.a_b~"), "srv-d5f6.a_b~");
/// ```
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Replaces every occurrence of `placeholder` in `template` with the encoded `value`.
///
/// Both the literal placeholder (`{{input}}`) and its percent-encoded form
/// (`%7B%7Binput%7D%7D`, hex digits in either case) are replaced. A template
/// without the placeholder is returned unchanged.
///
/// # Example
/// ```rust
/// use fieldsync_util::expand_placeholder;
///
/// let url = expand_placeholder("/ui/check/%7B%7Binput%7D%7D/exists", "{{input}}", "my slug");
/// assert_eq!(url, "/ui/check/my%20slug/exists");
/// ```
pub fn expand_placeholder(template: &str, placeholder: &str, value: &str) -> String {
    if placeholder.is_empty() {
        return template.to_string();
    }
    let encoded_value = encode_component(value);
    let encoded_placeholder = encode_component(placeholder);
    if encoded_placeholder == placeholder {
        return template.replace(placeholder, &encoded_value);
    }

    // Single pass so an encoded value is never matched again.
    let pattern = format!("{}|(?i:{})", regex::escape(placeholder), regex::escape(&encoded_placeholder));
    match Regex::new(&pattern) {
        Ok(pattern) => pattern.replace_all(template, NoExpand(&encoded_value)).into_owned(),
        Err(_) => template.replace(placeholder, &encoded_value),
    }
}

/// Appends one encoded path segment to a base path.
pub fn append_path_segment(base: &str, segment: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), encode_component(segment))
}

/// Appends `key=value` pairs with non-empty values as a query string.
///
/// # Example
/// ```rust
/// use fieldsync_util::with_query;
///
/// let url = with_query("/ui/cfps/duplicates", &[("cfpName", "Scala IO"), ("cfpUrl", "")]);
/// assert_eq!(url, "/ui/cfps/duplicates?cfpName=Scala%20IO");
/// assert_eq!(with_query::<&str, &str>("/embed", &[]), "/embed");
/// ```
pub fn with_query<K: AsRef<str>, V: AsRef<str>>(base: &str, pairs: &[(K, V)]) -> String {
    let query = pairs
        .iter()
        .filter(|(_, value)| !value.as_ref().is_empty())
        .map(|(key, value)| format!("{}={}", encode_component(key.as_ref()), encode_component(value.as_ref())))
        .collect::<Vec<_>>()
        .join("&");

    if query.is_empty() {
        return base.to_string();
    }
    let joiner = if base.contains('?') { '&' } else { '?' };
    format!("{base}{joiner}{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_placeholder_replaces_literal_and_encoded_forms() {
        let literal = expand_placeholder("/ui/groups/{{input}}/available", "{{input}}", "scala/io");
        assert_eq!(literal, "/ui/groups/scala%2Fio/available");

        let lowercase_hex = expand_placeholder("/check?slug=%7b%7binput%7d%7d", "{{input}}", "a&b");
        assert_eq!(lowercase_hex, "/check?slug=a%26b");
    }

    #[test]
    fn expand_placeholder_does_not_interpret_replacement_syntax() {
        let url = expand_placeholder("/check/%7B%7Binput%7D%7D", "{{input}}", "$1");
        assert_eq!(url, "/check/%241");
    }

    #[test]
    fn expand_placeholder_does_not_rescan_encoded_values() {
        let url = expand_placeholder("/check/{{input}}", "{{input}}", "{{input}}");
        assert_eq!(url, "/check/%7B%7Binput%7D%7D");
    }

    #[test]
    fn expand_placeholder_keeps_templates_without_placeholder() {
        assert_eq!(expand_placeholder("/static/list", "{{input}}", "x"), "/static/list");
        assert_eq!(expand_placeholder("/groups/:group", ":group", "hot stuff"), "/groups/hot%20stuff");
    }

    #[test]
    fn append_path_segment_encodes_reserved_bytes() {
        assert_eq!(append_path_segment("/ui/utils/template-data/", "event/42"), "/ui/utils/template-data/event%2F42");
    }

    #[test]
    fn with_query_extends_existing_query() {
        assert_eq!(with_query("/embed?theme=dark", &[("url", "https://youtu.be/x")]), "/embed?theme=dark&url=https%3A%2F%2Fyoutu.be%2Fx");
    }
}
