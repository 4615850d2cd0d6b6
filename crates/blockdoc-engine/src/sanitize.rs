//! Escaping and URL allow-listing for HTML output.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Escape `& < > " '` as HTML entities in a single pass.
///
/// Already-escaped input is escaped again (`&amp;` becomes `&amp;amp;`);
/// this is a character substitution, not an entity-aware transform.
pub fn sanitize_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Allow-list a URL for use in `src`/`href` attributes.
///
/// - `http://` and `https://` (any case) pass through unchanged
/// - protocol-relative `//host/...` is upgraded to `https:`
/// - anything without a `:` is treated as relative and kept
/// - every other scheme yields an empty string
pub fn sanitize_url(url: &str) -> String {
    static HTTP_SCHEME: OnceLock<Regex> = OnceLock::new();
    let http_scheme =
        HTTP_SCHEME.get_or_init(|| Regex::new(r"(?i)^https?://").expect("Invalid scheme regex"));

    if url.is_empty() {
        return String::new();
    }
    if http_scheme.is_match(url) {
        return url.to_string();
    }
    if url.starts_with("//") {
        return format!("https:{url}");
    }
    if !url.contains(':') {
        return url.to_string();
    }
    String::new()
}

/// String form of a loosely-typed block field.
///
/// Falsy values (`null`, `false`, `0`, `""`) become empty, matching how
/// optional fields are treated by both renderers.
pub fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| value_text(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(other) => other.to_string(),
    }
}

/// `sanitize_html` over a loosely-typed field; falsy values yield `""`.
pub fn sanitize_value(value: Option<&Value>) -> String {
    sanitize_html(&value_text(value))
}
