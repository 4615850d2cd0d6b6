//! URL parsing for embedded media.

use percent_encoding::percent_decode_str;
use regex::Regex;
use std::sync::OnceLock;

/// The parts of an absolute URL the embed renderer cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl<'a> {
    pub host: String,
    pub path: &'a str,
    pub query: Option<&'a str>,
}

/// Split an absolute `scheme://host[:port]/path?query#fragment` URL.
///
/// Returns `None` for relative or otherwise unparseable input.
pub fn parse_url(url: &str) -> Option<ParsedUrl<'_>> {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    let url_regex = URL_REGEX.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z][A-Za-z0-9+.\-]*://(?:[^@/?#]*@)?(?P<host>[^/?#:]+)(?::\d*)?(?P<path>[^?#]*)(?:\?(?P<query>[^#]*))?(?:#.*)?$",
        )
        .expect("Invalid URL regex")
    });

    let caps = url_regex.captures(url.trim())?;
    let host = caps.name("host")?.as_str().to_ascii_lowercase();
    let path = caps.name("path").map_or("", |m| m.as_str());
    let query = caps.name("query").map(|m| m.as_str());
    Some(ParsedUrl { host, path, query })
}

/// Decoded value of the first `name` parameter in a query string.
pub fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = key.replace('+', " ");
        if percent_decode_str(&key).decode_utf8_lossy() != name {
            return None;
        }
        let value = value.replace('+', " ");
        Some(percent_decode_str(&value).decode_utf8_lossy().into_owned())
    })
}

/// YouTube video id from a `youtu.be/<id>` or `youtube.com/watch?v=<id>` URL.
pub fn youtube_video_id(url: &str) -> Option<String> {
    let parsed = parse_url(url)?;
    let id = match parsed.host.as_str() {
        "youtu.be" => parsed.path.trim_start_matches('/').to_string(),
        "youtube.com" | "www.youtube.com" => query_param(parsed.query?, "v")?,
        _ => return None,
    };
    if id.is_empty() { None } else { Some(id) }
}
