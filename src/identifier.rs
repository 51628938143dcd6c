//! Resolution of user input into a validated YouTube video identifier.
//!
//! Two entry points exist and the caller picks one: [`VideoId::parse`] for a
//! bare 11-character identifier and [`VideoId::from_url`] for a watch, short,
//! embed or shorts URL. Nothing here guesses which one the input is.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use url::form_urlencoded;

use crate::error::ResolveError;

const ID_LENGTH: usize = 11;
const SHORT_HOST: &str = "youtu.be";
const ACCEPTED_HOSTS: [&str; 3] = ["www.youtube.com", "youtube.com", SHORT_HOST];
const PATH_PREFIXES: [&str; 2] = ["/embed/", "/shorts/"];

static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("identifier pattern compiles"));

/// An 11-character YouTube video identifier that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Returns true when `input` is exactly an identifier, with nothing around it.
    pub fn is_valid(input: &str) -> bool {
        ID_RE.is_match(input)
    }

    /// Validates a bare identifier.
    pub fn parse(input: &str) -> Result<Self, ResolveError> {
        if !Self::is_valid(input) {
            return Err(ResolveError::InvalidIdentifier(input.to_owned()));
        }
        Ok(Self(input.to_owned()))
    }

    /// Extracts the identifier from a YouTube URL.
    ///
    /// A missing scheme is treated as `https://`. The host must be one of
    /// `www.youtube.com`, `youtube.com` or `youtu.be`, compared exactly. The
    /// candidate is cut to 11 characters before validation so trailing path or
    /// query noise after the identifier is tolerated.
    pub fn from_url(input: &str) -> Result<Self, ResolveError> {
        let invalid = || ResolveError::InvalidUrl(input.to_owned());

        let with_scheme;
        let full = if input.starts_with("http://") || input.starts_with("https://") {
            input
        } else {
            with_scheme = format!("https://{input}");
            with_scheme.as_str()
        };

        let parts = UrlParts::split(full);
        if !ACCEPTED_HOSTS.contains(&parts.host) {
            return Err(invalid());
        }

        let candidate = if let Some(rest) = PATH_PREFIXES
            .iter()
            .find_map(|prefix| parts.path.strip_prefix(prefix))
        {
            truncate(rest.split('/').next().unwrap_or(rest))
        } else if parts.host == SHORT_HOST {
            let mut chars = parts.path.chars();
            chars.next();
            truncate(chars.as_str())
        } else {
            form_urlencoded::parse(parts.query.as_bytes())
                .find(|(key, value)| key == "v" && !value.is_empty())
                .map(|(_, value)| truncate(&value))
                .unwrap_or_default()
        };

        if !Self::is_valid(&candidate) {
            return Err(invalid());
        }
        Ok(Self(candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for VideoId {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The pieces of an absolute URL we care about, split the way a generic URL
/// splitter would: authority up to the first `/`, `?` or `#`, then path, then
/// query. No normalisation is applied, so host comparison stays exact.
struct UrlParts<'a> {
    host: &'a str,
    path: &'a str,
    query: &'a str,
}

impl<'a> UrlParts<'a> {
    fn split(url: &'a str) -> Self {
        let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
        let rest = rest.split_once('#').map_or(rest, |(before, _)| before);

        let host_end = rest.find(['/', '?']).unwrap_or(rest.len());
        let (host, rest) = rest.split_at(host_end);
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));

        Self { host, path, query }
    }
}

fn truncate(value: &str) -> String {
    match value.char_indices().nth(ID_LENGTH) {
        Some((end, _)) => value[..end].to_owned(),
        None => value.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "aqz-KE-bpKQ";

    fn url_id(input: &str) -> String {
        VideoId::from_url(input).unwrap().to_string()
    }

    #[test]
    fn parse_accepts_every_identifier_character() {
        for id in [ID, "___________", "-----------", "AZaz09_-AZa", "00000000000"] {
            assert_eq!(VideoId::parse(id).unwrap().as_str(), id);
        }
    }

    #[test]
    fn parse_rejects_malformed_identifiers() {
        for input in [
            "",
            "aqz-KE-bpK",
            "aqz-KE-bpKQQ",
            "aqz-KE-bp Q",
            "aqz-KE-bp+Q",
            "aqz-KE-bpKé",
            " aqz-KE-bpKQ",
            "aqz-KE-bpKQ\n",
        ] {
            match VideoId::parse(input) {
                Err(ResolveError::InvalidIdentifier(raw)) => assert_eq!(raw, input),
                other => panic!("expected InvalidIdentifier for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn from_url_reads_watch_query() {
        assert_eq!(url_id("https://www.youtube.com/watch?v=aqz-KE-bpKQ&t=30s"), ID);
        assert_eq!(url_id("https://youtube.com/watch?feature=share&v=aqz-KE-bpKQ"), ID);
        assert_eq!(url_id("http://www.youtube.com/watch?v=aqz-KE-bpKQ#t=10"), ID);
    }

    #[test]
    fn from_url_reads_short_links() {
        assert_eq!(url_id("https://youtu.be/aqz-KE-bpKQ"), ID);
        assert_eq!(url_id("https://youtu.be/aqz-KE-bpKQ?si=abc"), ID);
        assert_eq!(url_id("youtu.be/aqz-KE-bpKQ"), ID);
    }

    #[test]
    fn from_url_reads_embed_and_shorts_paths() {
        assert_eq!(url_id("https://www.youtube.com/embed/aqz-KE-bpKQ"), ID);
        assert_eq!(url_id("https://www.youtube.com/shorts/aqz-KE-bpKQ"), ID);
        assert_eq!(url_id("https://www.youtube.com/embed/aqz-KE-bpKQ/extra"), ID);
        assert_eq!(url_id("https://www.youtube.com/shorts/aqz-KE-bpKQ?feature=share"), ID);
    }

    #[test]
    fn from_url_prepends_missing_scheme() {
        assert_eq!(url_id("www.youtube.com/watch?v=aqz-KE-bpKQ"), ID);
    }

    #[test]
    fn from_url_truncates_trailing_noise() {
        assert_eq!(url_id("https://www.youtube.com/watch?v=aqz-KE-bpKQxyz"), ID);
        assert_eq!(url_id("https://youtu.be/aqz-KE-bpKQtrailing"), ID);
    }

    #[test]
    fn from_url_skips_blank_v_values() {
        assert_eq!(url_id("https://www.youtube.com/watch?v=&v=aqz-KE-bpKQ"), ID);
    }

    #[test]
    fn from_url_rejects_unknown_hosts() {
        for input in [
            "https://vimeo.com/12345",
            "https://m.youtube.com/watch?v=aqz-KE-bpKQ",
            "https://WWW.YOUTUBE.COM/watch?v=aqz-KE-bpKQ",
            "https://youtube.com:443/watch?v=aqz-KE-bpKQ",
            "https://youtube.com.evil.example/watch?v=aqz-KE-bpKQ",
        ] {
            match VideoId::from_url(input) {
                Err(ResolveError::InvalidUrl(raw)) => assert_eq!(raw, input),
                other => panic!("expected InvalidUrl for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn from_url_rejects_missing_or_short_identifiers() {
        for input in [
            "https://www.youtube.com/watch",
            "https://www.youtube.com/watch?list=PL123",
            "https://www.youtube.com/watch?v=short",
            "https://youtu.be/",
            "https://www.youtube.com/embed/",
            "https://www.youtube.com/watch?v=aqz-KE+bpKQ",
        ] {
            assert!(
                matches!(VideoId::from_url(input), Err(ResolveError::InvalidUrl(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn from_url_never_reports_identifier_errors() {
        assert!(matches!(
            VideoId::from_url("aqz-KE-bpKQ"),
            Err(ResolveError::InvalidUrl(_))
        ));
    }

    #[test]
    fn url_parts_split_without_normalising() {
        let parts = UrlParts::split("https://YouTube.com/a/b?x=1&y=2#frag");
        assert_eq!(parts.host, "YouTube.com");
        assert_eq!(parts.path, "/a/b");
        assert_eq!(parts.query, "x=1&y=2");

        let parts = UrlParts::split("https://youtu.be?v=1");
        assert_eq!(parts.host, "youtu.be");
        assert_eq!(parts.path, "");
        assert_eq!(parts.query, "v=1");
    }
}
