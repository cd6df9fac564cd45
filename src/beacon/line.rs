use std::fmt;

use url::Url;

use super::BeaconMetadata;
use crate::error::Error;

const MAX_PARTS: usize = 3;

/// A parsed mapping line: shortened source and its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconLine {
    source: String,
    target: String,
}

impl BeaconLine {
    /// Parse `line` using the header of the file it comes from.
    ///
    /// Lines are `source`, `source|target` or `source|timestamp|target`.
    /// `|` characters that appear inside a URL are not treated as separators.
    pub fn parse(line: &str, metadata: &BeaconMetadata) -> Result<Self, Error> {
        let parts = split_fields(line);
        if parts.len() > MAX_PARTS {
            return Err(Error::TooManyParts(parts.len()));
        }

        let source = parts[0];
        let target = match parts.as_slice() {
            [only] => *only,
            [_, target] if is_url(target) => *target,
            [_, _, target] => *target,
            _ => source,
        };

        Ok(Self {
            source: resolve(source, &metadata.prefix),
            target: resolve(target, &metadata.target),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl fmt::Display for BeaconLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.source, self.target)
    }
}

/// Split on `|`, except while inside a URL.
///
/// A URL starts at `http://` or `https://` and ends at the next whitespace.
fn split_fields(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut parts = Vec::with_capacity(MAX_PARTS);
    let mut start = 0;
    let mut in_url = false;

    for (i, b) in bytes.iter().enumerate() {
        if bytes[i..].starts_with(b"http://") || bytes[i..].starts_with(b"https://") {
            in_url = true;
            continue;
        }

        if in_url && b.is_ascii_whitespace() {
            in_url = false;
        }

        if *b == b'|' && !in_url {
            parts.push(line[start..i].trim());
            start = i + 1;
        }
    }
    parts.push(line[start..].trim());

    parts
}

/// Absolute URLs and absolute paths.
fn is_url(s: &str) -> bool {
    s.starts_with('/') || Url::parse(s).is_ok()
}

/// Combine a field with its header value.
///
/// If the header value is a URL (or an absolute path) it is the base and `stem` is appended to it,
/// otherwise the header value is appended to `stem`.
/// Values that already carry the header are returned unchanged.
fn resolve(stem: &str, header: &str) -> String {
    if header.is_empty() {
        return stem.to_string();
    }

    if is_url(header) {
        if stem.starts_with(header) {
            stem.to_string()
        } else {
            join(header, stem)
        }
    } else {
        let suffix = header.trim_start_matches('/');
        if stem.ends_with(&format!("/{}", suffix)) {
            stem.to_string()
        } else {
            join(stem, header)
        }
    }
}

/// Join with exactly one `/` between `base` and `path`.
fn join(base: &str, path: &str) -> String {
    let mut joined = base.to_string();
    if !joined.ends_with('/') {
        joined.push('/');
    }
    joined.push_str(path.trim_start_matches('/'));
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(prefix: &str, target: &str) -> BeaconMetadata {
        BeaconMetadata {
            prefix: prefix.to_string(),
            target: target.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn single_field() {
        let l = BeaconLine::parse("abc", &BeaconMetadata::default()).unwrap();
        assert_eq!(l.source(), "abc");
        assert_eq!(l.target(), "abc");
    }

    #[test]
    fn two_fields_with_url() {
        let l =
            BeaconLine::parse("abc|https://example.com/x", &meta("https://goo.gl/", "")).unwrap();
        assert_eq!(l.source(), "https://goo.gl/abc");
        assert_eq!(l.target(), "https://example.com/x");
        assert_eq!(l.to_string(), "https://goo.gl/abc,https://example.com/x");
    }

    #[test]
    fn two_fields_without_url_fall_back_to_source() {
        let l = BeaconLine::parse("abc|20201120", &BeaconMetadata::default()).unwrap();
        assert_eq!(l.source(), "abc");
        assert_eq!(l.target(), "abc");
    }

    #[test]
    fn three_fields_drop_timestamp() {
        let l = BeaconLine::parse(
            "abc | 2020-11-20T10:00:00Z | https://example.com/",
            &BeaconMetadata::default(),
        )
        .unwrap();
        assert_eq!(l.source(), "abc");
        assert_eq!(l.target(), "https://example.com/");
    }

    #[test]
    fn pipes_inside_urls_are_kept() {
        let l = BeaconLine::parse(
            "abc|https://example.com/?q=a|b|c",
            &BeaconMetadata::default(),
        )
        .unwrap();
        assert_eq!(l.target(), "https://example.com/?q=a|b|c");
    }

    #[test]
    fn url_span_ends_at_whitespace() {
        let parts = split_fields("abc|http://x.com/a|b c|d");
        assert_eq!(parts, vec!["abc", "http://x.com/a|b c", "d"]);
    }

    #[test]
    fn too_many_parts() {
        let r = BeaconLine::parse("a|b|c|d", &BeaconMetadata::default());
        assert!(matches!(r, Err(Error::TooManyParts(4))));
        assert!(r.unwrap_err().to_string().contains("too many parts"));
    }

    #[test]
    fn non_url_header_is_appended() {
        let l = BeaconLine::parse("abc|https://example.com", &meta("", "suffix")).unwrap();
        assert_eq!(l.source(), "abc");
        assert_eq!(l.target(), "https://example.com/suffix");
    }

    #[test]
    fn absolute_path_target() {
        let l = BeaconLine::parse("abc|/x/y", &BeaconMetadata::default()).unwrap();
        assert_eq!(l.source(), "abc");
        assert_eq!(l.target(), "/x/y");
    }

    #[test]
    fn absolute_path_header_is_a_base() {
        let l = BeaconLine::parse("abc|ts|def", &meta("", "/suffix")).unwrap();
        assert_eq!(l.target(), "/suffix/def");
    }

    #[test]
    fn line_starting_with_url_is_one_field() {
        let parts = split_fields("https://goo.gl/abc|https://example.com");
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn join_never_doubles_slashes() {
        assert_eq!(join("http://a/", "/b"), "http://a/b");
        assert_eq!(join("http://a", "b"), "http://a/b");
        assert_eq!(join("http://a/", "b"), "http://a/b");
    }

    #[test]
    fn header_join_is_idempotent() {
        let headers = [
            meta("https://goo.gl/", "https://target.example/"),
            meta("https://goo.gl", "suffix"),
            meta("", "/suffix"),
        ];
        let lines = ["abc", "abc|https://example.com/x", "abc|ts|def"];

        for m in headers.iter() {
            for line in lines.iter() {
                let once = BeaconLine::parse(line, m).unwrap();
                assert_eq!(resolve(once.source(), &m.prefix), once.source(), "{}", line);
                assert_eq!(resolve(once.target(), &m.target), once.target(), "{}", line);
            }
        }
    }
}
