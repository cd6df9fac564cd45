/*! Keyword matchers

A keyword specification is one line of the keyword file. It is turned into a [Matcher] that is
run against the raw bytes of each dump line, before any parsing happens.

- `regex <pattern>`: the line must match `<pattern>`,
- `a,b,c`: the line must contain every comma-separated keyword,
- anything else: the line must contain the whole string.
!*/
use std::fmt;

use memchr::memmem::Finder;
use regex::bytes::Regex;

use crate::error::Error;

const REGEX_PREFIX: &str = "regex ";

#[derive(Debug, Clone)]
pub enum Matcher {
    Regex(Regex),
    All(Vec<Finder<'static>>),
    Contains(Finder<'static>),
}

impl Matcher {
    /// Build a matcher from a keyword specification.
    ///
    /// Fails only if a `regex ` specification does not compile.
    pub fn new(spec: &str) -> Result<Self, Error> {
        if let Some(pattern) = spec.strip_prefix(REGEX_PREFIX) {
            return Ok(Matcher::Regex(Regex::new(pattern)?));
        }

        if spec.contains(',') {
            let keywords = spec.split(',').map(finder).collect();
            return Ok(Matcher::All(keywords));
        }

        Ok(Matcher::Contains(finder(spec)))
    }

    pub fn is_match(&self, line: &[u8]) -> bool {
        match self {
            Matcher::Regex(r) => r.is_match(line),
            Matcher::All(keywords) => keywords.iter().all(|k| k.find(line).is_some()),
            Matcher::Contains(keyword) => keyword.find(line).is_some(),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Regex(r) => write!(f, "{}{}", REGEX_PREFIX, r.as_str()),
            Matcher::All(keywords) => {
                let keywords: Vec<_> = keywords
                    .iter()
                    .map(|k| String::from_utf8_lossy(k.needle()))
                    .collect();
                write!(f, "{}", keywords.join(","))
            }
            Matcher::Contains(keyword) => {
                write!(f, "{}", String::from_utf8_lossy(keyword.needle()))
            }
        }
    }
}

/// Substring searcher for `keyword`. An empty keyword matches every line.
fn finder(keyword: &str) -> Finder<'static> {
    Finder::new(keyword.as_bytes()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_keyword() {
        let m = Matcher::new("example.com").unwrap();
        assert!(m.is_match(b"abc|http://example.com/foo"));
        assert!(!m.is_match(b"abc|http://example.org/foo"));
    }

    #[test]
    fn multi_keyword_is_and() {
        let m = Matcher::new("a,b").unwrap();
        assert!(matches!(m, Matcher::All(_)));
        assert!(m.is_match(b"xxaxxbxx"));
        assert!(m.is_match(b"bbbbba"));
        assert!(!m.is_match(b"only a here"));
        assert!(!m.is_match(b"nothing"));
    }

    #[test]
    fn regex_keyword() {
        let m = Matcher::new("regex ^http").unwrap();
        assert!(m.is_match(b"http://example.com"));
        assert!(!m.is_match(b"abc|http://example.com"));
    }

    #[test]
    fn regex_keeps_spaces_in_pattern() {
        let m = Matcher::new("regex foo bar").unwrap();
        assert!(m.is_match(b"xx foo bar xx"));
        assert!(!m.is_match(b"foo"));
    }

    #[test]
    fn invalid_regex_is_an_error() {
        let m = Matcher::new("regex ([a-z");
        assert!(matches!(m, Err(Error::Regex(_))));
    }

    #[test]
    fn regex_without_space_is_plain() {
        let m = Matcher::new("regexp").unwrap();
        assert!(matches!(m, Matcher::Contains(_)));
        assert!(m.is_match(b"a regexp"));
    }

    #[test]
    fn matches_non_utf8_lines() {
        let m = Matcher::new("abc").unwrap();
        assert!(m.is_match(&[0xff, 0xfe, b'a', b'b', b'c']));
    }

    #[test]
    fn keyword_longer_than_line() {
        let m = Matcher::new("example.com/very/long/path").unwrap();
        assert!(!m.is_match(b"example.com"));
        assert!(m.is_match(b"x|https://example.com/very/long/path?q=1"));
    }

    #[test]
    fn empty_part_matches_everything() {
        let m = Matcher::new("abc,").unwrap();
        assert!(m.is_match(b"abc"));
        assert!(!m.is_match(b"ab"));
    }

    #[test]
    fn display() {
        assert_eq!(Matcher::new("a,b").unwrap().to_string(), "a,b");
        assert_eq!(Matcher::new("regex ^x").unwrap().to_string(), "regex ^x");
    }
}
