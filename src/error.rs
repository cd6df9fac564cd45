//! Error enum
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Http(reqwest::Error),
    Zip(zip::result::ZipError),
    Xml(quick_xml::DeError),
    Json(serde_json::Error),
    Glob(glob::GlobError),
    GlobPattern(glob::PatternError),
    Regex(regex::Error),
    Date(chrono::ParseError),
    Join(tokio::task::JoinError),
    /// No catalog item for the requested date.
    NotFound(String),
    /// A zip member would be written outside of its destination.
    UnsafeArchivePath(PathBuf),
    TooManyParts(usize),
    Decompress(String),
    Cancelled,
    Custom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Http(e) => write!(f, "http error: {}", e),
            Error::Zip(e) => write!(f, "zip error: {}", e),
            Error::Xml(e) => write!(f, "invalid manifest: {}", e),
            Error::Json(e) => write!(f, "invalid catalog response: {}", e),
            Error::Glob(e) => write!(f, "glob error: {}", e),
            Error::GlobPattern(e) => write!(f, "invalid glob pattern: {}", e),
            Error::Regex(e) => write!(f, "invalid regex: {}", e),
            Error::Date(e) => write!(f, "wrong date format: {}", e),
            Error::Join(e) => write!(f, "task failed: {}", e),
            Error::NotFound(date) => write!(f, "no archive found for date {}", date),
            Error::UnsafeArchivePath(p) => write!(f, "{}: illegal file path", p.display()),
            Error::TooManyParts(n) => write!(f, "invalid line: too many parts ({})", n),
            Error::Decompress(msg) => write!(f, "decompression failed: {}", msg),
            Error::Cancelled => write!(f, "cancelled after a sibling failure"),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        Error::Http(e)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Error {
        Error::Zip(e)
    }
}

impl From<quick_xml::DeError> for Error {
    fn from(e: quick_xml::DeError) -> Error {
        Error::Xml(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Json(e)
    }
}

impl From<glob::GlobError> for Error {
    fn from(e: glob::GlobError) -> Error {
        Error::Glob(e)
    }
}

impl From<glob::PatternError> for Error {
    fn from(e: glob::PatternError) -> Error {
        Error::GlobPattern(e)
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Error {
        Error::Regex(e)
    }
}

impl From<chrono::ParseError> for Error {
    fn from(e: chrono::ParseError) -> Error {
        Error::Date(e)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Error {
        Error::Join(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
