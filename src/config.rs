/*! Run configuration.

[Config] carries the values that every component needs (archives root, pool size, remote
endpoints) and is threaded explicitly through constructors. [DateSpec] is the parsed form of the
`--date` argument.
!*/
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::Error;

/// Number of archives processed concurrently when searching a date range.
pub const DEFAULT_WORKERS: usize = 3;

/// Catalog query listing every URLTeam release.
pub const CATALOG_URL: &str = "https://archive.org/services/search/v1/scrape?debug=false&xvar=production&total_only=false&count=10000&fields=identifier%2Citem_size&q=Urlteam%20Release";

pub const DOWNLOAD_BASE_URL: &str = "https://archive.org/download/";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Token standing for the most recent release.
pub const LATEST: &str = "latest";

#[derive(Debug, Clone)]
pub struct Config {
    archives: PathBuf,
    workers: usize,
    catalog_url: String,
    download_base: String,
}

impl Config {
    /// Create a configuration rooted at `archives`, using archive.org endpoints.
    pub fn new(archives: impl Into<PathBuf>) -> Self {
        Self {
            archives: archives.into(),
            workers: DEFAULT_WORKERS,
            catalog_url: CATALOG_URL.to_string(),
            download_base: DOWNLOAD_BASE_URL.to_string(),
        }
    }

    /// Set the worker pool size. A size of 0 is bumped to 1.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = url.into();
        self
    }

    /// Base locator under which `<archive-id>/<file>` are downloaded.
    pub fn with_download_base(mut self, base: impl Into<String>) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        self.download_base = base;
        self
    }

    pub fn archives(&self) -> &Path {
        &self.archives
    }

    /// Local directory of an archive: `<archives>/<archive_id>`.
    pub fn archive_dir(&self, archive_id: &str) -> PathBuf {
        self.archives.join(archive_id)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn catalog_url(&self) -> &str {
        &self.catalog_url
    }

    /// Remote locator of `file` in archive `archive_id`.
    pub fn download_url(&self, archive_id: &str, file: &str) -> String {
        format!("{}{}/{}", self.download_base, archive_id, file)
    }
}

/// What the user asked to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpec {
    Latest,
    Single(NaiveDate),
    /// Inclusive range.
    Range(NaiveDate, NaiveDate),
}

impl FromStr for DateSpec {
    type Err = Error;

    /// Accepts `latest`, `YYYY-MM-DD`, `YYYY-MM-DD:YYYY-MM-DD` and `YYYY` (the whole year).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == LATEST {
            return Ok(DateSpec::Latest);
        }

        if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
            let year: i32 = s
                .parse()
                .map_err(|_| Error::Custom(format!("wrong year: {}", s)))?;
            let start = NaiveDate::from_ymd_opt(year, 1, 1);
            let end = NaiveDate::from_ymd_opt(year, 12, 31);
            return match (start, end) {
                (Some(start), Some(end)) => Ok(DateSpec::Range(start, end)),
                _ => Err(Error::Custom(format!("wrong year: {}", s))),
            };
        }

        match s.split_once(':') {
            Some((start, end)) => {
                let start = NaiveDate::parse_from_str(start, DATE_FORMAT)?;
                let end = NaiveDate::parse_from_str(end, DATE_FORMAT)?;
                Ok(DateSpec::Range(start, end))
            }
            None => Ok(DateSpec::Single(NaiveDate::parse_from_str(s, DATE_FORMAT)?)),
        }
    }
}

impl fmt::Display for DateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateSpec::Latest => write!(f, "{}", LATEST),
            DateSpec::Single(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            DateSpec::Range(s, e) => {
                write!(f, "{}:{}", s.format(DATE_FORMAT), e.format(DATE_FORMAT))
            }
        }
    }
}
