//! Jobs and their outcomes.
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{error, info};

use crate::config::{DateSpec, DATE_FORMAT, LATEST};
use crate::error::Error;
use crate::io::Output;

/// Date of a single job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobDate {
    Latest,
    Day(NaiveDate),
}

impl fmt::Display for JobDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobDate::Latest => write!(f, "{}", LATEST),
            JobDate::Day(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

/// Every day from `start` to `end`, both included.
pub fn expand_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|day| *day <= end).collect()
}

/// Search of one release.
#[derive(Debug, Clone)]
pub struct ArchiveJob {
    date: JobDate,
    keywords: PathBuf,
    output: Output,
    remove_after: bool,
}

impl ArchiveJob {
    pub fn new(date: JobDate, keywords: &Path, output: Output, remove_after: bool) -> Self {
        Self {
            date,
            keywords: keywords.to_path_buf(),
            output,
            remove_after,
        }
    }

    /// One job per date of `spec`.
    pub fn from_spec(
        spec: DateSpec,
        keywords: &Path,
        output: &Output,
        remove_after: bool,
    ) -> Vec<Self> {
        let dates = match spec {
            DateSpec::Latest => vec![JobDate::Latest],
            DateSpec::Single(day) => vec![JobDate::Day(day)],
            DateSpec::Range(start, end) => expand_range(start, end)
                .into_iter()
                .map(JobDate::Day)
                .collect(),
        };

        dates
            .into_iter()
            .map(|date| Self::new(date, keywords, output.clone(), remove_after))
            .collect()
    }

    pub fn date(&self) -> JobDate {
        self.date
    }

    pub fn keywords(&self) -> &Path {
        &self.keywords
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Remove the archive folder once searched.
    pub fn remove_after(&self) -> bool {
        self.remove_after
    }
}

/// Outcome of the extraction of a single payload.
#[derive(Debug)]
pub struct ProcessResult {
    pub archive_dir: PathBuf,
    pub entry: String,
    pub dump_paths: Vec<PathBuf>,
    pub error: Option<Error>,
}

impl ProcessResult {
    pub fn ok(archive_dir: PathBuf, entry: &str, dump_paths: Vec<PathBuf>) -> Self {
        Self {
            archive_dir,
            entry: entry.to_string(),
            dump_paths,
            error: None,
        }
    }

    pub fn failed(archive_dir: PathBuf, entry: &str, error: Error) -> Self {
        Self {
            archive_dir,
            entry: entry.to_string(),
            dump_paths: Vec::new(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => write!(f, "Success"),
            Status::Failed => write!(f, "Failed"),
        }
    }
}

/// Outcome of an [ArchiveJob].
#[derive(Debug)]
pub struct ProcessSummary {
    pub date: JobDate,
    pub status: Status,
    pub error: Option<Error>,
}

impl ProcessSummary {
    pub fn new(date: JobDate, result: Result<(), Error>) -> Self {
        match result {
            Ok(()) => Self {
                date,
                status: Status::Success,
                error: None,
            },
            Err(e) => Self {
                date,
                status: Status::Failed,
                error: Some(e),
            },
        }
    }

    pub fn log(&self) {
        match &self.error {
            None => info!("[SUCCESS] Date {} processed successfully", self.date),
            Some(e) => error!("[FAILED] Date {}: {}", self.date, e),
        }
    }
}
