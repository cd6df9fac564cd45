/*!
# IO utilities

Keyword file loading, on-disk dump lookup and match output.
!*/
mod output;

pub use output::Output;

use std::path::{Path, PathBuf};

use crate::error::Error;

/// Read a keyword file: one keyword specification per line, blank lines are skipped.
pub fn read_keywords(path: &Path) -> Result<Vec<String>, Error> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .collect())
}

/// List files of `dir` matching the glob `pattern` (e.g. `*.txt`), sorted.
///
/// `dir` is escaped, so only `pattern` is interpreted.
pub fn find_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, Error> {
    let dir = dir
        .to_str()
        .ok_or_else(|| Error::Custom(format!("path is not valid unicode: {:?}", dir)))?;
    let pattern = format!("{}/{}", glob::Pattern::escape(dir), pattern);

    let mut paths = glob::glob(&pattern)?.collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    Ok(paths)
}
