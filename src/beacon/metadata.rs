use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::error::Error;

/// Header of a beacon file.
///
/// Only the keys we know about are kept, missing ones are empty strings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BeaconMetadata {
    pub prefix: String,
    pub target: String,
    pub relation: String,
    pub message: String,
    pub annotation: String,
}

impl BeaconMetadata {
    /// Read the header of the beacon file at `path`.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let f = File::open(path)?;
        Self::from_reader(BufReader::new(f))
    }

    /// Read the leading `#` block of `reader`, stopping at the first other line.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut metadata = Self::default();

        for line in reader.lines() {
            let line = line?;
            if !line.starts_with('#') {
                break;
            }
            metadata.read_header_line(&line);
        }

        Ok(metadata)
    }

    /// Apply a single `#KEY: value` line. Unknown keys and lines without a colon are ignored.
    pub fn read_header_line(&mut self, line: &str) {
        let (key, value) = match line.split_once(':') {
            Some(kv) => kv,
            None => return,
        };
        let value = value.trim().to_string();

        match key {
            "#PREFIX" => self.prefix = value,
            "#TARGET" => self.target = value,
            "#RELATION" => self.relation = value,
            "#MESSAGE" => self.message = value,
            "#ANNOTATION" => self.annotation = value,
            _ => (),
        }
    }
}
