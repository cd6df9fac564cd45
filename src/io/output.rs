/*! Match output.

Every worker writes to the same [Output]. Writes are done line by line under a lock so that
lines coming from concurrent searches never interleave.
!*/
use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::beacon::BeaconLine;
use crate::error::Error;

type Sink = Box<dyn Write + Send>;

#[derive(Clone)]
pub struct Output {
    sink: Arc<Mutex<Sink>>,
}

impl Output {
    /// Print matches on the standard output.
    pub fn stdout() -> Self {
        Self::from_writer(std::io::stdout())
    }

    /// Append matches to the file at `path`, creating it if needed.
    pub fn append(path: &Path) -> Result<Self, Error> {
        let f = OpenOptions::new().append(true).create(true).open(path)?;
        Ok(Self::from_writer(f))
    }

    pub fn from_writer<W: Write + Send + 'static>(w: W) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(BufWriter::new(w)))),
        }
    }

    /// Write `source,target` followed by a newline.
    pub fn write_line(&self, line: &BeaconLine) -> Result<(), Error> {
        writeln!(self.lock()?, "{}", line)?;
        Ok(())
    }

    pub fn flush(&self) -> Result<(), Error> {
        self.lock()?.flush()?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Sink>, Error> {
        self.sink
            .lock()
            .map_err(|_| Error::Custom("output lock poisoned".to_string()))
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon::BeaconMetadata;

    #[test]
    fn append_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "previous\n").unwrap();

        let out = Output::append(&path).unwrap();
        let line = BeaconLine::parse("abc|https://example.com", &BeaconMetadata::default())
            .unwrap();
        out.write_line(&line).unwrap();
        out.clone().write_line(&line).unwrap();
        out.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "previous\nabc,https://example.com\nabc,https://example.com\n"
        );
    }
}
