/*! Searching a release

[Searcher] runs an [ArchiveJob] end to end: it resolves the release of the job's date, makes sure
its dumps are on disk (see [crate::processing::acquire]) and streams every dump once per keyword,
writing matching lines to the job's output.
!*/
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, info, warn};
use tokio::sync::OnceCell;

use crate::beacon::{BeaconLine, BeaconMetadata};
use crate::config::Config;
use crate::decompress::Decompress;
use crate::download::Fetch;
use crate::error::Error;
use crate::io::{read_keywords, Output};
use crate::matcher::Matcher;
use crate::processing::acquire::Acquisition;
use crate::processing::job::ArchiveJob;
use crate::sources::{Catalog, Manifest};

pub struct Searcher {
    config: Arc<Config>,
    fetcher: Arc<dyn Fetch>,
    decompressor: Arc<dyn Decompress>,
    catalog: OnceCell<Catalog>,
}

impl Searcher {
    pub fn new(config: Config, fetcher: Arc<dyn Fetch>, decompressor: Arc<dyn Decompress>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            decompressor,
            catalog: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The release catalog, fetched on first use and shared by every job.
    pub async fn catalog(&self) -> Result<&Catalog, Error> {
        self.catalog
            .get_or_try_init(|| Catalog::fetch(self.fetcher.as_ref(), self.config.catalog_url()))
            .await
    }

    /// Run a whole job.
    pub async fn run(&self, job: &ArchiveJob) -> Result<(), Error> {
        info!("Search starting for: {}", job.date());
        let keywords = read_keywords(job.keywords())?;

        let archive_id = self
            .catalog()
            .await?
            .resolve(&job.date().to_string())?
            .to_string();
        debug!("{} resolved to {}", job.date(), archive_id);

        let dumps = self.acquire(&archive_id).await?;
        self.search(dumps, keywords, job.output().clone()).await?;

        if job.remove_after() {
            self.cleanup(&archive_id).await;
        }

        Ok(())
    }

    /// Make sure every dump of `archive_id` is on disk, returning their paths.
    ///
    /// Nothing is downloaded when the dumps have already been extracted by a previous run.
    pub async fn acquire(&self, archive_id: &str) -> Result<Vec<PathBuf>, Error> {
        let manifest = Manifest::load(&self.config, self.fetcher.as_ref(), archive_id).await?;
        let archive_dir = self.config.archive_dir(archive_id);

        if manifest.is_materialized(&archive_dir)? {
            info!("{} already exists locally. Skipping download..", archive_id);
            return manifest.dump_paths(&archive_dir);
        }

        let acquisition = Acquisition::new(
            self.config.clone(),
            self.fetcher.clone(),
            self.decompressor.clone(),
        );
        let results = acquisition.run(archive_id, &manifest).await?;

        Ok(results
            .into_iter()
            .flat_map(|result| result.dump_paths)
            .collect())
    }

    /// Search `dumps` for every keyword, on the blocking pool.
    pub async fn search(
        &self,
        dumps: Vec<PathBuf>,
        keywords: Vec<String>,
        output: Output,
    ) -> Result<(), Error> {
        let root = self.config.archives().to_path_buf();
        tokio::task::spawn_blocking(move || search_dumps(&dumps, &keywords, &output, &root))
            .await?
    }

    /// Remove the archive folder. Failures are only logged.
    async fn cleanup(&self, archive_id: &str) {
        let archive_dir = self.config.archive_dir(archive_id);
        info!("Removing archive folder: {:?}", archive_dir);
        if let Err(e) = tokio::fs::remove_dir_all(&archive_dir).await {
            warn!("[WARNING]: Failed to remove archive folder: {}", e);
        }
    }
}

/// Search every dump for every keyword. Invalid keywords are skipped with a warning.
pub fn search_dumps(
    dumps: &[PathBuf],
    keywords: &[String],
    output: &Output,
    root: &Path,
) -> Result<(), Error> {
    for keyword in keywords {
        let matcher = match Matcher::new(keyword) {
            Ok(m) => m,
            Err(e) => {
                warn!("[WARNING]: skipping keyword {:?}: {}", keyword, e);
                continue;
            }
        };

        for dump in dumps {
            let shown = dump.strip_prefix(root).unwrap_or(dump);
            info!("Searching: \"{}\" in {}", keyword, shown.display());
            let nb_matches = search_file(dump, &matcher, output)?;
            debug!("{} matches for \"{}\" in {}", nb_matches, keyword, shown.display());
        }
    }
    Ok(())
}

/// Stream `path`, writing every line that `matcher` accepts, returning the number of matches.
///
/// The header block is read in the same pass and is never matched.
/// Lines that do not parse are skipped with a warning.
pub fn search_file(path: &Path, matcher: &Matcher, output: &Output) -> Result<usize, Error> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut metadata = BeaconMetadata::default();
    let mut in_header = true;
    let mut nb_matches = 0;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = trim_newline(&buf);

        if in_header {
            if line.starts_with(b"#") {
                metadata.read_header_line(&String::from_utf8_lossy(line));
                continue;
            }
            in_header = false;
        }

        if !matcher.is_match(line) {
            continue;
        }

        match BeaconLine::parse(&String::from_utf8_lossy(line), &metadata) {
            Ok(parsed) => {
                output.write_line(&parsed)?;
                nb_matches += 1;
            }
            Err(e) => warn!("[WARNING]: {}: {}", path.display(), e),
        }
    }

    output.flush()?;
    Ok(nb_matches)
}

#[inline]
fn trim_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
