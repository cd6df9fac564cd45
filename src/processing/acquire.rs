/*! Acquisition of a release

Payloads missing locally are downloaded concurrently, each one being extracted as soon as its
download completes. Payloads already present are extracted right away, and entries whose dumps are
already on disk are neither downloaded nor extracted.

Each task reports a [ProcessResult] on a channel. The first failure aborts the acquisition: every
other task is cancelled (pending downloads stop, extractions that have not started yet are skipped)
and its result discarded. Acquisition returns once every task has settled.
!*/
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, error, info};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::decompress::Decompress;
use crate::download::{partial_path, Fetch, LogProgress};
use crate::error::Error;
use crate::processing::extract::Extractor;
use crate::processing::job::ProcessResult;
use crate::sources::{DumpEntry, Manifest};

/// A payload to download.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub url: String,
    pub dir: PathBuf,
    pub filename: String,
}

impl DownloadJob {
    pub fn dst(&self) -> PathBuf {
        self.dir.join(&self.filename)
    }
}

pub struct Acquisition {
    config: Arc<Config>,
    fetcher: Arc<dyn Fetch>,
    decompressor: Arc<dyn Decompress>,
}

impl Acquisition {
    pub fn new(
        config: Arc<Config>,
        fetcher: Arc<dyn Fetch>,
        decompressor: Arc<dyn Decompress>,
    ) -> Self {
        Self {
            config,
            fetcher,
            decompressor,
        }
    }

    /// Download (when needed) and extract every entry of `manifest`.
    pub async fn run(
        &self,
        archive_id: &str,
        manifest: &Manifest,
    ) -> Result<Vec<ProcessResult>, Error> {
        let archive_dir = self.config.archive_dir(archive_id);
        tokio::fs::create_dir_all(&archive_dir).await?;

        let extractor = Extractor::new(archive_dir.clone(), self.decompressor.clone());
        let token = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(manifest.entries().len().max(1));
        let mut tasks = JoinSet::new();
        let mut results = Vec::with_capacity(manifest.entries().len());

        for entry in manifest.entries().iter().cloned() {
            let dumps = entry.dump_paths(&archive_dir)?;
            if !dumps.is_empty() {
                debug!("{} already extracted", entry.name());
                results.push(ProcessResult::ok(archive_dir.clone(), entry.name(), dumps));
                continue;
            }

            let tx = tx.clone();
            let token = token.clone();
            let extractor = extractor.clone();

            if entry.payload_path(&archive_dir).is_file() {
                tasks.spawn(async move {
                    let result = extract(extractor, entry, &token).await;
                    let _ = tx.send(result).await;
                });
            } else {
                info!("{} doesn't exist locally. Will be downloaded.", entry.name());
                let job = DownloadJob {
                    url: self.config.download_url(archive_id, entry.name()),
                    dir: archive_dir.clone(),
                    filename: entry.name().to_string(),
                };
                let fetcher = self.fetcher.clone();

                tasks.spawn(async move {
                    let result = match download(fetcher.as_ref(), &job, &token).await {
                        Ok(()) => extract(extractor, entry, &token).await,
                        Err(e) => ProcessResult::failed(job.dir, entry.name(), e),
                    };
                    let _ = tx.send(result).await;
                });
            }
        }
        // the channel closes once every task has dropped its sender
        drop(tx);

        let mut failure: Option<Error> = None;
        while let Some(result) = rx.recv().await {
            match result.error {
                Some(e) if failure.is_none() => {
                    error!("[ERROR]: {} in {}: {}", result.entry, archive_id, e);
                    token.cancel();
                    failure = Some(e);
                }
                Some(e) => debug!("discarding {} result: {}", result.entry, e),
                None => results.push(result),
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("[ERROR]: acquisition task of {} failed: {}", archive_id, e);
                failure.get_or_insert(Error::Join(e));
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(results),
        }
    }
}

/// Download a payload, giving up as soon as `token` is cancelled.
async fn download(
    fetcher: &dyn Fetch,
    job: &DownloadJob,
    token: &CancellationToken,
) -> Result<(), Error> {
    let dst = job.dst();
    let progress = LogProgress::new(&job.filename);

    tokio::select! {
        _ = token.cancelled() => {
            debug!("download of {} cancelled", job.filename);
            let _ = tokio::fs::remove_file(partial_path(&dst)).await;
            Err(Error::Cancelled)
        }
        written = fetcher.save_to(&job.url, &dst, &progress) => {
            debug!("{}: {} bytes", job.filename, written?);
            Ok(())
        }
    }
}

/// Extract on the blocking pool, unless the acquisition has been cancelled in the meantime.
async fn extract(
    extractor: Extractor,
    entry: DumpEntry,
    token: &CancellationToken,
) -> ProcessResult {
    let dir = extractor.archive_dir().to_path_buf();
    let name = entry.name().to_string();

    if token.is_cancelled() {
        return ProcessResult::failed(dir, &name, Error::Cancelled);
    }

    match tokio::task::spawn_blocking(move || extractor.extract(&entry)).await {
        Ok(Ok(dumps)) => ProcessResult::ok(dir, &name, dumps),
        Ok(Err(e)) => ProcessResult::failed(dir, &name, e),
        Err(e) => ProcessResult::failed(dir, &name, Error::Join(e)),
    }
}
