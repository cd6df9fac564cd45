/*! Downloading

[Fetch] is the seam between the pipeline and the network: everything that leaves the machine
(catalog query, manifest and payload downloads) goes through it.
[HttpFetcher] is the reqwest-backed implementation.
!*/
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use log::{debug, info};
use tokio::io::AsyncWriteExt;

use crate::error::Error;

/// Reporting step when the content length is unknown.
const UNKNOWN_LENGTH_STEP: u64 = 64 * 1_048_576;

/// Observer of a running download.
pub trait Progress: Send + Sync {
    /// Called after each chunk with the number of bytes written so far.
    fn update(&self, written: u64, total: Option<u64>);
}

impl Progress for () {
    fn update(&self, _written: u64, _total: Option<u64>) {}
}

/// Logs progress at debug level every 10% (or every 64MiB if the size is unknown).
pub struct LogProgress {
    name: String,
    last_step: AtomicU64,
}

impl LogProgress {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            last_step: AtomicU64::new(0),
        }
    }
}

impl Progress for LogProgress {
    fn update(&self, written: u64, total: Option<u64>) {
        let step = match total {
            Some(0) => return,
            Some(total) => written * 10 / total,
            None => written / UNKNOWN_LENGTH_STEP,
        };

        if step > self.last_step.swap(step, Ordering::Relaxed) {
            match total {
                Some(_) => debug!("{}: {}%", self.name, step * 10),
                None => debug!("{}: {} MiB", self.name, written / 1_048_576),
            }
        }
    }
}

#[async_trait]
pub trait Fetch: Send + Sync {
    /// Get the whole body of `url`.
    async fn fetch(&self, url: &str) -> Result<Bytes, Error>;

    /// Stream `url` into `dst`, returning the number of bytes written.
    ///
    /// `dst` only exists once the transfer has completed.
    async fn save_to(&self, url: &str, dst: &Path, progress: &dyn Progress) -> Result<u64, Error>;
}

/// Path used while `dst` is being written.
pub fn partial_path(dst: &Path) -> PathBuf {
    let mut name = dst.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

/// holds the http client that will make the requests.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, Error> {
        debug!("fetching {}", url);
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(body)
    }

    async fn save_to(&self, url: &str, dst: &Path, progress: &dyn Progress) -> Result<u64, Error> {
        info!("Downloading: {}", url);
        let resp = self.client.get(url).send().await?.error_for_status()?;
        let total = resp.content_length();

        if let Some(parent) = dst.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // write into a temporary file so that an interrupted transfer
        // is never mistaken for a complete payload.
        let part = partial_path(dst);
        let mut file = tokio::fs::File::create(&part).await?;
        let mut stream = resp.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            progress.update(written, total);
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&part, dst).await?;
        info!("Download finished: {} ({} bytes)", url, written);
        Ok(written)
    }
}
