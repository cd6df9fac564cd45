/*! Release manifest

Each release has a `urlteam_<date>_files.xml` manifest listing its members:

```xml
<files>
  <file name="goo-gl.zip" source="original">
    <format>ZIP</format>
    <size>123</size>
    <md5>...</md5>
  </file>
</files>
```

Only `ZIP` members are payloads (dumps); the others (torrents, metadata) are dropped.
The manifest is cached in the archive directory and reused on later runs.
!*/
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;

use crate::config::Config;
use crate::download::Fetch;
use crate::error::Error;
use crate::io::find_files;

/// Format of the members holding dumps.
pub const PAYLOAD_FORMAT: &str = "ZIP";

#[derive(Debug, Deserialize)]
struct Files {
    #[serde(rename = "file", default)]
    files: Vec<ManifestFile>,
}

/// A member as listed in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestFile {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@source", default)]
    pub source: String,
    #[serde(default)]
    pub format: String,
    pub size: Option<String>,
    pub md5: Option<String>,
    pub sha1: Option<String>,
}

/// A payload member, that is a zipped dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpEntry {
    name: String,
    format: String,
    dump_type: String,
}

impl DumpEntry {
    pub fn new(name: &str, format: &str) -> Self {
        let dump_type = name.split('.').next().unwrap_or(name).to_string();
        Self {
            name: name.to_string(),
            format: format.to_string(),
            dump_type,
        }
    }

    /// File name of the payload, e.g. `goo-gl.zip`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// Name without extension, e.g. `goo-gl`. Dumps are unpacked in a folder of that name.
    pub fn dump_type(&self) -> &str {
        &self.dump_type
    }

    /// `<archive_dir>/<name>`
    pub fn payload_path(&self, archive_dir: &Path) -> PathBuf {
        archive_dir.join(&self.name)
    }

    /// `<archive_dir>/<dump_type>`
    pub fn dump_dir(&self, archive_dir: &Path) -> PathBuf {
        archive_dir.join(&self.dump_type)
    }

    /// Decompressed dumps already present for this entry.
    pub fn dump_paths(&self, archive_dir: &Path) -> Result<Vec<PathBuf>, Error> {
        find_files(&self.dump_dir(archive_dir), "*.txt")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<DumpEntry>,
}

impl Manifest {
    /// Parse a manifest, keeping payload members only.
    pub fn from_xml(xml: &str) -> Result<Self, Error> {
        let files: Files = quick_xml::de::from_str(xml)?;
        let entries = files
            .files
            .iter()
            .filter(|f| f.format == PAYLOAD_FORMAT)
            .map(|f| DumpEntry::new(&f.name, &f.format))
            .collect();

        Ok(Self { entries })
    }

    /// Load the manifest of `archive_id`, downloading it first if it is not cached.
    ///
    /// A cached manifest that does not parse is removed so that the next run fetches it again.
    pub async fn load(
        config: &Config,
        fetcher: &dyn Fetch,
        archive_id: &str,
    ) -> Result<Self, Error> {
        let filename = manifest_filename(archive_id)?;
        let path = config.archive_dir(archive_id).join(&filename);

        if !path.is_file() {
            info!("{} doesn't exist locally. The file will be downloaded.", filename);
            let url = config.download_url(archive_id, &filename);
            fetcher.save_to(&url, &path, &()).await?;
        }

        let xml = tokio::fs::read_to_string(&path).await?;
        Self::from_xml(&xml).map_err(|e| {
            warn!("[WARNING]: removing invalid manifest {:?}", path);
            if let Err(rm) = std::fs::remove_file(&path) {
                warn!("[WARNING]: could not remove {:?}: {}", path, rm);
            }
            e
        })
    }

    pub fn entries(&self) -> &[DumpEntry] {
        &self.entries
    }

    /// Whether every entry already has its decompressed dump on disk.
    pub fn is_materialized(&self, archive_dir: &Path) -> Result<bool, Error> {
        for entry in &self.entries {
            if entry.dump_paths(archive_dir)?.is_empty() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Every decompressed dump on disk for this manifest.
    pub fn dump_paths(&self, archive_dir: &Path) -> Result<Vec<PathBuf>, Error> {
        let mut paths = Vec::new();
        for entry in &self.entries {
            paths.extend(entry.dump_paths(archive_dir)?);
        }
        Ok(paths)
    }
}

/// `urlteam_2020-11-20-03-17-04` has its manifest at `urlteam_2020-11-20-03-17-04_files.xml`.
pub fn manifest_filename(archive_id: &str) -> Result<String, Error> {
    match archive_id.split('_').nth(1) {
        Some(date) if !date.is_empty() => Ok(format!("urlteam_{}_files.xml", date)),
        _ => Err(Error::Custom(format!(
            "unexpected archive identifier: {}",
            archive_id
        ))),
    }
}
