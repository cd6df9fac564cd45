/*! Payload extraction

A payload is a zip file holding `<dump-type>/<name>.txt.xz`. Extraction:

1. removes dumps left by a previous run,
2. unzips the payload in the archive folder (deleting the payload if it is corrupt),
3. decompresses the `.txt.xz` containers,
4. removes the payload.
!*/
use std::{
    fs::{self, File},
    io,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use log::{debug, info, warn};
use zip::ZipArchive;

use crate::decompress::Decompress;
use crate::error::Error;
use crate::io::find_files;
use crate::sources::DumpEntry;

const CONTAINER_SUFFIX: &str = ".txt.xz";

#[derive(Clone)]
pub struct Extractor {
    archive_dir: PathBuf,
    decompressor: Arc<dyn Decompress>,
}

impl Extractor {
    pub fn new(archive_dir: PathBuf, decompressor: Arc<dyn Decompress>) -> Self {
        Self {
            archive_dir,
            decompressor,
        }
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Extract the already downloaded payload of `entry`, returning the decompressed dumps.
    pub fn extract(&self, entry: &DumpEntry) -> Result<Vec<PathBuf>, Error> {
        let payload = entry.payload_path(&self.archive_dir);

        for stale in entry.dump_paths(&self.archive_dir)? {
            debug!("removing stale dump {:?}", stale);
            fs::remove_file(&stale)?;
        }

        info!("Unzipping: {}", entry.name());
        let members = match unzip(&payload, &self.archive_dir) {
            Ok(members) => members,
            Err(e) => {
                // a corrupt payload has to be downloaded again
                warn!("[WARNING]: removing corrupt payload {:?}", payload);
                if let Err(rm) = fs::remove_file(&payload) {
                    warn!("[WARNING]: could not remove {:?}: {}", payload, rm);
                }
                return Err(e);
            }
        };

        let dumps = self.decompress(entry, &members);

        if let Err(e) = fs::remove_file(&payload) {
            warn!("[WARNING]: could not remove {:?}: {}", payload, e);
        }

        dumps
    }

    /// Decompress the containers found in `members`, or in the dump folder if there are none.
    fn decompress(&self, entry: &DumpEntry, members: &[PathBuf]) -> Result<Vec<PathBuf>, Error> {
        let mut containers: Vec<PathBuf> = members
            .iter()
            .filter(|m| has_suffix(m, CONTAINER_SUFFIX))
            .cloned()
            .collect();
        if containers.is_empty() {
            containers = find_files(&entry.dump_dir(&self.archive_dir), "*.txt.xz")?;
        }

        let mut dumps = Vec::with_capacity(containers.len());
        for container in containers {
            info!("Decompressing: {:?}", container);
            let dump = self.decompressor.decompress(&container)?;
            if !dump.is_file() {
                return Err(Error::Decompress(format!(
                    "{:?} was not produced from {:?}",
                    dump, container
                )));
            }
            dumps.push(dump);
        }

        // some payloads ship plain text
        if dumps.is_empty() {
            dumps = members
                .iter()
                .filter(|m| has_suffix(m, ".txt"))
                .cloned()
                .collect();
        }
        if dumps.is_empty() {
            dumps = entry.dump_paths(&self.archive_dir)?;
        }

        Ok(dumps)
    }
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.to_str().map_or(false, |p| p.ends_with(suffix))
}

/// Unzip `src` into `dst`, returning the paths of the extracted files.
///
/// Every member name is checked before anything is written:
/// absolute paths and paths going up (`..`) are refused.
pub fn unzip(src: &Path, dst: &Path) -> Result<Vec<PathBuf>, Error> {
    let file = File::open(src)?;
    let mut archive = ZipArchive::new(file)?;

    let mut targets = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index(index)?;
        let relative = sanitize_archive_path(entry.name())?;
        targets.push((index, dst.join(relative), entry.is_dir()));
    }

    let mut extracted = Vec::with_capacity(targets.len());
    for (index, path, is_dir) in targets {
        if is_dir {
            fs::create_dir_all(&path)?;
            continue;
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut entry = archive.by_index(index)?;
        let mut out = File::create(&path)?;
        io::copy(&mut entry, &mut out)?;

        extracted.push(path);
    }

    Ok(extracted)
}

fn sanitize_archive_path(name: &str) -> Result<PathBuf, Error> {
    let path = Path::new(name);
    if path.is_absolute() {
        return Err(Error::UnsafeArchivePath(path.to_path_buf()));
    }

    let mut sanitized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(segment) => sanitized.push(segment),
            Component::CurDir => {}
            _ => return Err(Error::UnsafeArchivePath(path.to_path_buf())),
        }
    }

    if sanitized.as_os_str().is_empty() {
        return Err(Error::UnsafeArchivePath(path.to_path_buf()));
    }

    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Pretends to decompress by stripping the `.xz` extension.
    struct Rename;

    impl Decompress for Rename {
        fn decompress(&self, container: &Path) -> Result<PathBuf, Error> {
            let dst = container.with_extension("");
            fs::rename(container, &dst)?;
            Ok(dst)
        }
    }

    struct Broken;

    impl Decompress for Broken {
        fn decompress(&self, _container: &Path) -> Result<PathBuf, Error> {
            Err(Error::Decompress("broken".to_string()))
        }
    }

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();
        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extract_payload() {
        let dir = tempfile::tempdir().unwrap();
        let entry = DumpEntry::new("goo-gl.zip", "ZIP");
        write_zip(
            &dir.path().join("goo-gl.zip"),
            &[("goo-gl/goo-gl.txt.xz", b"abc|https://example.com\n")],
        );

        let ex = Extractor::new(dir.path().to_path_buf(), Arc::new(Rename));
        let dumps = ex.extract(&entry).unwrap();

        assert_eq!(dumps, vec![dir.path().join("goo-gl/goo-gl.txt")]);
        assert_eq!(
            fs::read_to_string(&dumps[0]).unwrap(),
            "abc|https://example.com\n"
        );
        assert!(!dir.path().join("goo-gl.zip").exists());
    }

    #[test]
    fn stale_dumps_are_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let entry = DumpEntry::new("goo-gl.zip", "ZIP");
        fs::create_dir_all(dir.path().join("goo-gl")).unwrap();
        fs::write(dir.path().join("goo-gl/old.txt"), "stale").unwrap();
        write_zip(
            &dir.path().join("goo-gl.zip"),
            &[("goo-gl/new.txt.xz", b"fresh\n")],
        );

        let ex = Extractor::new(dir.path().to_path_buf(), Arc::new(Rename));
        let dumps = ex.extract(&entry).unwrap();

        assert_eq!(dumps, vec![dir.path().join("goo-gl/new.txt")]);
        assert!(!dir.path().join("goo-gl/old.txt").exists());
    }

    #[test]
    fn corrupt_payload_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let entry = DumpEntry::new("goo-gl.zip", "ZIP");
        fs::write(dir.path().join("goo-gl.zip"), b"this is not a zip").unwrap();

        let ex = Extractor::new(dir.path().to_path_buf(), Arc::new(Rename));
        assert!(matches!(ex.extract(&entry), Err(Error::Zip(_))));
        assert!(!dir.path().join("goo-gl.zip").exists());
    }

    #[test]
    fn path_traversal_is_refused() {
        let root = tempfile::tempdir().unwrap();
        let archive_dir = root.path().join("archive");
        fs::create_dir_all(&archive_dir).unwrap();
        let entry = DumpEntry::new("evil.zip", "ZIP");
        write_zip(
            &archive_dir.join("evil.zip"),
            &[
                ("evil/ok.txt.xz", b"fine"),
                ("../escaped.txt", b"gotcha"),
            ],
        );

        let ex = Extractor::new(archive_dir.clone(), Arc::new(Rename));
        let r = ex.extract(&entry);

        assert!(matches!(r, Err(Error::UnsafeArchivePath(_))));
        assert!(!root.path().join("escaped.txt").exists());
        // nothing at all is written when a member is refused
        assert!(!archive_dir.join("evil").exists());
        assert!(!archive_dir.join("evil.zip").exists());
    }

    #[test]
    fn decompression_failure() {
        let dir = tempfile::tempdir().unwrap();
        let entry = DumpEntry::new("goo-gl.zip", "ZIP");
        write_zip(
            &dir.path().join("goo-gl.zip"),
            &[("goo-gl/goo-gl.txt.xz", b"data")],
        );

        let ex = Extractor::new(dir.path().to_path_buf(), Arc::new(Broken));
        assert!(matches!(ex.extract(&entry), Err(Error::Decompress(_))));
        // container stays in its unzipped state, payload is gone
        assert!(dir.path().join("goo-gl/goo-gl.txt.xz").exists());
        assert!(!dir.path().join("goo-gl.zip").exists());
    }

    #[test]
    fn sanitize() {
        assert_eq!(
            sanitize_archive_path("./a/b.txt").unwrap(),
            PathBuf::from("a/b.txt")
        );
        assert!(sanitize_archive_path("/etc/passwd").is_err());
        assert!(sanitize_archive_path("a/../../b").is_err());
        assert!(sanitize_archive_path(".").is_err());
    }
}
