use std::{
    path::{Path, PathBuf},
    process::Command,
};

use log::debug;

use crate::error::Error;

/// Decompresses a container file in place.
pub trait Decompress: Send + Sync {
    /// Replace `container` by its decompressed content, returning the new path.
    fn decompress(&self, container: &Path) -> Result<PathBuf, Error>;
}

/// Runs `xz --decompress` on the container.
#[derive(Debug, Clone)]
pub struct XzCommand {
    program: String,
}

impl Default for XzCommand {
    fn default() -> Self {
        Self {
            program: "xz".to_string(),
        }
    }
}

impl XzCommand {
    /// Use another executable accepting the same arguments as `xz`.
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Decompress for XzCommand {
    fn decompress(&self, container: &Path) -> Result<PathBuf, Error> {
        debug!("{} --decompress {:?}", self.program, container);
        let output = Command::new(&self.program)
            .arg("--decompress")
            .arg(container)
            .output()?;

        if !output.status.success() {
            return Err(Error::Decompress(format!(
                "{:?}: {} ({})",
                container,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(decompressed_path(container))
    }
}

/// change `.../dump.txt.xz` into `.../dump.txt`
pub fn decompressed_path(container: &Path) -> PathBuf {
    container.with_extension("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_extension() {
        assert_eq!(
            decompressed_path(Path::new("a/goo-gl/dump.txt.xz")),
            PathBuf::from("a/goo-gl/dump.txt")
        );
    }

    #[test]
    #[cfg(unix)]
    fn failing_command() {
        let xz = XzCommand::with_program("false");
        let r = xz.decompress(Path::new("dump.txt.xz"));
        assert!(matches!(r, Err(Error::Decompress(_))));
    }

    #[test]
    #[cfg(unix)]
    fn succeeding_command() {
        let xz = XzCommand::with_program("true");
        let r = xz.decompress(Path::new("dump.txt.xz")).unwrap();
        assert_eq!(r, PathBuf::from("dump.txt"));
    }

    #[test]
    fn missing_program() {
        let xz = XzCommand::with_program("this-program-does-not-exist-42");
        let r = xz.decompress(Path::new("dump.txt.xz"));
        assert!(matches!(r, Err(Error::Io(_))));
    }
}
