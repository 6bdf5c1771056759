//! Output placement. A PDF only appears at its final path once it is complete.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::ConvertError;

/// `<output_dir>/<input stem>.pdf`.
pub fn output_path_for(input: &Path, output_dir: &Path) -> Result<PathBuf, ConvertError> {
    let stem = input
        .file_stem()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ConvertError::UnsupportedFormat(format!("no file name in {}", input.display()))
        })?;
    let mut name: OsString = stem.to_os_string();
    name.push(".pdf");
    Ok(output_dir.join(name))
}

/// A hidden scratch directory next to the final output.
///
/// Being on the same filesystem lets [`Staging::commit`] move the finished
/// file into place with a rename. Whatever is left in the directory is
/// removed when the staging is dropped, so a failed conversion leaves
/// nothing behind.
pub(crate) struct Staging {
    dir: TempDir,
    target: PathBuf,
    staged: PathBuf,
}

impl Staging {
    pub(crate) fn new(target: &Path) -> Result<Self, ConvertError> {
        let parent = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let file_name = target.file_name().ok_or_else(|| {
            ConvertError::UnsupportedFormat(format!("no file name in {}", target.display()))
        })?;
        let dir = tempfile::Builder::new()
            .prefix(".doc2pdf-")
            .tempdir_in(parent)?;
        let staged = dir.path().join(file_name);
        Ok(Self {
            dir,
            target: target.to_path_buf(),
            staged,
        })
    }

    /// Where the producer should write the PDF.
    pub(crate) fn path(&self) -> &Path {
        &self.staged
    }

    pub(crate) fn write(&self, bytes: &[u8]) -> Result<(), ConvertError> {
        fs::write(&self.staged, bytes)?;
        Ok(())
    }

    /// Move the staged file to its final path, replacing any previous file.
    pub(crate) fn commit(self) -> Result<PathBuf, ConvertError> {
        if !self.staged.is_file() {
            return Err(ConvertError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("nothing was written to {}", self.staged.display()),
            )));
        }
        fs::rename(&self.staged, &self.target)?;
        debug!(output = %self.target.display(), scratch = %self.dir.path().display(), "committed output");
        Ok(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_keeps_base_name() {
        assert_eq!(
            output_path_for(Path::new("/in/photo.png"), Path::new("/out")).unwrap(),
            PathBuf::from("/out/photo.pdf")
        );
        assert_eq!(
            output_path_for(Path::new("report.v2.docx"), Path::new("/out")).unwrap(),
            PathBuf::from("/out/report.v2.pdf")
        );
        assert_eq!(
            output_path_for(Path::new("README"), Path::new("/out")).unwrap(),
            PathBuf::from("/out/README.pdf")
        );
    }

    #[test]
    fn test_output_path_requires_file_name() {
        assert!(output_path_for(Path::new("/"), Path::new("/out")).is_err());
    }

    #[test]
    fn test_commit_moves_file_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("photo.pdf");
        let staging = Staging::new(&target).unwrap();
        staging.write(b"%PDF-1.5").unwrap();
        let written = staging.commit().unwrap();

        assert_eq!(written, target);
        assert_eq!(fs::read(&target).unwrap(), b"%PDF-1.5");
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "scratch directory should be gone");
    }

    #[test]
    fn test_dropped_staging_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("photo.pdf");
        {
            let staging = Staging::new(&target).unwrap();
            staging.write(b"partial").unwrap();
        }
        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_commit_replaces_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("photo.pdf");
        fs::write(&target, b"old").unwrap();
        let staging = Staging::new(&target).unwrap();
        staging.write(b"new").unwrap();
        staging.commit().unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn test_commit_without_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(&dir.path().join("photo.pdf")).unwrap();
        assert!(matches!(staging.commit(), Err(ConvertError::Io(_))));
    }
}
