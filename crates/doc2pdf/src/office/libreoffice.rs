//! LibreOffice in headless mode.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;
use tracing::debug;

use super::{EngineKind, EngineSession, OfficeEngine, file_url};
use crate::error::ConvertError;

/// Environment variable naming the `soffice` binary to use.
pub const SOFFICE_ENV: &str = "DOC2PDF_SOFFICE";

const PROGRAM_NAMES: &[&str] = &["soffice", "libreoffice"];

/// A LibreOffice installation, identified by its `soffice` binary.
#[derive(Debug, Clone)]
pub struct LibreOfficeEngine {
    program: PathBuf,
}

impl LibreOfficeEngine {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `$DOC2PDF_SOFFICE` if set, else the first of `soffice` / `libreoffice`
    /// that answers `--version`.
    pub fn locate() -> Option<Self> {
        Self::locate_with(std::env::var_os(SOFFICE_ENV))
    }

    fn locate_with(configured: Option<OsString>) -> Option<Self> {
        if let Some(program) = configured.filter(|p| !p.is_empty()) {
            return Some(Self::with_program(program));
        }
        PROGRAM_NAMES
            .iter()
            .map(|name| Self::with_program(*name))
            .find(|engine| engine.is_available())
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn export_error(&self, reason: impl Into<String>) -> ConvertError {
        ConvertError::EngineExport {
            engine: EngineKind::LibreOffice.name().to_string(),
            reason: reason.into(),
        }
    }
}

impl OfficeEngine for LibreOfficeEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::LibreOffice
    }

    fn is_available(&self) -> bool {
        match Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) => output.status.success(),
            Err(e) => {
                debug!(program = %self.program.display(), error = %e, "soffice not runnable");
                false
            }
        }
    }

    fn launch(&self) -> Result<Box<dyn EngineSession + '_>, ConvertError> {
        let profile = tempfile::Builder::new()
            .prefix("doc2pdf-lo-profile-")
            .tempdir()?;
        let outdir = tempfile::Builder::new().prefix("doc2pdf-lo-out-").tempdir()?;
        Ok(Box::new(LibreOfficeSession {
            engine: self,
            profile,
            outdir,
        }))
    }
}

/// A private LibreOffice profile plus a scratch output directory.
///
/// The profile keeps the headless instance from attaching to a desktop
/// instance the user already has open. Both directories go away on drop.
struct LibreOfficeSession<'a> {
    engine: &'a LibreOfficeEngine,
    profile: TempDir,
    outdir: TempDir,
}

impl LibreOfficeSession<'_> {
    fn command(&self, input: &Path) -> Command {
        let mut cmd = Command::new(&self.engine.program);
        cmd.arg("--headless")
            .arg("--norestore")
            .arg("--nolockcheck")
            .arg(format!(
                "-env:UserInstallation={}",
                file_url(self.profile.path())
            ))
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(self.outdir.path())
            .arg(input)
            .stdin(Stdio::null());
        cmd
    }
}

impl EngineSession for LibreOfficeSession<'_> {
    fn export_pdf(&mut self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        let stem = input
            .file_stem()
            .ok_or_else(|| self.engine.export_error("input has no file name"))?;

        let mut cmd = self.command(input);
        debug!(?cmd, "running LibreOffice");
        let result = cmd
            .output()
            .map_err(|e| self.engine.export_error(format!("failed to run soffice: {e}")))?;

        let stderr = String::from_utf8_lossy(&result.stderr);
        if !result.status.success() {
            return Err(self
                .engine
                .export_error(format!("soffice exited with {}: {}", result.status, stderr.trim())));
        }

        let mut name = stem.to_os_string();
        name.push(".pdf");
        let produced = self.outdir.path().join(name);
        if !produced.is_file() {
            let detail = if stderr.trim().is_empty() {
                "no PDF was produced".to_string()
            } else {
                format!("no PDF was produced: {}", stderr.trim())
            };
            return Err(self.engine.export_error(detail));
        }

        // The scratch directory may be on another filesystem than `output`.
        std::fs::copy(&produced, output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_program_wins() {
        let engine = LibreOfficeEngine::locate_with(Some(OsString::from("/opt/lo/soffice"))).unwrap();
        assert_eq!(engine.program(), Path::new("/opt/lo/soffice"));
        assert_eq!(engine.kind(), EngineKind::LibreOffice);
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let engine = LibreOfficeEngine::with_program("/nonexistent/doc2pdf/soffice");
        assert!(!engine.is_available());
    }

    #[test]
    fn test_session_dirs_removed_on_drop() {
        let engine = LibreOfficeEngine::with_program("/nonexistent/doc2pdf/soffice");
        let session = LibreOfficeSession {
            engine: &engine,
            profile: tempfile::tempdir().unwrap(),
            outdir: tempfile::tempdir().unwrap(),
        };
        let profile = session.profile.path().to_path_buf();
        let outdir = session.outdir.path().to_path_buf();
        drop(session);
        assert!(!profile.exists());
        assert!(!outdir.exists());
    }

    #[test]
    fn test_export_with_missing_program_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let engine = LibreOfficeEngine::with_program("/nonexistent/doc2pdf/soffice");
        let result = super::super::export_with(
            &engine,
            &dir.path().join("report.docx"),
            &dir.path().join("report.pdf"),
        );
        assert!(matches!(result, Err(ConvertError::EngineExport { .. })));
        assert!(!dir.path().join("report.pdf").exists());
    }

    /// A fake `soffice` that finds `--outdir` and the input among its
    /// arguments and runs `body` with `$out` and `$stem` set.
    #[cfg(unix)]
    fn stub_soffice(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = format!(
            "#!/bin/sh\n\
             prev=\"\"\n\
             for arg in \"$@\"; do\n\
             \x20 if [ \"$prev\" = \"--outdir\" ]; then out=\"$arg\"; fi\n\
             \x20 prev=\"$arg\"\n\
             done\n\
             name=$(basename \"$prev\")\n\
             stem=\"${{name%.*}}\"\n\
             {body}\n"
        );
        let path = dir.join("soffice");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_export_copies_produced_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let program = stub_soffice(
            dir.path(),
            "printf '%%PDF-1.5 from stub' > \"$out/$stem.pdf\"",
        );
        let input = dir.path().join("report.v2.docx");
        std::fs::write(&input, b"PK").unwrap();
        let output = dir.path().join("final.pdf");

        let engine = LibreOfficeEngine::with_program(program);
        super::super::export_with(&engine, &input, &output).unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"%PDF-1.5 from stub");
    }

    #[cfg(unix)]
    #[test]
    fn test_export_without_produced_pdf_fails() {
        let dir = tempfile::tempdir().unwrap();
        let program = stub_soffice(dir.path(), "echo 'source file could not be loaded' >&2");
        let input = dir.path().join("report.docx");
        std::fs::write(&input, b"PK").unwrap();
        let output = dir.path().join("report.pdf");

        let engine = LibreOfficeEngine::with_program(program);
        let err = super::super::export_with(&engine, &input, &output).unwrap_err();

        match err {
            ConvertError::EngineExport { reason, .. } => {
                assert!(reason.contains("no PDF was produced"), "{reason}");
                assert!(reason.contains("could not be loaded"), "{reason}");
            }
            other => panic!("expected EngineExport, got {other:?}"),
        }
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_export_nonzero_exit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let program = stub_soffice(dir.path(), "exit 3");
        let input = dir.path().join("report.docx");
        std::fs::write(&input, b"PK").unwrap();

        let engine = LibreOfficeEngine::with_program(program);
        let result = super::super::export_with(&engine, &input, &dir.path().join("report.pdf"));
        assert!(matches!(result, Err(ConvertError::EngineExport { .. })));
    }

    #[test]
    fn test_command_uses_private_profile() {
        let engine = LibreOfficeEngine::with_program("soffice");
        let session = LibreOfficeSession {
            engine: &engine,
            profile: tempfile::tempdir().unwrap(),
            outdir: tempfile::tempdir().unwrap(),
        };
        let cmd = session.command(Path::new("/docs/report.docx"));
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.contains(&"--headless".to_string()));
        assert!(args.iter().any(|a| a.starts_with("-env:UserInstallation=file://")));
        assert_eq!(args.last().map(String::as_str), Some("/docs/report.docx"));
    }
}
