//! Office engines used by the document pipeline.
//!
//! An engine is an external, separately installed application. Converting a
//! document launches a hidden instance of it as an [`EngineSession`]; the
//! session terminates the instance when it is dropped, so the instance is
//! released on every exit path, including a failed export.

pub mod com;
pub mod libreoffice;

use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use crate::config::EnginePreference;
use crate::error::ConvertError;

pub use com::ComEngine;
pub use libreoffice::LibreOfficeEngine;

/// The office suites doc2pdf knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Word,
    Wps,
    LibreOffice,
}

impl EngineKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Word => "Microsoft Word",
            Self::Wps => "WPS Office",
            Self::LibreOffice => "LibreOffice",
        }
    }

    /// COM automation endpoint, for the engines reached through COM.
    pub fn prog_id(self) -> Option<&'static str> {
        match self {
            Self::Word => Some("Word.Application"),
            Self::Wps => Some("Kwps.Application"),
            Self::LibreOffice => None,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An installed office application that can export documents as PDF.
pub trait OfficeEngine {
    fn kind(&self) -> EngineKind;

    /// Whether the engine can actually be started on this machine.
    fn is_available(&self) -> bool;

    /// Start a hidden instance. Dropping the session shuts it down.
    fn launch(&self) -> Result<Box<dyn EngineSession + '_>, ConvertError>;
}

/// A running, hidden engine instance.
pub trait EngineSession {
    /// Open `input`, export it as PDF to `output`, and close the document.
    ///
    /// Both paths are absolute. `output` does not exist yet.
    fn export_pdf(&mut self, input: &Path, output: &Path) -> Result<(), ConvertError>;
}

/// Engines to try for a preference, in detection order.
pub fn candidates(preference: EnginePreference) -> Vec<Box<dyn OfficeEngine>> {
    let kinds: &[EngineKind] = match preference {
        EnginePreference::Auto => &[EngineKind::Word, EngineKind::Wps, EngineKind::LibreOffice],
        EnginePreference::Word => &[EngineKind::Word],
        EnginePreference::Wps => &[EngineKind::Wps],
        EnginePreference::LibreOffice => &[EngineKind::LibreOffice],
    };

    let mut engines: Vec<Box<dyn OfficeEngine>> = Vec::new();
    for kind in kinds {
        match kind {
            EngineKind::Word | EngineKind::Wps => {
                if let Some(engine) = ComEngine::new(*kind) {
                    engines.push(Box::new(engine));
                }
            }
            EngineKind::LibreOffice => {
                if let Some(engine) = LibreOfficeEngine::locate() {
                    engines.push(Box::new(engine));
                }
            }
        }
    }
    engines
}

/// Find the first available engine for the given preference.
pub fn detect(preference: EnginePreference) -> Option<Box<dyn OfficeEngine>> {
    for engine in candidates(preference) {
        debug!(engine = %engine.kind(), "checking office engine");
        if engine.is_available() {
            info!(engine = %engine.kind(), "detected office engine");
            return Some(engine);
        }
    }
    info!(?preference, "no office engine detected");
    None
}

/// Export one document through a fresh hidden instance of `engine`.
///
/// The instance is shut down before this returns, whether or not the export
/// succeeded.
pub fn export_with(
    engine: &dyn OfficeEngine,
    input: &Path,
    output: &Path,
) -> Result<(), ConvertError> {
    let mut session = engine.launch()?;
    session.export_pdf(input, output)
}

/// Percent-encode the characters that break a `file://` URL argument.
pub(crate) fn file_url(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let mut encoded = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            ' ' => encoded.push_str("%20"),
            '#' => encoded.push_str("%23"),
            '%' => encoded.push_str("%25"),
            '?' => encoded.push_str("%3F"),
            _ => encoded.push(ch),
        }
    }
    if encoded.starts_with('/') {
        format!("file://{encoded}")
    } else {
        format!("file:///{encoded}")
    }
}
