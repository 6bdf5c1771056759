use std::path::PathBuf;

use thiserror::Error;

use crate::config::FileKind;

/// Errors that can occur while selecting or converting a file.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("no input file selected")]
    MissingInput,

    #[error("no output directory selected")]
    MissingOutputDir,

    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("output directory not found: {}", .0.display())]
    OutputDirNotFound(PathBuf),

    #[error("invalid image file: {0}")]
    InvalidImage(String),

    #[error("invalid PDF: {0}")]
    InvalidPdf(String),

    #[error("no office engine available (install Microsoft Word, WPS Office or LibreOffice)")]
    NoOfficeEngine,

    #[error("{engine} failed to export PDF: {reason}")]
    EngineExport { engine: String, reason: String },

    #[error("image encoding failed: {0}")]
    Encode(String),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Selection mistakes the user can fix by picking again, as opposed to
    /// failures of the conversion itself.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::MissingInput
                | Self::MissingOutputDir
                | Self::InputNotFound(_)
                | Self::OutputDirNotFound(_)
                | Self::InvalidOption(_)
        )
    }
}

/// A non-fatal warning emitted when an element cannot be fully processed.
#[derive(Debug, Clone)]
pub struct ConvertWarning {
    /// Description of the element that caused the warning.
    pub element: String,
    /// Reason the element could not be processed.
    pub reason: String,
}

impl ConvertWarning {
    pub fn new(element: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ConvertWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.element, self.reason)
    }
}

/// Result of a successful conversion.
#[derive(Debug)]
pub struct ConvertResult {
    /// Where the PDF was written.
    pub output: PathBuf,
    /// Pipeline that produced it.
    pub kind: FileKind,
    /// Page count of the written PDF.
    pub pages: u32,
    /// Warnings collected during conversion (non-fatal issues).
    pub warnings: Vec<ConvertWarning>,
}
