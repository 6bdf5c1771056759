use std::path::Path;

use crate::error::ConvertError;

/// Which pipeline a selected file goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Document,
    Image,
}

impl FileKind {
    /// Classify by extension. Anything outside the image set is a document.
    pub fn from_extension(ext: &str) -> Self {
        if is_image_extension(ext) {
            Self::Image
        } else {
            Self::Document
        }
    }

    /// Classify a path by its extension; a missing extension is a document.
    pub fn of_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map_or(Self::Document, Self::from_extension)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Image => "image",
        }
    }
}

/// One row of a file picker's filter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatGroup {
    pub description: &'static str,
    pub extensions: &'static [&'static str],
}

impl FormatGroup {
    fn contains(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Glob patterns for a picker, e.g. `*.doc;*.docx`.
    pub fn patterns(&self) -> String {
        self.extensions
            .iter()
            .map(|e| format!("*.{e}"))
            .collect::<Vec<_>>()
            .join(";")
    }
}

pub const DOCUMENT_FORMATS: &[FormatGroup] = &[
    FormatGroup {
        description: "Word documents",
        extensions: &["doc", "docx"],
    },
    FormatGroup {
        description: "Word templates",
        extensions: &["dot", "dotx"],
    },
    FormatGroup {
        description: "Macro-enabled documents",
        extensions: &["docm", "dotm"],
    },
    FormatGroup {
        description: "Rich text",
        extensions: &["rtf"],
    },
    FormatGroup {
        description: "Plain text",
        extensions: &["txt"],
    },
    FormatGroup {
        description: "Web pages",
        extensions: &["htm", "html"],
    },
    FormatGroup {
        description: "OpenDocument text",
        extensions: &["odt"],
    },
    FormatGroup {
        description: "XML documents",
        extensions: &["xml"],
    },
    FormatGroup {
        description: "PDF documents",
        extensions: &["pdf"],
    },
];

pub const IMAGE_FORMATS: &[FormatGroup] = &[
    FormatGroup {
        description: "JPEG images",
        extensions: &["jpg", "jpeg"],
    },
    FormatGroup {
        description: "PNG images",
        extensions: &["png"],
    },
    FormatGroup {
        description: "BMP images",
        extensions: &["bmp"],
    },
    FormatGroup {
        description: "GIF images",
        extensions: &["gif"],
    },
    FormatGroup {
        description: "TIFF images",
        extensions: &["tiff", "tif"],
    },
];

pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_FORMATS.iter().any(|g| g.contains(ext))
}

pub fn is_document_extension(ext: &str) -> bool {
    DOCUMENT_FORMATS.iter().any(|g| g.contains(ext))
}

/// Which office engine document conversion should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnginePreference {
    /// Word, then WPS, then LibreOffice.
    #[default]
    Auto,
    Word,
    Wps,
    LibreOffice,
}

impl EnginePreference {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "word" => Ok(Self::Word),
            "wps" => Ok(Self::Wps),
            "libreoffice" | "soffice" => Ok(Self::LibreOffice),
            other => Err(format!(
                "unknown engine: {other} (expected auto, word, wps or libreoffice)"
            )),
        }
    }
}

/// What to do when the selected "document" is already a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdfInputPolicy {
    /// Validate the PDF and copy it to the output location.
    #[default]
    PassThrough,
    /// Refuse PDF inputs.
    Reject,
}

impl PdfInputPolicy {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pass-through" | "passthrough" | "copy" => Ok(Self::PassThrough),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown PDF input policy: {other} (expected pass-through or reject)"
            )),
        }
    }
}

/// Options controlling the conversion process.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Resolution in DPI used to size image pages (`pixels * 72 / resolution` points).
    pub resolution: f32,
    /// JPEG quality (1-100) of embedded image streams.
    pub jpeg_quality: u8,
    /// Office engine to look for when converting documents.
    pub engine: EnginePreference,
    pub pdf_input: PdfInputPolicy,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            resolution: 100.0,
            jpeg_quality: 95,
            engine: EnginePreference::Auto,
            pdf_input: PdfInputPolicy::PassThrough,
        }
    }
}

impl ConvertOptions {
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(ConvertError::InvalidOption(format!(
                "resolution must be a positive number, got {}",
                self.resolution
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConvertError::InvalidOption(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}
