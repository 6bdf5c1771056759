//! Selection state: the one file being converted and where its PDF goes.
//!
//! This is the layer a front end drives. Every operation either succeeds and
//! updates the state, or fails and leaves the previous state untouched.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{ConvertOptions, DOCUMENT_FORMATS, FileKind, IMAGE_FORMATS};
use crate::error::{ConvertError, ConvertResult};
use crate::office::{self, EngineKind, OfficeEngine};
use crate::parser::image::{ImageInfo, verify_image};

/// The currently selected input file.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub path: PathBuf,
    pub kind: FileKind,
    /// Present for images, which are fully decoded when selected.
    pub image: Option<ImageInfo>,
}

impl Selection {
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}

/// Success or failure of one conversion, with a message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    pub fn from_result(result: &Result<ConvertResult, ConvertError>) -> Self {
        match result {
            Ok(done) => Self {
                success: true,
                message: format!(
                    "{} converted successfully ({} page{})",
                    display_name(&done.output),
                    done.pages,
                    if done.pages == 1 { "" } else { "s" }
                ),
            },
            Err(e) => Self {
                success: false,
                message: e.to_string(),
            },
        }
    }
}

pub struct Session {
    selected: Option<Selection>,
    output_dir: Option<PathBuf>,
    engine: Option<Box<dyn OfficeEngine>>,
    options: ConvertOptions,
    status: String,
}

impl Session {
    /// Start a session, detecting an office engine per `options.engine`.
    pub fn new(options: ConvertOptions) -> Self {
        let engine = office::detect(options.engine);
        if engine.is_none() {
            warn!("no office engine detected; only images can be converted");
        }
        Self::with_engine(engine, options)
    }

    /// Start a session with an already chosen engine (or none).
    pub fn with_engine(engine: Option<Box<dyn OfficeEngine>>, options: ConvertOptions) -> Self {
        Self {
            selected: None,
            output_dir: None,
            engine,
            options,
            status: "Ready".to_string(),
        }
    }

    pub fn engine_kind(&self) -> Option<EngineKind> {
        self.engine.as_ref().map(|e| e.kind())
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selected.as_ref()
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// One-line description of the last thing that happened.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Select a file picked from the document list.
    ///
    /// The extension still decides the pipeline at conversion time.
    pub fn select_document(&mut self, path: impl AsRef<Path>) -> Result<&Selection, ConvertError> {
        let path = path.as_ref();
        self.check_exists(path)?;
        let selection = Selection {
            path: path.to_path_buf(),
            kind: FileKind::of_path(path),
            image: None,
        };
        self.status = format!("Selected {}: {}", selection.kind.label(), selection.file_name());
        Ok(&*self.selected.insert(selection))
    }

    /// Select an image, decoding it fully first so corrupt files are refused
    /// up front.
    pub fn select_image(&mut self, path: impl AsRef<Path>) -> Result<&Selection, ConvertError> {
        let path = path.as_ref();
        self.check_exists(path)?;
        let info = std::fs::read(path)
            .map_err(ConvertError::from)
            .and_then(|data| verify_image(&data))
            .inspect_err(|e| self.status = format!("Error: {e}"))?;
        info!(path = %path.display(), frames = info.frames, "image selected");

        let selection = Selection {
            path: path.to_path_buf(),
            kind: FileKind::Image,
            image: Some(info),
        };
        self.status = format!("Selected {}: {}", selection.kind.label(), selection.file_name());
        Ok(&*self.selected.insert(selection))
    }

    /// Select any file, routing by extension.
    pub fn select_file(&mut self, path: impl AsRef<Path>) -> Result<&Selection, ConvertError> {
        let path = path.as_ref();
        match FileKind::of_path(path) {
            FileKind::Image => self.select_image(path),
            FileKind::Document => self.select_document(path),
        }
    }

    pub fn select_output_dir(&mut self, path: impl AsRef<Path>) -> Result<(), ConvertError> {
        let path = path.as_ref();
        if !path.is_dir() {
            self.status = "Error: output directory not found".to_string();
            return Err(ConvertError::OutputDirNotFound(path.to_path_buf()));
        }
        self.status = format!("Output directory: {}", path.display());
        self.output_dir = Some(path.to_path_buf());
        Ok(())
    }

    /// Forget the selected file, keeping the output directory.
    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.status = "Ready - select a new file".to_string();
    }

    /// Convert the selected file into the selected output directory.
    ///
    /// On failure nothing is written and the selection is kept.
    pub fn convert(&mut self) -> Result<ConvertResult, ConvertError> {
        let Some(selection) = self.selected.as_ref() else {
            self.status = "Warning: no file selected".to_string();
            return Err(ConvertError::MissingInput);
        };
        let Some(output_dir) = self.output_dir.as_deref() else {
            self.status = "Warning: no output directory selected".to_string();
            return Err(ConvertError::MissingOutputDir);
        };

        let name = selection.file_name();
        let result = crate::convert(
            &selection.path,
            output_dir,
            self.engine.as_deref(),
            &self.options,
        );
        self.status = match &result {
            Ok(_) => format!("Converted: {name}"),
            Err(e) => format!("Error: {e}"),
        };
        result
    }

    /// The "supported formats" listing for this session's engine.
    pub fn formats_report(&self) -> String {
        formats_report(self.engine_kind())
    }
}

/// List both format groups and which engine documents would go through.
pub fn formats_report(engine: Option<EngineKind>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Documents:");
    for group in DOCUMENT_FORMATS {
        let _ = writeln!(out, "  - {} ({})", group.description, group.patterns());
    }
    let _ = writeln!(out, "Images:");
    for group in IMAGE_FORMATS {
        let _ = writeln!(out, "  - {} ({})", group.description, group.patterns());
    }
    let engine = engine.map_or("none (documents cannot be converted)", EngineKind::name);
    let _ = writeln!(out, "Office engine: {engine}");
    out
}

impl Session {
    fn check_exists(&mut self, path: &Path) -> Result<(), ConvertError> {
        if path.is_file() {
            return Ok(());
        }
        self.status = "Error: file not found".to_string();
        Err(ConvertError::InputNotFound(path.to_path_buf()))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
