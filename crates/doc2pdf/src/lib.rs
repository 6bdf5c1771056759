pub mod config;
pub mod error;
pub mod ir;
pub mod office;
pub mod output;
pub mod parser;
pub mod pdf_ops;
pub mod render;
pub mod session;

use std::path::{Path, PathBuf};

use tracing::info;

use config::{ConvertOptions, FileKind, PdfInputPolicy};
use error::{ConvertError, ConvertResult, ConvertWarning};
use office::OfficeEngine;
use output::Staging;
use parser::Parser;
use parser::image::ImageParser;

pub use output::output_path_for;
pub use session::{Outcome, Session};

/// Convert `input` into `<output_dir>/<stem>.pdf`, choosing the pipeline by
/// extension.
///
/// Images never need `engine`. Every other file is a document and fails with
/// [`ConvertError::NoOfficeEngine`] when `engine` is `None`.
pub fn convert(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    engine: Option<&dyn OfficeEngine>,
    options: &ConvertOptions,
) -> Result<ConvertResult, ConvertError> {
    let input = input.as_ref();
    match FileKind::of_path(input) {
        FileKind::Image => convert_image(input, output_dir, options),
        FileKind::Document => convert_document(input, output_dir, engine, options),
    }
}

/// Convert an image file to a PDF with one page per frame.
pub fn convert_image(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<ConvertResult, ConvertError> {
    let input = input.as_ref();
    let target = prepare(input, output_dir.as_ref(), options)?;

    info!(input = %input.display(), "converting image");
    let data = std::fs::read(input)?;
    let title = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned());
    let (pdf, pages, warnings) = render_image(&data, title, options)?;

    let staging = Staging::new(&target)?;
    staging.write(&pdf)?;
    let output = staging.commit()?;
    info!(output = %output.display(), pages, "image converted");

    Ok(ConvertResult {
        output,
        kind: FileKind::Image,
        pages,
        warnings,
    })
}

/// Convert raw image bytes to PDF bytes, returning any warnings.
pub fn image_to_pdf(
    data: &[u8],
    options: &ConvertOptions,
) -> Result<(Vec<u8>, Vec<ConvertWarning>), ConvertError> {
    options.validate()?;
    let (pdf, _, warnings) = render_image(data, None, options)?;
    Ok((pdf, warnings))
}

fn render_image(
    data: &[u8],
    title: Option<String>,
    options: &ConvertOptions,
) -> Result<(Vec<u8>, u32, Vec<ConvertWarning>), ConvertError> {
    let (mut doc, warnings) = ImageParser.parse(data, options)?;
    doc.metadata.title = title;
    let pdf = render::pdf::render_pdf(&doc)?;
    Ok((pdf, doc.pages.len() as u32, warnings))
}

/// Convert a document through an office engine.
///
/// A PDF source is copied or rejected according to
/// [`ConvertOptions::pdf_input`] instead of being sent to the engine.
pub fn convert_document(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    engine: Option<&dyn OfficeEngine>,
    options: &ConvertOptions,
) -> Result<ConvertResult, ConvertError> {
    let input = input.as_ref();
    let engine = engine.ok_or(ConvertError::NoOfficeEngine)?;
    let target = prepare(input, output_dir.as_ref(), options)?;
    let staging = Staging::new(&target)?;

    let is_pdf = input
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        if options.pdf_input == PdfInputPolicy::Reject {
            return Err(ConvertError::UnsupportedFormat(
                "input is already a PDF".to_string(),
            ));
        }
        info!(input = %input.display(), "copying PDF input");
        pdf_ops::inspect(input)?;
        std::fs::copy(input, staging.path())?;
    } else {
        let source = std::path::absolute(input)?;
        info!(input = %source.display(), engine = %engine.kind(), "converting document");
        office::export_with(engine, &source, staging.path())?;
    }

    let pages = pdf_ops::inspect(staging.path()).map_err(|e| match e {
        ConvertError::InvalidPdf(reason) if !is_pdf => ConvertError::EngineExport {
            engine: engine.kind().name().to_string(),
            reason: format!("engine produced an unreadable PDF: {reason}"),
        },
        other => other,
    })?;
    let output = staging.commit()?;
    info!(output = %output.display(), pages, "document converted");

    Ok(ConvertResult {
        output,
        kind: FileKind::Document,
        pages,
        warnings: Vec::new(),
    })
}

/// Check options, input and output directory; return the final output path.
fn prepare(
    input: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
) -> Result<PathBuf, ConvertError> {
    options.validate()?;
    if !input.is_file() {
        return Err(ConvertError::InputNotFound(input.to_path_buf()));
    }
    if !output_dir.is_dir() {
        return Err(ConvertError::OutputDirNotFound(output_dir.to_path_buf()));
    }
    output_path_for(input, output_dir)
}
