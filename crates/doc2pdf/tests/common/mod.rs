//! Shared test utilities for integration tests.
#![allow(dead_code)]

use std::cell::Cell;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use doc2pdf::config::ConvertOptions;
use doc2pdf::error::ConvertError;
use doc2pdf::office::{EngineKind, EngineSession, OfficeEngine};
use image::codecs::gif::GifEncoder;
use image::{DynamicImage, Frame, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

/// Encode a solid-color RGB image in `format`.
pub fn image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 90])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("should encode test image");
    buf.into_inner()
}

/// An animated GIF with `frames` distinct frames.
pub fn gif_bytes(frames: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        let frames = (0..frames).map(|i| {
            Frame::new(RgbaImage::from_pixel(
                16,
                16,
                Rgba([(i * 60 % 256) as u8, 0, 255, 255]),
            ))
        });
        encoder.encode_frames(frames).expect("should encode GIF");
    }
    buf
}

/// A PNG cut off halfway through its pixel data.
pub fn truncated_png() -> Vec<u8> {
    let mut data = image_bytes(64, 64, ImageFormat::Png);
    data.truncate(data.len() / 2);
    data
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("should write fixture");
    path
}

/// Number of entries directly inside `dir`.
pub fn entry_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).expect("should list dir").count()
}

/// A valid PDF with `pages` pages, one per frame of a generated GIF.
pub fn pdf_bytes(pages: u32) -> Vec<u8> {
    let (pdf, _) = doc2pdf::image_to_pdf(&gif_bytes(pages as usize), &ConvertOptions::default())
        .expect("should render test PDF");
    pdf
}

/// How a [`FakeEngine`] answers export requests.
#[derive(Clone, Copy)]
pub enum FakeBehavior {
    /// Write a PDF with this many pages.
    Pages(u32),
    /// Report an export failure.
    Fail,
    /// Write bytes that are not a PDF.
    Garbage,
}

/// An office engine that never leaves the process.
///
/// Counts launched sessions and how many of them were released.
pub struct FakeEngine {
    pub behavior: FakeBehavior,
    pub launched: Rc<Cell<u32>>,
    pub released: Rc<Cell<u32>>,
}

impl FakeEngine {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            launched: Rc::new(Cell::new(0)),
            released: Rc::new(Cell::new(0)),
        }
    }
}

struct FakeSession {
    behavior: FakeBehavior,
    released: Rc<Cell<u32>>,
}

impl OfficeEngine for FakeEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Word
    }

    fn is_available(&self) -> bool {
        true
    }

    fn launch(&self) -> Result<Box<dyn EngineSession + '_>, ConvertError> {
        self.launched.set(self.launched.get() + 1);
        Ok(Box::new(FakeSession {
            behavior: self.behavior,
            released: Rc::clone(&self.released),
        }))
    }
}

impl EngineSession for FakeSession {
    fn export_pdf(&mut self, _input: &Path, output: &Path) -> Result<(), ConvertError> {
        match self.behavior {
            FakeBehavior::Pages(n) => std::fs::write(output, pdf_bytes(n))?,
            FakeBehavior::Fail => {
                return Err(ConvertError::EngineExport {
                    engine: "fake".to_string(),
                    reason: "document is password protected".to_string(),
                });
            }
            FakeBehavior::Garbage => std::fs::write(output, b"not a pdf")?,
        }
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

/// Validate PDF bytes using `qpdf --check`.
///
/// Returns `true` if validation was performed and passed, `false` if skipped.
///
/// Validation is skipped when:
/// - `DOC2PDF_VALIDATE_PDF` env var is not set to `"1"`
/// - `qpdf` is not installed on the system
///
/// Panics if `qpdf --check` reports the PDF is invalid.
pub fn validate_pdf_with_qpdf(pdf_bytes: &[u8]) -> bool {
    if std::env::var("DOC2PDF_VALIDATE_PDF").unwrap_or_default() != "1" {
        return false;
    }

    match std::process::Command::new("qpdf").arg("--version").output() {
        Ok(output) if output.status.success() => {}
        _ => {
            eprintln!("[WARN] qpdf not installed, skipping PDF validation");
            return false;
        }
    }

    let file = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .expect("should create temp PDF file");
    std::fs::write(file.path(), pdf_bytes).expect("should write temp PDF file");

    let output = std::process::Command::new("qpdf")
        .arg("--check")
        .arg(file.path())
        .output()
        .expect("should run qpdf");

    assert!(
        output.status.success(),
        "qpdf --check failed:\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    );

    true
}
