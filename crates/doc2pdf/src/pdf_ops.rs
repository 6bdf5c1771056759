//! PDF inspection: page counting for written output and PDF inputs.

use std::path::Path;

use lopdf::Document;

use crate::error::ConvertError;

/// Count the number of pages in a PDF.
pub fn page_count(input: &[u8]) -> Result<u32, ConvertError> {
    let doc = Document::load_mem(input).map_err(|e| ConvertError::InvalidPdf(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

/// Count the pages of a PDF on disk, failing if it cannot be parsed.
pub fn inspect(path: &Path) -> Result<u32, ConvertError> {
    let data = std::fs::read(path)?;
    page_count(&data).map_err(|e| match e {
        ConvertError::InvalidPdf(reason) => {
            ConvertError::InvalidPdf(format!("{}: {reason}", path.display()))
        }
        other => other,
    })
}
