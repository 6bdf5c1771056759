/// An encoded raster image ready to be embedded as a PDF image XObject.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub data: Vec<u8>,
    pub encoding: ImageEncoding,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// How `ImageData::data` is encoded. Always 8 bits per component, DeviceRGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// Baseline JPEG, embedded with `/DCTDecode`.
    Jpeg,
    /// Raw interleaved RGB samples, Flate-compressed when the PDF is written.
    RawRgb,
}

impl ImageEncoding {
    /// PDF filter name for the stream, if any.
    pub fn pdf_filter(self) -> Option<&'static str> {
        match self {
            Self::Jpeg => Some("DCTDecode"),
            Self::RawRgb => None,
        }
    }
}
