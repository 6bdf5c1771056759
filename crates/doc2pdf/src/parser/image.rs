use std::io::Cursor;

use image::codecs::gif::GifDecoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngDecoder;
use image::{AnimationDecoder, ColorType, DynamicImage, ImageFormat, ImageReader, RgbImage};
use tracing::debug;

use crate::config::ConvertOptions;
use crate::error::{ConvertError, ConvertWarning};
use crate::ir::{Document, ImageData, ImageEncoding, Metadata, Page, PageSize};

use super::Parser;

/// What a successful validation pass learned about an image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// Number of frames; 1 for still images.
    pub frames: usize,
    pub color: ColorType,
}

/// Parser for raster images (JPEG, PNG, BMP, GIF, TIFF).
///
/// Every frame of an animated GIF or APNG becomes one page.
pub struct ImageParser;

impl Parser for ImageParser {
    fn parse(
        &self,
        data: &[u8],
        options: &ConvertOptions,
    ) -> Result<(Document, Vec<ConvertWarning>), ConvertError> {
        let frames = decode_frames(data)?;
        let mut warnings = Vec::new();
        let mut pages = Vec::with_capacity(frames.len());

        for (index, frame) in frames.into_iter().enumerate() {
            let color = frame.color();
            if color != ColorType::Rgb8 {
                warnings.push(ConvertWarning::new(
                    format!("frame {}", index + 1),
                    format!("converted from {color:?} to RGB"),
                ));
            }
            let rgb = frame.into_rgb8();
            let size = PageSize::from_pixels(rgb.width(), rgb.height(), options.resolution);
            let image = encode_frame(&rgb, options.jpeg_quality)?;
            pages.push(Page { size, image });
        }

        let doc = Document {
            metadata: Metadata {
                title: None,
                producer: Some(format!("doc2pdf {}", env!("CARGO_PKG_VERSION"))),
            },
            pages,
        };
        Ok((doc, warnings))
    }
}

/// Decode the image completely, frame by frame, without producing any output.
///
/// This catches truncated and corrupt files that a header-only check would
/// accept.
pub fn verify_image(data: &[u8]) -> Result<ImageInfo, ConvertError> {
    let format = guess_format(data)?;
    let frames = decode_frames(data)?;
    let first = frames
        .first()
        .ok_or_else(|| ConvertError::InvalidImage("image contains no frames".to_string()))?;

    Ok(ImageInfo {
        format,
        width: first.width(),
        height: first.height(),
        frames: frames.len(),
        color: first.color(),
    })
}

/// Decode every frame of the image. Still images yield a single frame.
pub fn decode_frames(data: &[u8]) -> Result<Vec<DynamicImage>, ConvertError> {
    let format = guess_format(data)?;
    let frames = match format {
        ImageFormat::Gif => {
            let decoder = GifDecoder::new(Cursor::new(data)).map_err(invalid)?;
            collect_animation(decoder)?
        }
        ImageFormat::Png => {
            let decoder = PngDecoder::new(Cursor::new(data)).map_err(invalid)?;
            if decoder.is_apng().map_err(invalid)? {
                collect_animation(decoder.apng().map_err(invalid)?)?
            } else {
                vec![decode_still(data, format)?]
            }
        }
        _ => vec![decode_still(data, format)?],
    };
    debug!(?format, frames = frames.len(), "decoded image");
    Ok(frames)
}

fn guess_format(data: &[u8]) -> Result<ImageFormat, ConvertError> {
    if data.is_empty() {
        return Err(ConvertError::InvalidImage("file is empty".to_string()));
    }
    image::guess_format(data)
        .map_err(|_| ConvertError::InvalidImage("unrecognized image format".to_string()))
}

fn decode_still(data: &[u8], format: ImageFormat) -> Result<DynamicImage, ConvertError> {
    let mut reader = ImageReader::new(Cursor::new(data));
    reader.set_format(format);
    reader.decode().map_err(invalid)
}

fn collect_animation<'a>(
    decoder: impl AnimationDecoder<'a>,
) -> Result<Vec<DynamicImage>, ConvertError> {
    let frames = decoder.into_frames().collect_frames().map_err(invalid)?;
    if frames.is_empty() {
        return Err(ConvertError::InvalidImage(
            "animation contains no frames".to_string(),
        ));
    }
    Ok(frames
        .into_iter()
        .map(|f| DynamicImage::ImageRgba8(f.into_buffer()))
        .collect())
}

/// Quality 100 keeps the samples lossless; anything lower is JPEG-compressed.
fn encode_frame(rgb: &RgbImage, quality: u8) -> Result<ImageData, ConvertError> {
    if quality >= 100 {
        return Ok(ImageData {
            data: rgb.as_raw().clone(),
            encoding: ImageEncoding::RawRgb,
            width: rgb.width(),
            height: rgb.height(),
        });
    }

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(rgb)
        .map_err(|e| ConvertError::Encode(e.to_string()))?;

    Ok(ImageData {
        data: buf,
        encoding: ImageEncoding::Jpeg,
        width: rgb.width(),
        height: rgb.height(),
    })
}

fn invalid(err: image::ImageError) -> ConvertError {
    ConvertError::InvalidImage(err.to_string())
}
