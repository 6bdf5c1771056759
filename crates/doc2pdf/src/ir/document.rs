use super::elements::ImageData;

/// Top-level document model produced by parsers and consumed by the renderer.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub metadata: Metadata,
    pub pages: Vec<Page>,
}

/// Document metadata.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: Option<String>,
    pub producer: Option<String>,
}

/// One PDF page showing a single image that fills the media box.
#[derive(Debug, Clone)]
pub struct Page {
    pub size: PageSize,
    pub image: ImageData,
}

/// Page dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// Width in points (1 pt = 1/72 inch).
    pub width: f64,
    /// Height in points.
    pub height: f64,
}

impl PageSize {
    /// Size of a page that shows `width` x `height` pixels at `dpi`.
    pub fn from_pixels(width: u32, height: u32, dpi: f32) -> Self {
        let scale = 72.0 / f64::from(dpi);
        Self {
            width: f64::from(width) * scale,
            height: f64::from(height) * scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_at_72_dpi_matches_pixels() {
        let size = PageSize::from_pixels(640, 480, 72.0);
        assert_eq!(size.width, 640.0);
        assert_eq!(size.height, 480.0);
    }

    #[test]
    fn test_page_size_at_default_resolution() {
        let size = PageSize::from_pixels(1000, 500, 100.0);
        assert!((size.width - 720.0).abs() < 1e-6);
        assert!((size.height - 360.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::default();
        assert!(doc.pages.is_empty());
        assert!(doc.metadata.title.is_none());
    }
}
