use lopdf::content::{Content, Operation};
use lopdf::{Document as PdfDocument, Object, ObjectId, Stream, dictionary};

use crate::error::ConvertError;
use crate::ir::{Document, ImageData, Page};

const IMAGE_NAME: &[u8] = b"Im0";

/// Write an IR Document as PDF bytes, one image page per IR page.
pub fn render_pdf(doc: &Document) -> Result<Vec<u8>, ConvertError> {
    let mut pdf = PdfDocument::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let mut kids = Vec::with_capacity(doc.pages.len());
    for page in &doc.pages {
        let page_id = write_page(&mut pdf, pages_id, page)?;
        kids.push(Object::Reference(page_id));
    }

    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        }),
    );

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", Object::Reference(catalog_id));

    let mut info = lopdf::Dictionary::new();
    if let Some(title) = &doc.metadata.title {
        info.set("Title", Object::string_literal(title.as_str()));
    }
    if let Some(producer) = &doc.metadata.producer {
        info.set("Producer", Object::string_literal(producer.as_str()));
    }
    if !info.is_empty() {
        let info_id = pdf.add_object(info);
        pdf.trailer.set("Info", Object::Reference(info_id));
    }

    // JPEG streams opt out, so this only deflates content and raw samples.
    pdf.compress();

    let mut output = Vec::new();
    pdf.save_to(&mut output)
        .map_err(|e| ConvertError::Encode(format!("failed to write PDF: {e}")))?;
    Ok(output)
}

fn write_page(
    pdf: &mut PdfDocument,
    pages_id: ObjectId,
    page: &Page,
) -> Result<ObjectId, ConvertError> {
    let image_id = pdf.add_object(image_stream(&page.image));

    let width = page.size.width as f32;
    let height = page.size.height as f32;
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0.into(),
                    0.into(),
                    height.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| ConvertError::Encode(format!("failed to encode page content: {e}")))?;
    let content_id = pdf.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = pdf.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    });
    Ok(page_id)
}

fn image_stream(image: &ImageData) -> Stream {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(image.width),
        "Height" => i64::from(image.height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };
    match image.encoding.pdf_filter() {
        Some(filter) => {
            dict.set("Filter", filter);
            Stream::new(dict, image.data.clone()).with_compression(false)
        }
        None => Stream::new(dict, image.data.clone()),
    }
}
