//! Image-only PDF assembly for the compressor.
//!
//! Each page becomes a single DCT-encoded image XObject drawn full-bleed on
//! a page whose MediaBox equals the bitmap size (one pixel per point).

use crate::engine::lopdf_engine::{append_kids, pages_root};
use crate::engine::{LopdfEngine, PdfEngine};
use crate::error::EngineError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// Resource name of the page image.
const IMAGE_NAME: &[u8] = b"Im0";

/// One JPEG-encoded page.
#[derive(Debug, Clone)]
pub struct JpegPage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Build a PDF with one full-page JPEG per entry, in order.
pub fn image_only_pdf(pages: Vec<JpegPage>) -> Result<Vec<u8>, EngineError> {
    let engine = LopdfEngine;
    let mut doc = engine.create_document();
    let root = pages_root(&doc)?;

    let mut page_ids = Vec::with_capacity(pages.len());
    for page in pages {
        page_ids.push(add_image_page(&mut doc, page)?);
    }
    append_kids(&mut doc, root, &page_ids)?;
    engine.serialize(&mut doc)
}

fn add_image_page(doc: &mut Document, page: JpegPage) -> Result<ObjectId, EngineError> {
    let (w, h) = (i64::from(page.width), i64::from(page.height));

    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => w,
            "Height" => h,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        page.jpeg,
    )
    .with_compression(false);
    let image_id = doc.add_object(image);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                [w, 0, 0, h, 0, 0].into_iter().map(Object::Integer).collect(),
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| EngineError::Save(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(w),
            Object::Integer(h),
        ],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
        "Contents" => content_id,
    }))
}
