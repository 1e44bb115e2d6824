//! Narrow seams over the two PDF engines the tools drive.
//!
//! ## Why two traits?
//!
//! Page assembly (merge, split, rebuilding a compressed document) and page
//! rasterisation have nothing in common beyond "a PDF goes in". `lopdf`
//! is pure Rust and handles object-level work; pdfium is the only engine
//! that renders faithfully. Splitting the seam lets tests swap either side
//! for an in-memory fake without a pdfium build on the machine.
//!
//! * [`PdfEngine`] — load, create, count, copy pages, serialise.
//! * [`PageRenderer`] — rasterise every page of a document, in order.

pub mod lopdf_engine;
pub mod pdfium;

use crate::error::{DocToolsError, EngineError};
use image::DynamicImage;

pub use lopdf_engine::LopdfEngine;
pub use pdfium::PdfiumRenderer;

/// Object-level PDF operations used by the manager and the compressor.
pub trait PdfEngine {
    /// In-memory document handle.
    type Document;

    /// Parse `bytes` into a document.
    fn load_document(&self, bytes: &[u8]) -> Result<Self::Document, EngineError>;

    /// A new document with an empty page tree.
    fn create_document(&self) -> Self::Document;

    fn page_count(&self, doc: &Self::Document) -> usize;

    /// Append deep copies of `src` pages (0-based `indices`, in order,
    /// duplicates allowed) to the end of `dst`. `src` is left untouched.
    fn copy_pages(
        &self,
        dst: &mut Self::Document,
        src: &Self::Document,
        indices: &[usize],
    ) -> Result<(), EngineError>;

    /// Serialise to PDF bytes.
    fn serialize(&self, doc: &mut Self::Document) -> Result<Vec<u8>, EngineError>;
}

/// One rasterised page.
#[derive(Debug, Clone)]
pub struct PageBitmap {
    /// 0-based page index.
    pub index: usize,
    /// Pages in the document.
    pub total: usize,
    pub image: DynamicImage,
}

/// Rasterises whole documents page by page.
///
/// Pages are handed to `on_page` in document order; an error returned by the
/// callback stops rendering and is propagated unchanged. Implementations are
/// blocking and are driven from `spawn_blocking`.
pub trait PageRenderer: Send + Sync {
    fn render_document(
        &self,
        name: &str,
        pdf: &[u8],
        scale: f32,
        on_page: &mut dyn FnMut(PageBitmap) -> Result<(), DocToolsError>,
    ) -> Result<(), DocToolsError>;
}
