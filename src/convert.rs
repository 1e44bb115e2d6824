//! PDF converter: every page to an image, or the whole document to text.
//!
//! ## Why a fixed 2× scale?
//!
//! A page rendered at 72 px per inch looks soft on any modern display.
//! Doubling it gives 144 px per inch, sharp enough for reading and sharing
//! while keeping a letter-size page around 1,224 × 1,584 px.
//!
//! ## Image quality
//!
//! The quality tier only changes JPEG output (100 / 70 / 50). PNG is
//! lossless by nature, and WebP is written lossless by the `image` crate's
//! encoder, so a WebP page is the same bytes at every tier and usually
//! larger than the JPEG of the same page.
//!
//! "PDF to text" is not done here: it is handed to the Markdown conversion
//! service, which does a far better job of recovering structure than a
//! local text dump.

use crate::config::{ImageFormat, ToolsConfig};
use crate::engine::PageRenderer;
use crate::error::DocToolsError;
use crate::markdown::MarkdownClient;
use crate::output::{pdf_stem, MarkdownResult, OutputFile};
use crate::pipeline::encode::encode_image;
use crate::pipeline::input::InputFile;
use crate::pipeline::render::rasterise_pages;
use crate::progress::ProgressTracker;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// What the converter produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionMode {
    /// One image per page in `config.image_format`.
    #[default]
    PdfToImage,
    /// Delegate to the Markdown conversion API.
    PdfToText,
}

/// Images produced from one source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertedDocument {
    pub source_name: String,
    pub pages: Vec<OutputFile>,
}

/// Rasterise every page of every `.pdf` in `files`.
///
/// # Errors
/// - validation errors (no PDFs, oversize, not a PDF) before any work starts
/// - [`DocToolsError::ConversionFailed`] naming the first file that failed
/// - [`DocToolsError::Cancelled`] when `config.cancel` fires
pub async fn convert_to_images(
    files: Vec<InputFile>,
    renderer: Arc<dyn PageRenderer>,
    config: &ToolsConfig,
) -> Result<Vec<ConvertedDocument>, DocToolsError> {
    let files = crate::compress::select_pdfs(files, config.limits.pdf_max_bytes)?;
    let tracker = ProgressTracker::new(config.progress_callback.clone(), config.cancel.clone());
    tracker.callback().on_operation_start("convert", files.len());

    let result = convert_all(files, renderer, config, &tracker).await;
    tracker.callback().on_operation_complete(
        result
            .as_ref()
            .map_or(0, |docs| docs.iter().map(|d| d.pages.len()).sum()),
    );
    result
}

async fn convert_all(
    files: Vec<InputFile>,
    renderer: Arc<dyn PageRenderer>,
    config: &ToolsConfig,
    tracker: &ProgressTracker,
) -> Result<Vec<ConvertedDocument>, DocToolsError> {
    let format = config.image_format;
    let quality = config.image_quality.converter_jpeg_quality();
    let scale = config.converter_scale;
    let total_files = files.len();
    let mut documents = Vec::with_capacity(total_files);

    for (i, file) in files.into_iter().enumerate() {
        tracker.checkpoint()?;
        let name = file.name.clone();
        tracker.callback().on_file_start(i + 1, &name);
        let progress = tracker.file(i, total_files);
        progress.loaded();

        let start = Instant::now();
        let stem = pdf_stem(&name).to_string();
        let pages = rasterise_pages(
            Arc::clone(&renderer),
            file,
            scale,
            progress.clone(),
            move |bitmap| {
                let page = bitmap.index + 1;
                let bytes = encode_image(&bitmap.image, format, quality, page)?;
                Ok(OutputFile::new(
                    page_filename(&stem, page, format),
                    format.mime_type(),
                    bytes,
                ))
            },
        )
        .await
        .map_err(|e| match e {
            DocToolsError::Cancelled => DocToolsError::Cancelled,
            other => {
                error!("Conversion of '{}' failed: {}", name, other);
                DocToolsError::ConversionFailed {
                    name: name.clone(),
                    source: Box::new(other),
                }
            }
        })?;
        progress.finished();

        info!(
            "Converted '{}' → {} {} image(s) in {}ms",
            name,
            pages.len(),
            format.extension(),
            start.elapsed().as_millis()
        );
        tracker.callback().on_file_complete(i + 1, &name);
        documents.push(ConvertedDocument {
            source_name: name,
            pages,
        });
    }
    Ok(documents)
}

/// Send every `.pdf` in `files` to the Markdown conversion API, in order.
pub async fn convert_to_text(
    files: Vec<InputFile>,
    client: &MarkdownClient,
    config: &ToolsConfig,
) -> Result<Vec<MarkdownResult>, DocToolsError> {
    let files = crate::compress::select_pdfs(files, config.limits.pdf_max_bytes)?;
    let tracker = ProgressTracker::new(config.progress_callback.clone(), config.cancel.clone());
    tracker.callback().on_operation_start("convert", files.len());

    let total_files = files.len();
    let mut results = Vec::with_capacity(total_files);
    for (i, file) in files.iter().enumerate() {
        if let Err(e) = tracker.checkpoint() {
            tracker.callback().on_operation_complete(0);
            return Err(e);
        }
        tracker.callback().on_file_start(i + 1, &file.name);
        match client.convert(file).await {
            Ok(result) => results.push(result),
            Err(e) => {
                tracker.callback().on_operation_complete(0);
                return Err(e);
            }
        }
        tracker.file(i, total_files).finished();
        tracker.callback().on_file_complete(i + 1, &file.name);
    }
    tracker.callback().on_operation_complete(results.len());
    Ok(results)
}

/// `<stem>_page_<n>.<ext>`.
pub fn page_filename(stem: &str, page: usize, format: ImageFormat) -> String {
    format!("{stem}_page_{page}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_filenames() {
        assert_eq!(page_filename("deck", 3, ImageFormat::Png), "deck_page_3.png");
        assert_eq!(page_filename("deck", 1, ImageFormat::Jpeg), "deck_page_1.jpeg");
        assert_eq!(page_filename("deck", 12, ImageFormat::Webp), "deck_page_12.webp");
    }

    #[test]
    fn default_mode_is_images() {
        assert_eq!(ConversionMode::default(), ConversionMode::PdfToImage);
    }
}
