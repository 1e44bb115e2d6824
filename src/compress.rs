//! PDF compressor: rebuild each document from re-encoded page images.
//!
//! ## Why rasterise?
//!
//! Most bloated PDFs are bloated by scanned or embedded imagery. Rendering
//! each page at a reduced scale and storing it as a single JPEG caps the
//! per-page cost regardless of what the original page contained. The price
//! is that text stops being selectable, which is the trade the tool makes.
//!
//! Files are processed strictly one after another; the first failure aborts
//! the batch and discards every result produced so far.

use crate::config::{QualityTier, ToolsConfig};
use crate::engine::PageRenderer;
use crate::error::DocToolsError;
use crate::output::{pdf_stem, CompressionResult, OutputFile};
use crate::pipeline::assemble::{image_only_pdf, JpegPage};
use crate::pipeline::encode::encode_jpeg;
use crate::pipeline::input::{check_pdf_magic, check_size, InputFile};
use crate::pipeline::render::rasterise_pages;
use crate::progress::{FileProgress, ProgressTracker};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Compress every `.pdf` in `files` at `config.compression_quality`.
///
/// # Errors
/// - validation errors (no PDFs, oversize, not a PDF) before any work starts
/// - [`DocToolsError::CompressionFailed`] naming the first file that failed
/// - [`DocToolsError::Cancelled`] when `config.cancel` fires
pub async fn compress_files(
    files: Vec<InputFile>,
    renderer: Arc<dyn PageRenderer>,
    config: &ToolsConfig,
) -> Result<Vec<CompressionResult>, DocToolsError> {
    let files = select_pdfs(files, config.limits.pdf_max_bytes)?;
    let tracker = ProgressTracker::new(config.progress_callback.clone(), config.cancel.clone());
    tracker.callback().on_operation_start("compress", files.len());

    let result = compress_all(files, renderer, config.compression_quality, &tracker).await;
    tracker
        .callback()
        .on_operation_complete(result.as_ref().map_or(0, Vec::len));
    result
}

async fn compress_all(
    files: Vec<InputFile>,
    renderer: Arc<dyn PageRenderer>,
    tier: QualityTier,
    tracker: &ProgressTracker,
) -> Result<Vec<CompressionResult>, DocToolsError> {
    let total_files = files.len();
    let mut results = Vec::with_capacity(total_files);

    for (i, file) in files.into_iter().enumerate() {
        tracker.checkpoint()?;
        let name = file.name.clone();
        tracker.callback().on_file_start(i + 1, &name);

        let start = Instant::now();
        let result = compress_one(file, Arc::clone(&renderer), tier, tracker.file(i, total_files))
            .await
            .map_err(|e| match e {
                DocToolsError::Cancelled => DocToolsError::Cancelled,
                other => {
                    error!("Compression of '{}' failed: {}", name, other);
                    DocToolsError::CompressionFailed {
                        name: name.clone(),
                        source: Box::new(other),
                    }
                }
            })?;

        info!(
            "Compressed '{}': {} → {} bytes ({:.1}%) in {}ms",
            name,
            result.original_size,
            result.compressed_size,
            result.ratio_percent,
            start.elapsed().as_millis()
        );
        tracker.callback().on_file_complete(i + 1, &name);
        results.push(result);
    }
    Ok(results)
}

/// Rasterise, re-encode and reassemble one document.
pub async fn compress_one(
    file: InputFile,
    renderer: Arc<dyn PageRenderer>,
    tier: QualityTier,
    progress: FileProgress,
) -> Result<CompressionResult, DocToolsError> {
    let params = tier.compression_params();
    let original_size = file.size();
    let name = file.name.clone();
    progress.loaded();

    let pages = rasterise_pages(
        renderer,
        file,
        params.image_scale,
        progress.clone(),
        move |bitmap| {
            let (width, height) = (bitmap.image.width(), bitmap.image.height());
            let jpeg = encode_jpeg(&bitmap.image, params.jpeg_quality).map_err(|e| {
                DocToolsError::EncodeFailed {
                    page: bitmap.index + 1,
                    detail: e.to_string(),
                }
            })?;
            Ok(JpegPage {
                jpeg,
                width,
                height,
            })
        },
    )
    .await?;

    if pages.is_empty() {
        return Err(DocToolsError::EmptyDocument { name });
    }

    let bytes = image_only_pdf(pages).map_err(|source| DocToolsError::Engine {
        name: name.clone(),
        source,
    })?;
    progress.finished();

    let output = OutputFile::pdf(format!("{}_compressed.pdf", pdf_stem(&name)), bytes);
    Ok(CompressionResult::new(output, original_size))
}

/// Keep `.pdf` names, validate them, and reject a batch with nothing left.
pub(crate) fn select_pdfs(
    files: Vec<InputFile>,
    limit: u64,
) -> Result<Vec<InputFile>, DocToolsError> {
    let first = match files.first() {
        Some(f) => (f.name.clone(), f.extension().unwrap_or_default()),
        None => return Err(DocToolsError::NoFiles),
    };

    let (pdfs, skipped): (Vec<_>, Vec<_>) =
        files.into_iter().partition(InputFile::has_pdf_extension);
    for file in &skipped {
        warn!("Skipping non-PDF input '{}'", file.name);
    }
    if pdfs.is_empty() {
        return Err(DocToolsError::UnsupportedFormat {
            name: first.0,
            extension: first.1,
        });
    }
    for file in &pdfs {
        check_size(&file.name, file.size(), limit)?;
        check_pdf_magic(file)?;
    }
    Ok(pdfs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> InputFile {
        InputFile::new(name, b"%PDF-1.7\n".to_vec())
    }

    #[test]
    fn non_pdfs_are_dropped() {
        let kept = select_pdfs(vec![pdf("a.pdf"), pdf("b.png"), pdf("c.PDF")], 1024).unwrap();
        let names: Vec<_> = kept.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.pdf", "c.PDF"]);
    }

    #[test]
    fn batch_without_pdfs_is_rejected() {
        assert!(matches!(
            select_pdfs(vec![], 1024),
            Err(DocToolsError::NoFiles)
        ));
        match select_pdfs(vec![pdf("notes.txt")], 1024) {
            Err(DocToolsError::UnsupportedFormat { name, extension }) => {
                assert_eq!(name, "notes.txt");
                assert_eq!(extension, "txt");
            }
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn oversize_pdf_is_rejected() {
        assert!(matches!(
            select_pdfs(vec![pdf("a.pdf")], 4),
            Err(DocToolsError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn fake_pdf_is_rejected() {
        let fake = InputFile::new("a.pdf", b"GIF89a".to_vec());
        assert!(matches!(
            select_pdfs(vec![fake], 1024),
            Err(DocToolsError::NotAPdf { .. })
        ));
    }
}
