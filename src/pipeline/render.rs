//! PDF rasterisation driver.
//!
//! ## Why spawn_blocking?
//!
//! pdfium keeps thread-local state and is CPU-bound; calling it on a Tokio
//! worker would stall every other task on that worker. The whole per-file
//! job (render plus the per-page transform, usually encoding) runs as one
//! `spawn_blocking` task, awaited before the next file starts.

use crate::engine::{PageBitmap, PageRenderer};
use crate::error::DocToolsError;
use crate::pipeline::input::InputFile;
use crate::progress::FileProgress;
use std::sync::Arc;
use tracing::debug;

/// Render every page of `file` at `scale` and map each bitmap through
/// `per_page`, returning the results in page order.
///
/// Cancellation is checked before each page is handed to `per_page`;
/// progress advances after each page.
pub async fn rasterise_pages<T, F>(
    renderer: Arc<dyn PageRenderer>,
    file: InputFile,
    scale: f32,
    progress: FileProgress,
    per_page: F,
) -> Result<Vec<T>, DocToolsError>
where
    T: Send + 'static,
    F: FnMut(PageBitmap) -> Result<T, DocToolsError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        rasterise_blocking(renderer.as_ref(), &file, scale, &progress, per_page)
    })
    .await
    .map_err(|e| DocToolsError::Internal(format!("Render task panicked: {e}")))?
}

fn rasterise_blocking<T, F>(
    renderer: &dyn PageRenderer,
    file: &InputFile,
    scale: f32,
    progress: &FileProgress,
    mut per_page: F,
) -> Result<Vec<T>, DocToolsError>
where
    F: FnMut(PageBitmap) -> Result<T, DocToolsError>,
{
    let mut results = Vec::new();
    renderer.render_document(&file.name, &file.bytes, scale, &mut |bitmap| {
        progress.checkpoint()?;
        let (done, total) = (bitmap.index + 1, bitmap.total);
        results.push(per_page(bitmap)?);
        progress.page(done, total);
        Ok(())
    })?;
    debug!("'{}': {} page(s) rasterised", file.name, results.len());
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CancelToken, ProgressTracker};
    use image::{DynamicImage, RgbaImage};

    struct Blank(usize);

    impl PageRenderer for Blank {
        fn render_document(
            &self,
            _name: &str,
            _pdf: &[u8],
            scale: f32,
            on_page: &mut dyn FnMut(PageBitmap) -> Result<(), DocToolsError>,
        ) -> Result<(), DocToolsError> {
            let side = (10.0 * scale) as u32;
            for index in 0..self.0 {
                on_page(PageBitmap {
                    index,
                    total: self.0,
                    image: DynamicImage::ImageRgba8(RgbaImage::new(side, side)),
                })?;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn maps_pages_in_order() {
        let tracker = ProgressTracker::silent();
        let out = rasterise_pages(
            Arc::new(Blank(3)),
            InputFile::new("a.pdf", vec![]),
            2.0,
            tracker.file(0, 1),
            |b| Ok((b.index, b.image.width())),
        )
        .await
        .unwrap();
        assert_eq!(out, vec![(0, 20), (1, 20), (2, 20)]);
        assert!((tracker.current() - 90.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn cancellation_stops_before_next_page() {
        let cancel = CancelToken::new();
        let tracker = ProgressTracker::new(None, cancel.clone());
        let result = rasterise_pages(
            Arc::new(Blank(5)),
            InputFile::new("a.pdf", vec![]),
            1.0,
            tracker.file(0, 1),
            move |b| {
                if b.index == 1 {
                    cancel.cancel();
                }
                Ok(b.index)
            },
        )
        .await;
        assert!(matches!(result, Err(DocToolsError::Cancelled)));
    }

    #[tokio::test]
    async fn per_page_error_propagates() {
        let result: Result<Vec<()>, _> = rasterise_pages(
            Arc::new(Blank(2)),
            InputFile::new("a.pdf", vec![]),
            1.0,
            ProgressTracker::silent().file(0, 1),
            |b| {
                Err(DocToolsError::EncodeFailed {
                    page: b.index + 1,
                    detail: "nope".into(),
                })
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(DocToolsError::EncodeFailed { page: 1, .. })
        ));
    }
}
