//! [`PageRenderer`] backed by pdfium via `pdfium-render`.
//!
//! ## Why bind per call?
//!
//! A `Pdfium` instance and every `PdfDocument` borrowed from it must stay on
//! the thread that created them. Binding inside [`PageRenderer::render_document`]
//! keeps all pdfium state local to the blocking task that owns the work, so
//! the renderer itself is a plain `Send + Sync` value holding a library path.
//!
//! ## Library lookup
//!
//! 1. `library_path` (normally `PDFIUM_LIB_PATH`): a file is bound directly,
//!    a directory is searched for the platform library name.
//! 2. Otherwise the system loader is asked for `libpdfium`.

use super::{PageBitmap, PageRenderer};
use crate::error::DocToolsError;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Environment variable naming a pdfium library file or directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    library_path: Option<PathBuf>,
}

impl PdfiumRenderer {
    /// Use `path` (file or directory) instead of the system library.
    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    /// Honour `PDFIUM_LIB_PATH` when set and non-empty.
    pub fn from_env() -> Self {
        match std::env::var(PDFIUM_LIB_PATH_ENV) {
            Ok(p) if !p.trim().is_empty() => Self::with_library_path(p),
            _ => Self::default(),
        }
    }

    fn bind(&self) -> Result<Pdfium, DocToolsError> {
        let bindings = match &self.library_path {
            Some(path) if path.is_dir() => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path))
            }
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| DocToolsError::PdfiumBindingFailed(format!("{e:?}")))?;
        Ok(Pdfium::new(bindings))
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_document(
        &self,
        name: &str,
        pdf: &[u8],
        scale: f32,
        on_page: &mut dyn FnMut(PageBitmap) -> Result<(), DocToolsError>,
    ) -> Result<(), DocToolsError> {
        let pdfium = self.bind()?;
        let document =
            pdfium
                .load_pdf_from_byte_slice(pdf, None)
                .map_err(|e| DocToolsError::CorruptPdf {
                    name: name.to_string(),
                    detail: format!("{e:?}"),
                })?;

        let pages = document.pages();
        let total = pages.len() as usize;
        info!("Rendering '{}': {} pages at scale {}", name, total, scale);

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);

        for index in 0..total {
            let page = pages
                .get(index as u16)
                .map_err(|e| DocToolsError::RasterisationFailed {
                    page: index + 1,
                    detail: format!("{e:?}"),
                })?;
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                DocToolsError::RasterisationFailed {
                    page: index + 1,
                    detail: format!("{e:?}"),
                }
            })?;
            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                index + 1,
                image.width(),
                image.height()
            );
            on_page(PageBitmap {
                index,
                total,
                image,
            })?;
        }
        Ok(())
    }
}
