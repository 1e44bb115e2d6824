//! # edgequake-doctools
//!
//! A small suite of document utilities: a PDF compressor, a PDF converter,
//! a PDF manager (merge and split), a file-to-Markdown API client, and an
//! icon designer.
//!
//! ## Why these engines?
//!
//! Page rasterisation goes through pdfium, the renderer Chromium ships,
//! because it draws real-world PDFs faithfully. Structural work (copying
//! pages between documents, writing new ones) goes through `lopdf`, which
//! edits the object graph directly and never re-renders anything. Icons
//! are drawn with `tiny-skia` and glyphs decoded with `usvg`, both pure
//! Rust, so the icon designer needs no native library at all.
//!
//! ## Tools
//!
//! ```text
//! compress   PDF ─▶ pdfium ─▶ JPEG per page ─▶ image-only PDF
//! convert    PDF ─▶ pdfium ─▶ PNG / JPEG / WebP per page
//!            PDF ─▶ Markdown API                      (text mode)
//! merge      PDF × n ─▶ lopdf page copy ─▶ one PDF
//! split      PDF ─▶ page ranges ─▶ lopdf page copy ─▶ PDF × k
//! markdown   any supported file ─▶ multipart POST ─▶ Markdown
//! icon       IconSpec ─▶ tiny-skia canvas ─▶ PNG data URI
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doctools::{merge, read_pdf, LopdfEngine, ProgressTracker, ToolsConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ToolsConfig::default();
//!     let files = vec![
//!         read_pdf(Path::new("a.pdf"), config.limits.pdf_max_bytes)?,
//!         read_pdf(Path::new("b.pdf"), config.limits.pdf_max_bytes)?,
//!     ];
//!     let merged = merge(
//!         &LopdfEngine,
//!         &files,
//!         &config.merge_output_name,
//!         &config.limits,
//!         &ProgressTracker::silent(),
//!     )?;
//!     std::fs::write(&merged.filename, &merged.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doctools` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! The rasterising tools need a pdfium shared library at run time; see
//! [`engine::PdfiumRenderer`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compress;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod icon;
pub mod manager;
pub mod markdown;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod ranges;
pub mod state;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compress::compress_files;
pub use config::{ImageFormat, QualityTier, SizeLimits, ToolsConfig, ToolsConfigBuilder};
pub use convert::{convert_to_images, convert_to_text, ConversionMode, ConvertedDocument};
pub use engine::{LopdfEngine, PageRenderer, PdfEngine, PdfiumRenderer};
pub use error::{DocToolsError, EngineError, ErrorKind};
pub use icon::{export_icon, render_icon, IconSpec, IconTemplate};
pub use manager::{inspect, merge, split, DocumentInfo};
pub use markdown::MarkdownClient;
pub use output::{CompressionResult, IconExport, MarkdownResult, OutputFile};
pub use pipeline::input::{read_input, read_pdf, InputFile};
pub use progress::{
    CancelToken, NoopProgressCallback, ProgressCallback, ProgressTracker, ToolProgressCallback,
};
pub use ranges::{parse_custom_ranges, resolve, PageRange, SplitPlan};
pub use state::{ToolSession, ToolState};
