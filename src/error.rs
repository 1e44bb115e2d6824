//! Error types for the edgequake-doctools library.
//!
//! Two error types reflect two layers:
//!
//! * [`DocToolsError`] — **Fatal** for the current tool operation. Every
//!   top-level entry point (`compress_files`, `merge`, `split`,
//!   `MarkdownClient::convert`, …) returns it. Nothing is retried; the
//!   caller corrects the input and triggers the operation again.
//!
//! * [`EngineError`] — raised by the PDF engine seam ([`crate::engine`]).
//!   Tools translate it into a [`DocToolsError`] that names the file being
//!   processed, so the message a user sees always says *which* input broke.
//!
//! [`DocToolsError::kind`] groups variants into the three classes the
//! tools report on: validation problems (nothing was attempted), runtime
//! failures (an engine, encoder or the network gave up) and internal bugs.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`DocToolsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input detected before any processing started.
    Validation,
    /// A library, encoder or network step failed mid-operation.
    Runtime,
    /// Misuse of the API or an unexpected internal condition.
    Internal,
}

/// All fatal errors returned by the edgequake-doctools library.
#[derive(Debug, Error)]
pub enum DocToolsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was read, but is not a PDF.
    #[error("File is not a valid PDF: '{name}'\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: [u8; 4] },

    /// File extension is not accepted by the tool.
    #[error("Unsupported file format '.{extension}' for '{name}'")]
    UnsupportedFormat { name: String, extension: String },

    /// Legacy binary Office formats are refused by the Markdown converter.
    #[error("Legacy Office format '.{extension}' is not supported; save '{name}' as .{extension}x first")]
    LegacyOfficeFormat { name: String, extension: String },

    /// A single file exceeds the tool's size ceiling.
    #[error("File '{name}' is too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    /// The combined size of a merge batch exceeds its ceiling.
    #[error("Selected files total {total} bytes, above the {limit} byte limit")]
    AggregateTooLarge { total: u64, limit: u64 },

    /// No input files were supplied.
    #[error("No files selected")]
    NoFiles,

    /// Merge needs at least two documents.
    #[error("At least {needed} files are required, got {got}")]
    TooFewFiles { needed: usize, got: usize },

    // ── Range errors ──────────────────────────────────────────────────────
    /// A custom range token is malformed (`a > b` or a non-numeric bound).
    #[error("Invalid page range '{token}': {reason}")]
    InvalidRange { token: String, reason: String },

    /// The custom range list contained no tokens.
    #[error("No page ranges given")]
    EmptyRangeList,

    /// A range falls outside the document; the whole split is aborted.
    #[error("Page range {start}-{end} is out of bounds (document has {total} pages)")]
    RangeOutOfBounds {
        start: usize,
        end: usize,
        total: usize,
    },

    /// Equal-parts split was asked for fewer than two parts.
    #[error("Part count must be at least 2, got {0}")]
    InvalidPartsCount(usize),

    /// The source document has no pages to split.
    #[error("Document '{name}' has no pages")]
    EmptyDocument { name: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// A merge input could not be loaded; nothing was produced.
    #[error("Failed to process file '{name}': make sure it is a valid PDF ({source})")]
    LoadFailed {
        name: String,
        #[source]
        source: EngineError,
    },

    /// Generic engine failure while operating on a named file.
    #[error("PDF operation failed on '{name}': {source}")]
    Engine {
        name: String,
        #[source]
        source: EngineError,
    },

    /// pdfium could not open the document.
    #[error("PDF '{name}' is corrupt: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Bitmap → PNG/JPEG/WebP encoding failed.
    #[error("Image encoding failed for page {page}: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// The compressor gave up on a file; prior page work was discarded.
    #[error("PDF compression failed for '{name}'")]
    CompressionFailed {
        name: String,
        #[source]
        source: Box<DocToolsError>,
    },

    /// The converter gave up on a file; prior page work was discarded.
    #[error("PDF conversion failed for '{name}'")]
    ConversionFailed {
        name: String,
        #[source]
        source: Box<DocToolsError>,
    },

    // ── Markdown API errors ───────────────────────────────────────────────
    /// The HTTP request never produced a response.
    #[error("Markdown conversion request failed: {0}")]
    RequestFailed(String),

    /// The API answered with a non-success status.
    #[error("Markdown conversion API returned HTTP {status}: {body}")]
    ApiError { status: u16, body: String },

    /// The API answered 2xx but the body was not the expected JSON.
    #[error("Markdown conversion API returned an unexpected body: {0}")]
    InvalidResponse(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Lifecycle ─────────────────────────────────────────────────────────
    /// The operation was cancelled before it could start more work.
    #[error("Operation cancelled")]
    Cancelled,

    /// A [`crate::state::ToolSession`] transition is not allowed from the current state.
    #[error("Invalid tool state transition: cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Rasterising tools (compress, convert) need a pdfium build.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory).\n\
  • Or install libpdfium where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocToolsError {
    /// Classify this error for reporting.
    pub fn kind(&self) -> ErrorKind {
        use DocToolsError::*;
        match self {
            FileNotFound { .. }
            | PermissionDenied { .. }
            | NotAPdf { .. }
            | UnsupportedFormat { .. }
            | LegacyOfficeFormat { .. }
            | FileTooLarge { .. }
            | AggregateTooLarge { .. }
            | NoFiles
            | TooFewFiles { .. }
            | InvalidRange { .. }
            | EmptyRangeList
            | RangeOutOfBounds { .. }
            | InvalidPartsCount(_)
            | EmptyDocument { .. }
            | InvalidConfig(_) => ErrorKind::Validation,

            LoadFailed { .. }
            | Engine { .. }
            | CorruptPdf { .. }
            | RasterisationFailed { .. }
            | EncodeFailed { .. }
            | CompressionFailed { .. }
            | ConversionFailed { .. }
            | RequestFailed(_)
            | ApiError { .. }
            | InvalidResponse(_)
            | OutputWriteFailed { .. }
            | PdfiumBindingFailed(_)
            | Cancelled => ErrorKind::Runtime,

            InvalidState { .. } | Internal(_) => ErrorKind::Internal,
        }
    }

    /// `true` when the error was raised before any processing happened.
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

/// Errors raised by a [`crate::engine::PdfEngine`] implementation.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Bytes could not be parsed as a PDF document.
    #[error("failed to load document: {0}")]
    Load(String),

    /// A page index outside the document was requested (0-based).
    #[error("page index {index} out of range (document has {total} pages)")]
    PageIndex { index: usize, total: usize },

    /// The document's page tree or catalog is malformed.
    #[error("malformed document structure: {0}")]
    Structure(String),

    /// Serialisation to bytes failed.
    #[error("failed to serialise document: {0}")]
    Save(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_display_names_range() {
        let e = DocToolsError::RangeOutOfBounds {
            start: 15,
            end: 15,
            total: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("15-15"), "got: {msg}");
        assert!(msg.contains("10 pages"), "got: {msg}");
    }

    #[test]
    fn load_failed_names_file() {
        let e = DocToolsError::LoadFailed {
            name: "broken.pdf".into(),
            source: EngineError::Load("bad xref".into()),
        };
        assert!(e.to_string().contains("broken.pdf"));
        assert_eq!(e.kind(), ErrorKind::Runtime);
    }

    #[test]
    fn validation_errors_are_classified() {
        assert!(DocToolsError::NoFiles.is_validation());
        assert!(DocToolsError::InvalidPartsCount(1).is_validation());
        assert!(DocToolsError::FileTooLarge {
            name: "a.pdf".into(),
            size: 2,
            limit: 1
        }
        .is_validation());
        assert!(!DocToolsError::RequestFailed("refused".into()).is_validation());
    }

    #[test]
    fn compression_failure_is_generic() {
        let e = DocToolsError::CompressionFailed {
            name: "report.pdf".into(),
            source: Box::new(DocToolsError::RasterisationFailed {
                page: 3,
                detail: "boom".into(),
            }),
        };
        let msg = e.to_string();
        assert!(msg.contains("report.pdf"));
        assert!(!msg.contains("boom"), "detail stays in the source chain: {msg}");
    }

    #[test]
    fn invalid_state_display() {
        let e = DocToolsError::InvalidState {
            action: "begin",
            state: "idle",
        };
        assert_eq!(
            e.to_string(),
            "Invalid tool state transition: cannot begin while idle"
        );
        assert_eq!(e.kind(), ErrorKind::Internal);
    }
}
