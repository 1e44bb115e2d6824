//! Result types returned by the tools, plus filename helpers.
//!
//! Every tool hands back owned values; nothing is written to disk unless
//! the caller asks for it through [`write_output`].

use crate::error::DocToolsError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// MIME type of every PDF the tools produce.
pub const PDF_MIME: &str = "application/pdf";

/// One produced file, held in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    pub filename: String,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl OutputFile {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn pdf(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(filename, PDF_MIME, bytes)
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Outcome of compressing one PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionResult {
    pub file: OutputFile,
    pub original_size: u64,
    pub compressed_size: u64,
    /// `(original − compressed) / original × 100`. Negative when the output
    /// grew.
    pub ratio_percent: f64,
}

impl CompressionResult {
    pub fn new(file: OutputFile, original_size: u64) -> Self {
        let compressed_size = file.size();
        Self {
            ratio_percent: compression_ratio(original_size, compressed_size),
            file,
            original_size,
            compressed_size,
        }
    }
}

/// Percentage saved; `0.0` for an empty original.
pub fn compression_ratio(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - compressed as f64) / original as f64 * 100.0
}

/// Markdown returned by the conversion API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkdownResult {
    pub source_name: String,
    pub markdown: String,
    pub conversion_time_seconds: f64,
}

impl MarkdownResult {
    /// User-facing confirmation, time rendered to two decimals.
    pub fn success_message(&self) -> String {
        format!(
            "Converted successfully in {:.2} seconds",
            self.conversion_time_seconds
        )
    }

    /// `<basename>.md`, where basename drops the last extension.
    pub fn download_filename(&self) -> String {
        format!("{}.md", strip_extension(&self.source_name))
    }

    pub fn to_output_file(&self) -> OutputFile {
        OutputFile::new(
            self.download_filename(),
            "text/markdown",
            self.markdown.clone().into_bytes(),
        )
    }
}

/// An exported icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconExport {
    pub size: u32,
    pub filename: String,
    pub data_uri: String,
    #[serde(skip)]
    pub png: Vec<u8>,
}

// ── Filename helpers ─────────────────────────────────────────────────────

/// Name without a trailing `.pdf` (case-insensitive).
pub fn pdf_stem(name: &str) -> &str {
    let n = name.len();
    if n >= 4 && name.is_char_boundary(n - 4) && name[n - 4..].eq_ignore_ascii_case(".pdf") {
        &name[..n - 4]
    } else {
        name
    }
}

/// Name without its last extension; dotfiles keep their name.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(i) => &name[..i],
    }
}

/// Lower-cased extension without the dot, if any.
pub fn extension_of(name: &str) -> Option<String> {
    match name.rfind('.') {
        Some(i) if i + 1 < name.len() => Some(name[i + 1..].to_ascii_lowercase()),
        _ => None,
    }
}

/// Human-readable size: `0 Bytes`, `1.5 KB`, `12.34 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Write `file` into `dir` atomically (temp file + rename).
///
/// The temporary file lives in the destination directory so the final
/// rename never crosses a filesystem; it is removed if anything fails.
pub fn write_output(dir: &Path, file: &OutputFile) -> Result<PathBuf, DocToolsError> {
    let path = dir.join(&file.filename);
    let write_err = |source| DocToolsError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&file.bytes).map_err(write_err)?;
    tmp.persist(&path).map_err(|e| write_err(e.error))?;
    Ok(path)
}
