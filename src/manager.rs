//! PDF manager: merge several documents, or split one by a [`SplitPlan`].
//!
//! Both operations are all-or-nothing: the first failure discards whatever
//! was assembled so far and nothing partial reaches the caller.
//!
//! Progress follows the same shape for both: 20 % once inputs are loaded,
//! then a proportional walk up to 80 % while pages are copied, 100 % when
//! the outputs are serialised.

use crate::config::SizeLimits;
use crate::engine::PdfEngine;
use crate::error::DocToolsError;
use crate::output::{pdf_stem, OutputFile};
use crate::pipeline::input::{check_size, InputFile};
use crate::progress::ProgressTracker;
use crate::ranges::{resolve, PageRange, SplitPlan};
use lopdf::{Document, Object};
use serde::Serialize;
use tracing::{error, info};

const LOADED: f32 = 20.0;
const COPIED: f32 = 80.0;

/// Merge `files` in list order into a single PDF named `output_name`.
pub fn merge<E: PdfEngine>(
    engine: &E,
    files: &[InputFile],
    output_name: &str,
    limits: &SizeLimits,
    progress: &ProgressTracker,
) -> Result<OutputFile, DocToolsError> {
    progress.callback().on_operation_start("merge", files.len());
    let result = merge_inner(engine, files, output_name, limits, progress);
    progress
        .callback()
        .on_operation_complete(usize::from(result.is_ok()));
    result
}

fn merge_inner<E: PdfEngine>(
    engine: &E,
    files: &[InputFile],
    output_name: &str,
    limits: &SizeLimits,
    progress: &ProgressTracker,
) -> Result<OutputFile, DocToolsError> {
    if files.len() < 2 {
        return Err(DocToolsError::TooFewFiles {
            needed: 2,
            got: files.len(),
        });
    }
    let total: u64 = files.iter().map(InputFile::size).sum();
    if total > limits.merge_total_max_bytes {
        return Err(DocToolsError::AggregateTooLarge {
            total,
            limit: limits.merge_total_max_bytes,
        });
    }

    info!("Merging {} files ({} bytes)", files.len(), total);
    let mut merged = engine.create_document();
    progress.report(LOADED);

    for (i, file) in files.iter().enumerate() {
        progress.checkpoint()?;
        progress.callback().on_file_start(i + 1, &file.name);

        let src = engine.load_document(&file.bytes).map_err(|source| {
            error!("Failed to load '{}': {}", file.name, source);
            DocToolsError::LoadFailed {
                name: file.name.clone(),
                source,
            }
        })?;
        let indices: Vec<usize> = (0..engine.page_count(&src)).collect();
        engine
            .copy_pages(&mut merged, &src, &indices)
            .map_err(|source| DocToolsError::Engine {
                name: file.name.clone(),
                source,
            })?;

        progress.callback().on_file_complete(i + 1, &file.name);
        progress.report(LOADED + (COPIED - LOADED) * (i + 1) as f32 / files.len() as f32);
    }

    let bytes = engine
        .serialize(&mut merged)
        .map_err(|source| DocToolsError::Engine {
            name: output_name.to_string(),
            source,
        })?;
    progress.report(100.0);
    info!("Merged document '{}': {} bytes", output_name, bytes.len());
    Ok(OutputFile::pdf(output_name, bytes))
}

/// Split `file` into one PDF per range resolved from `plan`.
pub fn split<E: PdfEngine>(
    engine: &E,
    file: &InputFile,
    plan: &SplitPlan,
    limits: &SizeLimits,
    progress: &ProgressTracker,
) -> Result<Vec<OutputFile>, DocToolsError> {
    progress.callback().on_operation_start("split", 1);
    let result = split_inner(engine, file, plan, limits, progress);
    progress
        .callback()
        .on_operation_complete(result.as_ref().map_or(0, Vec::len));
    result
}

fn split_inner<E: PdfEngine>(
    engine: &E,
    file: &InputFile,
    plan: &SplitPlan,
    limits: &SizeLimits,
    progress: &ProgressTracker,
) -> Result<Vec<OutputFile>, DocToolsError> {
    match plan {
        SplitPlan::EqualParts(n) if *n < 2 => return Err(DocToolsError::InvalidPartsCount(*n)),
        SplitPlan::CustomRanges(r) if r.is_empty() => return Err(DocToolsError::EmptyRangeList),
        _ => {}
    }
    check_size(&file.name, file.size(), limits.pdf_max_bytes)?;

    progress.checkpoint()?;
    progress.callback().on_file_start(1, &file.name);
    let src = engine
        .load_document(&file.bytes)
        .map_err(|source| DocToolsError::LoadFailed {
            name: file.name.clone(),
            source,
        })?;
    let total = engine.page_count(&src);
    if total == 0 {
        return Err(DocToolsError::EmptyDocument {
            name: file.name.clone(),
        });
    }
    let ranges = resolve(plan, total)?;
    progress.report(LOADED);
    info!(
        "Splitting '{}' ({} pages) into {} part(s)",
        file.name,
        total,
        ranges.len()
    );

    let stem = pdf_stem(&file.name);
    let mut outputs = Vec::with_capacity(ranges.len());
    for (i, range) in ranges.iter().enumerate() {
        progress.checkpoint()?;
        let mut part = engine.create_document();
        let engine_err = |source| DocToolsError::Engine {
            name: file.name.clone(),
            source,
        };
        engine
            .copy_pages(&mut part, &src, &range.indices())
            .map_err(engine_err)?;
        let bytes = engine.serialize(&mut part).map_err(engine_err)?;
        outputs.push(OutputFile::pdf(split_filename(stem, plan, range, i), bytes));
        progress.report(LOADED + (COPIED - LOADED) * (i + 1) as f32 / ranges.len() as f32);
    }

    progress.callback().on_file_complete(1, &file.name);
    progress.report(100.0);
    Ok(outputs)
}

/// Output name for the `index`-th (0-based) resolved range.
pub fn split_filename(stem: &str, plan: &SplitPlan, range: &PageRange, index: usize) -> String {
    match plan {
        SplitPlan::SinglePages => format!("{stem}_page_{}.pdf", range.start()),
        SplitPlan::CustomRanges(_) if range.is_single() => {
            format!("{stem}_{}.pdf", range.start())
        }
        SplitPlan::CustomRanges(_) => format!("{stem}_{}-{}.pdf", range.start(), range.end()),
        SplitPlan::EqualParts(_) => format!("{stem}_part_{}.pdf", index + 1),
    }
}

// ── Inspect ──────────────────────────────────────────────────────────────

/// Basic facts about a PDF, read without rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub name: String,
    pub size: u64,
    pub page_count: usize,
    pub pdf_version: String,
    pub title: Option<String>,
}

/// Read page count, version and title from `file`.
pub fn inspect(file: &InputFile) -> Result<DocumentInfo, DocToolsError> {
    let doc = Document::load_mem(&file.bytes).map_err(|e| DocToolsError::CorruptPdf {
        name: file.name.clone(),
        detail: e.to_string(),
    })?;
    Ok(DocumentInfo {
        name: file.name.clone(),
        size: file.size(),
        page_count: doc.get_pages().len(),
        pdf_version: doc.version.clone(),
        title: document_title(&doc),
    })
}

fn document_title(doc: &Document) -> Option<String> {
    let info_id = doc.trailer.get(b"Info").and_then(Object::as_reference).ok()?;
    let title = doc.get_dictionary(info_id).ok()?.get(b"Title").ok()?;
    match title {
        Object::String(bytes, _) => Some(decode_pdf_text(bytes)).filter(|t| !t.is_empty()),
        _ => None,
    }
}

/// PDF text strings are UTF-16BE with a BOM, or a single-byte encoding.
fn decode_pdf_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}
