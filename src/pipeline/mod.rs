//! Pipeline stages shared by the rasterising tools.
//!
//! Each submodule implements exactly one transformation step, so each can
//! be tested on its own and the compressor and converter can combine them
//! differently.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ assemble
//! (bytes)   (pdfium)   (jpeg/png/webp)  (image-only PDF)
//! ```
//!
//! 1. [`input`]    — read and validate a file from disk (existence,
//!    permissions, size ceiling, `%PDF` magic)
//! 2. [`render`]   — rasterise every page; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`encode`]   — bitmap → PNG / JPEG / WebP bytes, base64 data URIs
//! 4. [`assemble`] — one full-bleed JPEG per page into a new PDF (compressor
//!    only)

pub mod assemble;
pub mod encode;
pub mod input;
pub mod render;
