//! Input validation: turn a path on disk into an in-memory [`InputFile`].
//!
//! ## Why check size from metadata?
//!
//! The ceilings exist to refuse work early. Reading a 2 GB file into memory
//! only to reject it defeats the point, so the size is taken from
//! `fs::metadata` before any byte is read.

use crate::error::DocToolsError;
use crate::output::extension_of;
use std::path::Path;
use tracing::debug;

/// A selected file: display name plus its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lower-cased extension, if the name has one.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }

    /// `true` when the name ends in `.pdf` (any case).
    pub fn has_pdf_extension(&self) -> bool {
        self.extension().as_deref() == Some("pdf")
    }
}

/// Read `path`, refusing files above `limit` bytes.
pub fn read_input(path: &Path, limit: u64) -> Result<InputFile, DocToolsError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let metadata = std::fs::metadata(path).map_err(|e| io_error(path, e))?;
    if !metadata.is_file() {
        return Err(DocToolsError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    check_size(&name, metadata.len(), limit)?;

    let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
    debug!("Read '{}' ({} bytes)", name, bytes.len());
    Ok(InputFile { name, bytes })
}

/// Read a PDF: [`read_input`] plus the `%PDF` magic check.
pub fn read_pdf(path: &Path, limit: u64) -> Result<InputFile, DocToolsError> {
    let file = read_input(path, limit)?;
    check_pdf_magic(&file)?;
    Ok(file)
}

/// Sum the on-disk sizes of `paths` and refuse the batch when the total is
/// above `limit`. Nothing is read.
pub fn check_batch_size<P: AsRef<Path>>(
    paths: &[P],
    limit: u64,
) -> Result<u64, DocToolsError> {
    let mut total = 0u64;
    for path in paths {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| io_error(path, e))?;
        total = total.saturating_add(metadata.len());
    }
    if total > limit {
        return Err(DocToolsError::AggregateTooLarge { total, limit });
    }
    debug!("Batch of {} files is {} bytes", paths.len(), total);
    Ok(total)
}

/// Reject `size > limit`.
pub fn check_size(name: &str, size: u64, limit: u64) -> Result<(), DocToolsError> {
    if size > limit {
        return Err(DocToolsError::FileTooLarge {
            name: name.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

/// Reject files whose first four bytes are not `%PDF`.
pub fn check_pdf_magic(file: &InputFile) -> Result<(), DocToolsError> {
    if file.bytes.starts_with(b"%PDF") {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = file.bytes.len().min(4);
    magic[..n].copy_from_slice(&file.bytes[..n]);
    Err(DocToolsError::NotAPdf {
        name: file.name.clone(),
        magic,
    })
}

fn io_error(path: &Path, e: std::io::Error) -> DocToolsError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => DocToolsError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => DocToolsError::FileNotFound {
            path: path.to_path_buf(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_not_found() {
        let err = read_input(Path::new("/definitely/not/here.pdf"), 10).unwrap_err();
        assert!(matches!(err, DocToolsError::FileNotFound { .. }));
    }

    #[test]
    fn oversize_file_is_rejected_before_reading() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&[0u8; 64]).unwrap();
        let err = read_input(tmp.path(), 63).unwrap_err();
        match err {
            DocToolsError::FileTooLarge { size, limit, .. } => {
                assert_eq!((size, limit), (64, 63));
            }
            other => panic!("expected FileTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn size_at_limit_is_accepted() {
        assert!(check_size("a.pdf", 100, 100).is_ok());
        assert!(check_size("a.pdf", 101, 100).is_err());
    }

    #[test]
    fn batch_size_is_summed_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        std::fs::write(&a, [0u8; 40]).unwrap();
        std::fs::write(&b, [0u8; 25]).unwrap();

        assert_eq!(check_batch_size(&[&a, &b], 65).unwrap(), 65);
        assert!(matches!(
            check_batch_size(&[&a, &b], 64),
            Err(DocToolsError::AggregateTooLarge { total: 65, limit: 64 })
        ));
        assert!(matches!(
            check_batch_size(&[a, dir.path().join("missing.pdf")], 1000),
            Err(DocToolsError::FileNotFound { .. })
        ));
    }

    #[test]
    fn magic_check() {
        assert!(check_pdf_magic(&InputFile::new("a.pdf", b"%PDF-1.4\n".to_vec())).is_ok());
        match check_pdf_magic(&InputFile::new("b.pdf", b"PK".to_vec())) {
            Err(DocToolsError::NotAPdf { name, magic }) => {
                assert_eq!(name, "b.pdf");
                assert_eq!(magic, [b'P', b'K', 0, 0]);
            }
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn pdf_extension_is_case_insensitive() {
        assert!(InputFile::new("Scan.PDF", vec![]).has_pdf_extension());
        assert!(!InputFile::new("scan.png", vec![]).has_pdf_extension());
    }

    #[test]
    fn reads_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();
        let file = read_pdf(&path, 1024).unwrap();
        assert_eq!(file.name, "doc.pdf");
        assert_eq!(file.size(), 8);
    }
}
