//! File-to-Markdown client for the external conversion service.
//!
//! The service is an opaque collaborator: it accepts a multipart upload on
//! `POST /api/markdown-convert` (field `file`) and answers with
//! `{"markdown_content": "...", "conversion_time_seconds": 1.23}`.
//!
//! Every check that can be made locally (legacy Office formats, the
//! extension allow-list, the size ceiling) runs before a connection is
//! opened, so a rejected file never costs a round trip.

use crate::config::ToolsConfig;
use crate::error::DocToolsError;
use crate::output::{extension_of, MarkdownResult};
use crate::pipeline::input::{check_size, read_input, InputFile};
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

/// Path of the conversion endpoint, relative to the service base URL.
pub const MARKDOWN_ENDPOINT: &str = "/api/markdown-convert";

/// Extensions the service converts.
pub const SUPPORTED_EXTENSIONS: [&str; 13] = [
    "docx", "pdf", "pptx", "xlsx", "html", "htm", "rtf", "txt", "csv", "json", "xml", "epub", "md",
];

/// Binary Office formats the service cannot read.
pub const LEGACY_OFFICE_EXTENSIONS: [&str; 3] = ["doc", "ppt", "xls"];

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    markdown_content: String,
    conversion_time_seconds: f64,
}

/// HTTP client for the conversion service.
#[derive(Debug, Clone)]
pub struct MarkdownClient {
    http: reqwest::Client,
    endpoint: Url,
    max_bytes: u64,
}

impl MarkdownClient {
    /// Build a client from the API base, timeout and size ceiling in `config`.
    pub fn new(config: &ToolsConfig) -> Result<Self, DocToolsError> {
        let endpoint = format!(
            "{}{}",
            config.markdown_api_base.trim_end_matches('/'),
            MARKDOWN_ENDPOINT
        );
        let endpoint = Url::parse(&endpoint).map_err(|e| {
            DocToolsError::InvalidConfig(format!("markdown endpoint '{endpoint}': {e}"))
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.api_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| DocToolsError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            max_bytes: config.limits.markdown_max_bytes,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Validate `file` locally, upload it, and return the Markdown.
    pub async fn convert(&self, file: &InputFile) -> Result<MarkdownResult, DocToolsError> {
        validate_name(&file.name)?;
        check_size(&file.name, file.size(), self.max_bytes)?;

        info!(
            "Uploading '{}' ({} bytes) to {}",
            file.name,
            file.size(),
            self.endpoint
        );
        let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Markdown request for '{}' failed: {}", file.name, e);
                if e.is_timeout() {
                    DocToolsError::RequestFailed(format!("request timed out: {e}"))
                } else {
                    DocToolsError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Markdown API returned HTTP {} for '{}'", status, file.name);
            return Err(DocToolsError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ConvertResponse = response
            .json()
            .await
            .map_err(|e| DocToolsError::InvalidResponse(e.to_string()))?;
        debug!(
            "'{}' converted: {} chars in {:.2}s",
            file.name,
            parsed.markdown_content.len(),
            parsed.conversion_time_seconds
        );

        Ok(MarkdownResult {
            source_name: file.name.clone(),
            markdown: parsed.markdown_content,
            conversion_time_seconds: parsed.conversion_time_seconds,
        })
    }

    /// Validate the name, read `path` within the size ceiling, then convert.
    pub async fn convert_path(&self, path: &Path) -> Result<MarkdownResult, DocToolsError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        validate_name(&name)?;
        let file = read_input(path, self.max_bytes)?;
        self.convert(&file).await
    }
}

/// Extension checks: legacy Office formats first, then the allow-list.
pub fn validate_name(name: &str) -> Result<(), DocToolsError> {
    let extension = extension_of(name).unwrap_or_default();
    if LEGACY_OFFICE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(DocToolsError::LegacyOfficeFormat {
            name: name.to_string(),
            extension,
        });
    }
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(DocToolsError::UnsupportedFormat {
            name: name.to_string(),
            extension,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SizeLimits;

    #[test]
    fn legacy_office_formats_are_named() {
        for name in ["old.doc", "deck.PPT", "sheet.xls"] {
            let err = validate_name(name).unwrap_err();
            assert!(
                matches!(err, DocToolsError::LegacyOfficeFormat { .. }),
                "{name}: {err:?}"
            );
        }
        let msg = validate_name("old.doc").unwrap_err().to_string();
        assert!(msg.contains(".docx"), "{msg}");
    }

    #[test]
    fn allow_list() {
        for name in ["a.docx", "b.PDF", "c.htm", "d.epub", "e.md", "f.json"] {
            assert!(validate_name(name).is_ok(), "{name}");
        }
        assert!(matches!(
            validate_name("photo.png"),
            Err(DocToolsError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            validate_name("Makefile"),
            Err(DocToolsError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let config = ToolsConfig::builder()
            .markdown_api_base("http://localhost:8000/tools/")
            .build()
            .unwrap();
        let client = MarkdownClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "http://localhost:8000/tools/api/markdown-convert"
        );
    }

    #[test]
    fn oversize_is_rejected_without_network() {
        // Port 9 (discard) on loopback: any connection attempt would fail
        // with RequestFailed rather than FileTooLarge.
        let config = ToolsConfig::builder()
            .markdown_api_base("http://127.0.0.1:9")
            .limits(SizeLimits {
                markdown_max_bytes: 8,
                ..SizeLimits::default()
            })
            .build()
            .unwrap();
        let client = MarkdownClient::new(&config).unwrap();
        let file = InputFile::new("big.txt", vec![b'x'; 9]);
        let err = tokio_test::block_on(client.convert(&file)).unwrap_err();
        assert!(matches!(
            err,
            DocToolsError::FileTooLarge {
                size: 9,
                limit: 8,
                ..
            }
        ));
    }

    #[test]
    fn unsupported_is_rejected_before_size() {
        let config = ToolsConfig::builder()
            .limits(SizeLimits {
                markdown_max_bytes: 1,
                ..SizeLimits::default()
            })
            .build()
            .unwrap();
        let client = MarkdownClient::new(&config).unwrap();
        let file = InputFile::new("legacy.doc", vec![0; 10]);
        let err = tokio_test::block_on(client.convert(&file)).unwrap_err();
        assert!(matches!(err, DocToolsError::LegacyOfficeFormat { .. }));
    }
}
