//! Result types: per-page records and the aggregate OCR document.
//!
//! The serialised shape is the on-disk artifact:
//!
//! ```json
//! {"pages": [{"index": 1, "text": "…", "raw_response": "…"}, …]}
//! ```
//!
//! Failed pages carry an extra `"error"` object; successful pages omit it.

use crate::error::{PageError, PdfOcrError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix appended to the input stem to name the output file.
pub const OUTPUT_SUFFIX: &str = "_ocr.json";

/// Prefix of the `text` written for a page whose OCR call failed.
pub const ERROR_MARKER: &str = "[OCR ERROR]";

/// Result of OCR for a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number, in document order.
    pub index: usize,
    /// Text exactly as returned by the service, or an [`ERROR_MARKER`] line
    /// naming the failure.
    pub text: String,
    /// The service response, verbatim. Empty when raw responses are omitted
    /// or when the call never produced one.
    pub raw_response: String,
    /// Present only when this page failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PageError>,
}

impl PageResult {
    /// A successful page.
    pub fn success(index: usize, text: String, raw_response: String) -> Self {
        Self {
            index,
            text,
            raw_response,
            error: None,
        }
    }

    /// A failed page. The text is a human-readable marker so a reviewer
    /// reading only the JSON can spot pages that need reprocessing.
    pub fn failure(index: usize, error: PageError) -> Self {
        Self {
            index,
            text: format!("{ERROR_MARKER} {error}"),
            raw_response: String::new(),
            error: Some(error),
        }
    }

    /// Whether the OCR call for this page succeeded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// The aggregate result: one [`PageResult`] per rasterised page, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrDocument {
    pub pages: Vec<PageResult>,
}

impl OcrDocument {
    pub fn new(pages: Vec<PageResult>) -> Self {
        Self { pages }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Number of pages whose OCR call succeeded.
    pub fn success_count(&self) -> usize {
        self.pages.iter().filter(|p| p.is_ok()).count()
    }

    /// 1-indexed page numbers that failed, ascending.
    pub fn failed_pages(&self) -> Vec<usize> {
        self.pages
            .iter()
            .filter(|p| !p.is_ok())
            .map(|p| p.index)
            .collect()
    }

    /// Treat any page failure as an error.
    ///
    /// The default pipeline never does this; callers that need all-or-nothing
    /// semantics opt in here.
    pub fn into_result(self) -> Result<Self, PdfOcrError> {
        let failed = self.failed_pages();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(PdfOcrError::PartialFailure {
                failed: failed.len(),
                total: self.pages.len(),
                pages: failed,
            })
        }
    }

    /// Pretty-printed JSON. Non-ASCII text is written as-is, not escaped.
    pub fn to_json_pretty(&self) -> Result<String, PdfOcrError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a previously written artifact.
    pub fn from_json(json: &str) -> Result<Self, PdfOcrError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the document as JSON to `path`.
    ///
    /// Uses atomic write (temp file + rename) to prevent partial files.
    pub async fn write_json(&self, path: &Path) -> Result<(), PdfOcrError> {
        let json = self.to_json_pretty()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PdfOcrError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json.as_bytes())
            .await
            .map_err(|e| PdfOcrError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            tokio::fs::remove_file(&tmp_path).await.ok();
            return Err(PdfOcrError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }

        debug!("Wrote {} bytes to {}", json.len(), path.display());
        Ok(())
    }
}

/// Derive the artifact path for an input PDF: same directory, input stem
/// plus [`OUTPUT_SUFFIX`].
///
/// ```rust
/// use pdf_ocr::default_output_path;
/// use std::path::Path;
///
/// assert_eq!(
///     default_output_path(Path::new("/scans/report.v2.pdf")),
///     Path::new("/scans/report.v2_ocr.json"),
/// );
/// ```
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let name = format!("{stem}{OUTPUT_SUFFIX}");
    match input.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Document-level information read without OCR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub pdf_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OcrDocument {
        OcrDocument::new(vec![
            PageResult::success(1, "Hello\n  world".into(), "{\"id\":\"a\"}".into()),
            PageResult::failure(
                2,
                PageError::Service {
                    page: 2,
                    status: 503,
                    body: "overloaded".into(),
                },
            ),
            PageResult::success(3, "Grüße — 東京 ∑x²".into(), String::new()),
        ])
    }

    #[test]
    fn failure_text_names_page_and_cause() {
        let doc = sample();
        let failed = &doc.pages[1];
        assert!(failed.text.starts_with(ERROR_MARKER));
        assert!(failed.text.contains("Page 2"));
        assert!(failed.text.contains("503"));
        assert!(failed.raw_response.is_empty());
    }

    #[test]
    fn counts_and_failed_pages() {
        let doc = sample();
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.success_count(), 2);
        assert_eq!(doc.failed_pages(), vec![2]);
    }

    #[test]
    fn into_result_rejects_partial_failure() {
        match sample().into_result() {
            Err(PdfOcrError::PartialFailure { failed, total, pages }) => {
                assert_eq!((failed, total), (1, 3));
                assert_eq!(pages, vec![2]);
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
    }

    #[test]
    fn json_shape_matches_artifact_contract() {
        let json = sample().to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let first = &value["pages"][0];
        assert_eq!(first["index"], 1);
        assert_eq!(first["text"], "Hello\n  world");
        assert_eq!(first["raw_response"], "{\"id\":\"a\"}");
        assert!(first.get("error").is_none());
        assert_eq!(value["pages"][1]["error"]["kind"], "service");
    }

    #[test]
    fn json_keeps_non_ascii_unescaped() {
        let json = sample().to_json_pretty().unwrap();
        assert!(json.contains("Grüße — 東京 ∑x²"));
        assert!(!json.contains("\\u"));
    }

    #[test]
    fn json_reparse_preserves_pages() {
        let doc = sample();
        let back = OcrDocument::from_json(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn output_path_uses_stem_and_input_dir() {
        assert_eq!(
            default_output_path(Path::new("/data/in/scan.pdf")),
            PathBuf::from("/data/in/scan_ocr.json")
        );
        assert_eq!(
            default_output_path(Path::new("scan.pdf")),
            PathBuf::from("scan_ocr.json")
        );
    }

    #[tokio::test]
    async fn write_json_is_atomic_and_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out_ocr.json");
        let doc = sample();
        doc.write_json(&path).await.unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(OcrDocument::from_json(&text).unwrap(), doc);
    }

    #[tokio::test]
    async fn write_json_into_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let err = sample()
            .write_json(&blocker.join("out.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, PdfOcrError::OutputWriteFailed { .. }));
    }

    #[tokio::test]
    async fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory at the target path makes the rename fail.
        let path = dir.path().join("out_ocr.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let err = sample().write_json(&path).await.unwrap_err();
        assert!(matches!(err, PdfOcrError::OutputWriteFailed { .. }));
        assert!(!path.with_extension("json.tmp").exists());
        assert!(path.join("keep").exists());
    }
}
