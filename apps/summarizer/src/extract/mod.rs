//! Text extraction: turns staged CV files into plain text.
//!
//! PDFs go through `pdf-extract` page by page; images go through Tesseract.
//! Extraction is all-or-nothing per file: a failure yields an
//! [`ExtractionError`] carrying the path, never partial text.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod ocr;
pub mod pdf;

use ocr::TesseractOcr;

/// Separator placed between pages of one PDF and between images of one CV.
pub const SEGMENT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to extract PDF text from {path}: {message}")]
    Pdf { path: PathBuf, message: String },

    #[error("OCR failed for {path}: {message}")]
    Ocr { path: PathBuf, message: String },
}

impl ExtractionError {
    pub fn path(&self) -> &Path {
        match self {
            ExtractionError::Io { path, .. }
            | ExtractionError::Pdf { path, .. }
            | ExtractionError::Ocr { path, .. } => path,
        }
    }
}

/// Formats the pipeline knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Image,
}

impl FileKind {
    /// Maps an upload's MIME type. Anything outside PDF/JPEG/JPG/PNG is `None`.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" => Some(FileKind::Pdf),
            "image/jpeg" | "image/jpg" | "image/png" => Some(FileKind::Image),
            _ => None,
        }
    }

    /// MIME type guessed from a file extension, for local submissions.
    pub fn content_type_for(path: &Path) -> Option<&'static str> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some("application/pdf"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            _ => None,
        }
    }
}

/// Collapses newlines and whitespace runs into single spaces.
/// Applying it twice gives the same text as applying it once.
pub fn normalize_page_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_whitespace = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}

/// Joins extracted segments in order with a blank line between them.
pub fn join_segments<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    segments
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(SEGMENT_SEPARATOR)
}

/// Extraction seam used by the pipeline.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_pdf(&self, path: &Path) -> Result<String, ExtractionError>;

    async fn extract_image(&self, path: &Path) -> Result<String, ExtractionError>;

    /// Extracts every page image of one logical CV, in order, and joins them.
    async fn extract_image_group(&self, paths: &[PathBuf]) -> Result<String, ExtractionError> {
        let mut texts = Vec::with_capacity(paths.len());
        for path in paths {
            texts.push(self.extract_image(path).await?);
        }
        Ok(join_segments(texts))
    }
}

/// Production extractor: `pdf-extract` for PDFs, Tesseract for images.
pub struct LocalExtractor {
    ocr: TesseractOcr,
}

impl LocalExtractor {
    pub fn new(ocr: TesseractOcr) -> Self {
        Self { ocr }
    }
}

#[async_trait]
impl TextExtractor for LocalExtractor {
    async fn extract_pdf(&self, path: &Path) -> Result<String, ExtractionError> {
        pdf::extract_pdf_text(path).await
    }

    async fn extract_image(&self, path: &Path) -> Result<String, ExtractionError> {
        self.ocr.recognize(path).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_normalize_collapses_newlines_and_runs() {
        let raw = "Jane Doe\nSenior  Engineer\n\n\tRust,   Go\r\n";
        assert_eq!(normalize_page_text(raw), "Jane Doe Senior Engineer Rust, Go ");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "",
            "   leading",
            "a\n\nb\t\tc",
            "Experiência:\n  2019 – 2023\u{a0}\u{a0}Backend",
            "no-op",
        ];
        for raw in samples {
            let once = normalize_page_text(raw);
            assert_eq!(normalize_page_text(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn test_join_segments_uses_blank_line() {
        assert_eq!(join_segments(["p1", "p2", "p3"]), "p1\n\np2\n\np3");
        assert_eq!(join_segments(Vec::<String>::new()), "");
    }

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(FileKind::from_content_type("application/pdf"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_content_type("image/JPEG"), Some(FileKind::Image));
        assert_eq!(FileKind::from_content_type("image/jpg"), Some(FileKind::Image));
        assert_eq!(
            FileKind::from_content_type("image/png; charset=binary"),
            Some(FileKind::Image)
        );
        assert_eq!(FileKind::from_content_type("image/gif"), None);
        assert_eq!(FileKind::from_content_type("text/plain"), None);
    }

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(
            FileKind::content_type_for(Path::new("cv.PDF")),
            Some("application/pdf")
        );
        assert_eq!(FileKind::content_type_for(Path::new("p1.jpeg")), Some("image/jpeg"));
        assert_eq!(FileKind::content_type_for(Path::new("notes.docx")), None);
        assert_eq!(FileKind::content_type_for(Path::new("README")), None);
    }

    struct CannedOcr(HashMap<PathBuf, &'static str>);

    #[async_trait]
    impl TextExtractor for CannedOcr {
        async fn extract_pdf(&self, path: &Path) -> Result<String, ExtractionError> {
            Err(ExtractionError::Pdf {
                path: path.to_path_buf(),
                message: "not a pdf fixture".to_string(),
            })
        }

        async fn extract_image(&self, path: &Path) -> Result<String, ExtractionError> {
            self.0
                .get(path)
                .map(|t| t.to_string())
                .ok_or_else(|| ExtractionError::Ocr {
                    path: path.to_path_buf(),
                    message: "unreadable".to_string(),
                })
        }
    }

    #[tokio::test]
    async fn test_image_group_joins_pages_in_order() {
        let ocr = CannedOcr(HashMap::from([
            (PathBuf::from("/tmp/page2.png"), "second"),
            (PathBuf::from("/tmp/page1.png"), "first"),
        ]));
        let text = ocr
            .extract_image_group(&[PathBuf::from("/tmp/page1.png"), PathBuf::from("/tmp/page2.png")])
            .await
            .unwrap();
        assert_eq!(text, "first\n\nsecond");
    }

    #[tokio::test]
    async fn test_image_group_fails_whole_group_on_one_bad_page() {
        let ocr = CannedOcr(HashMap::from([(PathBuf::from("/tmp/ok.png"), "fine")]));
        let err = ocr
            .extract_image_group(&[PathBuf::from("/tmp/ok.png"), PathBuf::from("/tmp/bad.png")])
            .await
            .unwrap_err();
        assert_eq!(err.path(), Path::new("/tmp/bad.png"));
    }
}
