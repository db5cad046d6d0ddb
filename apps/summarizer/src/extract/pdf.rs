use std::path::Path;

use tracing::debug;

use super::{join_segments, normalize_page_text, ExtractionError};

/// Extracts a PDF's text page by page, normalizes whitespace inside each page,
/// and joins pages in order with a blank line.
pub async fn extract_pdf_text(path: &Path) -> Result<String, ExtractionError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ExtractionError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    // Parsing is CPU-bound and pdf-extract may panic on malformed input;
    // spawn_blocking keeps the executor free and turns a panic into a JoinError.
    let pages = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| ExtractionError::Pdf {
        path: path.to_path_buf(),
        message: format!("parser aborted: {e}"),
    })?
    .map_err(|message| ExtractionError::Pdf {
        path: path.to_path_buf(),
        message,
    })?;

    debug!("Extracted {} pages from {}", pages.len(), path.display());

    Ok(join_pages(&pages))
}

fn join_pages(pages: &[String]) -> String {
    join_segments(pages.iter().map(|p| normalize_page_text(p)))
}
