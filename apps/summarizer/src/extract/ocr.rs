//! Tesseract OCR, driven as a subprocess.

use std::ffi::OsString;
use std::path::Path;

use tokio::process::Command;

use super::ExtractionError;

/// LSTM engine only.
const OCR_ENGINE_MODE: &str = "3";

#[derive(Debug, Clone)]
pub struct TesseractOcr {
    bin: String,
    /// Tesseract language spec, e.g. `por+eng`.
    languages: String,
}

impl TesseractOcr {
    pub fn new(bin: impl Into<String>, languages: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            languages: languages.into(),
        }
    }

    /// Checks that the configured binary can be launched.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.bin)
            .arg("--version")
            .kill_on_drop(true)
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Runs OCR over one image and returns its raw text.
    pub async fn recognize(&self, image: &Path) -> Result<String, ExtractionError> {
        let output = Command::new(&self.bin)
            .args(self.args_for(image))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ExtractionError::Ocr {
                path: image.to_path_buf(),
                message: format!("failed to run {}: {e}", self.bin),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Ocr {
                path: image.to_path_buf(),
                message: format!("tesseract exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn args_for(&self, image: &Path) -> Vec<OsString> {
        vec![
            image.as_os_str().to_os_string(),
            "stdout".into(),
            "--oem".into(),
            OCR_ENGINE_MODE.into(),
            "-l".into(),
            self.languages.clone().into(),
        ]
    }
}
