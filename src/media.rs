//! Image Handling
//!
//! Archive of received images on disk and OCR text extraction through the
//! Tesseract CLI. Tesseract reads the image from stdin and writes plain
//! text to stdout, so no temporary files are involved.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// Languages handed to Tesseract
pub const OCR_LANGUAGES: &str = "spa+eng";

/// Error types for text extraction
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// The OCR binary could not be started
    #[error("OCR engine not found: {0}")]
    EngineMissing(String),

    #[error("OCR failed: {0}")]
    Failed(String),
}

/// Text extraction from image bytes
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Best-effort text, trimmed; empty when nothing legible was found
    async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError>;
}

/// Tesseract CLI wrapper
pub struct TesseractOcr {
    cmd: PathBuf,
    languages: String,
}

impl TesseractOcr {
    pub fn new(cmd: impl Into<PathBuf>) -> Self {
        Self {
            cmd: cmd.into(),
            languages: OCR_LANGUAGES.to_string(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError> {
        let mut child = Command::new(&self.cmd)
            .args(["stdin", "stdout", "-l", &self.languages])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => OcrError::EngineMissing(self.cmd.display().to_string()),
                _ => OcrError::Failed(e.to_string()),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::Failed("tesseract stdin unavailable".to_string()))?;
        let input = image.to_vec();
        let writer = async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        };

        let (written, output) = tokio::join!(writer, child.wait_with_output());
        let output = output.map_err(|e| OcrError::Failed(e.to_string()))?;

        if let Err(e) = written {
            // Tesseract may close stdin early on unreadable input; its exit status decides
            debug!("Writing image to tesseract stopped early: {}", e);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Failed(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("OCR extracted {} chars", text.chars().count());
        Ok(text)
    }
}

/// On-disk archive of received images
pub struct ImageArchive {
    dir: PathBuf,
}

impl ImageArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the bytes as `<phone>_<8 hex>.jpg`; returns the file name
    pub async fn save(&self, phone: &str, bytes: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating image directory {}", self.dir.display()))?;

        let suffix: String = uuid::Uuid::new_v4().simple().to_string().chars().take(8).collect();
        let file_name = format!("{}_{}.jpg", phone, suffix);
        let path = self.dir.join(&file_name);

        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing image {}", path.display()))?;

        info!("Archived image {} ({} bytes)", file_name, bytes.len());
        Ok(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_archive_writes_named_file() {
        let dir = TempDir::new().unwrap();
        let archive = ImageArchive::new(dir.path().join("imagenes"));

        let name = archive.save("3000000000", b"\xff\xd8jpeg").await.unwrap();
        assert!(name.starts_with("3000000000_"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), "3000000000_".len() + 8 + ".jpg".len());

        let stored = std::fs::read(archive.dir().join(&name)).unwrap();
        assert_eq!(stored, b"\xff\xd8jpeg");
    }

    #[tokio::test]
    async fn test_missing_binary_is_engine_missing() {
        let ocr = TesseractOcr::new("/nonexistent/tesseract-binary");
        let err = ocr.extract_text(b"not an image").await.unwrap_err();
        assert!(matches!(err, OcrError::EngineMissing(_)));
    }
}
