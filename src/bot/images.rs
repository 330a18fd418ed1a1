//! Background Image Task
//!
//! Download, archive and OCR run outside the user's lock. Analysis of the
//! extracted text re-acquires the lock and reloads the record, as if a new
//! text message had arrived.

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use super::analysis::ImageContext;
use super::SecurityBot;
use crate::channels::ChannelError;
use crate::media::OcrError;
use crate::replies;
use crate::text::collapse_whitespace;

/// Failure of one stage of the image pipeline
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("download failed: {0}")]
    Download(#[from] ChannelError),

    #[error("archiving failed: {0:#}")]
    Archive(anyhow::Error),

    #[error(transparent)]
    Ocr(#[from] OcrError),
}

impl ImageError {
    fn apology(&self, name: &str) -> String {
        match self {
            ImageError::Download(_) => replies::image_download_failed(name),
            ImageError::Ocr(OcrError::EngineMissing(_)) => replies::ocr_unavailable(name),
            ImageError::Archive(_) | ImageError::Ocr(OcrError::Failed(_)) => {
                replies::image_unexpected_error(name)
            }
        }
    }
}

impl SecurityBot {
    /// Fire-and-forget processing of a received image
    pub(super) fn spawn_image_task(&self, phone: &str, media_id: &str) {
        let bot = self.clone();
        let phone = phone.to_string();
        let media_id = media_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = bot.process_image(&phone, &media_id).await {
                error!(phone = %phone, media_id = %media_id, "Image task failed: {:#}", e);
            }
        });
    }

    /// Run the whole image pipeline for one media reference.
    ///
    /// Public so callers that already run off the request path can await it.
    pub async fn process_image(&self, phone: &str, media_id: &str) -> Result<()> {
        info!(phone = %phone, media_id = %media_id, "Processing image");

        let (ocr_text, image_ref) = match self.read_image(phone, media_id).await {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!(phone = %phone, media_id = %media_id, "Image pipeline stopped: {}", e);
                let name = self.display_name_for(phone)?;
                self.reply(phone, &e.apology(&name)).await;
                return Ok(());
            }
        };

        if ocr_text.is_empty() {
            info!(phone = %phone, image = %image_ref, "No legible text in image");
            let name = self.display_name_for(phone)?;
            self.reply(phone, &replies::image_no_text(&name)).await;
            return Ok(());
        }

        let _guard = self.locks.acquire(phone).await;
        let user = self
            .store
            .get(phone)?
            .with_context(|| format!("user {} missing during image analysis", phone))?;

        let note = replies::ocr_provenance_note(user.display_name(), &ocr_text);
        let context = ImageContext {
            ocr_text,
            image_ref,
        };
        self.run_analysis(&user, &collapse_whitespace(&note), Some(&context))
            .await
    }

    /// Download, archive and OCR; returns the trimmed text and the file name
    async fn read_image(&self, phone: &str, media_id: &str) -> Result<(String, String), ImageError> {
        let bytes = self.media.fetch_image(media_id).await?;

        let image_ref = self
            .archive
            .save(phone, &bytes)
            .await
            .map_err(ImageError::Archive)?;
        self.store
            .record_image(phone, &image_ref)
            .map_err(ImageError::Archive)?;

        let text = self.ocr.extract_text(&bytes).await?;
        Ok((text.trim().to_string(), image_ref))
    }

    fn display_name_for(&self, phone: &str) -> Result<String> {
        Ok(self
            .store
            .get(phone)?
            .map(|u| u.display_name().to_string())
            .unwrap_or_else(|| "tú".to_string()))
    }
}
