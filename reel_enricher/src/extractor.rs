//! The audio extractor seam: `media_url -> local mp3 file`.
//!
//! Treated as an opaque collaborator: the real extraction mechanism (a
//! transcoder, a dedicated microservice, ffmpeg) is outside this crate's
//! concern. [`HttpAudioExtractor`] is the one concrete implementation that
//! ships here, for the common case where the upstream audio URL is already
//! directly fetchable bytes.

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use tempfile::NamedTempFile;

use crate::error::EnrichError;

/// Produces a local file at `dest` from `media_url`. Implementations own
/// the full fetch-and-write; callers only care that `dest` exists and is
/// non-empty on success.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    async fn extract(&self, media_url: &str, dest: &Path) -> Result<(), EnrichError>;
}

/// Downloads `media_url` over HTTP and writes it to `dest` atomically
/// (temp file in the same directory, then rename).
pub struct HttpAudioExtractor {
    client: Client,
}

impl HttpAudioExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AudioExtractor for HttpAudioExtractor {
    async fn extract(&self, media_url: &str, dest: &Path) -> Result<(), EnrichError> {
        let bytes = self.client.get(media_url).send().await?.error_for_status()?.bytes().await?;

        let dir = dest.parent().filter(|p| !p.as_os_str().is_empty()).map(|p| p.to_path_buf());
        let dest = dest.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<(), EnrichError> {
            let mut tmp = match &dir {
                Some(dir) => {
                    std::fs::create_dir_all(dir)?;
                    NamedTempFile::new_in(dir)?
                }
                None => NamedTempFile::new()?,
            };
            std::io::Write::write_all(&mut tmp, &bytes)?;
            tmp.persist(&dest).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| EnrichError::Process(e.to_string()))??;

        Ok(())
    }
}
