//! Combines [`crate::extractor::AudioExtractor`] and
//! [`crate::transcriber::Transcriber`] into the enrichment algorithm: for a
//! freshly discovered video, download its audio to a content-addressed
//! path and transcribe it, tolerating partial failure of
//! either step. [`Enricher::enrich`] never returns an error to its caller:
//! a failed extraction or transcription downgrades to a `None` field, and
//! the Video row is still created.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::extractor::AudioExtractor;
use crate::transcriber::Transcriber;

/// The two fields of a [`Video`](reel_store::models::Video) that
/// enrichment is responsible for filling in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichResult {
    pub audio_file_path: Option<PathBuf>,
    pub transcription: Option<String>,
}

/// Produces an [`EnrichResult`] for a discovered video's `(shortcode, media_url)`.
pub struct Enricher {
    extractor: Arc<dyn AudioExtractor>,
    transcriber: Arc<dyn Transcriber>,
    audio_dir: PathBuf,
}

impl Enricher {
    pub fn new(
        extractor: Arc<dyn AudioExtractor>,
        transcriber: Arc<dyn Transcriber>,
        audio_dir: PathBuf,
    ) -> Self {
        Self { extractor, transcriber, audio_dir }
    }

    /// `<audio_dir>/<shortcode>.mp3`, the deterministic audio path for a shortcode.
    pub fn audio_path(&self, shortcode: &str) -> PathBuf {
        self.audio_dir.join(format!("{shortcode}.mp3"))
    }

    /// Idempotent: calling twice for the same shortcode reuses an existing
    /// non-empty mp3 rather than re-downloading, and always re-attempts
    /// transcription (the caller, via `Store::upsert_video`'s fill-if-null
    /// semantics, decides whether a fresh transcription is actually needed).
    pub async fn enrich(&self, shortcode: &str, media_url: &str) -> EnrichResult {
        let dest = self.audio_path(shortcode);

        let already_present = tokio::fs::metadata(&dest)
            .await
            .map(|m| m.len() > 0)
            .unwrap_or(false);

        if !already_present {
            if let Err(error) = self.extractor.extract(media_url, &dest).await {
                warn!(shortcode, %error, "audio extraction failed, video will be created without audio");
                return EnrichResult { audio_file_path: None, transcription: None };
            }
        }

        let transcription = match self.transcriber.transcribe(&dest).await {
            Ok(text) => Some(text),
            Err(error) => {
                warn!(shortcode, %error, "transcription failed, video will be created without it");
                None
            }
        };

        EnrichResult { audio_file_path: Some(dest), transcription }
    }
}
