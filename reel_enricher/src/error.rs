use thiserror::Error;

/// Failures internal to extraction or transcription. Never crosses
/// [`crate::enricher::Enricher::enrich`]; callers only ever see a
/// downgraded [`crate::enricher::EnrichResult`] field.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("failed to download audio: {0}")]
    Download(#[from] reqwest::Error),

    #[error("audio file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("transcription process failed: {0}")]
    Process(String),
}
