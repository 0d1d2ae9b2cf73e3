//! The transcription seam: `audio file -> UTF-8 text`.
//!
//! The speech-to-text model itself is opaque (a transformer mapping audio
//! bytes to text); the one concrete implementation here shells out to a
//! configured executable, so the actual model is swappable without
//! touching this crate.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::EnrichError;

/// Produces UTF-8 text from a local audio file. CPU-heavy implementations
/// must not block the caller's scheduling loop; [`ProcessTranscriber`]
/// satisfies this by running in a subprocess rather than in-process.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, EnrichError>;
}

/// Runs a configured executable against the audio file and takes its
/// stdout, trimmed, as the transcription. The executable and any leading
/// arguments are fixed at construction; the audio path is appended last.
pub struct ProcessTranscriber {
    program: String,
    args: Vec<String>,
}

impl ProcessTranscriber {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }
}

#[async_trait]
impl Transcriber for ProcessTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, EnrichError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(audio_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| EnrichError::Process(e.to_string()))?;

        if !output.status.success() {
            return Err(EnrichError::Process(format!(
                "transcriber exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let text = String::from_utf8(output.stdout)
            .map_err(|e| EnrichError::Process(format!("non-utf8 transcriber output: {e}")))?;
        Ok(text.trim().to_string())
    }
}
