//! The Media Enricher: for a freshly discovered video, downloads audio to
//! a content-addressed file and transcribes it, tolerating partial
//! failure of either step.

pub mod enricher;
pub mod error;
pub mod extractor;
pub mod transcriber;

pub use enricher::{EnrichResult, Enricher};
pub use error::EnrichError;
pub use extractor::{AudioExtractor, HttpAudioExtractor};
pub use transcriber::{ProcessTranscriber, Transcriber};
