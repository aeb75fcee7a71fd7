use std::path::Path;

use super::audio_segment::AudioSegment;

/// Persists a processed soundtrack.
pub trait AudioWriter: Send {
    fn write(&self, path: &Path, audio: &AudioSegment) -> Result<(), Box<dyn std::error::Error>>;
}
