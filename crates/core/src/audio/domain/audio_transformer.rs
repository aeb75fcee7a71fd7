use super::audio_segment::AudioSegment;

/// An in-place effect over one audio chunk (pitch, volume). Implementations
/// may change the chunk length.
pub trait AudioTransformer: Send {
    fn transform(&self, audio: &mut AudioSegment) -> Result<(), Box<dyn std::error::Error>>;
}
