use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;

/// Decodes the soundtrack of a recorded video.
pub trait AudioReader: Send {
    /// Decodes to interleaved f32 PCM at `sample_rate` with `channels`
    /// channels. Returns `None` when the file has no audio track.
    fn read_audio(
        &self,
        path: &Path,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>>;
}
