use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::audio_writer::AudioWriter;

/// Writes 32-bit float WAV files with `hound`.
pub struct WavAudioWriter;

impl AudioWriter for WavAudioWriter {
    fn write(&self, path: &Path, audio: &AudioSegment) -> Result<(), Box<dyn std::error::Error>> {
        let spec = hound::WavSpec {
            channels: audio.channels(),
            sample_rate: audio.sample_rate(),
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in audio.samples() {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        log::info!("wrote {:.1}s of audio to {}", audio.duration(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_written_file_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.wav");
        let audio = AudioSegment::new(vec![0.0, 0.5, -0.25, 1.0, -1.0, 0.125], 44100, 2);

        WavAudioWriter.write(&path, &audio).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        let samples: Vec<f32> = reader.samples::<f32>().map(Result::unwrap).collect();
        assert_eq!(samples, audio.samples());
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let audio = AudioSegment::new(vec![0.0; 4], 44100, 1);
        assert!(WavAudioWriter.write(&blocker.join("out.wav"), &audio).is_err());
    }
}
