/// A chunk of PCM audio: interleaved samples normalized to [-1.0, 1.0].
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSegment {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioSegment {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels: channels.max(1),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Swaps in new interleaved samples with the same rate and layout.
    pub fn replace_samples(&mut self, samples: Vec<f32>) {
        self.samples = samples;
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Samples per channel.
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// One channel's samples, de-interleaved.
    pub fn channel(&self, index: u16) -> Vec<f32> {
        self.samples
            .iter()
            .skip(index as usize)
            .step_by(self.channels as usize)
            .copied()
            .collect()
    }

    /// Interleaves equally long per-channel buffers.
    pub fn from_channels(channels: &[Vec<f32>], sample_rate: u32) -> Self {
        let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
        let samples = (0..frames)
            .flat_map(|i| channels.iter().map(move |c| c[i]))
            .collect();
        Self::new(samples, sample_rate, channels.len() as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let seg = AudioSegment::new(vec![0.0f32; 44100], 44100, 1);
        assert_eq!(seg.samples().len(), 44100);
        assert_eq!(seg.sample_rate(), 44100);
        assert_eq!(seg.channels(), 1);
    }

    #[test]
    fn test_duration_counts_frames_not_samples() {
        assert_eq!(AudioSegment::new(vec![0.0; 48000], 16000, 1).duration(), 3.0);
        assert_eq!(AudioSegment::new(vec![0.0; 96000], 48000, 2).duration(), 1.0);
    }

    #[test]
    fn test_zero_channels_treated_as_mono() {
        let seg = AudioSegment::new(vec![0.0; 10], 100, 0);
        assert_eq!(seg.channels(), 1);
        assert_eq!(seg.frame_count(), 10);
    }

    #[test]
    fn test_channel_split_and_join() {
        let seg = AudioSegment::new(vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0], 8000, 2);
        let left = seg.channel(0);
        let right = seg.channel(1);
        assert_eq!(left, vec![1.0, 2.0, 3.0]);
        assert_eq!(right, vec![-1.0, -2.0, -3.0]);
        assert_eq!(AudioSegment::from_channels(&[left, right], 8000), seg);
    }

    #[test]
    fn test_replace_samples_keeps_format() {
        let mut seg = AudioSegment::new(vec![0.0; 100], 16000, 2);
        seg.replace_samples(vec![0.5; 40]);
        assert_eq!(seg.frame_count(), 20);
        assert_eq!(seg.sample_rate(), 16000);
        seg.samples_mut()[0] = 1.0;
        assert_eq!(seg.samples()[0], 1.0);
    }
}
