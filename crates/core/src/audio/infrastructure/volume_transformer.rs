use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::audio_transformer::AudioTransformer;

/// Gain for the "volume down" intervention.
pub const QUIETER_GAIN: f32 = 0.5;
/// Gain for the "volume up" intervention.
pub const LOUDER_GAIN: f32 = 1.5;

/// Scales every sample by `gain`, hard-clipping to [-1, 1].
pub struct VolumeTransformer {
    gain: f32,
}

impl VolumeTransformer {
    pub fn new(gain: f32) -> Self {
        Self { gain }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }
}

impl AudioTransformer for VolumeTransformer {
    fn transform(&self, audio: &mut AudioSegment) -> Result<(), Box<dyn std::error::Error>> {
        if !self.gain.is_finite() || self.gain < 0.0 {
            return Err(format!("invalid gain {}", self.gain).into());
        }
        for sample in audio.samples_mut() {
            *sample = (*sample * self.gain).clamp(-1.0, 1.0);
        }
        Ok(())
    }
}

/// A mono sine tone, sampled at both ends of `[0, duration]`.
pub fn generate_beep(duration: f64, frequency: f64, sample_rate: u32) -> AudioSegment {
    let n = (sample_rate as f64 * duration).max(0.0) as usize;
    let step = if n > 1 { duration / (n - 1) as f64 } else { 0.0 };
    let samples = (0..n)
        .map(|i| (2.0 * std::f64::consts::PI * frequency * i as f64 * step).sin() as f32)
        .collect();
    AudioSegment::new(samples, sample_rate, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[rstest]
    #[case(QUIETER_GAIN, 0.4, 0.2)]
    #[case(LOUDER_GAIN, 0.4, 0.6)]
    #[case(LOUDER_GAIN, 0.8, 1.0)]
    #[case(LOUDER_GAIN, -0.9, -1.0)]
    #[case(0.0, 0.7, 0.0)]
    fn test_gain_is_applied_and_clipped(#[case] gain: f32, #[case] input: f32, #[case] expected: f32) {
        let mut audio = AudioSegment::new(vec![input], 44100, 1);
        VolumeTransformer::new(gain).transform(&mut audio).unwrap();
        assert_abs_diff_eq!(audio.samples()[0], expected, epsilon = 1e-6);
    }

    #[test]
    fn test_negative_gain_is_rejected() {
        let mut audio = AudioSegment::new(vec![0.1], 44100, 1);
        assert!(VolumeTransformer::new(-1.0).transform(&mut audio).is_err());
    }

    #[test]
    fn test_beep_length_and_range() {
        let beep = generate_beep(0.1, 440.0, 44100);
        assert_eq!(beep.samples().len(), 4410);
        assert_eq!(beep.channels(), 1);
        assert_abs_diff_eq!(beep.samples()[0], 0.0);
        assert!(beep.samples().iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(beep.samples().iter().any(|&s| s > 0.99));
    }

    #[test]
    fn test_beep_frequency_from_zero_crossings() {
        // 1 s at 100 Hz: 200 sign changes, give or take the endpoints.
        let beep = generate_beep(1.0, 100.0, 8000);
        let crossings = beep
            .samples()
            .windows(2)
            .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
            .count();
        assert!((198..=201).contains(&crossings), "got {crossings}");
    }

    #[test]
    fn test_zero_duration_beep_is_empty() {
        assert!(generate_beep(0.0, 440.0, 44100).samples().is_empty());
    }
}
