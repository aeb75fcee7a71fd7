use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::audio_transformer::AudioTransformer;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Pitch factor applied while distracted.
pub const DEFAULT_PITCH_FACTOR: f64 = 1.3;

/// Raises pitch by `factor` by resampling each channel to `len / factor`
/// samples and playing the result at the original rate.
///
/// Tempo changes with pitch. A factor below 1 lowers the pitch.
pub struct ResamplePitchTransformer {
    factor: f64,
}

impl ResamplePitchTransformer {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl Default for ResamplePitchTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_PITCH_FACTOR)
    }
}

impl AudioTransformer for ResamplePitchTransformer {
    fn transform(&self, audio: &mut AudioSegment) -> Result<(), Box<dyn std::error::Error>> {
        if !self.factor.is_finite() || self.factor <= 0.0 {
            return Err(format!("invalid pitch factor {}", self.factor).into());
        }
        if (self.factor - 1.0).abs() < 1e-10 || audio.samples().is_empty() {
            return Ok(());
        }

        let target = (audio.frame_count() as f64 / self.factor) as usize;
        let channels: Vec<Vec<f32>> = (0..audio.channels())
            .map(|c| resample(&audio.channel(c), target))
            .collect();
        let resampled = AudioSegment::from_channels(&channels, audio.sample_rate());
        audio.replace_samples(resampled.samples().to_vec());
        Ok(())
    }
}

/// Fourier resampling of one periodic, band-limited channel to `target_len`
/// samples: truncate or zero-pad the spectrum, splitting or folding the
/// Nyquist bin.
pub fn resample(signal: &[f32], target_len: usize) -> Vec<f32> {
    let n = signal.len();
    if n == 0 || target_len == 0 {
        return vec![0.0; target_len];
    }
    if n == target_len {
        return signal.to_vec();
    }

    let mut planner = FftPlanner::<f64>::new();
    let mut spectrum: Vec<Complex<f64>> =
        signal.iter().map(|&s| Complex::new(s as f64, 0.0)).collect();
    planner.plan_fft_forward(n).process(&mut spectrum);

    let keep = n.min(target_len);
    let mut out = vec![Complex::new(0.0, 0.0); target_len];
    let positive = keep.div_ceil(2);
    out[..positive].copy_from_slice(&spectrum[..positive]);
    for k in 1..positive {
        out[target_len - k] = spectrum[n - k];
    }
    if keep % 2 == 0 {
        let half = keep / 2;
        if target_len < n {
            out[half] = spectrum[half] + spectrum[n - half];
        } else {
            out[half] = spectrum[half] * 0.5;
            out[target_len - half] = spectrum[half] * 0.5;
        }
    }

    planner.plan_fft_inverse(target_len).process(&mut out);
    let norm = 1.0 / n as f64;
    out.iter().map(|c| (c.re * norm) as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn sine(cycles: f64, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * cycles * i as f64 / len as f64).sin() as f32)
            .collect()
    }

    #[test]
    fn test_resample_keeps_cycles_over_new_length() {
        let out = resample(&sine(8.0, 1024), 512);
        assert_eq!(out.len(), 512);
        for (a, b) in out.iter().zip(sine(8.0, 512)) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_upsample_keeps_cycles() {
        let out = resample(&sine(3.0, 64), 100);
        for (a, b) in out.iter().zip(sine(3.0, 100)) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_resample_preserves_dc() {
        let out = resample(&[0.25; 300], 231);
        assert!(out.iter().all(|s| (s - 0.25).abs() < 1e-5));
    }

    #[test]
    fn test_resample_edge_lengths() {
        assert!(resample(&[], 10).iter().all(|&s| s == 0.0));
        assert!(resample(&[1.0, 2.0], 0).is_empty());
        assert_eq!(resample(&[1.0, 2.0], 2), vec![1.0, 2.0]);
    }

    #[test]
    fn test_transform_shortens_by_factor() {
        let mut audio = AudioSegment::new(sine(10.0, 1000), 44100, 1);
        ResamplePitchTransformer::default()
            .transform(&mut audio)
            .unwrap();
        assert_eq!(audio.frame_count(), (1000.0 / 1.3) as usize);
        assert_eq!(audio.sample_rate(), 44100);
    }

    #[test]
    fn test_transform_lengthens_for_factor_below_one() {
        let mut audio = AudioSegment::new(sine(10.0, 1000), 44100, 1);
        ResamplePitchTransformer::new(0.5)
            .transform(&mut audio)
            .unwrap();
        assert_eq!(audio.frame_count(), 2000);
    }

    #[test]
    fn test_transform_resamples_each_channel() {
        let left = sine(4.0, 400);
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        let mut audio = AudioSegment::from_channels(&[left, right], 8000);

        ResamplePitchTransformer::new(2.0).transform(&mut audio).unwrap();

        assert_eq!(audio.channels(), 2);
        assert_eq!(audio.frame_count(), 200);
        for (l, r) in audio.channel(0).iter().zip(audio.channel(1)) {
            assert_abs_diff_eq!(*l, -r, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_unit_factor_is_identity() {
        let original = sine(5.0, 256);
        let mut audio = AudioSegment::new(original.clone(), 16000, 1);
        ResamplePitchTransformer::new(1.0)
            .transform(&mut audio)
            .unwrap();
        assert_eq!(audio.samples(), &original[..]);
    }

    #[test]
    fn test_invalid_factor_is_rejected() {
        let mut audio = AudioSegment::new(vec![0.0; 10], 16000, 1);
        assert!(ResamplePitchTransformer::new(0.0).transform(&mut audio).is_err());
        assert!(ResamplePitchTransformer::new(f64::NAN)
            .transform(&mut audio)
            .is_err());
    }
}
