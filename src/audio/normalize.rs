//! PCM normalization for speech engines.
//!
//! Speech engines want mono f32 at a fixed rate; capture hands over
//! interleaved multi-channel i16. Policy: average the channels, resample by
//! linear interpolation over the sample index, scale integers into [-1, 1].
//! Linear interpolation is not bandlimited; for speech that tradeoff is fine.

/// Scale 16-bit integer PCM into [-1.0, 1.0].
pub fn to_float(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32_768.0).collect()
}

/// Fold interleaved multi-channel samples to mono by averaging each frame.
pub fn fold_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    let stride = channels as usize;
    samples
        .chunks(stride)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Resample audio from one rate to another using linear interpolation.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let new_len = (samples.len() as f64 / ratio).round() as usize;
    let mut resampled = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_pos = i as f64 * ratio;
        let src_idx = src_pos as usize;
        let frac = src_pos - src_idx as f64;

        let sample = if src_idx + 1 < samples.len() {
            samples[src_idx] as f64 * (1.0 - frac) + samples[src_idx + 1] as f64 * frac
        } else if src_idx < samples.len() {
            samples[src_idx] as f64
        } else {
            0.0
        };

        resampled.push(sample as f32);
    }

    resampled
}

/// Full pipeline: interleaved i16 at (`sample_rate`, `channels`) to mono f32
/// at `target_rate`.
pub fn prepare_for_engine(
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
    target_rate: u32,
) -> Vec<f32> {
    let float = to_float(samples);
    let mono = fold_to_mono(&float, channels);
    resample(&mono, sample_rate, target_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_float_bounds() {
        let converted = to_float(&[i16::MIN, 0, i16::MAX]);
        assert_eq!(converted[0], -1.0);
        assert_eq!(converted[1], 0.0);
        assert!(converted[2] < 1.0 && converted[2] > 0.999);
    }

    #[test]
    fn test_fold_stereo_averages_frames() {
        let folded = fold_to_mono(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2);
        assert_eq!(folded, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_fold_mono_is_identity() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(fold_to_mono(&samples, 1), samples);
    }

    #[test]
    fn test_fold_handles_trailing_partial_frame() {
        // A truncated final frame is averaged over what is there.
        let folded = fold_to_mono(&[1.0, 0.0, 0.8], 2);
        assert_eq!(folded, vec![0.5, 0.8]);
    }

    #[test]
    fn test_resample_same_rate() {
        let samples = vec![1.0, 2.0, 3.0];
        assert_eq!(resample(&samples, 16_000, 16_000), samples);
    }

    #[test]
    fn test_resample_empty() {
        assert!(resample(&[], 48_000, 16_000).is_empty());
    }

    #[test]
    fn test_resample_downsample_length() {
        // 48kHz to 16kHz is a 3:1 ratio.
        let samples: Vec<f32> = (0..48).map(|i| i as f32).collect();
        assert_eq!(resample(&samples, 48_000, 16_000).len(), 16);
    }

    #[test]
    fn test_resample_preserves_constant_signal() {
        let samples = vec![0.25; 441];
        let out = resample(&samples, 44_100, 16_000);
        for sample in &out {
            assert!((sample - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_prepare_for_engine_length() {
        // One second of 44.1kHz stereo should land at one second of 16kHz mono.
        let samples = vec![0i16; 44_100 * 2];
        let prepared = prepare_for_engine(&samples, 44_100, 2, 16_000);
        let expected = (44_100f64 * 16_000.0 / 44_100.0).round() as usize;
        assert!((prepared.len() as i64 - expected as i64).abs() <= 1);
    }

    #[test]
    fn test_prepare_for_engine_silence_stays_silent() {
        let samples = vec![0i16; 4_410 * 2];
        let prepared = prepare_for_engine(&samples, 44_100, 2, 16_000);
        assert!(prepared.iter().all(|&s| s == 0.0));
    }
}
