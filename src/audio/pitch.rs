//! Duration-preserving pitch shifting.
//!
//! The waveform is resampled to `rate * pitch_factor`, which moves pitch and
//! length together, then phase-vocoder time-stretched back to its original
//! length and played at the original rate.

use std::f32::consts::PI;

use realfft::num_complex::Complex;
use realfft::RealFftPlanner;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::{Result, SynthesisResult};

/// Signals shorter than this (seconds) are passed through untouched.
pub const MIN_AUDIO_DURATION: f64 = 0.5;

/// STFT frame length used by the time stretcher.
const STFT_SIZE: usize = 2048;

/// Hop between STFT frames (75% overlap).
const STFT_HOP: usize = STFT_SIZE / 4;

#[derive(Debug, Clone, Copy)]
pub struct PitchShifter {
    min_duration_secs: f64,
}

impl Default for PitchShifter {
    fn default() -> Self {
        Self::new(MIN_AUDIO_DURATION)
    }
}

impl PitchShifter {
    pub fn new(min_duration_secs: f64) -> Self {
        Self { min_duration_secs }
    }

    /// Shift `samples` by `pitch_factor` while keeping their length.
    ///
    /// The output is meant to be played at `sample_rate`. Inputs shorter
    /// than the minimum duration come back unmodified.
    pub fn shift(&self, samples: &[f32], sample_rate: u32, pitch_factor: f64) -> Result<Vec<f32>> {
        let duration = samples.len() as f64 / sample_rate as f64;
        if duration < self.min_duration_secs {
            log::warn!(
                "Audio of {duration:.2}s is too short for pitch shifting, passing through"
            );
            return Ok(samples.to_vec());
        }
        if (pitch_factor - 1.0).abs() < f64::EPSILON {
            return Ok(samples.to_vec());
        }

        let target_rate = (sample_rate as f64 * pitch_factor).round() as u32;
        let shifted = resample(samples, sample_rate, target_rate)?;

        let stretch = shifted.len() as f64 / (sample_rate as f64 * duration);
        log::debug!(
            "Pitch factor {pitch_factor:.3}: {sample_rate}Hz -> {target_rate}Hz, stretch {stretch:.3}"
        );
        time_stretch(&shifted, stretch, samples.len())
    }

    /// Shift a whole synthesis result; the sample rate is kept.
    pub fn shift_result(&self, audio: &SynthesisResult, pitch_factor: f64) -> Result<SynthesisResult> {
        Ok(SynthesisResult {
            samples: self.shift(&audio.samples, audio.sample_rate, pitch_factor)?,
            sample_rate: audio.sample_rate,
        })
    }
}

/// Band-limited resampling of a mono signal.
///
/// The output holds exactly `round(len * to / from)` samples with the
/// resampler's group delay removed.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let expected = (samples.len() as f64 * ratio).round() as usize;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, samples.len(), 1)?;
    let delay = resampler.output_delay();

    let mut out = resampler.process(&[samples.to_vec()], None)?.remove(0);
    // Flush the filter tail with silence until the delayed signal is complete.
    while out.len() < expected + delay {
        let tail = resampler.process_partial(None::<&[Vec<f32>]>, None)?;
        match tail.first() {
            Some(channel) if !channel.is_empty() => out.extend_from_slice(channel),
            _ => break,
        }
    }

    out.drain(..delay.min(out.len()));
    out.resize(expected, 0.0);
    Ok(out)
}

/// Phase-vocoder time stretch.
///
/// `rate > 1` speeds the signal up. The output is forced to exactly
/// `target_len` samples; callers pick `target_len ≈ len / rate`.
pub fn time_stretch(samples: &[f32], rate: f64, target_len: usize) -> Result<Vec<f32>> {
    if samples.is_empty() || target_len == 0 || rate <= 0.0 {
        return Ok(vec![0.0; target_len]);
    }

    let n = STFT_SIZE;
    let hop = STFT_HOP;
    let bins = n / 2 + 1;
    let pad = n / 2;
    let window = hann_window(n);

    // Centre the first frame on sample 0 and leave room for the last one.
    let mut padded = vec![0.0f32; pad];
    padded.extend_from_slice(samples);
    padded.resize(padded.len() + pad + n, 0.0);
    let n_frames = 1 + (padded.len() - n) / hop;

    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let ifft = planner.plan_fft_inverse(n);

    let mut frames = Vec::with_capacity(n_frames);
    let mut frame_in = fft.make_input_vec();
    for f in 0..n_frames {
        let start = f * hop;
        for (i, slot) in frame_in.iter_mut().enumerate() {
            *slot = padded[start + i] * window[i];
        }
        let mut spectrum = fft.make_output_vec();
        fft.process(&mut frame_in, &mut spectrum)?;
        frames.push(spectrum);
    }

    let expected_advance: Vec<f32> = (0..bins)
        .map(|i| 2.0 * PI * i as f32 * hop as f32 / n as f32)
        .collect();
    let mut phase: Vec<f32> = frames[0].iter().map(|c| c.arg()).collect();

    let steps = ((n_frames - 1) as f64 / rate).ceil() as usize;
    let out_len = (steps * hop + n).max(pad + target_len);
    let mut out = vec![0.0f32; out_len];
    let mut norm = vec![0.0f32; out_len];

    let mut spectrum = ifft.make_input_vec();
    let mut frame_out = ifft.make_output_vec();
    let scale = 1.0 / n as f32;

    for step in 0..steps {
        let t = step as f64 * rate;
        let k = t.floor() as usize;
        if k + 1 >= n_frames {
            break;
        }
        let alpha = (t - k as f64) as f32;
        let (current, next) = (&frames[k], &frames[k + 1]);

        for i in 0..bins {
            let magnitude = (1.0 - alpha) * current[i].norm() + alpha * next[i].norm();
            spectrum[i] = Complex::from_polar(magnitude, phase[i]);

            let deviation = next[i].arg() - current[i].arg() - expected_advance[i];
            phase[i] += expected_advance[i] + wrap_phase(deviation);
        }
        // DC and Nyquist bins must be real for the inverse transform.
        spectrum[0].im = 0.0;
        spectrum[bins - 1].im = 0.0;

        ifft.process(&mut spectrum, &mut frame_out)?;

        let offset = step * hop;
        for i in 0..n {
            out[offset + i] += frame_out[i] * scale * window[i];
            norm[offset + i] += window[i] * window[i];
        }
    }

    Ok((pad..pad + target_len)
        .map(|i| {
            if norm[i] > 1e-6 {
                out[i] / norm[i]
            } else {
                out[i]
            }
        })
        .collect())
}

fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / n as f32).cos())
        .collect()
}

fn wrap_phase(x: f32) -> f32 {
    x - 2.0 * PI * (x / (2.0 * PI)).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, secs: f32) -> Vec<f32> {
        let len = (sample_rate as f32 * secs) as usize;
        (0..len)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    fn zero_crossings(samples: &[f32]) -> usize {
        samples
            .windows(2)
            .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
            .count()
    }

    #[test]
    fn keeps_length_across_the_pitch_range() {
        let shifter = PitchShifter::default();
        let input = sine(220.0, 16_000, 1.2);
        for factor in [0.8, 0.9, 1.05, 1.17, 1.299] {
            let out = shifter.shift(&input, 16_000, factor).unwrap();
            assert!(
                out.len().abs_diff(input.len()) <= 1,
                "factor {factor}: {} vs {}",
                out.len(),
                input.len()
            );
        }
    }

    #[test]
    fn short_audio_passes_through_unmodified() {
        let shifter = PitchShifter::default();
        let input = sine(300.0, 22_050, 0.3);
        let out = shifter.shift(&input, 22_050, 1.2).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn unit_factor_is_identity() {
        let input = sine(300.0, 16_000, 1.0);
        assert_eq!(PitchShifter::default().shift(&input, 16_000, 1.0).unwrap(), input);
    }

    #[test]
    fn moves_the_fundamental_by_the_factor() {
        let rate = 16_000;
        let input = sine(440.0, rate, 1.5);
        let factor = 1.25;
        let out = PitchShifter::default().shift(&input, rate, factor).unwrap();

        let lo = input.len() / 10;
        let hi = input.len() - lo;
        let before = zero_crossings(&input[lo..hi]) as f64;
        let after = zero_crossings(&out[lo..hi]) as f64;
        let observed = before / after;
        assert!(
            (observed - factor).abs() < 0.1,
            "expected frequency ratio near {factor}, got {observed}"
        );
    }

    #[test]
    fn resample_hits_the_expected_length() {
        let input = sine(100.0, 24_000, 0.75);
        let out = resample(&input, 24_000, 28_800).unwrap();
        assert_eq!(out.len(), (input.len() as f64 * 1.2).round() as usize);
    }

    #[test]
    fn time_stretch_is_exact_in_length() {
        let input = sine(200.0, 16_000, 1.0);
        let out = time_stretch(&input, 1.3, 12_308).unwrap();
        assert_eq!(out.len(), 12_308);
        assert!(time_stretch(&[], 1.3, 10).unwrap().iter().all(|&s| s == 0.0));
    }
}
