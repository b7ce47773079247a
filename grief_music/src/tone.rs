// Sine tone synthesis.
//
// A tone is `sample_count = floor(sample_rate * duration)` samples of
// `amplitude * sin(2*pi*f*t)`, with the time points spread evenly over
// [0, duration): `t_i = i * duration / sample_count`. When the product
// `sample_rate * duration` is not an integer this spacing differs very
// slightly from `1 / sample_rate`; the segment still spans the whole
// requested duration.
//
// The synthesizer owns the sample rate and the fade length, so callers only
// decide per tone whether it fades. Fading uses envelope.rs.

use crate::config::require_amplitude;
use crate::envelope::FadeEnvelope;
use crate::error::{Result, SynthError, require_positive};
use std::f64::consts::TAU;

/// Most samples a single render may hold: 16-bit mono PCM in a WAV data
/// chunk, whose length field is a 32-bit byte count.
pub const MAX_SAMPLES: usize = (u32::MAX / 2) as usize;

/// An immutable block of synthesized samples.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneSegment {
    sample_rate: u32,
    samples: Vec<f64>,
}

impl ToneSegment {
    pub(crate) fn new(sample_rate: u32, samples: Vec<f64>) -> Self {
        ToneSegment {
            sample_rate,
            samples,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value (0.0 for an empty segment).
    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0f64, |acc, s| acc.max(s.abs()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSynthesizer {
    sample_rate: u32,
    fade_seconds: f64,
}

impl ToneSynthesizer {
    pub fn new(sample_rate: u32, fade_seconds: f64) -> Result<Self> {
        if sample_rate == 0 {
            return Err(SynthError::invalid("sample_rate", "must be > 0"));
        }
        if !(fade_seconds.is_finite() && fade_seconds >= 0.0) {
            return Err(SynthError::invalid(
                "fade_seconds",
                format!("must be a finite value >= 0, got {fade_seconds}"),
            ));
        }
        Ok(ToneSynthesizer {
            sample_rate,
            fade_seconds,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// `floor(sample_rate * seconds)`.
    pub fn sample_count(&self, seconds: f64) -> usize {
        (self.sample_rate as f64 * seconds) as usize
    }

    /// `sample_count`, rejected with `InvalidParameter` above `MAX_SAMPLES`.
    pub(crate) fn bounded_sample_count(&self, name: &'static str, seconds: f64) -> Result<usize> {
        let count = self.sample_count(seconds);
        if count > MAX_SAMPLES {
            return Err(SynthError::invalid(
                name,
                format!("{seconds} s at {} Hz exceeds {MAX_SAMPLES} samples", self.sample_rate),
            ));
        }
        Ok(count)
    }

    /// Length of the fade window in samples, before clamping to a segment.
    pub fn fade_len(&self) -> usize {
        self.sample_count(self.fade_seconds)
    }

    pub fn synthesize(
        &self,
        frequency: f64,
        duration: f64,
        amplitude: f64,
        fade_out: bool,
    ) -> Result<ToneSegment> {
        validate_tone(frequency, duration, amplitude)?;
        self.bounded_sample_count("duration", duration)?;
        let mut samples = self.sine(frequency, duration, amplitude);
        if fade_out {
            FadeEnvelope::new(samples.len(), self.fade_len()).apply(&mut samples);
        }
        Ok(ToneSegment::new(self.sample_rate, samples))
    }

    /// Raw sine samples; arguments and length must already be validated.
    pub(crate) fn sine(&self, frequency: f64, duration: f64, amplitude: f64) -> Vec<f64> {
        let n = self.sample_count(duration);
        let step = if n == 0 { 0.0 } else { duration / n as f64 };
        (0..n)
            .map(|i| amplitude * (TAU * frequency * (i as f64 * step)).sin())
            .collect()
    }
}

pub(crate) fn validate_tone(frequency: f64, duration: f64, amplitude: f64) -> Result<()> {
    require_positive("frequency", frequency)?;
    require_positive("duration", duration)?;
    require_amplitude("amplitude", amplitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synth() -> ToneSynthesizer {
        ToneSynthesizer::new(44_100, 7.0).unwrap()
    }

    #[test]
    fn test_length_is_floor_of_rate_times_duration() {
        let s = synth();
        for &(duration, expected) in &[
            (1.0, 44_100),
            (0.1, 4_410),
            (0.15, 6_615),
            (0.25, 11_025),
            (0.7, 30_869), // 44100 * 0.7 = 30869.999... in f64
            (0.00001, 0),
        ] {
            let tone = s.synthesize(440.0, duration, 0.5, false).unwrap();
            assert_eq!(tone.len(), expected, "duration {duration}");
            assert_eq!(tone.len(), (44_100.0 * duration) as usize);
        }
    }

    #[test]
    fn test_first_sample_is_zero_and_peak_is_amplitude() {
        let tone = synth().synthesize(441.0, 1.0, 0.2, false).unwrap();
        assert_eq!(tone.samples()[0], 0.0);
        // 441 Hz at 44.1 kHz: a quarter period is exactly 25 samples.
        assert!((tone.samples()[25] - 0.2).abs() < 1e-12);
        assert!((tone.peak() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_fade_only_touches_trailing_window() {
        let s = ToneSynthesizer::new(1_000, 0.5).unwrap();
        let plain = s.synthesize(3.0, 2.0, 0.5, false).unwrap();
        let faded = s.synthesize(3.0, 2.0, 0.5, true).unwrap();
        assert_eq!(faded.len(), 2_000);
        assert_eq!(&plain.samples()[..1_500], &faded.samples()[..1_500]);
        assert_eq!(*faded.samples().last().unwrap(), 0.0);
        for (f, p) in faded.samples()[1_500..].iter().zip(&plain.samples()[1_500..]) {
            assert!(f.abs() <= p.abs() + 1e-15);
        }
    }

    #[test]
    fn test_fade_longer_than_tone() {
        let s = ToneSynthesizer::new(1_000, 5.0).unwrap();
        let faded = s.synthesize(7.0, 1.0, 1.0, true).unwrap();
        assert_eq!(faded.len(), 1_000);
        assert_eq!(*faded.samples().last().unwrap(), 0.0);
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        let s = synth();
        assert!(matches!(
            s.synthesize(440.0, 0.0, 0.5, false),
            Err(SynthError::InvalidParameter { name: "duration", .. })
        ));
        assert!(s.synthesize(440.0, -1.0, 0.5, false).is_err());
        assert!(matches!(
            s.synthesize(0.0, 1.0, 0.5, false),
            Err(SynthError::InvalidParameter { name: "frequency", .. })
        ));
        assert!(matches!(
            s.synthesize(440.0, 1.0, 0.0, false),
            Err(SynthError::InvalidParameter { name: "amplitude", .. })
        ));
        assert!(s.synthesize(440.0, 1.0, 1.01, false).is_err());
        assert!(s.synthesize(440.0, 1.0, 1.0, false).is_ok());
        assert!(ToneSynthesizer::new(0, 1.0).is_err());
        assert!(ToneSynthesizer::new(44_100, -1.0).is_err());
    }

    #[test]
    fn test_rejects_durations_past_the_sample_cap() {
        let s = synth();
        for duration in [1e6, 1e30, f64::MAX] {
            assert!(matches!(
                s.synthesize(440.0, duration, 0.5, false),
                Err(SynthError::InvalidParameter { name: "duration", .. })
            ));
        }
        assert_eq!(s.bounded_sample_count("duration", 2.0).unwrap(), 88_200);
    }

    #[test]
    fn test_deterministic() {
        let s = synth();
        let a = s.synthesize(783.99, 0.2, 0.2, false).unwrap();
        let b = s.synthesize(783.99, 0.2, 0.2, false).unwrap();
        assert_eq!(a, b);
    }
}
