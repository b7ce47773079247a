// Additive chord synthesis.
//
// A chord is the sample-wise sum of one unfaded sine per frequency, divided
// by its own peak so the result always peaks at exactly 1.0. Chords never
// fade; only the flatline tone does.
//
// If the sum is silent (e.g. a duration too short to yield a single sample)
// there is no peak to divide by, so normalization is skipped and the silent
// segment is returned as-is.

use crate::error::{Result, SynthError};
use crate::tone::{ToneSegment, ToneSynthesizer, validate_tone};
use tracing::debug;

pub fn synthesize_chord(
    tones: &ToneSynthesizer,
    frequencies: &[f64],
    duration: f64,
    amplitude: f64,
) -> Result<ToneSegment> {
    if frequencies.is_empty() {
        return Err(SynthError::invalid("frequencies", "chord needs at least one frequency"));
    }
    // Validate every voice before computing any of them.
    for &frequency in frequencies {
        validate_tone(frequency, duration, amplitude)?;
    }

    let mut sum = vec![0.0f64; tones.bounded_sample_count("duration", duration)?];
    for &frequency in frequencies {
        for (acc, s) in sum.iter_mut().zip(tones.sine(frequency, duration, amplitude)) {
            *acc += s;
        }
    }

    if !normalize(&mut sum) {
        debug!(?frequencies, duration, "silent chord sum, skipping normalization");
    }
    Ok(ToneSegment::new(tones.sample_rate(), sum))
}

/// Scale `samples` so the peak absolute value is 1.0. Returns false (and
/// leaves the samples alone) when every sample is zero.
pub fn normalize(samples: &mut [f64]) -> bool {
    let peak = samples.iter().fold(0.0f64, |acc, s| acc.max(s.abs()));
    if peak == 0.0 {
        return false;
    }
    for sample in samples.iter_mut() {
        *sample /= peak;
    }
    true
}
